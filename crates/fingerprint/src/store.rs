//! Storage collaborators for enrolled templates.
//!
//! Stores are queried per call; nothing keeps a handle open across matching.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    error::{FingerprintError, Result},
    template::Template,
};

/// File extension of template blobs in a [`DirectoryTemplateStore`]
pub const TEMPLATE_EXTENSION: &str = "tpl";

/// An enrolled template with its label (e.g. which finger)
#[derive(Debug, Clone, PartialEq)]
pub struct StoredTemplate {
    pub label: String,
    pub template: Template,
}

/// Source of enrolled templates for an identity
pub trait TemplateStore {
    /// All templates enrolled for `identity`, in a stable order.
    /// Fails with `UnknownIdentity` if the identity was never enrolled.
    fn fetch_templates(&self, identity: &str) -> Result<Vec<StoredTemplate>>;
}

fn validate_identifier(value: &str) -> Result<()> {
    let invalid = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\'])
        || value.contains('\0');
    if invalid {
        return Err(FingerprintError::InvalidIdentifier(value.to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryTemplateStore {
    entries: BTreeMap<String, Vec<StoredTemplate>>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an identity without templates
    pub fn add_identity(&mut self, identity: impl Into<String>) {
        self.entries.entry(identity.into()).or_default();
    }

    pub fn enroll(&mut self, identity: impl Into<String>, label: impl Into<String>, template: Template) {
        self.entries
            .entry(identity.into())
            .or_default()
            .push(StoredTemplate {
                label: label.into(),
                template,
            });
    }

    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl TemplateStore for InMemoryTemplateStore {
    fn fetch_templates(&self, identity: &str) -> Result<Vec<StoredTemplate>> {
        self.entries
            .get(identity)
            .cloned()
            .ok_or_else(|| FingerprintError::UnknownIdentity(identity.to_string()))
    }
}

/// Templates kept as `<root>/<identity>/<label>.tpl` blobs
#[derive(Debug, Clone)]
pub struct DirectoryTemplateStore {
    root: PathBuf,
}

impl DirectoryTemplateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn identity_dir(&self, identity: &str) -> Result<PathBuf> {
        validate_identifier(identity)?;
        Ok(self.root.join(identity))
    }

    /// Write `template` for `identity`, replacing an existing one with the
    /// same label. Returns the blob path.
    pub fn enroll(&self, identity: &str, label: &str, template: &Template) -> Result<PathBuf> {
        validate_identifier(label)?;
        let dir = self.identity_dir(identity)?;
        fs::create_dir_all(&dir)?;

        let path = dir.join(format!("{label}.{TEMPLATE_EXTENSION}"));
        template.save(&path)?;
        debug!(identity, label, points = template.len(), path = %path.display(), "template enrolled");
        Ok(path)
    }

    /// Enrolled identities, sorted
    pub fn identities(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut identities = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                identities.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        identities.sort();
        Ok(identities)
    }
}

impl TemplateStore for DirectoryTemplateStore {
    fn fetch_templates(&self, identity: &str) -> Result<Vec<StoredTemplate>> {
        let dir = self.identity_dir(identity)?;
        if !dir.is_dir() {
            return Err(FingerprintError::UnknownIdentity(identity.to_string()));
        }

        let mut paths = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some(TEMPLATE_EXTENSION) {
                paths.push(path);
            }
        }
        paths.sort();

        paths
            .into_iter()
            .map(|path| {
                let label = path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Ok(StoredTemplate {
                    label,
                    template: Template::load(&path)?,
                })
            })
            .collect()
    }
}

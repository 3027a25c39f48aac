use clap::{
    Parser, Subcommand,
    builder::{PossibleValuesParser, TypedValueParser},
};
use cli::{CliError, ExtractionSummary, TemplateSource, build_pipeline, extract, load_config};
use color_eyre::eyre::{Result, eyre};
use fingerprint::{
    DirectoryTemplateStore, EngineConfig, MatchStrategy, Matcher, VerificationStatus, Verifier,
    config::ThinningAlgorithm, io::load_ridge_image, render::draw_minutiae,
};
use std::path::{Path, PathBuf};
use strum::VariantNames;
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Engine configuration (.toml or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Thinning algorithm, overriding the config file
    #[arg(
        long,
        global = true,
        value_parser = PossibleValuesParser::new(ThinningAlgorithm::VARIANTS)
            .try_map(|name| name.parse::<ThinningAlgorithm>())
    )]
    thinning: Option<ThinningAlgorithm>,

    /// Matching strategy, overriding the config file
    #[arg(
        long,
        global = true,
        value_parser = PossibleValuesParser::new(MatchStrategy::VARIANTS)
            .try_map(|name| name.parse::<MatchStrategy>())
    )]
    strategy: Option<MatchStrategy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a template from a fingerprint image
    Extract {
        /// Path to the fingerprint image
        #[arg(short, long)]
        image: PathBuf,
        /// Where to write the template blob
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Save the image with minutiae markers drawn on it
        #[arg(long)]
        overlay: Option<PathBuf>,
        /// Save the ridge skeleton as an image
        #[arg(long)]
        skeleton: Option<PathBuf>,
        /// Print a JSON summary instead of log lines
        #[arg(long)]
        json: bool,
    },
    /// Score a probe against a reference (images or .tpl blobs)
    Compare {
        #[arg(short, long)]
        probe: PathBuf,
        #[arg(short, long)]
        reference: PathBuf,
        /// Override the configured matching tolerance
        #[arg(short, long)]
        tolerance: Option<f32>,
    },
    /// Store a template for an identity
    Enroll {
        /// Template store directory
        #[arg(short, long)]
        store: PathBuf,
        #[arg(long)]
        identity: String,
        /// Finger description, used as the blob name
        #[arg(long)]
        label: String,
        /// Fingerprint image or .tpl blob
        #[arg(long)]
        input: PathBuf,
    },
    /// Check a fresh capture against an identity's enrolled templates
    Verify {
        /// Template store directory
        #[arg(short, long)]
        store: PathBuf,
        #[arg(long)]
        identity: String,
        /// Fingerprint image or .tpl blob
        #[arg(long)]
        input: PathBuf,
        /// Override the configured acceptance threshold
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Print the JSON schema of the configuration file
    Schema,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(thinning) = cli.thinning {
        config.thinning = thinning;
    }
    if let Some(strategy) = cli.strategy {
        config.matching.strategy = strategy;
    }

    match &cli.command {
        Commands::Extract { image, output, overlay, skeleton, json } => {
            run_extract(&config, image, output.as_deref(), overlay.as_deref(), skeleton.as_deref(), *json)?;
        }
        Commands::Compare { probe, reference, tolerance } => {
            run_compare(&config, probe, reference, *tolerance)?;
        }
        Commands::Enroll { store, identity, label, input } => {
            run_enroll(&config, store, identity, label, input)?;
        }
        Commands::Verify { store, identity, input, threshold } => {
            let verified = run_verify(&config, store, identity, input, *threshold)?;
            if !verified {
                std::process::exit(1);
            }
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&EngineConfig::schema())?);
        }
    }

    Ok(())
}

fn run_extract(
    config: &EngineConfig,
    image_path: &Path,
    output: Option<&Path>,
    overlay: Option<&Path>,
    skeleton: Option<&Path>,
    json: bool,
) -> Result<()> {
    let pipeline = build_pipeline(config)?;
    info!("{}", pipeline.info());
    let extraction = extract(&pipeline, image_path)?;
    let summary = ExtractionSummary::new(image_path, &extraction);

    if json {
        println!("{}", summary.to_json()?);
    } else {
        info!(
            "Found {} ridge endings and {} bifurcations in {}x{} image",
            summary.ridge_endings, summary.bifurcations, summary.width, summary.height
        );
    }

    if extraction.template.is_empty() {
        warn!("No minutiae detected in {:?}", image_path);
    }

    if let Some(path) = output {
        extraction.template.save(path)?;
        info!("Template saved to: {:?}", path);
    }

    if let Some(path) = overlay {
        let image = load_ridge_image(image_path)?;
        draw_minutiae(&image, &extraction.minutiae).save(path)?;
        info!("Minutiae overlay saved to: {:?}", path);
    }

    if let Some(path) = skeleton {
        extraction.skeleton.to_gray_image().save(path)?;
        info!("Skeleton saved to: {:?}", path);
    }

    Ok(())
}

fn run_compare(config: &EngineConfig, probe: &Path, reference: &Path, tolerance: Option<f32>) -> Result<()> {
    let pipeline = build_pipeline(config)?;
    let probe_template = TemplateSource::from_path(probe).load(&pipeline)?;
    let reference_template = TemplateSource::from_path(reference).load(&pipeline)?;

    let matcher = Matcher::new(config.matching.clone());
    let score = matcher.compare_with_tolerance(&probe_template, &reference_template, tolerance);
    let verdict = if config.acceptance.accepts(score) { "match" } else { "no match" };

    info!(
        "Probe {} points, reference {} points",
        probe_template.len(),
        reference_template.len()
    );
    println!("{score} ({verdict})");
    Ok(())
}

fn run_enroll(config: &EngineConfig, store: &Path, identity: &str, label: &str, input: &Path) -> Result<()> {
    let pipeline = build_pipeline(config)?;
    let template = TemplateSource::from_path(input).load(&pipeline)?;
    if template.is_empty() {
        return Err(CliError::NoSignal(input.to_path_buf()).into());
    }

    let store = DirectoryTemplateStore::new(store);
    let path = store.enroll(identity, label, &template)?;
    info!("✅ Enrolled '{}' for '{}' ({} minutiae) at {:?}", label, identity, template.len(), path);
    Ok(())
}

fn run_verify(
    config: &EngineConfig,
    store: &Path,
    identity: &str,
    input: &Path,
    threshold: Option<f64>,
) -> Result<bool> {
    let mut config = config.clone();
    if let Some(threshold) = threshold {
        config.acceptance.threshold = threshold;
        config.validate()?;
    }

    let pipeline = build_pipeline(&config)?;
    let probe = TemplateSource::from_path(input).load(&pipeline)?;

    let store = DirectoryTemplateStore::new(store);
    let outcome = Verifier::from_config(&config).verify(&store, identity, &probe)?;

    for entry in &outcome.scores {
        println!("{}: {}", entry.label, entry.score);
    }

    match outcome.status {
        VerificationStatus::Verified => {
            let best = outcome
                .best()
                .ok_or_else(|| eyre!("verified outcome without scores"))?;
            println!("✅ VERIFIED: best match {} ({})", best.label, best.score);
        }
        VerificationStatus::Rejected => {
            if let Some(best) = outcome.best() {
                println!("❌ REJECTED: best match {} ({})", best.label, best.score);
            }
        }
        VerificationStatus::NoSignal => println!("⚠️ No minutiae detected in the probe"),
        VerificationStatus::NoEnrolledTemplates => {
            println!("⚠️ No fingerprints enrolled for '{}'", identity)
        }
    }

    Ok(outcome.is_verified())
}

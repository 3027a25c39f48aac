//! Parallel two-sub-iteration thinning.
//!
//! Every sub-iteration marks deletable pixels against the state left by the
//! previous sub-iteration and only then deletes them, so marking order never
//! affects the result. Thinning stops after the first pass (both
//! sub-iterations) that deletes nothing, which makes the output a fixed point:
//! thinning a skeleton again returns it unchanged. The grid is treated as if
//! surrounded by background, so ridges touching the frame thin down to
//! proper endings like any other.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

use crate::{
    error::Result,
    traits::Skeletonizer,
    types::{BinaryMask, NEIGHBOR_OFFSETS, Skeleton},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubIteration {
    First,
    Second,
}

/// Neighbourhood `p2..p9` (north, then clockwise).
type Neighborhood = [bool; 8];

type DeletionRule = fn(&Neighborhood, SubIteration) -> bool;

/// Zhang–Suen thinning (1984). The plain rule erases an isolated 2x2 block
/// outright; here the block's top-left pixel survives so no component is lost.
#[derive(Debug, Clone, Default)]
pub struct ZhangSuenThinning;

impl Skeletonizer for ZhangSuenThinning {
    fn skeletonize(&self, mask: &BinaryMask) -> Result<Skeleton> {
        Ok(thin(mask, zhang_suen_deletable))
    }
}

/// Guo–Hall thinning (1989). Tends to keep diagonal ridges thinner than
/// Zhang–Suen.
#[derive(Debug, Clone, Default)]
pub struct GuoHallThinning;

impl Skeletonizer for GuoHallThinning {
    fn skeletonize(&self, mask: &BinaryMask) -> Result<Skeleton> {
        Ok(thin(mask, guo_hall_deletable))
    }
}

fn zhang_suen_deletable(p: &Neighborhood, sub: SubIteration) -> bool {
    let set = p.iter().filter(|&&v| v).count();
    if !(2..=6).contains(&set) {
        return false;
    }

    let transitions = (0..8).filter(|&i| !p[i] && p[(i + 1) % 8]).count();
    if transitions != 1 {
        return false;
    }

    let [p2, _, p4, _, p6, _, p8, _] = *p;
    match sub {
        SubIteration::First => !(p2 && p4 && p6) && !(p4 && p6 && p8),
        SubIteration::Second => !(p2 && p4 && p8) && !(p2 && p6 && p8),
    }
}

fn guo_hall_deletable(p: &Neighborhood, sub: SubIteration) -> bool {
    let [p2, p3, p4, p5, p6, p7, p8, p9] = *p;

    let c = [
        !p2 && (p3 || p4),
        !p4 && (p5 || p6),
        !p6 && (p7 || p8),
        !p8 && (p9 || p2),
    ]
    .iter()
    .filter(|&&v| v)
    .count();

    let n1 = [p9 || p2, p3 || p4, p5 || p6, p7 || p8].iter().filter(|&&v| v).count();
    let n2 = [p2 || p3, p4 || p5, p6 || p7, p8 || p9].iter().filter(|&&v| v).count();
    let n = n1.min(n2);

    let m = match sub {
        SubIteration::First => (p6 || p7 || !p9) && p8,
        SubIteration::Second => (p2 || p3 || !p5) && p4,
    };

    c == 1 && (2..=3).contains(&n) && !m
}

fn neighborhood(mask: &BinaryMask, x: u32, y: u32) -> Neighborhood {
    let mut p = [false; 8];
    for (slot, (dx, dy)) in p.iter_mut().zip(NEIGHBOR_OFFSETS) {
        *slot = mask.get(x as i64 + dx, y as i64 + dy);
    }
    p
}

fn deletable(mask: &BinaryMask, rule: DeletionRule, sub: SubIteration, x: i64, y: i64) -> bool {
    mask.get(x, y) && rule(&neighborhood(mask, x as u32, y as u32), sub)
}

/// Top-left pixel of a 2x2 block with nothing around it that the rule would
/// delete completely.
fn is_vanishing_block_anchor(mask: &BinaryMask, rule: DeletionRule, sub: SubIteration, x: i64, y: i64) -> bool {
    let block = [(x, y), (x + 1, y), (x, y + 1), (x + 1, y + 1)];
    if !block.iter().all(|&(bx, by)| mask.get(bx, by)) {
        return false;
    }

    let isolated = (y - 1..=y + 2)
        .flat_map(|ry| (x - 1..=x + 2).map(move |rx| (rx, ry)))
        .filter(|p| !block.contains(p))
        .all(|(rx, ry)| !mask.get(rx, ry));

    isolated && block.iter().all(|&(bx, by)| deletable(mask, rule, sub, bx, by))
}

fn mark_row(mask: &BinaryMask, rule: DeletionRule, sub: SubIteration, y: u32) -> Vec<(u32, u32)> {
    let y = y as i64;
    (0..mask.width() as i64)
        .filter(|&x| deletable(mask, rule, sub, x, y) && !is_vanishing_block_anchor(mask, rule, sub, x, y))
        .map(|x| (x as u32, y as u32))
        .collect()
}

fn mark(mask: &BinaryMask, rule: DeletionRule, sub: SubIteration) -> Vec<(u32, u32)> {
    let rows = 0..mask.height();

    #[cfg(feature = "parallel")]
    let marked = rows
        .into_par_iter()
        .flat_map_iter(|y| mark_row(mask, rule, sub, y))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let marked = rows.flat_map(|y| mark_row(mask, rule, sub, y)).collect();

    marked
}

fn thin(mask: &BinaryMask, rule: DeletionRule) -> Skeleton {
    let mut current = mask.clone();
    let mut passes = 0usize;
    let mut removed = 0usize;
    loop {
        let mut changed = false;
        for sub in [SubIteration::First, SubIteration::Second] {
            let marked = mark(&current, rule, sub);
            changed |= !marked.is_empty();
            removed += marked.len();
            for (x, y) in marked {
                current.clear(x, y);
            }
        }
        passes += 1;
        if !changed {
            break;
        }
    }

    debug!(passes, removed, remaining = current.foreground_count(), "thinning converged");
    Skeleton::from_mask(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{algorithms::CrossingNumberDetector, traits::MinutiaeDetector, types::MinutiaKind};
    use std::collections::VecDeque;

    fn components(skeleton: &Skeleton) -> usize {
        let (w, h) = skeleton.dimensions();
        let mut seen = vec![false; (w * h) as usize];
        let mut count = 0;
        for y in 0..h {
            for x in 0..w {
                if !skeleton.get(x as i64, y as i64) || seen[(y * w + x) as usize] {
                    continue;
                }
                count += 1;
                let mut queue = VecDeque::from([(x as i64, y as i64)]);
                seen[(y * w + x) as usize] = true;
                while let Some((cx, cy)) = queue.pop_front() {
                    for (dx, dy) in NEIGHBOR_OFFSETS {
                        let (nx, ny) = (cx + dx, cy + dy);
                        if skeleton.get(nx, ny) && !seen[(ny as u32 * w + nx as u32) as usize] {
                            seen[(ny as u32 * w + nx as u32) as usize] = true;
                            queue.push_back((nx, ny));
                        }
                    }
                }
            }
        }
        count
    }

    fn thick_bar() -> BinaryMask {
        BinaryMask::from_fn(30, 20, |x, y| (3..27).contains(&x) && (8..13).contains(&y))
    }

    fn ring() -> BinaryMask {
        BinaryMask::from_fn(40, 40, |x, y| {
            let dx = x as f32 - 20.0;
            let dy = y as f32 - 20.0;
            let d2 = dx * dx + dy * dy;
            (100.0..=196.0).contains(&d2)
        })
    }

    fn algorithms() -> Vec<Box<dyn Skeletonizer>> {
        vec![Box::new(ZhangSuenThinning), Box::new(GuoHallThinning)]
    }

    #[test]
    fn test_bar_thins_to_connected_centerline() {
        let mask = thick_bar();
        for algorithm in algorithms() {
            let skeleton = algorithm.skeletonize(&mask).unwrap();
            assert!(skeleton.pixel_count() > 0);
            assert!(skeleton.pixel_count() * 3 < mask.foreground_count());
            assert_eq!(components(&skeleton), 1);

            let xs: Vec<u32> = (0..30)
                .filter(|&x| (0..20).any(|y| skeleton.get(x, y)))
                .map(|x| x as u32)
                .collect();
            assert!(xs.first().copied().unwrap_or(u32::MAX) <= 8);
            assert!(xs.last().copied().unwrap_or(0) >= 22);
        }
    }

    #[test]
    fn test_skeleton_stays_inside_mask() {
        let mask = ring();
        for algorithm in algorithms() {
            let skeleton = algorithm.skeletonize(&mask).unwrap();
            for (pixel, &inside) in skeleton.as_mask().pixels().iter().zip(mask.pixels()) {
                assert!(!pixel || inside);
            }
        }
    }

    #[test]
    fn test_ring_keeps_its_hole() {
        let mask = ring();
        for algorithm in algorithms() {
            let skeleton = algorithm.skeletonize(&mask).unwrap();
            assert_eq!(components(&skeleton), 1);
            assert!(!skeleton.get(20, 20));
            assert!((0..20).any(|x| skeleton.get(x, 20)));
            assert!((21..40).any(|x| skeleton.get(x, 20)));
        }
    }

    fn bar_through_frame() -> BinaryMask {
        BinaryMask::from_fn(30, 40, |x, _| (10..16).contains(&x))
    }

    #[test]
    fn test_thinning_is_idempotent() {
        for mask in [thick_bar(), ring(), bar_through_frame()] {
            for algorithm in algorithms() {
                let once = algorithm.skeletonize(&mask).unwrap();
                let twice = algorithm.skeletonize(once.as_mask()).unwrap();
                assert_eq!(once, twice);
            }
        }
    }

    #[test]
    fn test_single_pixel_line_is_untouched() {
        let mask = BinaryMask::from_fn(12, 9, |x, y| y == 4 && (2..10).contains(&x));
        for algorithm in algorithms() {
            let skeleton = algorithm.skeletonize(&mask).unwrap();
            assert_eq!(skeleton.as_mask(), &mask);
        }
    }

    #[test]
    fn test_empty_and_tiny_masks() {
        let empty = BinaryMask::new(10, 10);
        assert_eq!(ZhangSuenThinning.skeletonize(&empty).unwrap().pixel_count(), 0);

        let tiny = BinaryMask::from_fn(2, 2, |_, _| true);
        assert_eq!(GuoHallThinning.skeletonize(&tiny).unwrap().pixel_count(), 1);
        assert_eq!(ZhangSuenThinning.skeletonize(&tiny).unwrap().pixel_count(), 1);
    }

    #[test]
    fn test_isolated_block_keeps_one_pixel() {
        let mask = BinaryMask::from_fn(10, 10, |x, y| (4..6).contains(&x) && (4..6).contains(&y));
        for algorithm in algorithms() {
            let skeleton = algorithm.skeletonize(&mask).unwrap();
            assert_eq!(skeleton.pixel_count(), 1);
            assert_eq!(components(&skeleton), 1);
        }
        assert!(ZhangSuenThinning.skeletonize(&mask).unwrap().get(4, 4));
    }

    #[test]
    fn test_bar_touching_frame_ends_inside_image() {
        let mask = bar_through_frame();
        let skeleton = ZhangSuenThinning.skeletonize(&mask).unwrap();
        let (w, h) = skeleton.dimensions();
        assert!((0..w as i64).all(|x| !skeleton.get(x, 0) && !skeleton.get(x, h as i64 - 1)));
        assert_eq!(components(&skeleton), 1);

        let minutiae = CrossingNumberDetector.detect(&skeleton);
        assert_eq!(minutiae.len(), 2, "{minutiae:?}");
        assert!(minutiae.iter().all(|m| m.kind == MinutiaKind::RidgeEnding));
        assert!(minutiae.iter().all(|m| (10..16).contains(&m.x)));
        assert!(minutiae[0].y < h / 2 && minutiae[1].y > h / 2);
    }

    #[test]
    fn test_zhang_suen_rule() {
        // Top edge of a block: only the south side is filled
        let edge = [false, false, true, true, true, true, true, false];
        assert!(zhang_suen_deletable(&edge, SubIteration::Second));
        // Line interior has two transitions
        let line = [false, false, true, false, false, false, true, false];
        assert!(!zhang_suen_deletable(&line, SubIteration::First));
        // Line end has a single neighbour
        let end = [false, false, true, false, false, false, false, false];
        assert!(!zhang_suen_deletable(&end, SubIteration::First));
    }
}

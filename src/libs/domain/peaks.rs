use crate::libs::domain::{Moments, ScoreSurface};
use crate::libs::error::{try_zeroed, Result};
use itertools::iproduct;
use std::collections::VecDeque;

/// A domain candidate in global bins, `start < end`.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub start: usize,
    pub end: usize,
    pub score: f64,
    pub control: f64,
    pub upper: Moments,
    pub lower: Moments,
}

/// Peak corners of a window's surface, in row-major order.
///
/// Corners whose sign exceeds `threshold` form 8-connected plateaus, and so
/// do the corners above the core level `(1 + threshold) / 2`. The core
/// plateaus split off nested domains that share a plateau with their parent.
/// Every plateau of either level yields its best corner: highest score, ties
/// to the smallest `(a, b)`.
///
/// A best corner the window does not [cover](ScoreSurface::covered) is
/// dropped along with its plateau. The overlapping window sees that domain
/// whole.
pub fn plateaus(surface: &ScoreSurface, threshold: f64) -> Result<Vec<(usize, usize)>> {
    let mut peaks = best_corners(surface, threshold)?;
    peaks.extend(best_corners(surface, (1.0 + threshold) / 2.0)?);
    peaks.sort_unstable();
    peaks.dedup();

    peaks.retain(|&(a, b)| surface.covered(a, b));
    Ok(peaks)
}

fn best_corners(surface: &ScoreSurface, level: f64) -> Result<Vec<(usize, usize)>> {
    let m = surface.size();
    let above = |a: usize, b: usize| surface.sign(a, b) > level;

    let mut seen: Vec<bool> = try_zeroed("plateau mask", m, m)?;
    let mut queue = VecDeque::new();
    let mut bests = vec![];

    for a in 0..m {
        for b in a + 1..m {
            if seen[a * m + b] || !above(a, b) {
                continue;
            }

            seen[a * m + b] = true;
            queue.push_back((a, b));
            let mut best = (a, b);

            while let Some((ca, cb)) = queue.pop_front() {
                let (score, best_score) = (surface.score(ca, cb), surface.score(best.0, best.1));
                if score > best_score || (score == best_score && (ca, cb) < best) {
                    best = (ca, cb);
                }

                let rows = ca.saturating_sub(1)..=(ca + 1).min(m - 1);
                let cols = cb.saturating_sub(1)..=(cb + 1).min(m - 1);
                for (na, nb) in iproduct!(rows, cols) {
                    if nb <= na || seen[na * m + nb] || !above(na, nb) {
                        continue;
                    }
                    seen[na * m + nb] = true;
                    queue.push_back((na, nb));
                }
            }

            bests.push(best);
        }
    }

    Ok(bests)
}

//! Contact-domain calling.
//!
//! A chromosome is tiled into overlapping windows. Each window's block is
//! turned into an arrowhead matrix, every corner `(a, b)` of the block is
//! scored, and the best corner of each high-scoring plateau becomes a
//! candidate domain. A diagonal-shuffled copy of the same block provides the
//! control score.

mod engine;
mod genome_wide;
mod merge;
mod peaks;
mod score;
mod source;
mod window;

pub use engine::{ChromDomains, DomainCaller, DomainOutputs, DOMAIN_COLUMNS, SCORE_COLUMNS};
pub use genome_wide::{GenomeWideCaller, RunConfig, RunSummary};
pub use merge::merge_candidates;
pub use peaks::{plateaus, Candidate};
pub use score::{scan_window, CornerScore, CornerScorer, Frame, Moments, ScoreSurface, SignSumScorer};
pub use source::{BlockSource, ControlSource, ObservedSource};
pub use window::{tiles, DEFAULT_WINDOW};

/// Tunables of the domain caller.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainConfig {
    /// Requested processing window in bins, see [`DomainConfig::window_size`]
    pub window: usize,
    /// Minimum sign component of a corner score for it to become a candidate
    pub sign_threshold: f64,
    /// Corners with `var(U) + var(L)` above this are ignored
    pub max_variance: Option<f64>,
    /// Required margin of the observed score over the control score
    pub min_enrichment: f64,
    /// Narrowest corner considered, `b - a`
    pub min_domain_bins: usize,
    /// Candidates whose both ends are this close, in bins, are duplicates
    pub merge_tolerance: usize,
    /// Seed of the control shuffle
    pub seed: u64,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            sign_threshold: 0.4,
            max_variance: None,
            min_enrichment: 0.0,
            min_domain_bins: 3,
            merge_tolerance: 1,
            seed: 42,
        }
    }
}

impl DomainConfig {
    /// Effective window size.
    ///
    /// Odd values are bumped to the next even number, and anything not larger
    /// than 50 falls back to [`DEFAULT_WINDOW`].
    ///
    /// ```
    /// # use hicdom::libs::domain::DomainConfig;
    /// assert_eq!(DomainConfig::window_size(None), 2000);
    /// assert_eq!(DomainConfig::window_size(Some(301)), 302);
    /// assert_eq!(DomainConfig::window_size(Some(49)), 2000);
    /// assert_eq!(DomainConfig::window_size(Some(51)), 52);
    /// ```
    pub fn window_size(requested: Option<usize>) -> usize {
        match requested {
            None => DEFAULT_WINDOW,
            Some(w) => {
                let w = if w % 2 == 1 {
                    w.checked_add(1).unwrap_or(w - 1)
                } else {
                    w
                };
                if w > 50 {
                    w
                } else {
                    DEFAULT_WINDOW
                }
            }
        }
    }

    /// Sets the window through [`DomainConfig::window_size`].
    pub fn with_window(mut self, requested: Option<usize>) -> Self {
        self.window = Self::window_size(requested);
        self
    }

    /// The window actually used, whatever was stored in `window`
    pub fn effective_window(&self) -> usize {
        Self::window_size(Some(self.window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_size_even_and_large() {
        for w in 0..5000 {
            let eff = DomainConfig::window_size(Some(w));
            assert_eq!(eff % 2, 0, "{}", w);
            assert!(eff >= 52, "{}", w);
        }
        assert_eq!(DomainConfig::window_size(Some(usize::MAX - 1)), usize::MAX - 1);
    }

    #[test]
    fn test_effective_window() {
        let mut config = DomainConfig::default().with_window(Some(99));
        assert_eq!(config.window, 100);

        config.window = 7;
        assert_eq!(config.effective_window(), DEFAULT_WINDOW);
    }
}

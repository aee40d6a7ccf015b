use crate::libs::domain::{
    merge_candidates, plateaus, scan_window, tiles, Candidate, ControlSource, CornerScorer,
    DomainConfig, Frame, ObservedSource, SignSumScorer,
};
use crate::libs::error::Result;
use crate::libs::feature::{ChromPair, Feature2D};
use crate::libs::feature_list::FeatureList;
use crate::libs::genome::Chromosome;
use crate::libs::hic::ContactMatrix;
use std::collections::HashMap;
use std::sync::Mutex;

/// Attribute columns of the domains table
pub const DOMAIN_COLUMNS: [&str; 6] = ["score", "control", "u_var", "l_var", "u_sign", "l_sign"];
/// Attribute columns of the score tables
pub const SCORE_COLUMNS: [&str; 1] = ["score"];

/// Everything called on one chromosome.
#[derive(Debug, Clone)]
pub struct ChromDomains {
    pub key: ChromPair,
    /// Accepted domains
    pub domains: Vec<Feature2D>,
    /// Observed score of every merged candidate
    pub scores: Vec<Feature2D>,
    /// Control score of every merged candidate
    pub controls: Vec<Feature2D>,
}

/// The three collections shared by all chromosomes of a run.
pub struct DomainOutputs {
    domains: Mutex<FeatureList>,
    scores: Mutex<FeatureList>,
    controls: Mutex<FeatureList>,
}

impl Default for DomainOutputs {
    fn default() -> Self {
        Self {
            domains: Mutex::new(FeatureList::new(&DOMAIN_COLUMNS)),
            scores: Mutex::new(FeatureList::new(&SCORE_COLUMNS)),
            controls: Mutex::new(FeatureList::new(&SCORE_COLUMNS)),
        }
    }
}

impl DomainOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, calls: ChromDomains) {
        let ChromDomains {
            key,
            domains,
            scores,
            controls,
        } = calls;

        for (list, features) in [
            (&self.domains, domains),
            (&self.scores, scores),
            (&self.controls, controls),
        ] {
            if features.is_empty() {
                continue;
            }
            list.lock()
                .unwrap_or_else(|e| e.into_inner())
                .add_all(key.clone(), features);
        }
    }

    /// `(domains, scores, controls)`
    pub fn into_lists(self) -> (FeatureList, FeatureList, FeatureList) {
        let unwrap = |m: Mutex<FeatureList>| m.into_inner().unwrap_or_else(|e| e.into_inner());
        (unwrap(self.domains), unwrap(self.scores), unwrap(self.controls))
    }
}

// -0 is written as 0
fn format_attr(v: f64) -> String {
    format!("{}", v + 0.0)
}

/// Calls the domains of one chromosome.
pub struct DomainCaller<'a> {
    config: &'a DomainConfig,
    scorer: &'a dyn CornerScorer,
}

impl<'a> DomainCaller<'a> {
    /// A caller with the [`SignSumScorer`]
    pub fn new(config: &'a DomainConfig) -> Self {
        Self {
            config,
            scorer: &SignSumScorer,
        }
    }

    pub fn with_scorer(config: &'a DomainConfig, scorer: &'a dyn CornerScorer) -> Self {
        Self { config, scorer }
    }

    /// Merged candidates of the whole chromosome, in global bins.
    pub fn candidates(&self, chr: &Chromosome, matrix: &dyn ContactMatrix) -> Result<Vec<Candidate>> {
        let n = matrix.bin_count();
        let window = self.config.effective_window();

        let observed = ObservedSource::new(matrix);
        let control = ControlSource::new(
            matrix,
            self.config.seed.wrapping_add((chr.index() as u64) << 32),
        );

        let mut raw = vec![];
        for range in tiles(n, window) {
            let frame = Frame::of(&range, n);
            let (obs, ctl) = rayon::join(
                || scan_window(&observed, range.clone(), frame, self.scorer, self.config),
                || scan_window(&control, range.clone(), frame, self.scorer, self.config),
            );
            let (obs, ctl) = (obs?, ctl?);

            let peaks = plateaus(&obs, self.config.sign_threshold)?;
            log::debug!(
                "{}: {} candidates in bins {}-{}",
                chr.name(),
                peaks.len(),
                range.start,
                range.end
            );

            for (a, b) in peaks {
                let (upper, lower) = obs.regions(a, b);
                raw.push(Candidate {
                    start: range.start + a,
                    end: range.start + b,
                    score: obs.score(a, b),
                    control: ctl.score(a, b),
                    upper,
                    lower,
                });
            }
        }

        Ok(merge_candidates(raw, self.config.merge_tolerance))
    }

    /// Domains, observed scores and control scores of one chromosome.
    pub fn call(
        &self,
        chr: &Chromosome,
        resolution: u32,
        matrix: &dyn ContactMatrix,
    ) -> Result<ChromDomains> {
        let mut calls = ChromDomains {
            key: ChromPair::new(chr.name(), chr.name()),
            domains: vec![],
            scores: vec![],
            controls: vec![],
        };
        if matrix.bin_count() == 0 {
            return Ok(calls);
        }

        let res = resolution.max(1) as u64;
        let feature = |name: &str, cand: &Candidate, attrs: Vec<(&str, f64)>| -> Result<Feature2D> {
            let (start, end) = (cand.start as u64 * res, cand.end as u64 * res);
            let attrs: HashMap<String, String> = attrs
                .into_iter()
                .map(|(k, v)| (k.to_string(), format_attr(v)))
                .collect();
            Feature2D::new(name, chr.name(), start, end, chr.name(), start, end, None, attrs)
        };

        for cand in self.candidates(chr, matrix)? {
            calls
                .scores
                .push(feature("score", &cand, vec![("score", cand.score)])?);
            calls
                .controls
                .push(feature("control", &cand, vec![("score", cand.control)])?);

            if cand.score - cand.control > self.config.min_enrichment {
                calls.domains.push(feature(
                    "domain",
                    &cand,
                    vec![
                        ("score", cand.score),
                        ("control", cand.control),
                        ("u_var", cand.upper.variance()),
                        ("l_var", cand.lower.variance()),
                        ("u_sign", -cand.upper.sign_fraction()),
                        ("l_sign", cand.lower.sign_fraction()),
                    ],
                )?);
            }
        }

        Ok(calls)
    }

    /// Calls one chromosome into `outputs`, returning the number of domains.
    pub fn run(
        &self,
        chr: &Chromosome,
        resolution: u32,
        matrix: &dyn ContactMatrix,
        outputs: &DomainOutputs,
    ) -> Result<usize> {
        let calls = self.call(chr, resolution, matrix)?;
        let count = calls.domains.len();
        outputs.append(calls);
        Ok(count)
    }
}

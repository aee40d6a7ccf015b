use crate::libs::domain::{DomainCaller, DomainConfig, DomainOutputs};
use crate::libs::error::{HicError, Result};
use crate::libs::feature::ChromPair;
use crate::libs::feature_list::FeatureList;
use crate::libs::genome::{Chromosome, ChromosomeCatalog};
use crate::libs::hic::{MatrixProvider, MatrixRequest, NormalizationType};
use rayon::prelude::*;
use std::collections::HashMap;

/// Settings of one genome-wide run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub resolution: u32,
    pub norm: NormalizationType,
    /// Restrict the run to these chromosomes
    pub chromosomes: Option<Vec<String>>,
    pub outprefix: String,
    /// Chromosomes processed at the same time
    pub parallel: usize,
    /// Write a header line into the output files
    pub with_header: bool,
    pub domain: DomainConfig,
}

impl RunConfig {
    pub fn new(outprefix: &str, resolution: u32) -> Self {
        Self {
            resolution,
            norm: NormalizationType::None,
            chromosomes: None,
            outprefix: outprefix.to_string(),
            parallel: 1,
            with_header: false,
            domain: DomainConfig::default(),
        }
    }

    /// Domains, observed scores and control scores file names
    ///
    /// ```
    /// # use hicdom::libs::domain::RunConfig;
    /// let config = RunConfig::new("out/gm", 10000);
    /// assert_eq!(
    ///     config.output_files(),
    ///     ["out/gm_10000_blocks", "out/gm_10000_list_scores", "out/gm_10000_control_scores"]
    /// );
    /// ```
    pub fn output_files(&self) -> [String; 3] {
        let base = format!("{}_{}", self.outprefix, self.resolution);
        [
            format!("{}_blocks", base),
            format!("{}_list_scores", base),
            format!("{}_control_scores", base),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub processed: Vec<String>,
    pub skipped: Vec<String>,
    pub domains: usize,
}

enum Outcome {
    Processed(usize),
    Skipped,
}

/// Runs the domain caller over every chromosome of a catalog.
pub struct GenomeWideCaller<'a> {
    provider: &'a dyn MatrixProvider,
    catalog: &'a ChromosomeCatalog,
    config: RunConfig,
}

impl<'a> GenomeWideCaller<'a> {
    pub fn new(provider: &'a dyn MatrixProvider, catalog: &'a ChromosomeCatalog, config: RunConfig) -> Self {
        Self {
            provider,
            catalog,
            config,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Chromosomes to process, in catalog order and without the whole-genome
    /// pseudo-chromosome.
    pub fn chromosomes(&self) -> Result<Vec<Chromosome>> {
        let chromosomes = match &self.config.chromosomes {
            Some(names) => self.catalog.resolve(names)?,
            None => self.catalog.chromosomes().to_vec(),
        };
        Ok(chromosomes
            .into_iter()
            .filter(|c| !c.is_whole_genome())
            .collect())
    }

    /// Calls all chromosomes, returning `(domains, scores, controls)`.
    ///
    /// A chromosome without a matrix is skipped with a warning. Running out
    /// of memory stops the whole run.
    pub fn call(&self) -> Result<([FeatureList; 3], RunSummary)> {
        let chromosomes = self.chromosomes()?;
        let outputs = DomainOutputs::new();
        let caller = DomainCaller::new(&self.config.domain);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.parallel.max(1))
            .build()?;
        let outcomes: Vec<Result<Outcome>> = pool.install(|| {
            chromosomes
                .par_iter()
                .map(|chr| self.process(&caller, chr, &outputs))
                .collect()
        });

        let mut summary = RunSummary::default();
        for (chr, outcome) in chromosomes.iter().zip(outcomes) {
            match outcome? {
                Outcome::Processed(count) => {
                    summary.processed.push(chr.name().to_string());
                    summary.domains += count;
                }
                Outcome::Skipped => summary.skipped.push(chr.name().to_string()),
            }
        }

        // chromosomes finish in any order
        let rank: HashMap<&str, usize> = self
            .catalog
            .chromosomes()
            .iter()
            .map(|c| (c.name(), c.index()))
            .collect();
        let by_catalog = |k: &ChromPair| {
            (
                rank.get(k.first()).copied().unwrap_or(usize::MAX),
                rank.get(k.second()).copied().unwrap_or(usize::MAX),
            )
        };
        let (mut domains, mut scores, mut controls) = outputs.into_lists();
        for list in [&mut domains, &mut scores, &mut controls] {
            list.sort_buckets_by_key(by_catalog);
        }

        Ok(([domains, scores, controls], summary))
    }

    fn process(&self, caller: &DomainCaller, chr: &Chromosome, outputs: &DomainOutputs) -> Result<Outcome> {
        let request = MatrixRequest::intra(chr, self.config.resolution, self.config.norm);
        let matrix = match self.provider.matrix(&request) {
            Ok(Some(matrix)) => matrix,
            Ok(None) => {
                log::warn!(
                    "No {} matrix for {} at {}, skipped",
                    self.config.norm,
                    chr.name(),
                    self.config.resolution
                );
                return Ok(Outcome::Skipped);
            }
            Err(e @ HicError::ResourceExhausted { .. }) => return Err(e),
            Err(e) => {
                log::warn!("Reading {} failed, skipped: {}", chr.name(), e);
                return Ok(Outcome::Skipped);
            }
        };

        if matrix.bin_count() == 0 {
            log::warn!("{} has an empty matrix, skipped", chr.name());
            return Ok(Outcome::Skipped);
        }

        log::info!("Processing {} ({} bins)", chr.name(), matrix.bin_count());
        let count = caller.run(chr, self.config.resolution, matrix.as_ref(), outputs)?;
        log::info!("{}: {} domains", chr.name(), count);

        Ok(Outcome::Processed(count))
    }

    /// Calls all chromosomes and writes the three output files.
    pub fn run(&self) -> Result<RunSummary> {
        let (lists, summary) = self.call()?;
        for (list, outfile) in lists.iter().zip(self.config.output_files()) {
            list.export(&outfile, self.config.with_header)?;
        }

        log::info!(
            "{} domains on {} chromosomes, {} skipped",
            summary.domains,
            summary.processed.len(),
            summary.skipped.len()
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::hic::{ContactDataset, ContactMatrix, ZoomData};
    use std::sync::Arc;

    fn records(chrs: &[&str], domains: &[(usize, usize)], n: usize, res: u64) -> String {
        let mut out = String::new();
        for chr in chrs {
            for i in 0..n {
                for j in i..n {
                    let inside = domains.iter().any(|&(s, e)| s <= i && j < e);
                    let count = if inside { 100 } else { 1 };
                    out += &format!("{} {} {} {} {}\n", chr, i as u64 * res, chr, j as u64 * res, count);
                }
            }
        }
        out
    }

    fn dataset() -> ContactDataset {
        let mut ds = ContactDataset::new();
        ds.add_reader(records(&["chr1", "chr2", "chr3"], &[(10, 30), (30, 70)], 100, 1000).as_bytes())
            .unwrap();
        ds
    }

    #[test]
    fn test_chromosome_selection() {
        let ds = dataset();
        let catalog = ds.catalog();

        let caller = GenomeWideCaller::new(&ds, &catalog, RunConfig::new("x", 1000));
        let names: Vec<String> = caller.chromosomes().unwrap().iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["chr1", "chr2", "chr3"]);

        let mut config = RunConfig::new("x", 1000);
        config.chromosomes = Some(vec!["3".to_string(), "All".to_string(), "chr1".to_string()]);
        let caller = GenomeWideCaller::new(&ds, &catalog, config);
        let names: Vec<String> = caller.chromosomes().unwrap().iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["chr1", "chr3"]);

        let mut config = RunConfig::new("x", 1000);
        config.chromosomes = Some(vec!["chrZ".to_string()]);
        let caller = GenomeWideCaller::new(&ds, &catalog, config);
        assert!(matches!(caller.call(), Err(HicError::UnknownChromosome(_))));
    }

    #[test]
    fn test_parallel_matches_serial() {
        let ds = dataset();
        let catalog = ds.catalog();

        let export = |parallel: usize| {
            let mut config = RunConfig::new("x", 1000);
            config.parallel = parallel;
            let (lists, summary) = GenomeWideCaller::new(&ds, &catalog, config).call().unwrap();
            let mut out = vec![];
            for list in &lists {
                list.export_to(&mut out, true).unwrap();
            }
            (String::from_utf8(out).unwrap(), summary)
        };

        let (serial, summary) = export(1);
        let (parallel, _) = export(3);
        assert_eq!(serial, parallel);
        assert_eq!(summary.processed, vec!["chr1", "chr2", "chr3"]);
        assert_eq!(summary.domains, 6);

        let chrs: Vec<&str> = serial
            .lines()
            .filter(|l| !l.starts_with("chr1\tx1"))
            .map(|l| l.split('\t').next().unwrap())
            .collect();
        let mut sorted = chrs.clone();
        sorted.sort();
        assert_eq!(chrs[..6], sorted[..6]);
    }

    struct Partial<'a> {
        inner: &'a ContactDataset,
        missing: &'a str,
        exhausted: &'a str,
        empty: &'a str,
    }

    impl MatrixProvider for Partial<'_> {
        fn matrix(&self, request: &MatrixRequest) -> Result<Option<Arc<dyn ContactMatrix>>> {
            let name = request.chr1.name();
            if name == self.empty {
                Ok(Some(Arc::new(ZoomData::from_contacts(0, vec![]))))
            } else if name == self.missing {
                Err(HicError::parse(1, "corrupt"))
            } else if name == self.exhausted {
                Err(HicError::ResourceExhausted {
                    what: "contact block",
                    rows: 1,
                    cols: 1,
                })
            } else {
                self.inner.matrix(request)
            }
        }
    }

    #[test]
    fn test_skip_and_fatal() {
        let ds = dataset();
        let catalog = ds.catalog();

        let provider = Partial {
            inner: &ds,
            missing: "chr2",
            exhausted: "none",
            empty: "none",
        };
        let (lists, summary) = GenomeWideCaller::new(&provider, &catalog, RunConfig::new("x", 1000))
            .call()
            .unwrap();
        assert_eq!(summary.skipped, vec!["chr2"]);
        assert_eq!(summary.processed, vec!["chr1", "chr3"]);
        assert!(lists[0].iter().all(|f| f.chr1() != "chr2"));

        let provider = Partial {
            inner: &ds,
            missing: "none",
            exhausted: "chr3",
            empty: "none",
        };
        let res = GenomeWideCaller::new(&provider, &catalog, RunConfig::new("x", 1000)).call();
        assert!(matches!(res, Err(HicError::ResourceExhausted { .. })));
    }

    #[test]
    fn test_empty_matrix_skipped() {
        let ds = dataset();
        let catalog = ds.catalog();

        let provider = Partial {
            inner: &ds,
            missing: "none",
            exhausted: "none",
            empty: "chr1",
        };
        let (lists, summary) = GenomeWideCaller::new(&provider, &catalog, RunConfig::new("x", 1000))
            .call()
            .unwrap();
        assert_eq!(summary.skipped, vec!["chr1"]);
        assert_eq!(summary.processed, vec!["chr2", "chr3"]);
        assert_eq!(summary.domains, 4);
        assert!(lists.iter().all(|l| l.iter().all(|f| f.chr1() != "chr1")));
    }

    #[test]
    fn test_kr_without_vectors() {
        let ds = dataset();
        let catalog = ds.catalog();
        let mut config = RunConfig::new("x", 1000);
        config.norm = NormalizationType::Kr;

        let (lists, summary) = GenomeWideCaller::new(&ds, &catalog, config).call().unwrap();
        assert!(summary.processed.is_empty());
        assert_eq!(summary.skipped.len(), 3);
        assert!(lists.iter().all(|l| l.is_empty()));
    }
}

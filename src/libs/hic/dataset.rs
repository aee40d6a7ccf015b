use crate::libs::error::{HicError, Result};
use crate::libs::genome::ChromosomeCatalog;
use crate::libs::hic::{ContactMatrix, MatrixProvider, MatrixRequest, NormalizationType, Unit, ZoomData};
use indexmap::IndexMap;
use lru::LruCache;
use std::collections::HashMap;
use std::io::BufRead;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

type VectorKey = (NormalizationType, String, u32);

/// Intra-chromosomal contacts read from text records, binned on request.
///
/// Record lines are `chrom1 pos1 chrom2 pos2 [count]`, whitespace separated;
/// `count` defaults to 1. Inter-chromosomal records are counted and dropped.
pub struct ContactDataset {
    contacts: IndexMap<String, Vec<(u64, u64, f64)>>,
    max_pos: IndexMap<String, u64>,
    vectors: HashMap<VectorKey, Vec<f64>>,
    cache: Mutex<LruCache<VectorKey, Arc<ZoomData>>>,
    inter: usize,
}

impl Default for ContactDataset {
    fn default() -> Self {
        Self {
            contacts: IndexMap::new(),
            max_pos: IndexMap::new(),
            vectors: HashMap::new(),
            cache: Mutex::new(LruCache::new(NonZeroUsize::MIN.saturating_add(3))),
            inter: 0,
        }
    }
}

impl ContactDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads one file, or several joined by `+` which are merged into a single
    /// dataset by summing their counts.
    pub fn load(infiles: &str) -> Result<Self> {
        let mut dataset = Self::new();
        for infile in infiles.split('+').filter(|s| !s.is_empty()) {
            log::info!("Reading contacts from {}", infile);
            dataset.add_reader(crate::reader(infile)?)?;
        }
        Ok(dataset)
    }

    /// Appends all records of `reader`.
    ///
    /// ```
    /// # use hicdom::libs::hic::ContactDataset;
    /// let mut ds = ContactDataset::new();
    /// ds.add_reader("chr1 100 chr1 2500 3\nchr1 10 chr2 20\n# skipped\nchr1 0 chr1 0\n".as_bytes()).unwrap();
    /// assert_eq!(ds.contact_count(), 2);
    /// assert_eq!(ds.inter_count(), 1);
    /// ```
    pub fn add_reader<R: BufRead>(&mut self, reader: R) -> Result<()> {
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line_no = idx + 1;

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return Err(HicError::parse(line_no, "expected `chrom1 pos1 chrom2 pos2 [count]`"));
            }
            let pos = |i: usize| -> Result<u64> {
                fields[i].parse::<u64>().map_err(|e| {
                    HicError::parse(line_no, format!("invalid position {:?}: {}", fields[i], e))
                })
            };
            let (pos1, pos2) = (pos(1)?, pos(3)?);
            let count = match fields.get(4) {
                None => 1.0,
                Some(s) => s.parse::<f64>().map_err(|e| {
                    HicError::parse(line_no, format!("invalid count {:?}: {}", s, e))
                })?,
            };

            let (chr1, chr2) = (fields[0], fields[2]);
            for (chr, pos) in [(chr1, pos1), (chr2, pos2)] {
                let max = self.max_pos.entry(chr.to_string()).or_insert(0);
                *max = (*max).max(pos);
            }

            if chr1 != chr2 {
                self.inter += 1;
                continue;
            }
            self.contacts
                .entry(chr1.to_string())
                .or_default()
                .push((pos1, pos2, count));
        }

        Ok(())
    }

    /// Reads external normalization vectors, lines of
    /// `norm chrom resolution bin factor`.
    ///
    /// Vectors take precedence over the coverage factors computed on the fly.
    pub fn add_vectors<R: BufRead>(&mut self, reader: R) -> Result<()> {
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line_no = idx + 1;

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != 5 {
                return Err(HicError::parse(line_no, "expected `norm chrom resolution bin factor`"));
            }
            let norm = fields[0].parse::<NormalizationType>()?;
            let resolution = fields[2]
                .parse::<u32>()
                .map_err(|e| HicError::parse(line_no, format!("invalid resolution: {}", e)))?;
            let bin = fields[3]
                .parse::<usize>()
                .map_err(|e| HicError::parse(line_no, format!("invalid bin: {}", e)))?;
            let factor = fields[4]
                .parse::<f64>()
                .map_err(|e| HicError::parse(line_no, format!("invalid factor: {}", e)))?;

            let vector = self
                .vectors
                .entry((norm, fields[1].to_string(), resolution))
                .or_default();
            if vector.len() <= bin {
                vector.resize(bin + 1, f64::NAN);
            }
            vector[bin] = factor;
        }

        Ok(())
    }

    pub fn load_vectors(&mut self, infile: &str) -> Result<()> {
        self.add_vectors(crate::reader(infile)?)
    }

    /// Number of intra-chromosomal records
    pub fn contact_count(&self) -> usize {
        self.contacts.values().map(|v| v.len()).sum()
    }

    /// Number of dropped inter-chromosomal records
    pub fn inter_count(&self) -> usize {
        self.inter
    }

    /// Chromosomes in order of first appearance, each as long as its largest
    /// position plus one.
    pub fn catalog(&self) -> ChromosomeCatalog {
        let lengths: Vec<(&str, u64)> = self
            .max_pos
            .iter()
            .map(|(name, max)| (name.as_str(), max + 1))
            .collect();
        ChromosomeCatalog::from_lengths(&lengths)
    }

    fn bin(&self, request: &MatrixRequest) -> Result<Option<ZoomData>> {
        let chr = request.chr1;
        let resolution = request.resolution.max(1);
        let contacts = match self.contacts.get(chr.name()) {
            Some(c) if !c.is_empty() => c,
            _ => return Ok(None),
        };
        let bin_count = chr.bin_count(resolution);
        if bin_count == 0 {
            return Ok(None);
        }

        let res = resolution as u64;
        let zd = ZoomData::from_contacts(
            bin_count,
            contacts
                .iter()
                .map(|(p1, p2, v)| ((p1 / res) as usize, (p2 / res) as usize, *v)),
        );

        let key = (request.norm, chr.name().to_string(), resolution);
        let factors = match self.vectors.get(&key) {
            Some(v) => Some(v.clone()),
            None => match request.norm {
                NormalizationType::None => return Ok(Some(zd)),
                NormalizationType::Kr => {
                    log::debug!("No {} vector for {} at {}", request.norm, chr.name(), resolution);
                    return Ok(None);
                }
                norm => zd.coverage_factors(norm),
            },
        };

        Ok(Some(match factors {
            Some(f) => zd.with_factors(f),
            None => zd,
        }))
    }
}

impl MatrixProvider for ContactDataset {
    fn matrix(&self, request: &MatrixRequest) -> Result<Option<Arc<dyn ContactMatrix>>> {
        if request.chr1.name() != request.chr2.name() {
            log::debug!(
                "Inter-chromosomal matrix {}-{} is not served",
                request.chr1.name(),
                request.chr2.name()
            );
            return Ok(None);
        }
        if request.unit != Unit::Bp {
            return Ok(None);
        }

        let key = (request.norm, request.chr1.name().to_string(), request.resolution);
        if request.use_cache {
            let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(zd) = cache.get(&key) {
                return Ok(Some(zd.clone()));
            }
        }

        let zd = match self.bin(request)? {
            Some(zd) => Arc::new(zd),
            None => return Ok(None),
        };

        if request.use_cache {
            let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            cache.put(key, zd.clone());
        }

        Ok(Some(zd))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::genome::Chromosome;

    fn dataset() -> ContactDataset {
        let mut ds = ContactDataset::new();
        let records = "\
chr1 0 chr1 0 4
chr1 5 chr1 15 2
chr1 25 chr1 12 1
chr2 0 chr2 0 1
chr1 3 chr2 9 5
";
        ds.add_reader(records.as_bytes()).unwrap();
        ds
    }

    #[test]
    fn test_catalog() {
        let ds = dataset();
        let catalog = ds.catalog();
        let names: Vec<&str> = catalog.chromosomes().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["All", "chr1", "chr2"]);
        assert_eq!(catalog.get("chr1").unwrap().length(), 26);
        assert_eq!(catalog.get("chr2").unwrap().length(), 10);
    }

    #[test]
    fn test_binning() {
        let ds = dataset();
        let chr1 = Chromosome::new("chr1", 1, 26);
        let request = MatrixRequest::intra(&chr1, 10, NormalizationType::None);
        let matrix = ds.matrix(&request).unwrap().unwrap();
        assert_eq!(matrix.bin_count(), 3);

        let block = matrix.block(0, 3).unwrap();
        assert_eq!(block[(0, 0)], 4.0);
        assert_eq!(block[(0, 1)], 2.0);
        assert_eq!(block[(1, 2)], 1.0);
        assert_eq!(block[(2, 1)], 1.0);
    }

    #[test]
    fn test_unavailable() {
        let ds = dataset();
        let chr1 = Chromosome::new("chr1", 1, 26);
        let chr2 = Chromosome::new("chr2", 2, 10);
        let chr3 = Chromosome::new("chr3", 3, 10);

        let request = MatrixRequest::intra(&chr3, 10, NormalizationType::None);
        assert!(ds.matrix(&request).unwrap().is_none());

        let request = MatrixRequest::intra(&chr1, 10, NormalizationType::Kr);
        assert!(ds.matrix(&request).unwrap().is_none());

        let mut request = MatrixRequest::intra(&chr1, 10, NormalizationType::None);
        request.chr2 = &chr2;
        assert!(ds.matrix(&request).unwrap().is_none());
    }

    #[test]
    fn test_external_vectors() {
        let mut ds = dataset();
        ds.add_vectors("KR chr1 10 0 2.0\nKR chr1 10 1 1.0\nKR chr1 10 2 0.5\n".as_bytes())
            .unwrap();

        let chr1 = Chromosome::new("chr1", 1, 26);
        let request = MatrixRequest::intra(&chr1, 10, NormalizationType::Kr);
        let block = ds.matrix(&request).unwrap().unwrap().block(0, 3).unwrap();
        assert_eq!(block[(0, 0)], 1.0);
        assert_eq!(block[(0, 1)], 1.0);
        assert_eq!(block[(1, 2)], 2.0);
    }

    #[test]
    fn test_cache() {
        let ds = dataset();
        let chr1 = Chromosome::new("chr1", 1, 26);
        let mut request = MatrixRequest::intra(&chr1, 10, NormalizationType::Vc);
        request.use_cache = true;

        let m1 = ds.matrix(&request).unwrap().unwrap();
        let m2 = ds.matrix(&request).unwrap().unwrap();
        assert!(Arc::ptr_eq(&m1, &m2));

        request.use_cache = false;
        let m3 = ds.matrix(&request).unwrap().unwrap();
        assert!(!Arc::ptr_eq(&m1, &m3));
    }

    #[test]
    fn test_bad_record() {
        let mut ds = ContactDataset::new();
        let res = ds.add_reader("chr1 0 chr1 0\nchr1 x chr1 0\n".as_bytes());
        assert!(matches!(res, Err(HicError::Parse { line: 2, .. })));
    }
}

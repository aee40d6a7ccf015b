use crate::libs::error::{HicError, Result};
use indexmap::IndexMap;
use std::io::BufRead;

/// Name of the whole-genome pseudo-chromosome
pub const CHR_ALL: &str = "All";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chromosome {
    name: String,
    index: usize,
    length: u64,
}

impl Chromosome {
    pub fn new(name: &str, index: usize, length: u64) -> Self {
        Self {
            name: name.to_string(),
            index,
            length,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn index(&self) -> usize {
        self.index
    }
    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn is_whole_genome(&self) -> bool {
        self.name.eq_ignore_ascii_case(CHR_ALL)
    }

    /// Number of bins of size `resolution` covering the chromosome
    ///
    /// ```
    /// # use hicdom::libs::genome::Chromosome;
    /// let chr = Chromosome::new("chr1", 1, 5_000_001);
    /// assert_eq!(chr.bin_count(10_000), 501);
    /// assert_eq!(Chromosome::new("chrM", 2, 0).bin_count(10_000), 0);
    /// ```
    pub fn bin_count(&self, resolution: u32) -> usize {
        let resolution = resolution.max(1) as u64;
        self.length.div_ceil(resolution) as usize
    }
}

/// Ordered chromosomes of an assembly.
///
/// Index 0 is always the [`CHR_ALL`] pseudo-chromosome, real chromosomes are
/// numbered from 1 in input order.
#[derive(Debug, Clone)]
pub struct ChromosomeCatalog {
    chromosomes: Vec<Chromosome>,
}

impl ChromosomeCatalog {
    /// ```
    /// # use hicdom::libs::genome::ChromosomeCatalog;
    /// let catalog = ChromosomeCatalog::from_lengths(&[("chr1", 2000), ("chr2", 1000)]);
    /// assert_eq!(catalog.chromosomes().len(), 3);
    /// assert!(catalog.chromosomes()[0].is_whole_genome());
    /// assert_eq!(catalog.get("chr2").unwrap().index(), 2);
    /// ```
    pub fn from_lengths(lengths: &[(&str, u64)]) -> Self {
        let genome: u64 = lengths.iter().map(|(_, len)| *len).sum();
        let mut chromosomes = vec![Chromosome::new(CHR_ALL, 0, genome / 1000)];
        for (name, len) in lengths {
            let index = chromosomes.len();
            chromosomes.push(Chromosome::new(name, index, *len));
        }
        Self { chromosomes }
    }

    /// Reads a `chrom.sizes` table: `name<TAB>length` per line.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut length_of: IndexMap<String, u64> = IndexMap::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 2 {
                return Err(HicError::parse(idx + 1, "expected `name length`"));
            }
            let length = fields[1].parse::<u64>().map_err(|e| {
                HicError::parse(idx + 1, format!("invalid length {:?}: {}", fields[1], e))
            })?;
            length_of.insert(fields[0].to_string(), length);
        }

        let lengths: Vec<(&str, u64)> = length_of.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        Ok(Self::from_lengths(&lengths))
    }

    pub fn load(infile: &str) -> Result<Self> {
        Self::from_reader(crate::reader(infile)?)
    }

    pub fn chromosomes(&self) -> &[Chromosome] {
        &self.chromosomes
    }

    pub fn get(&self, name: &str) -> Option<&Chromosome> {
        self.chromosomes.iter().find(|c| c.name == name)
    }

    /// Resolves user-supplied names against the catalog.
    ///
    /// Matching tries the exact name first, then ignores case and an optional
    /// `chr` prefix; `M` and `MT` are synonyms. The result follows catalog order
    /// and has no duplicates.
    ///
    /// ```
    /// # use hicdom::libs::genome::ChromosomeCatalog;
    /// let catalog = ChromosomeCatalog::from_lengths(&[("chr1", 10), ("chrX", 10), ("chrM", 10)]);
    /// let names = vec!["X".to_string(), "chr1".to_string(), "MT".to_string(), "1".to_string()];
    /// let resolved = catalog.resolve(&names).unwrap();
    /// let got: Vec<&str> = resolved.iter().map(|c| c.name()).collect();
    /// assert_eq!(got, vec!["chr1", "chrX", "chrM"]);
    ///
    /// assert!(catalog.resolve(&["chr22".to_string()]).is_err());
    /// ```
    pub fn resolve(&self, names: &[String]) -> Result<Vec<Chromosome>> {
        let mut picked = vec![false; self.chromosomes.len()];

        for name in names {
            let found = self
                .chromosomes
                .iter()
                .position(|c| c.name == *name)
                .or_else(|| {
                    let wanted = canonical(name);
                    self.chromosomes.iter().position(|c| canonical(&c.name) == wanted)
                });
            match found {
                Some(idx) => picked[idx] = true,
                None => return Err(HicError::UnknownChromosome(name.clone())),
            }
        }

        Ok(self
            .chromosomes
            .iter()
            .zip(picked)
            .filter(|(_, p)| *p)
            .map(|(c, _)| c.clone())
            .collect())
    }
}

fn canonical(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    let bare = lower.strip_prefix("chr").unwrap_or(&lower);
    match bare {
        "mt" => "m".to_string(),
        _ => bare.to_string(),
    }
}

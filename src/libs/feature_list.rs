use crate::libs::error::{HicError, Result};
use crate::libs::feature::{ChromPair, Feature2D};
use indexmap::IndexMap;
use std::io::{BufRead, Write};

/// Features grouped by chromosome pair.
///
/// Buckets and the features inside them keep insertion order, so the export of
/// identical input is byte-identical.
#[derive(Debug, Clone, Default)]
pub struct FeatureList {
    columns: Vec<String>,
    buckets: IndexMap<ChromPair, Vec<Feature2D>>,
}

impl FeatureList {
    /// An empty list whose export writes `columns` after the six coordinate columns.
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            buckets: IndexMap::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn add(&mut self, feature: Feature2D) {
        self.buckets.entry(feature.key()).or_default().push(feature);
    }

    pub fn add_all(&mut self, key: ChromPair, features: Vec<Feature2D>) {
        self.buckets.entry(key).or_default().extend(features);
    }

    /// Appends every bucket of `other`, keeping its order.
    pub fn merge(&mut self, other: FeatureList) {
        for (key, features) in other.buckets {
            self.add_all(key, features);
        }
    }

    pub fn get(&self, key: &ChromPair) -> Option<&[Feature2D]> {
        self.buckets.get(key).map(|v| v.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &ChromPair> {
        self.buckets.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature2D> {
        self.buckets.values().flatten()
    }

    /// Number of features over all buckets
    pub fn len(&self) -> usize {
        self.buckets.values().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reorders the buckets by a caller-supplied rank. Features inside a bucket
    /// are untouched.
    pub fn sort_buckets_by_key<K, F>(&mut self, mut rank: F)
    where
        K: Ord,
        F: FnMut(&ChromPair) -> K,
    {
        self.buckets.sort_by(|k1, _, k2, _| rank(k1).cmp(&rank(k2)));
    }

    /// Writes all features, one per line.
    ///
    /// ```
    /// # use hicdom::libs::feature::Feature2D;
    /// # use hicdom::libs::feature_list::FeatureList;
    /// # use std::collections::HashMap;
    /// let mut list = FeatureList::new(&["score"]);
    /// let mut attrs = HashMap::new();
    /// attrs.insert("score".to_string(), "0.9".to_string());
    /// list.add(Feature2D::new("domain", "chr1", 0, 50, "chr1", 0, 50, None, attrs).unwrap());
    ///
    /// let mut out = vec![];
    /// list.export_to(&mut out, true).unwrap();
    /// assert_eq!(
    ///     String::from_utf8(out).unwrap(),
    ///     "chr1\tx1\tx2\tchr2\ty1\ty2\tscore\nchr1\t0\t50\tchr1\t0\t50\t0.9\n"
    /// );
    /// ```
    pub fn export_to<W: Write>(&self, writer: &mut W, with_header: bool) -> Result<()> {
        if with_header {
            let mut header = vec!["chr1", "x1", "x2", "chr2", "y1", "y2"];
            header.extend(self.columns.iter().map(|c| c.as_str()));
            writeln!(writer, "{}", header.join("\t"))?;
        }
        for feature in self.iter() {
            writeln!(writer, "{}", feature.to_line(&self.columns))?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Rewrites `outfile` with the whole list.
    pub fn export(&self, outfile: &str, with_header: bool) -> Result<()> {
        let mut writer = crate::writer(outfile)?;
        self.export_to(&mut writer, with_header)
    }

    /// Reads back an exported table.
    ///
    /// With a header the attribute columns take their names from it, otherwise
    /// they are named `f1`, `f2`, ...
    pub fn from_reader<R: BufRead>(reader: R, has_header: bool) -> Result<Self> {
        let mut list = FeatureList::default();
        let mut columns: Option<Vec<String>> = None;

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = idx + 1;
            if line.trim().is_empty() {
                continue;
            }

            if columns.is_none() {
                let fields: Vec<&str> = line.split('\t').collect();
                if fields.len() < 6 {
                    return Err(HicError::parse(
                        line_no,
                        format!("expected at least 6 fields, found {}", fields.len()),
                    ));
                }
                let names: Vec<String> = if has_header {
                    fields[6..].iter().map(|s| s.to_string()).collect()
                } else {
                    (1..=fields.len() - 6).map(|i| format!("f{}", i)).collect()
                };
                list.columns = names.clone();
                columns = Some(names);
                if has_header {
                    continue;
                }
            }

            let cols = columns.as_deref().unwrap_or_default();
            list.add(Feature2D::parse_line("feature", &line, cols, line_no)?);
        }

        Ok(list)
    }

    /// Reads an exported file.
    pub fn load(infile: &str, has_header: bool) -> Result<Self> {
        Self::from_reader(crate::reader(infile)?, has_header)
    }
}

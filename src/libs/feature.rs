use crate::libs::error::{HicError, Result};
use std::collections::HashMap;

//----------------------------
// Rgb
//----------------------------
/// Display hint carried by a feature. Never affects calling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{},{},{}", self.0, self.1, self.2)
    }
}

//----------------------------
// ChromPair
//----------------------------
/// Unordered chromosome-pair key, the smaller name always comes first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChromPair(String, String);

impl ChromPair {
    /// ```
    /// # use hicdom::libs::feature::ChromPair;
    /// let k1 = ChromPair::new("chr2", "chr1");
    /// let k2 = ChromPair::new("chr1", "chr2");
    /// assert_eq!(k1, k2);
    /// assert_eq!(k1.first(), "chr1");
    /// assert_eq!(k1.to_string(), "chr1_chr2");
    /// ```
    pub fn new(chr1: &str, chr2: &str) -> Self {
        if chr1 <= chr2 {
            Self(chr1.to_string(), chr2.to_string())
        } else {
            Self(chr2.to_string(), chr1.to_string())
        }
    }

    pub fn first(&self) -> &str {
        &self.0
    }

    pub fn second(&self) -> &str {
        &self.1
    }
}

impl std::fmt::Display for ChromPair {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}_{}", self.0, self.1)
    }
}

//----------------------------
// Feature2D
//----------------------------
/// A pair of genomic intervals, 0-based and half-open.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature2D {
    name: String,
    chr1: String,
    start1: u64,
    end1: u64,
    chr2: String,
    start2: u64,
    end2: u64,
    color: Rgb,
    attributes: HashMap<String, String>,
}

impl Feature2D {
    /// ```
    /// # use hicdom::libs::feature::Feature2D;
    /// # use std::collections::HashMap;
    /// let mut attrs = HashMap::new();
    /// attrs.insert("score".to_string(), "1.5".to_string());
    /// let f = Feature2D::new("domain", "chr1", 0, 990000, "chr1", 0, 990000, None, attrs).unwrap();
    /// assert_eq!(f.chr1(), "chr1");
    /// assert_eq!(f.end2(), 990000);
    /// assert_eq!(f.attribute("score"), Some("1.5"));
    ///
    /// assert!(Feature2D::new("bad", "chr1", 10, 5, "chr1", 0, 1, None, HashMap::new()).is_err());
    /// ```
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str,
        chr1: &str,
        start1: u64,
        end1: u64,
        chr2: &str,
        start2: u64,
        end2: u64,
        color: Option<Rgb>,
        attributes: HashMap<String, String>,
    ) -> Result<Self> {
        if start1 > end1 || start2 > end2 {
            return Err(HicError::InvalidFeature(format!(
                "{}:{}-{} x {}:{}-{}",
                chr1, start1, end1, chr2, start2, end2
            )));
        }

        Ok(Self {
            name: name.to_string(),
            chr1: chr1.to_string(),
            start1,
            end1,
            chr2: chr2.to_string(),
            start2,
            end2,
            color: color.unwrap_or(Rgb::BLACK),
            attributes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn chr1(&self) -> &str {
        &self.chr1
    }
    pub fn start1(&self) -> u64 {
        self.start1
    }
    pub fn end1(&self) -> u64 {
        self.end1
    }
    pub fn chr2(&self) -> &str {
        &self.chr2
    }
    pub fn start2(&self) -> u64 {
        self.start2
    }
    pub fn end2(&self) -> u64 {
        self.end2
    }
    pub fn color(&self) -> Rgb {
        self.color
    }
    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(|s| s.as_str())
    }

    pub fn key(&self) -> ChromPair {
        ChromPair::new(&self.chr1, &self.chr2)
    }

    /// One tab-separated line with the attributes in the order of `columns`.
    /// Absent attributes are written as `NA`.
    ///
    /// ```
    /// # use hicdom::libs::feature::Feature2D;
    /// # use std::collections::HashMap;
    /// let mut attrs = HashMap::new();
    /// attrs.insert("score".to_string(), "1.5".to_string());
    /// let f = Feature2D::new("domain", "chr1", 0, 100, "chr1", 0, 100, None, attrs).unwrap();
    /// let cols = vec!["score".to_string(), "control".to_string()];
    /// assert_eq!(f.to_line(&cols), "chr1\t0\t100\tchr1\t0\t100\t1.5\tNA");
    /// ```
    pub fn to_line(&self, columns: &[String]) -> String {
        let mut fields = vec![
            self.chr1.clone(),
            self.start1.to_string(),
            self.end1.to_string(),
            self.chr2.clone(),
            self.start2.to_string(),
            self.end2.to_string(),
        ];
        for col in columns {
            fields.push(self.attribute(col).unwrap_or("NA").to_string());
        }
        fields.join("\t")
    }

    /// Parses a line written by [`Feature2D::to_line`].
    ///
    /// `NA` attribute values are treated as absent.
    pub fn parse_line(name: &str, line: &str, columns: &[String], line_no: usize) -> Result<Self> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 6 + columns.len() {
            return Err(HicError::parse(
                line_no,
                format!("expected {} fields, found {}", 6 + columns.len(), fields.len()),
            ));
        }

        let coord = |idx: usize| -> Result<u64> {
            fields[idx].parse::<u64>().map_err(|e| {
                HicError::parse(line_no, format!("invalid coordinate {:?}: {}", fields[idx], e))
            })
        };

        let attributes: HashMap<String, String> = columns
            .iter()
            .zip(fields.iter().skip(6))
            .filter(|(_, v)| **v != "NA")
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect();

        Feature2D::new(
            name,
            fields[0],
            coord(1)?,
            coord(2)?,
            fields[3],
            coord(4)?,
            coord(5)?,
            None,
            attributes,
        )
    }
}

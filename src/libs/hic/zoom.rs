use crate::libs::error::{try_zeroed, Result};
use crate::libs::hic::{ContactMatrix, NormalizationType};
use nalgebra::DMatrix;

/// A binned intra-chromosomal matrix at one resolution.
///
/// Only the upper triangle is stored, row by row with increasing columns.
#[derive(Debug, Clone)]
pub struct ZoomData {
    bin_count: usize,
    rows: Vec<Vec<(u32, f64)>>,
    factors: Option<Vec<f64>>,
}

impl ZoomData {
    /// Builds the matrix from `(bin1, bin2, value)` triples.
    ///
    /// Pairs are folded onto the upper triangle, repeated pairs are summed and
    /// bins outside `[0, bin_count)` are dropped.
    ///
    /// ```
    /// # use hicdom::libs::hic::{ContactMatrix, ZoomData};
    /// let zd = ZoomData::from_contacts(3, vec![(0, 1, 2.0), (1, 0, 1.0), (2, 2, 5.0), (7, 1, 9.0)]);
    /// let block = zd.block(0, 3).unwrap();
    /// assert_eq!(block[(0, 1)], 3.0);
    /// assert_eq!(block[(1, 0)], 3.0);
    /// assert_eq!(block[(2, 2)], 5.0);
    /// assert_eq!(block[(0, 2)], 0.0);
    /// ```
    pub fn from_contacts<I>(bin_count: usize, contacts: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        let mut triples: Vec<(usize, usize, f64)> = contacts
            .into_iter()
            .filter(|(b1, b2, _)| *b1 < bin_count && *b2 < bin_count)
            .map(|(b1, b2, v)| if b1 <= b2 { (b1, b2, v) } else { (b2, b1, v) })
            .collect();
        triples.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut rows: Vec<Vec<(u32, f64)>> = vec![vec![]; bin_count];
        for (r, c, v) in triples {
            let row = &mut rows[r];
            match row.last_mut() {
                Some((col, acc)) if *col as usize == c => *acc += v,
                _ => row.push((c as u32, v)),
            }
        }

        Self {
            bin_count,
            rows,
            factors: None,
        }
    }

    /// Row sums of the full symmetric matrix
    pub fn coverage(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.bin_count];
        for (r, row) in self.rows.iter().enumerate() {
            for &(c, v) in row {
                sums[r] += v;
                if c as usize != r {
                    sums[c as usize] += v;
                }
            }
        }
        sums
    }

    /// Coverage-based factors, scaled so that the mean over covered bins is 1.
    ///
    /// Returns `None` for [`NormalizationType::None`] and [`NormalizationType::Kr`].
    pub fn coverage_factors(&self, norm: NormalizationType) -> Option<Vec<f64>> {
        let sqrt = match norm {
            NormalizationType::Vc => false,
            NormalizationType::VcSqrt => true,
            _ => return None,
        };

        let sums = self.coverage();
        let covered: Vec<f64> = sums.iter().copied().filter(|s| *s > 0.0).collect();
        let mean = if covered.is_empty() {
            1.0
        } else {
            covered.iter().sum::<f64>() / covered.len() as f64
        };

        Some(
            sums.iter()
                .map(|s| if sqrt { (s / mean).sqrt() } else { s / mean })
                .collect(),
        )
    }

    /// Attaches normalization factors; a value is divided by `f[i] * f[j]`.
    /// Bins past the end of `factors` get no factor.
    pub fn with_factors(mut self, mut factors: Vec<f64>) -> Self {
        factors.resize(self.bin_count, f64::NAN);
        self.factors = Some(factors);
        self
    }

    fn factor_ok(&self, bin: usize) -> bool {
        match &self.factors {
            None => true,
            Some(f) => f.get(bin).is_some_and(|v| v.is_finite() && *v > 0.0),
        }
    }
}

impl ContactMatrix for ZoomData {
    fn bin_count(&self) -> usize {
        self.bin_count
    }

    fn block(&self, start: usize, end: usize) -> Result<DMatrix<f64>> {
        let end = end.min(self.bin_count);
        let start = start.min(end);
        let m = end - start;

        let data: Vec<f64> = try_zeroed("contact block", m, m)?;
        let mut block = DMatrix::from_vec(m, m, data);

        for r in start..end {
            for &(c, v) in &self.rows[r] {
                let c = c as usize;
                if c >= end {
                    break;
                }
                let v = match &self.factors {
                    None => v,
                    Some(f) => v / (f[r] * f[c]),
                };
                block[(r - start, c - start)] = v;
                block[(c - start, r - start)] = v;
            }
        }

        if self.factors.is_some() {
            for k in 0..m {
                if !self.factor_ok(start + k) {
                    block.row_mut(k).fill(f64::NAN);
                    block.column_mut(k).fill(f64::NAN);
                }
            }
        }

        Ok(block)
    }
}

use crate::libs::domain::{BlockSource, DomainConfig};
use crate::libs::error::{try_zeroed, Result};
use nalgebra::DMatrix;
use std::ops::{Add, AddAssign, Range, Sub, SubAssign};

//----------------------------
// Moments
//----------------------------
/// Running statistics of the arrowhead values in one region.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Moments {
    /// Number of known cells
    pub n: f64,
    pub sum: f64,
    pub sum_sq: f64,
    /// `#positive - #negative`
    pub sign: f64,
}

impl Moments {
    pub fn of(v: f64) -> Self {
        let sign = if v > 0.0 {
            1.0
        } else if v < 0.0 {
            -1.0
        } else {
            0.0
        };
        Self {
            n: 1.0,
            sum: v,
            sum_sq: v * v,
            sign,
        }
    }

    /// Population variance, 0 for an empty region
    ///
    /// ```
    /// # use hicdom::libs::domain::Moments;
    /// let m = Moments::of(1.0) + Moments::of(-1.0);
    /// assert_eq!(m.variance(), 1.0);
    /// assert_eq!(Moments::default().variance(), 0.0);
    /// ```
    pub fn variance(&self) -> f64 {
        if self.n < 1.0 {
            return 0.0;
        }
        let mean = self.sum / self.n;
        (self.sum_sq / self.n - mean * mean).max(0.0)
    }

    /// Sign sum over the cell count, `NaN` for an empty region
    pub fn sign_fraction(&self) -> f64 {
        if self.n < 1.0 {
            f64::NAN
        } else {
            self.sign / self.n
        }
    }
}

impl Add for Moments {
    type Output = Moments;

    fn add(self, rhs: Moments) -> Moments {
        Moments {
            n: self.n + rhs.n,
            sum: self.sum + rhs.sum,
            sum_sq: self.sum_sq + rhs.sum_sq,
            sign: self.sign + rhs.sign,
        }
    }
}

impl Sub for Moments {
    type Output = Moments;

    fn sub(self, rhs: Moments) -> Moments {
        Moments {
            n: self.n - rhs.n,
            sum: self.sum - rhs.sum,
            sum_sq: self.sum_sq - rhs.sum_sq,
            sign: self.sign - rhs.sign,
        }
    }
}

impl AddAssign for Moments {
    fn add_assign(&mut self, rhs: Moments) {
        *self = *self + rhs;
    }
}

impl SubAssign for Moments {
    fn sub_assign(&mut self, rhs: Moments) {
        *self = *self - rhs;
    }
}

//----------------------------
// Scorers
//----------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CornerScore {
    /// Gates candidacy
    pub sign: f64,
    /// Ranks candidates and is reported
    pub score: f64,
}

/// Turns the moments of the upper triangle `U` and the lower triangle `L` of
/// a corner into a score.
pub trait CornerScorer: Sync {
    fn score(&self, upper: &Moments, lower: &Moments) -> CornerScore;
}

/// `U` should be negative and `L` positive.
///
/// The sign part is the agreement of the weaker triangle, the smaller of
/// `-U.sign / U.n` and `L.sign / L.n`. A triangle without known cells only
/// occurs on a chromosome edge; the corner then gets half the agreement of
/// the other triangle.
///
/// `score = (L.sign - U.sign) / n + (L.sum - U.sum) / n`, with `n` the known
/// cells of both triangles.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignSumScorer;

impl CornerScorer for SignSumScorer {
    fn score(&self, upper: &Moments, lower: &Moments) -> CornerScore {
        let n = upper.n + lower.n;
        if n < 1.0 {
            return CornerScore::default();
        }

        let up = -upper.sign_fraction();
        let down = lower.sign_fraction();
        let sign = match (up.is_nan(), down.is_nan()) {
            (false, false) => up.min(down),
            (true, _) => down / 2.0,
            (_, true) => up / 2.0,
        };

        CornerScore {
            sign,
            score: (lower.sign - upper.sign) / n + (lower.sum - upper.sum) / n,
        }
    }
}

//----------------------------
// ScoreSurface
//----------------------------
/// How a window sits on its chromosome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// The window starts at bin 0
    pub at_start: bool,
    /// The window ends at the last bin
    pub at_end: bool,
}

impl Frame {
    pub fn of(window: &Range<usize>, bin_count: usize) -> Self {
        Self {
            at_start: window.start == 0,
            at_end: window.end >= bin_count,
        }
    }
}

/// Scores of every corner `(a, b)`, `a < b`, of one `m x m` block.
///
/// The arrowhead value of a local cell `(i, j)` compares `i`'s contacts
/// upstream, with `u = 2i - j`, and downstream:
/// `A(i, j) = (M[i][u] - M[i][j]) / (M[i][u] + M[i][j])`. For a domain
/// `[a, b]` the triangle `U` inside the domain is negative and the triangle
/// `L` leaving it is positive.
pub struct ScoreSurface {
    m: usize,
    frame: Frame,
    sign: Vec<f64>,
    score: Vec<f64>,
    /// `row[i * m + j]`: moments of row `i` up to column `j`
    row: Vec<Moments>,
    /// `slant[u * m + i]`: moments of the cells `(i', 2i' - u)` with `i' <= i`
    slant: Vec<Moments>,
}

fn eligible(a: usize, b: usize, config: &DomainConfig, upper: &Moments, lower: &Moments) -> bool {
    if b - a < config.min_domain_bins {
        return false;
    }
    match config.max_variance {
        Some(max) => upper.variance() + lower.variance() <= max,
        None => true,
    }
}

fn arrowhead(block: &DMatrix<f64>, i: usize, j: usize) -> Option<f64> {
    if 2 * i < j {
        return None;
    }
    let up = block[(i, 2 * i - j)];
    let down = block[(i, j)];
    if up.is_nan() || down.is_nan() {
        return None;
    }

    let total = up + down;
    if total == 0.0 {
        Some(0.0)
    } else {
        Some((up - down) / total)
    }
}

impl ScoreSurface {
    /// Scores all corners of `block`.
    ///
    /// Corners are ineligible, with `NaN` sign, when narrower than
    /// `min_domain_bins` or too variable. How much of a corner the window
    /// sees is answered separately by [`ScoreSurface::covered`].
    pub fn compute(
        block: &DMatrix<f64>,
        frame: Frame,
        scorer: &dyn CornerScorer,
        config: &DomainConfig,
    ) -> Result<Self> {
        let m = block.nrows();

        let mut row: Vec<Moments> = try_zeroed("row prefix", m, m)?;
        for i in 0..m {
            let mut acc = Moments::default();
            for j in 0..m {
                if j > i {
                    if let Some(v) = arrowhead(block, i, j) {
                        acc += Moments::of(v);
                    }
                }
                row[i * m + j] = acc;
            }
        }

        let mut slant: Vec<Moments> = try_zeroed("slant prefix", m, m)?;
        for u in 0..m {
            let mut acc = Moments::default();
            for i in 0..m {
                if i > u && 2 * i - u < m {
                    if let Some(v) = arrowhead(block, i, 2 * i - u) {
                        acc += Moments::of(v);
                    }
                }
                slant[u * m + i] = acc;
            }
        }

        let mut surface = Self {
            m,
            frame,
            sign: try_zeroed("sign surface", m, m)?,
            score: try_zeroed("score surface", m, m)?,
            row,
            slant,
        };
        surface.sign.fill(f64::NAN);

        for b in 0..m {
            let mut upper = Moments::default();
            let mut lower = Moments::default();
            for a in (0..b).rev() {
                surface.step(a, b, &mut upper, &mut lower);

                let cs = scorer.score(&upper, &lower);
                let idx = a * m + b;
                surface.score[idx] = cs.score;
                if eligible(a, b, config, &upper, &lower) {
                    surface.sign[idx] = cs.sign;
                }
            }
        }

        Ok(surface)
    }

    /// Moves `(upper, lower)` from corner `(a + 1, b)` to `(a, b)`.
    fn step(&self, a: usize, b: usize, upper: &mut Moments, lower: &mut Moments) {
        let mid = (a + b) / 2;
        *upper += self.row_segment(a, a + 1, b);
        *upper -= self.slant_segment(a, a + 1, mid);
        *lower += self.slant_segment(a, mid + 1, b);
    }

    fn row_segment(&self, i: usize, lo: usize, hi: usize) -> Moments {
        if lo > hi {
            return Moments::default();
        }
        let before = if lo > 0 {
            self.row[i * self.m + lo - 1]
        } else {
            Moments::default()
        };
        self.row[i * self.m + hi] - before
    }

    fn slant_segment(&self, u: usize, lo: usize, hi: usize) -> Moments {
        if lo > hi {
            return Moments::default();
        }
        let before = if lo > 0 {
            self.slant[u * self.m + lo - 1]
        } else {
            Moments::default()
        };
        self.slant[u * self.m + hi] - before
    }

    /// Side of the block
    pub fn size(&self) -> usize {
        self.m
    }

    /// Whether the window sees enough of both triangles of `(a, b)`.
    ///
    /// `U` reaches back to `2a - b` and `L` forward to `2b - a`. Unless the
    /// window edge is a chromosome edge, at most about a quarter of either
    /// triangle may fall outside the block: `b <= 3a` and
    /// `3b - a <= 2(m - 1)`.
    pub fn covered(&self, a: usize, b: usize) -> bool {
        (self.frame.at_start || b <= 3 * a) && (self.frame.at_end || 3 * b <= 2 * (self.m - 1) + a)
    }

    /// Sign component at `(a, b)`, `NaN` for an ineligible corner
    pub fn sign(&self, a: usize, b: usize) -> f64 {
        self.sign[a * self.m + b]
    }

    /// Score at `(a, b)`, eligible or not
    pub fn score(&self, a: usize, b: usize) -> f64 {
        self.score[a * self.m + b]
    }

    /// Moments of the upper and lower triangles of corner `(a, b)`
    pub fn regions(&self, a: usize, b: usize) -> (Moments, Moments) {
        let mut upper = Moments::default();
        let mut lower = Moments::default();
        for a2 in (a..b).rev() {
            self.step(a2, b, &mut upper, &mut lower);
        }
        (upper, lower)
    }
}

/// Fetches the window's block from `source` and scores it.
pub fn scan_window(
    source: &dyn BlockSource,
    window: Range<usize>,
    frame: Frame,
    scorer: &dyn CornerScorer,
    config: &DomainConfig,
) -> Result<ScoreSurface> {
    let block = source.block(window.start, window.end)?;
    ScoreSurface::compute(&block, frame, scorer, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const WHOLE: Frame = Frame {
        at_start: true,
        at_end: true,
    };

    fn blocks(n: usize, domains: &[(usize, usize)], bg: f64) -> DMatrix<f64> {
        let mut m = DMatrix::from_element(n, n, bg);
        for &(s, e) in domains {
            for i in s..e {
                for j in s..e {
                    m[(i, j)] = 10.0;
                }
            }
        }
        m
    }

    // direct definition of the two triangles
    fn brute_regions(block: &DMatrix<f64>, a: usize, b: usize) -> (Moments, Moments) {
        let m = block.nrows();
        let mut upper = Moments::default();
        let mut lower = Moments::default();
        for i in 0..m {
            for j in i + 1..m {
                let Some(v) = arrowhead(block, i, j) else {
                    continue;
                };
                let u = 2 * i - j;
                if a <= i && j <= b && u < a {
                    upper += Moments::of(v);
                }
                if i <= b && b < j && u >= a {
                    lower += Moments::of(v);
                }
            }
        }
        (upper, lower)
    }

    #[test]
    fn test_arrowhead() {
        let mut block = DMatrix::from_element(5, 5, 1.0);
        block[(2, 0)] = 3.0;
        block[(2, 3)] = f64::NAN;

        // upstream partner before the block
        assert_eq!(arrowhead(&block, 0, 1), None);
        assert_eq!(arrowhead(&block, 2, 3), None);
        assert_relative_eq!(arrowhead(&block, 2, 4).unwrap(), 0.5);
        assert_eq!(arrowhead(&block, 3, 4), Some(0.0));
        assert_eq!(arrowhead(&DMatrix::zeros(3, 3), 1, 2), Some(0.0));
    }

    #[test]
    fn test_recurrence_matches_definition() {
        let mut block = blocks(40, &[(3, 12), (12, 30)], 0.5);
        for i in 0..40 {
            for j in 0..40 {
                block[(i, j)] += ((i * 7 + j * 3) % 5) as f64 * 0.1;
            }
        }
        block[(20, 25)] = f64::NAN;

        let config = DomainConfig::default();
        let surface = ScoreSurface::compute(&block, WHOLE, &SignSumScorer, &config).unwrap();
        for (a, b) in [(0, 5), (3, 11), (3, 12), (12, 29), (10, 39), (0, 39), (20, 24)] {
            let (upper, lower) = surface.regions(a, b);
            let (bu, bl) = brute_regions(&block, a, b);
            assert_eq!(upper.n, bu.n, "({}, {})", a, b);
            assert_eq!(lower.n, bl.n, "({}, {})", a, b);
            assert_eq!(upper.sign, bu.sign);
            assert_eq!(lower.sign, bl.sign);
            assert_relative_eq!(upper.sum, bu.sum, epsilon = 1e-9);
            assert_relative_eq!(lower.sum_sq, bl.sum_sq, epsilon = 1e-9);

            let cs = SignSumScorer.score(&bu, &bl);
            assert_relative_eq!(surface.score(a, b), cs.score, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_domain_corner() {
        let block = blocks(60, &[(10, 30)], 0.01);
        let config = DomainConfig::default();
        let surface = ScoreSurface::compute(&block, WHOLE, &SignSumScorer, &config).unwrap();

        assert_relative_eq!(surface.sign(10, 29), 1.0);
        assert!(surface.score(10, 29) > 1.9);
        assert!(surface.sign(10, 29) > surface.sign(20, 40));
    }

    #[test]
    fn test_constant_block_scores_zero() {
        let config = DomainConfig::default();
        for value in [0.0, 3.0] {
            let block = DMatrix::from_element(30, 30, value);
            let surface = ScoreSurface::compute(&block, WHOLE, &SignSumScorer, &config).unwrap();
            for a in 0..30 {
                for b in a + 1..30 {
                    assert_eq!(surface.score(a, b), 0.0);
                }
            }
        }
    }

    #[test]
    fn test_weaker_triangle_gates() {
        let block = blocks(60, &[(10, 30)], 0.01);
        let config = DomainConfig::default();
        let surface = ScoreSurface::compute(&block, WHOLE, &SignSumScorer, &config).unwrap();

        // U of (20, 29) lies inside the domain, L of (10, 22) too
        assert_eq!(surface.sign(20, 29), 0.0);
        assert!(surface.sign(10, 22) < 0.4);
        assert!(surface.score(20, 29) > 0.9);
        assert!(surface.sign(15, 29) < surface.sign(10, 29));

        // one-sided corners on the chromosome edges
        let edges = blocks(60, &[(0, 20), (40, 60)], 0.01);
        let surface = ScoreSurface::compute(&edges, WHOLE, &SignSumScorer, &config).unwrap();
        assert_relative_eq!(surface.sign(0, 19), 0.5);
        assert_relative_eq!(surface.sign(40, 59), 0.5);
        assert!(surface.score(0, 19) > 1.9);
    }

    #[test]
    fn test_coverage() {
        let block = blocks(60, &[(20, 35)], 0.01);
        let config = DomainConfig::default();
        let inner = Frame {
            at_start: false,
            at_end: false,
        };
        let surface = ScoreSurface::compute(&block, inner, &SignSumScorer, &config).unwrap();

        assert!(surface.covered(20, 34));
        assert_relative_eq!(surface.sign(20, 34), 1.0);
        // too narrow
        assert!(surface.sign(20, 22).is_nan());
        // U runs too far past the window start
        assert!(!surface.covered(5, 20));
        assert!(surface.covered(7, 21));
        // L runs too far past the window end
        assert!(!surface.covered(20, 58));
        assert!(surface.covered(20, 45));
        // coverage does not touch the surface itself
        assert!(!surface.sign(5, 20).is_nan());

        let whole = ScoreSurface::compute(&block, WHOLE, &SignSumScorer, &config).unwrap();
        assert!(whole.covered(5, 20));
        assert!(whole.covered(20, 58));
        assert!(whole.covered(0, 59));
    }

    #[test]
    fn test_variance_ceiling() {
        let mut block = blocks(60, &[(10, 30)], 0.01);
        for i in 0..60 {
            for j in 0..60 {
                block[(i, j)] += ((i * 7 + j * 3) % 5) as f64 * 0.1;
            }
        }
        let config = DomainConfig {
            max_variance: Some(1e-6),
            ..DomainConfig::default()
        };
        let surface = ScoreSurface::compute(&block, WHOLE, &SignSumScorer, &config).unwrap();
        assert!(surface.sign(10, 29).is_nan());
        assert!(!surface.score(10, 29).is_nan());

        let surface =
            ScoreSurface::compute(&block, WHOLE, &SignSumScorer, &DomainConfig::default()).unwrap();
        assert!(!surface.sign(10, 29).is_nan());
    }
}

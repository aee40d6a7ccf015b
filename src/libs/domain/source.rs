use crate::libs::error::Result;
use crate::libs::hic::ContactMatrix;
use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Where the blocks on the diagonal come from.
pub trait BlockSource: Sync {
    /// The symmetric block `[start, end) x [start, end)`
    fn block(&self, start: usize, end: usize) -> Result<DMatrix<f64>>;
}

/// The contacts as they are.
pub struct ObservedSource<'a> {
    matrix: &'a dyn ContactMatrix,
}

impl<'a> ObservedSource<'a> {
    pub fn new(matrix: &'a dyn ContactMatrix) -> Self {
        Self { matrix }
    }
}

impl BlockSource for ObservedSource<'_> {
    fn block(&self, start: usize, end: usize) -> Result<DMatrix<f64>> {
        self.matrix.block(start, end)
    }
}

/// The contacts with every diagonal of a block permuted on its own.
///
/// The decay of contacts with distance survives, domains do not.
pub struct ControlSource<'a> {
    matrix: &'a dyn ContactMatrix,
    seed: u64,
}

impl<'a> ControlSource<'a> {
    /// `seed` is combined with the block start, so each window gets its own
    /// but reproducible permutation.
    pub fn new(matrix: &'a dyn ContactMatrix, seed: u64) -> Self {
        Self { matrix, seed }
    }
}

impl BlockSource for ControlSource<'_> {
    fn block(&self, start: usize, end: usize) -> Result<DMatrix<f64>> {
        let mut block = self.matrix.block(start, end)?;
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(start as u64));
        shuffle_diagonals(&mut block, &mut rng);
        Ok(block)
    }
}

fn shuffle_diagonals(block: &mut DMatrix<f64>, rng: &mut StdRng) {
    let m = block.nrows();
    let mut values = Vec::with_capacity(m);

    for d in 0..m {
        values.clear();
        values.extend((0..m - d).map(|i| block[(i, i + d)]));
        values.shuffle(rng);

        for (i, v) in values.iter().enumerate() {
            block[(i, i + d)] = *v;
            block[(i + d, i)] = *v;
        }
    }
}

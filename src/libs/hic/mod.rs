//! Contact matrices and the provider interface the domain caller consumes.

mod dataset;
mod zoom;

pub use dataset::ContactDataset;
pub use zoom::ZoomData;

use crate::libs::error::{HicError, Result};
use crate::libs::genome::Chromosome;
use nalgebra::DMatrix;
use std::sync::Arc;

/// Matrix balancing applied before any score is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NormalizationType {
    None,
    /// Vanilla coverage
    Vc,
    VcSqrt,
    /// Knight-Ruiz balancing, vectors come from outside
    Kr,
}

impl std::str::FromStr for NormalizationType {
    type Err = HicError;

    /// ```
    /// # use hicdom::libs::hic::NormalizationType;
    /// assert_eq!("VC_SQRT".parse::<NormalizationType>().unwrap(), NormalizationType::VcSqrt);
    /// assert_eq!("kr".parse::<NormalizationType>().unwrap(), NormalizationType::Kr);
    /// assert!("ICE".parse::<NormalizationType>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "NONE" => Ok(NormalizationType::None),
            "VC" => Ok(NormalizationType::Vc),
            "VC_SQRT" => Ok(NormalizationType::VcSqrt),
            "KR" => Ok(NormalizationType::Kr),
            _ => Err(HicError::InvalidNormalization(s.to_string())),
        }
    }
}

impl std::fmt::Display for NormalizationType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            NormalizationType::None => "NONE",
            NormalizationType::Vc => "VC",
            NormalizationType::VcSqrt => "VC_SQRT",
            NormalizationType::Kr => "KR",
        };
        write!(f, "{}", s)
    }
}

/// Unit of the bin size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Bp,
    Frag,
}

/// A square, symmetric, intra-chromosomal contact matrix.
pub trait ContactMatrix: Send + Sync {
    fn bin_count(&self) -> usize;

    /// Dense symmetric block `[start, end) x [start, end)`.
    ///
    /// Bins without a usable normalization factor yield `NaN` rows and columns.
    fn block(&self, start: usize, end: usize) -> Result<DMatrix<f64>>;
}

/// Everything a provider needs to serve one matrix.
#[derive(Debug, Clone)]
pub struct MatrixRequest<'a> {
    pub chr1: &'a Chromosome,
    pub chr2: &'a Chromosome,
    pub unit: Unit,
    pub resolution: u32,
    pub norm: NormalizationType,
    /// Keep the binned matrix around for later requests
    pub use_cache: bool,
}

impl<'a> MatrixRequest<'a> {
    /// Self-by-self request at a base-pair resolution, without caching
    pub fn intra(chr: &'a Chromosome, resolution: u32, norm: NormalizationType) -> Self {
        Self {
            chr1: chr,
            chr2: chr,
            unit: Unit::Bp,
            resolution,
            norm,
            use_cache: false,
        }
    }
}

/// The storage layer seen from the domain caller.
pub trait MatrixProvider: Sync {
    /// `Ok(None)` when the matrix is not available.
    fn matrix(&self, request: &MatrixRequest) -> Result<Option<Arc<dyn ContactMatrix>>>;
}

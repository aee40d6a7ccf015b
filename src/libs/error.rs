use thiserror::Error;

#[derive(Error, Debug)]
pub enum HicError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed line in one of the text inputs
    #[error("Parse error at line {line}: {message}")]
    Parse {
        /// The line number (1-based)
        line: usize,
        /// A human-readable message explaining the error
        message: String,
    },

    #[error("Unknown normalization: {0}, expected one of NONE/VC/VC_SQRT/KR")]
    InvalidNormalization(String),

    #[error("Unknown chromosome: {0}")]
    UnknownChromosome(String),

    #[error("Invalid feature: {0}")]
    InvalidFeature(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Not enough memory for a {rows}x{cols} {what}, try a coarser resolution or a smaller matrix size")]
    ResourceExhausted {
        what: &'static str,
        rows: usize,
        cols: usize,
    },
}

pub type Result<T> = std::result::Result<T, HicError>;

impl HicError {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        HicError::Parse {
            line,
            message: message.into(),
        }
    }
}

/// Allocates a zero-filled buffer of `rows * cols` elements, surfacing allocation
/// failure instead of aborting the process.
pub fn try_zeroed<T: Clone + Default>(what: &'static str, rows: usize, cols: usize) -> Result<Vec<T>> {
    let exhausted = || HicError::ResourceExhausted { what, rows, cols };
    let len = rows.checked_mul(cols).ok_or_else(exhausted)?;

    let mut buf: Vec<T> = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| exhausted())?;
    buf.resize(len, T::default());
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_zeroed() {
        let buf: Vec<f64> = try_zeroed("block", 3, 4).unwrap();
        assert_eq!(buf.len(), 12);
        assert!(buf.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_try_zeroed_overflow() {
        let res: Result<Vec<u8>> = try_zeroed("surface", usize::MAX, 2);
        let err = res.unwrap_err();
        assert!(matches!(err, HicError::ResourceExhausted { .. }));
        assert!(err.to_string().contains("coarser resolution"));
    }
}

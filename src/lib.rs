//! `hicdom` calls contact domains from Hi-C contact matrices.
//!
//! The library is split the same way the binary uses it:
//!
//! * [`libs::feature`] - interval-pair features and feature lists with their text export
//! * [`libs::genome`] - chromosome catalog
//! * [`libs::hic`] - the matrix provider interface and a text-backed dataset
//! * [`libs::domain`] - the domain calling engine and the genome-wide orchestrator

pub mod libs;

pub use libs::error::{HicError, Result};
pub use libs::io::{reader, writer};

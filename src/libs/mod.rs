pub mod domain;
pub mod error;
pub mod feature;
pub mod feature_list;
pub mod genome;
pub mod hic;
pub mod io;

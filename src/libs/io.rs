use crate::libs::error::Result;
use std::io::{BufRead, BufReader, BufWriter, Write};

/// Opens a plain or gzipped text file, or `stdin`.
///
/// ```
/// use std::io::BufRead;
/// let reader = hicdom::reader("tests/hic/two_blocks.sizes").unwrap();
/// let lines: Vec<_> = reader.lines().collect();
/// assert_eq!(lines.len(), 1);
///
/// assert!(hicdom::reader("tests/hic/not_exists.txt").is_err());
/// ```
pub fn reader(input: &str) -> Result<Box<dyn BufRead>> {
    let reader: Box<dyn BufRead> = if input == "stdin" {
        Box::new(BufReader::new(std::io::stdin()))
    } else {
        let path = std::path::Path::new(input);
        let file = std::fs::File::open(path)?;

        if path.extension() == Some(std::ffi::OsStr::new("gz")) {
            Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        }
    };

    Ok(reader)
}

/// Creates (truncating) an output file, or `stdout`.
pub fn writer(output: &str) -> Result<Box<dyn Write>> {
    let writer: Box<dyn Write> = if output == "stdout" {
        Box::new(BufWriter::new(std::io::stdout()))
    } else {
        Box::new(BufWriter::new(std::fs::File::create(output)?))
    };

    Ok(writer)
}

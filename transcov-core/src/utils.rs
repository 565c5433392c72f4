use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::errors::TranscovError;

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>, TranscovError> {
    let is_gzipped = path.extension() == Some(OsStr::new("gz"));
    let file = File::open(path)
        .map_err(|e| TranscovError::FileReadError(format!("{}: {}", path.display(), e)))?;
    let file: Box<dyn Read> = match is_gzipped {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    Ok(BufReader::new(file))
}

/// Get a reader for a file path, or stdin when the path is `-`.
pub fn get_dynamic_reader_w_stdin(
    file_path_str: &str,
) -> Result<BufReader<Box<dyn Read>>, TranscovError> {
    if file_path_str == "-" {
        Ok(BufReader::new(Box::new(std::io::stdin()) as Box<dyn Read>))
    } else {
        get_dynamic_reader(Path::new(file_path_str))
    }
}

///
/// Read a chrom.sizes file (`chrom<whitespace>length`) keeping the file order.
///
/// Empty lines and `#` comments are skipped.
///
pub fn get_chrom_sizes<T: AsRef<Path>>(path: T) -> Result<Vec<(String, u64)>, TranscovError> {
    let reader = get_dynamic_reader(path.as_ref())?;
    parse_chrom_sizes(reader)
}

pub fn parse_chrom_sizes<R: BufRead>(reader: R) -> Result<Vec<(String, u64)>, TranscovError> {
    let mut chrom_sizes = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut fields = trimmed.split_whitespace();
        let chrom = fields.next().ok_or_else(|| {
            TranscovError::RecordParseError(format!("line {}: missing chromosome", line_num + 1))
        })?;
        let size = fields
            .next()
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| {
                TranscovError::RecordParseError(format!(
                    "line {}: missing or invalid length for {}",
                    line_num + 1,
                    chrom
                ))
            })?;

        chrom_sizes.push((chrom.to_string(), size));
    }

    Ok(chrom_sizes)
}

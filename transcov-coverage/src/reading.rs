use std::io::{BufRead, Lines};
use std::path::Path;

use transcov_core::TranscovError;
use transcov_core::models::{Feature, FeatureId, FeatureType, MappingRecord, Strand};
use transcov_core::utils::{get_dynamic_reader, get_dynamic_reader_w_stdin};

use crate::accumulator::ExcludedRegion;
use crate::errors::CoverageError;

fn is_skippable(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty()
        || trimmed.starts_with('#')
        || trimmed.starts_with("track")
        || trimmed.starts_with("browser")
}

fn parse_field<T: std::str::FromStr>(
    field: Option<&str>,
    name: &str,
    line: &str,
) -> Result<T, TranscovError> {
    field
        .and_then(|s| s.trim().parse::<T>().ok())
        .ok_or_else(|| TranscovError::RecordParseError(format!("bad {} in '{}'", name, line)))
}

///
/// Parse one BED6 line (`chrom start end name score strand`) into a mapping.
///
/// BED starts are 0-based; the returned mapping is 1-based with `stop = end`.
///
pub fn parse_mapping_line(line: &str) -> Result<Option<MappingRecord>, TranscovError> {
    if is_skippable(line) {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 6 {
        return Err(TranscovError::RecordParseError(format!(
            "mapping line has fewer than 6 fields: '{}'",
            line
        )));
    }

    let start: u64 = parse_field(Some(fields[1]), "start", line)?;
    let end: u64 = parse_field(Some(fields[2]), "end", line)?;
    let strand: Strand = fields[5].trim().parse()?;

    Ok(Some(MappingRecord::new(fields[0], start + 1, end, strand)))
}

/// Streams mappings out of a BED6 file, one record at a time.
pub struct MappingReader<R: BufRead> {
    lines: Lines<R>,
}

impl<R: BufRead> MappingReader<R> {
    pub fn new(reader: R) -> Self {
        MappingReader {
            lines: reader.lines(),
        }
    }
}

impl<R: BufRead> Iterator for MappingReader<R> {
    type Item = Result<MappingRecord, CoverageError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            match parse_mapping_line(&line) {
                Ok(Some(mapping)) => return Some(Ok(mapping)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

/// Open a (optionally gzipped) BED6 mapping file, or stdin for `-`.
pub fn open_mappings(
    path: &str,
) -> Result<MappingReader<std::io::BufReader<Box<dyn std::io::Read>>>, CoverageError> {
    Ok(MappingReader::new(get_dynamic_reader_w_stdin(path)?))
}

///
/// Read a feature table: `chrom start end strand id type`, 1-based inclusive.
///
pub fn read_features<P: AsRef<Path>>(path: P) -> Result<Vec<Feature>, CoverageError> {
    let reader = get_dynamic_reader(path.as_ref())?;
    let mut features = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if is_skippable(&line) {
            continue;
        }
        let mut fields = line.split('\t');
        let chromosome = fields
            .next()
            .ok_or_else(|| TranscovError::RecordParseError(line.clone()))?
            .to_string();
        let start: u64 = parse_field(fields.next(), "start", &line)?;
        let stop: u64 = parse_field(fields.next(), "stop", &line)?;
        let strand: Strand = parse_field(fields.next(), "strand", &line)?;
        let id: u64 = parse_field(fields.next(), "id", &line)?;
        let feature_type = fields
            .next()
            .map(|raw| raw.trim().parse::<FeatureType>().unwrap_or(FeatureType::Other))
            .unwrap_or(FeatureType::Other);

        features.push(Feature {
            id: FeatureId(id),
            chromosome,
            start,
            stop,
            strand,
            feature_type,
        });
    }

    Ok(features)
}

/// Read excluded regions from a BED3+ file into 1-based inclusive regions.
pub fn read_excluded_regions<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<ExcludedRegion>, CoverageError> {
    let reader = get_dynamic_reader(path.as_ref())?;
    let mut regions = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if is_skippable(&line) {
            continue;
        }
        let mut fields = line.split('\t');
        let chromosome = fields
            .next()
            .ok_or_else(|| TranscovError::RecordParseError(line.clone()))?
            .to_string();
        let start: u64 = parse_field(fields.next(), "start", &line)?;
        let end: u64 = parse_field(fields.next(), "end", &line)?;

        regions.push(ExcludedRegion {
            chromosome,
            start: start + 1,
            stop: end,
        });
    }

    Ok(regions)
}

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::TranscovError;

///
/// Strand of a mapping, feature or coverage track
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Strand {
    #[serde(rename = "+")]
    Forward,
    #[serde(rename = "-")]
    Reverse,
}

impl Strand {
    /// The other strand.
    pub fn opposite(&self) -> Strand {
        match self {
            Strand::Forward => Strand::Reverse,
            Strand::Reverse => Strand::Forward,
        }
    }

    pub fn is_forward(&self) -> bool {
        matches!(self, Strand::Forward)
    }
}

impl FromStr for Strand {
    type Err = TranscovError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" | "fwd" | "forward" => Ok(Strand::Forward),
            "-" | "rev" | "reverse" => Ok(Strand::Reverse),
            other => Err(TranscovError::RecordParseError(format!(
                "unknown strand '{}'",
                other
            ))),
        }
    }
}

impl Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Forward => write!(f, "+"),
            Strand::Reverse => write!(f, "-"),
        }
    }
}

///
/// A single aligned read. Positions are 1-based; `stop` is the last aligned base.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRecord {
    pub chromosome: String,
    pub start: u64,
    pub stop: u64,
    pub strand: Strand,
}

impl MappingRecord {
    pub fn new(chromosome: impl Into<String>, start: u64, stop: u64, strand: Strand) -> Self {
        MappingRecord {
            chromosome: chromosome.into(),
            start,
            stop,
            strand,
        }
    }

    /// Number of aligned bases, counting both ends.
    pub fn length(&self) -> u64 {
        self.stop.saturating_sub(self.start) + 1
    }

    /// The 5'-most position of the read on its own strand.
    pub fn read_start(&self) -> u64 {
        match self.strand {
            Strand::Forward => self.start,
            Strand::Reverse => self.stop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case("+", Strand::Forward)]
    #[case("-", Strand::Reverse)]
    #[case("rev", Strand::Reverse)]
    fn test_parse_strand(#[case] raw: &str, #[case] expected: Strand) {
        assert_eq!(raw.parse::<Strand>().unwrap(), expected);
    }

    #[rstest]
    fn test_parse_strand_rejects_dot() {
        assert!(".".parse::<Strand>().is_err());
    }

    #[rstest]
    fn test_read_start_follows_strand() {
        let fwd = MappingRecord::new("chr1", 10, 40, Strand::Forward);
        let rev = MappingRecord::new("chr1", 10, 40, Strand::Reverse);

        assert_eq!(fwd.read_start(), 10);
        assert_eq!(rev.read_start(), 40);
        assert_eq!(fwd.length(), 31);
    }
}

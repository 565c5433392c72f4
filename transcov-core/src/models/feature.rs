use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::mapping::Strand;

/// Identifier of an annotated feature. Ordering follows the numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(pub u64);

impl Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    Gene,
    Cds,
    Mrna,
    Rrna,
    Trna,
    MiscRna,
    NcRna,
    Other,
}

impl FeatureType {
    /// Miscellaneous RNAs never take part in operon adjacency.
    pub fn is_misc_rna(&self) -> bool {
        matches!(self, FeatureType::MiscRna)
    }
}

impl FromStr for FeatureType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "gene" => FeatureType::Gene,
            "cds" => FeatureType::Cds,
            "mrna" => FeatureType::Mrna,
            "rrna" => FeatureType::Rrna,
            "trna" => FeatureType::Trna,
            "misc_rna" | "miscrna" => FeatureType::MiscRna,
            "ncrna" => FeatureType::NcRna,
            _ => FeatureType::Other,
        })
    }
}

///
/// An annotated feature on the reference, 1-based and inclusive on both ends
///
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    pub chromosome: String,
    pub start: u64,
    pub stop: u64,
    pub strand: Strand,
    pub feature_type: FeatureType,
}

impl Feature {
    pub fn contains(&self, position: u64) -> bool {
        self.start <= position && position <= self.stop
    }
}

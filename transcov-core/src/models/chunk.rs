use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use super::mapping::Strand;

/// Identifier of one sequencing dataset mapped against the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub u32);

impl Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "track{}", self.0)
    }
}

/// The two tracks a correlation interval was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackPair {
    pub first: TrackId,
    pub second: TrackId,
}

impl Display for TrackPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.second)
    }
}

///
/// Per-position coverage depth of one track over `from..=to` (1-based).
///
/// Both depth vectors hold exactly `to - from + 1` values.
///
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageChunk {
    pub track: TrackId,
    pub chromosome: String,
    pub from: u64,
    pub to: u64,
    pub forward: Vec<u32>,
    pub reverse: Vec<u32>,
}

impl CoverageChunk {
    pub fn len(&self) -> usize {
        (self.to + 1).saturating_sub(self.from) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn depth(&self, strand: Strand) -> &[u32] {
        match strand {
            Strand::Forward => &self.forward,
            Strand::Reverse => &self.reverse,
        }
    }

    /// Depth values for `position..position + width` on `strand`, if fully inside the chunk.
    pub fn window(&self, strand: Strand, position: u64, width: u64) -> Option<&[u32]> {
        if position < self.from || position + width - 1 > self.to {
            return None;
        }
        let offset = (position - self.from) as usize;
        self.depth(strand).get(offset..offset + width as usize)
    }

    /// True when the chunk's own bookkeeping agrees with its payload.
    pub fn is_consistent(&self) -> bool {
        self.forward.len() == self.len() && self.reverse.len() == self.len()
    }
}

pub mod chunk;
pub mod feature;
pub mod mapping;

// re-export for cleaner imports
pub use self::chunk::{CoverageChunk, TrackId, TrackPair};
pub use self::feature::{Feature, FeatureId, FeatureType};
pub use self::mapping::{MappingRecord, Strand};

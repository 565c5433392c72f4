use transcov_core::models::Strand;

use crate::errors::CoverageError;

///
/// Dense per-position read-start counts and coverage depth for one chromosome.
///
/// Positions are 1-based: index `i` of every array holds position `i + 1`, and
/// every array is exactly `length` long until the profile is cleared.
///
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageProfile {
    pub chromosome: String,
    pub length: u64,
    forward_starts: Vec<u32>,
    reverse_starts: Vec<u32>,
    forward_coverage: Vec<u32>,
    reverse_coverage: Vec<u32>,
    cleared: bool,
}

impl CoverageProfile {
    pub fn new(chromosome: impl Into<String>, length: u64) -> Self {
        let size = length as usize;
        CoverageProfile {
            chromosome: chromosome.into(),
            length,
            forward_starts: vec![0; size],
            reverse_starts: vec![0; size],
            forward_coverage: vec![0; size],
            reverse_coverage: vec![0; size],
            cleared: false,
        }
    }

    pub fn read_starts(&self, strand: Strand) -> &[u32] {
        match strand {
            Strand::Forward => &self.forward_starts,
            Strand::Reverse => &self.reverse_starts,
        }
    }

    pub fn coverage(&self, strand: Strand) -> &[u32] {
        match strand {
            Strand::Forward => &self.forward_coverage,
            Strand::Reverse => &self.reverse_coverage,
        }
    }

    /// Coverage depth at a 1-based position, `None` outside the chromosome.
    pub fn coverage_at(&self, strand: Strand, position: u64) -> Option<u32> {
        let index = position.checked_sub(1)? as usize;
        self.coverage(strand).get(index).copied()
    }

    /// Read starts at a 1-based position, `None` outside the chromosome.
    pub fn read_starts_at(&self, strand: Strand, position: u64) -> Option<u32> {
        let index = position.checked_sub(1)? as usize;
        self.read_starts(strand).get(index).copied()
    }

    /// Copy of the coverage depth over `from..=to`, clipped to the chromosome.
    pub fn coverage_range(&self, strand: Strand, from: u64, to: u64) -> Vec<u32> {
        let depth = self.coverage(strand);
        let lo = (from.max(1) - 1) as usize;
        let hi = (to.min(self.length) as usize).min(depth.len());
        if lo >= hi {
            return Vec::new();
        }
        depth[lo..hi].to_vec()
    }

    pub fn total_read_starts(&self, strand: Strand) -> u64 {
        self.read_starts(strand).iter().map(|&c| u64::from(c)).sum()
    }

    pub(crate) fn add_read_start(&mut self, strand: Strand, position: u64) {
        let index = (position - 1) as usize;
        match strand {
            Strand::Forward => self.forward_starts[index] += 1,
            Strand::Reverse => self.reverse_starts[index] += 1,
        }
    }

    /// Adds one to every position in `start..stop`.
    pub(crate) fn add_coverage(&mut self, strand: Strand, start: u64, stop: u64) {
        let depth = match strand {
            Strand::Forward => &mut self.forward_coverage,
            Strand::Reverse => &mut self.reverse_coverage,
        };
        for value in &mut depth[(start - 1) as usize..(stop - 1) as usize] {
            *value += 1;
        }
    }

    pub(crate) fn ensure_live(&self) -> Result<(), CoverageError> {
        if self.cleared {
            return Err(CoverageError::ProfileCleared(self.chromosome.clone()));
        }
        Ok(())
    }

    /// Release the position arrays once results have been consumed.
    pub fn clear(&mut self) {
        self.forward_starts = Vec::new();
        self.reverse_starts = Vec::new();
        self.forward_coverage = Vec::new();
        self.reverse_coverage = Vec::new();
        self.cleared = true;
    }

    pub fn is_cleared(&self) -> bool {
        self.cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_new_profile_is_zeroed() {
        let profile = CoverageProfile::new("chr1", 50);
        for strand in [Strand::Forward, Strand::Reverse] {
            assert_eq!(profile.coverage(strand).len(), 50);
            assert_eq!(profile.read_starts(strand).len(), 50);
            assert_eq!(profile.total_read_starts(strand), 0);
        }
    }

    #[rstest]
    fn test_add_coverage_is_half_open() {
        let mut profile = CoverageProfile::new("chr1", 10);
        profile.add_coverage(Strand::Forward, 3, 6);

        assert_eq!(profile.coverage_at(Strand::Forward, 2), Some(0));
        assert_eq!(profile.coverage_at(Strand::Forward, 3), Some(1));
        assert_eq!(profile.coverage_at(Strand::Forward, 5), Some(1));
        assert_eq!(profile.coverage_at(Strand::Forward, 6), Some(0));
        assert_eq!(profile.coverage_at(Strand::Reverse, 4), Some(0));
        assert_eq!(profile.coverage_at(Strand::Forward, 0), None);
        assert_eq!(profile.coverage_at(Strand::Forward, 11), None);
    }

    #[rstest]
    fn test_coverage_range_clips_to_chromosome() {
        let mut profile = CoverageProfile::new("chr1", 10);
        profile.add_coverage(Strand::Reverse, 8, 11);

        assert_eq!(profile.coverage_range(Strand::Reverse, 7, 15), vec![0, 1, 1, 1]);
        assert!(profile.coverage_range(Strand::Reverse, 12, 15).is_empty());
    }

    #[rstest]
    fn test_clear_releases_arrays() {
        let mut profile = CoverageProfile::new("chr1", 1000);
        profile.clear();

        assert!(profile.is_cleared());
        assert!(profile.coverage(Strand::Forward).is_empty());
        assert!(profile.ensure_live().is_err());
    }
}

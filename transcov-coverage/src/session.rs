//! Accumulation driven by an asynchronous mapping-retrieval collaborator.
//!
//! The collaborator answers each [`IntervalRequest`] with any number of
//! [`MappingEvent::Batch`] events followed by exactly one `Finished` or `Failed`,
//! from whatever thread it likes. The session is the only consumer of those
//! events, so each batch is applied under a single owner.

use crossbeam_channel::{Receiver, Sender, unbounded};
use fxhash::FxHashMap as HashMap;
use log::{info, warn};

use transcov_core::models::MappingRecord;

use crate::accumulator::{CoverageAccumulator, ExcludedRegion, ExclusionMask};
use crate::errors::CoverageError;
use crate::genome::CoverageResult;
use crate::operon::FeatureAdjacencyIndex;

/// A genomic interval whose mappings are wanted, 1-based inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalRequest {
    pub chromosome: String,
    pub from: u64,
    pub to: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MappingEvent {
    Batch {
        chromosome: String,
        mappings: Vec<MappingRecord>,
    },
    Finished,
    Failed(String),
}

/// Where a mapping source sends its events. Cheap to clone and safe to move
/// to another thread.
#[derive(Debug, Clone)]
pub struct MappingSink {
    sender: Sender<MappingEvent>,
}

impl MappingSink {
    /// Returns `false` once the session has stopped listening.
    pub fn deliver(&self, event: MappingEvent) -> bool {
        self.sender.send(event).is_ok()
    }
}

pub trait MappingSource {
    fn request_mappings(&self, request: IntervalRequest, sink: MappingSink);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStep {
    Continue,
    Finished,
}

///
/// One accumulation session over a fixed set of chromosomes.
///
pub struct AccumulationSession<'a> {
    accumulators: Vec<CoverageAccumulator<'a>>,
    lookup: HashMap<String, usize>,
}

impl<'a> AccumulationSession<'a> {
    pub fn new(
        chrom_sizes: &[(String, u64)],
        features: Option<&'a dyn FeatureAdjacencyIndex>,
        excluded: &[ExcludedRegion],
    ) -> Self {
        let mut accumulators = Vec::with_capacity(chrom_sizes.len());
        let mut lookup = HashMap::default();

        for (index, (chrom, length)) in chrom_sizes.iter().enumerate() {
            let mut accumulator = CoverageAccumulator::new(chrom.as_str(), *length);
            if let Some(mask) = ExclusionMask::from_regions(chrom, *length, excluded) {
                accumulator = accumulator.with_exclusions(mask);
            }
            if let Some(features) = features {
                accumulator = accumulator.with_features(features);
            }
            accumulators.push(accumulator);
            lookup.insert(chrom.clone(), index);
        }

        AccumulationSession {
            accumulators,
            lookup,
        }
    }

    pub fn handle(&mut self, event: MappingEvent) -> Result<SessionStep, CoverageError> {
        match event {
            MappingEvent::Batch {
                chromosome,
                mappings,
            } => {
                let index = *self
                    .lookup
                    .get(&chromosome)
                    .ok_or_else(|| CoverageError::UnknownChromosome(chromosome.clone()))?;
                self.accumulators[index].accumulate(mappings, &chromosome)?;
                Ok(SessionStep::Continue)
            }
            MappingEvent::Finished => Ok(SessionStep::Finished),
            MappingEvent::Failed(reason) => {
                warn!("mapping retrieval failed: {}", reason);
                Err(CoverageError::MappingFetch(reason))
            }
        }
    }

    ///
    /// Issue every request and apply events until each request has finished.
    ///
    /// On failure the counts gathered so far stay in the session.
    ///
    pub fn run<S: MappingSource + ?Sized>(
        &mut self,
        source: &S,
        requests: Vec<IntervalRequest>,
    ) -> Result<(), CoverageError> {
        let (sender, receiver): (Sender<MappingEvent>, Receiver<MappingEvent>) = unbounded();
        let mut pending = requests.len();

        for request in requests {
            source.request_mappings(
                request,
                MappingSink {
                    sender: sender.clone(),
                },
            );
        }
        drop(sender);

        while pending > 0 {
            let event = receiver.recv().map_err(|_| {
                CoverageError::MappingFetch(format!(
                    "source hung up with {} request(s) outstanding",
                    pending
                ))
            })?;
            if self.handle(event)? == SessionStep::Finished {
                pending -= 1;
            }
        }

        Ok(())
    }

    pub fn finish(self) -> CoverageResult {
        let mut result = CoverageResult::default();
        for accumulator in self.accumulators {
            result.push(accumulator);
        }
        info!(
            "session finished: {} mappings, {} unique",
            result.summary.mappings, result.summary.unique_count
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::thread;
    use transcov_core::models::Strand;

    /// Delivers every request from its own thread in two half batches.
    struct ThreadedSource {
        mappings: Vec<MappingRecord>,
        fail_on: Option<String>,
    }

    impl MappingSource for ThreadedSource {
        fn request_mappings(&self, request: IntervalRequest, sink: MappingSink) {
            let mut hits: Vec<MappingRecord> = self
                .mappings
                .iter()
                .filter(|m| {
                    m.chromosome == request.chromosome
                        && m.start >= request.from
                        && m.start <= request.to
                })
                .cloned()
                .collect();
            let fail = self.fail_on.as_deref() == Some(request.chromosome.as_str());
            thread::spawn(move || {
                if fail {
                    sink.deliver(MappingEvent::Failed("disk on fire".to_string()));
                    return;
                }
                let tail = hits.split_off(hits.len() / 2);
                for batch in [hits, tail] {
                    sink.deliver(MappingEvent::Batch {
                        chromosome: request.chromosome.clone(),
                        mappings: batch,
                    });
                }
                sink.deliver(MappingEvent::Finished);
            });
        }
    }

    fn requests() -> Vec<IntervalRequest> {
        vec![
            IntervalRequest {
                chromosome: "chr1".to_string(),
                from: 1,
                to: 100,
            },
            IntervalRequest {
                chromosome: "chr2".to_string(),
                from: 1,
                to: 100,
            },
        ]
    }

    #[fixture]
    fn source() -> ThreadedSource {
        ThreadedSource {
            mappings: vec![
                MappingRecord::new("chr1", 5, 15, Strand::Forward),
                MappingRecord::new("chr1", 8, 12, Strand::Forward),
                MappingRecord::new("chr2", 20, 40, Strand::Reverse),
                MappingRecord::new("chr2", 30, 50, Strand::Reverse),
                MappingRecord::new("chr2", 35, 45, Strand::Forward),
            ],
            fail_on: None,
        }
    }

    #[rstest]
    fn test_session_accumulates_all_requests(source: ThreadedSource) {
        let sizes = vec![("chr1".to_string(), 100), ("chr2".to_string(), 100)];
        let mut session = AccumulationSession::new(&sizes, None, &[]);

        session.run(&source, requests()).unwrap();
        let result = session.finish();

        assert_eq!(result.summary.mappings, 5);
        let chr2 = result.profile("chr2").unwrap();
        assert_eq!(chr2.coverage_at(Strand::Reverse, 35), Some(2));
        assert_eq!(chr2.total_read_starts(Strand::Reverse), 2);
    }

    #[rstest]
    fn test_failed_retrieval_surfaces_error(mut source: ThreadedSource) {
        source.fail_on = Some("chr2".to_string());
        let sizes = vec![("chr1".to_string(), 100), ("chr2".to_string(), 100)];
        let mut session = AccumulationSession::new(&sizes, None, &[]);

        let result = session.run(&source, requests());
        assert!(matches!(result, Err(CoverageError::MappingFetch(_))));
    }

    #[rstest]
    fn test_batch_for_unknown_chromosome() {
        let sizes = vec![("chr1".to_string(), 100)];
        let mut session = AccumulationSession::new(&sizes, None, &[]);

        let result = session.handle(MappingEvent::Batch {
            chromosome: "chrM".to_string(),
            mappings: vec![],
        });
        assert!(matches!(result, Err(CoverageError::UnknownChromosome(_))));
    }

    #[rstest]
    fn test_source_hanging_up_is_an_error() {
        struct SilentSource;
        impl MappingSource for SilentSource {
            fn request_mappings(&self, _request: IntervalRequest, _sink: MappingSink) {}
        }

        let sizes = vec![("chr1".to_string(), 100)];
        let mut session = AccumulationSession::new(&sizes, None, &[]);
        let result = session.run(&SilentSource, requests()[..1].to_vec());
        assert!(matches!(result, Err(CoverageError::MappingFetch(_))));
    }
}

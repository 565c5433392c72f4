use std::thread;

use pretty_assertions::assert_eq;
use rstest::*;

use transcov_core::models::{Feature, FeatureId, FeatureType, MappingRecord, Strand};
use transcov_coverage::{
    AccumulationSession, CoverageAccumulator, FeatureIntervals, IntervalRequest, MappingEvent,
    MappingSink, MappingSource, accumulate_genome,
};

fn feature(id: u64, start: u64, stop: u64, strand: Strand, feature_type: FeatureType) -> Feature {
    Feature {
        id: FeatureId(id),
        chromosome: "chr1".to_string(),
        start,
        stop,
        strand,
        feature_type,
    }
}

#[fixture]
fn operon() -> FeatureIntervals {
    FeatureIntervals::build(vec![
        feature(1, 100, 199, Strand::Forward, FeatureType::Gene),
        feature(2, 210, 320, Strand::Forward, FeatureType::Gene),
        feature(3, 400, 450, Strand::Forward, FeatureType::MiscRna),
        feature(4, 500, 560, Strand::Reverse, FeatureType::Gene),
        feature(5, 600, 700, Strand::Reverse, FeatureType::Gene),
    ])
}

#[rstest]
fn test_non_overlapping_mappings_give_exact_coverage() {
    let mappings = vec![
        MappingRecord::new("chr1", 10, 20, Strand::Forward),
        MappingRecord::new("chr1", 30, 45, Strand::Forward),
        MappingRecord::new("chr1", 50, 51, Strand::Reverse),
        MappingRecord::new("chr1", 60, 90, Strand::Reverse),
    ];
    let mut accumulator = CoverageAccumulator::new("chr1", 100);
    accumulator.accumulate(mappings.clone(), "chr1").unwrap();
    let profile = accumulator.profile();

    for strand in [Strand::Forward, Strand::Reverse] {
        for position in 1..=100 {
            let expected = mappings
                .iter()
                .filter(|m| m.strand == strand && m.start <= position && position < m.stop)
                .count() as u32;
            assert_eq!(
                profile.coverage_at(strand, position),
                Some(expected),
                "{} at {}",
                strand,
                position
            );
        }
    }
}

#[rstest]
fn test_read_starts_sum_to_mappings_per_strand() {
    let mappings: Vec<MappingRecord> = (0..40)
        .map(|i| {
            let strand = if i % 3 == 0 {
                Strand::Reverse
            } else {
                Strand::Forward
            };
            MappingRecord::new("chr1", 1 + i * 7, 30 + i * 7, strand)
        })
        .collect();
    let reverse = mappings.iter().filter(|m| !m.strand.is_forward()).count() as u64;

    let result = accumulate_genome(&[("chr1".to_string(), 400)], mappings, None, &[]).unwrap();
    let profile = result.profile("chr1").unwrap();

    assert_eq!(profile.total_read_starts(Strand::Forward), 40 - reverse);
    assert_eq!(profile.total_read_starts(Strand::Reverse), reverse);
}

#[rstest]
fn test_spanning_reads_build_one_candidate(operon: FeatureIntervals) {
    let mut accumulator = CoverageAccumulator::new("chr1", 1000).with_features(&operon);

    accumulator
        .accumulate(vec![MappingRecord::new("chr1", 180, 230, Strand::Forward)], "chr1")
        .unwrap();
    assert_eq!(accumulator.candidates().len(), 1);
    assert_eq!(accumulator.candidates()[&FeatureId(1)].spanning_reads, 1);

    accumulator
        .accumulate(vec![MappingRecord::new("chr1", 150, 300, Strand::Forward)], "chr1")
        .unwrap();
    assert_eq!(accumulator.candidates().len(), 1);
    let candidate = &accumulator.candidates()[&FeatureId(1)];
    assert_eq!(candidate.downstream, FeatureId(2));
    assert_eq!(candidate.spanning_reads, 2);
}

#[rstest]
fn test_misc_rna_and_wrong_strand_do_not_count(operon: FeatureIntervals) {
    let mut accumulator = CoverageAccumulator::new("chr1", 1000).with_features(&operon);
    accumulator
        .accumulate(
            vec![
                // gene 2 into misc RNA 3
                MappingRecord::new("chr1", 300, 420, Strand::Forward),
                // gene 1 into gene 2, but on the other strand
                MappingRecord::new("chr1", 180, 230, Strand::Reverse),
            ],
            "chr1",
        )
        .unwrap();
    assert!(accumulator.candidates().is_empty());
}

#[rstest]
fn test_reverse_strand_upstream_is_the_stop_side(operon: FeatureIntervals) {
    let result = accumulate_genome(
        &[("chr1".to_string(), 1000)],
        vec![MappingRecord::new("chr1", 520, 650, Strand::Reverse)],
        Some(&operon),
        &[],
    )
    .unwrap();

    let candidate = &result.candidates[&FeatureId(5)];
    assert_eq!(candidate.downstream, FeatureId(4));
}

/// Streams each request back in single-mapping batches from a worker thread.
struct TrickleSource {
    mappings: Vec<MappingRecord>,
}

impl MappingSource for TrickleSource {
    fn request_mappings(&self, request: IntervalRequest, sink: MappingSink) {
        let hits: Vec<MappingRecord> = self
            .mappings
            .iter()
            .filter(|m| m.chromosome == request.chromosome && m.start >= request.from && m.start <= request.to)
            .cloned()
            .collect();
        thread::spawn(move || {
            for mapping in hits {
                sink.deliver(MappingEvent::Batch {
                    chromosome: mapping.chromosome.clone(),
                    mappings: vec![mapping],
                });
            }
            sink.deliver(MappingEvent::Finished);
        });
    }
}

#[rstest]
fn test_streamed_session_matches_batch_accumulation(operon: FeatureIntervals) {
    let mappings = vec![
        MappingRecord::new("chr1", 180, 230, Strand::Forward),
        MappingRecord::new("chr1", 150, 300, Strand::Forward),
        MappingRecord::new("chr1", 520, 650, Strand::Reverse),
        MappingRecord::new("chr1", 700, 720, Strand::Forward),
    ];
    let sizes = vec![("chr1".to_string(), 1000)];
    let requests = vec![
        IntervalRequest {
            chromosome: "chr1".to_string(),
            from: 1,
            to: 500,
        },
        IntervalRequest {
            chromosome: "chr1".to_string(),
            from: 501,
            to: 1000,
        },
    ];

    let mut session = AccumulationSession::new(&sizes, Some(&operon), &[]);
    session
        .run(
            &TrickleSource {
                mappings: mappings.clone(),
            },
            requests,
        )
        .unwrap();
    let streamed = session.finish();
    let batched = accumulate_genome(&sizes, mappings, Some(&operon), &[]).unwrap();

    assert_eq!(streamed.profiles, batched.profiles);
    assert_eq!(streamed.candidates, batched.candidates);
    assert_eq!(streamed.summary, batched.summary);
}

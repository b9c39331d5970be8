use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use synoid_digest::engine::{
    knapsack, BoundaryRefiner, GreedySelector, OverlapResolver, ScoreAggregator, SegmentSelector, SimilarityIndex,
};
use synoid_digest::{DigestConfig, DigestEngine, DigestInput, Segment, SelectionStrategy, TranscriptCue};

fn brute_force_best(weights: &[usize], values: &[f64], capacity: usize) -> f64 {
    let n = weights.len();
    (0u32..(1 << n))
        .filter_map(|mask| {
            let picked: Vec<usize> = (0..n).filter(|i| mask & (1 << i) != 0).collect();
            let weight: usize = picked.iter().map(|&i| weights[i]).sum();
            (weight <= capacity).then(|| picked.iter().map(|&i| values[i]).sum::<f64>())
        })
        .fold(0.0, f64::max)
}

#[test]
fn test_knapsack_matches_exhaustive_search() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    for _ in 0..200 {
        let n = rng.gen_range(0..=12);
        let weights: Vec<usize> = (0..n).map(|_| rng.gen_range(1..=8)).collect();
        // Integer values keep float sums exact in any order.
        let values: Vec<f64> = (0..n).map(|_| rng.gen_range(0..100) as f64).collect();
        let capacity = rng.gen_range(0..=30);

        let chosen = knapsack(&weights, &values, capacity);
        let value: f64 = chosen.iter().map(|&i| values[i]).sum();
        let weight: usize = chosen.iter().map(|&i| weights[i]).sum();

        assert!(weight <= capacity);
        assert!(chosen.windows(2).all(|w| w[0] < w[1]), "not in input order: {:?}", chosen);
        if capacity > 0 {
            assert_eq!(value, brute_force_best(&weights, &values, capacity));
        } else {
            assert!(chosen.is_empty());
        }
    }
}

fn random_filmstrip(rng: &mut StdRng, n: usize, dim: usize) -> Vec<Segment> {
    let mut t = 0.0;
    (0..n)
        .map(|i| {
            let len = rng.gen_range(0.5..8.0);
            let frames = (len as usize).max(1);
            let scores: Vec<f64> = (0..frames).map(|_| rng.gen_range(0.0..1.0)).collect();
            let vector: Vec<f64> = (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect();
            let seg = Segment::new(i as u32, t, t + len)
                .with_frame_scores(scores)
                .with_feature_vector(vector);
            t += len;
            seg
        })
        .collect()
}

#[test]
fn test_greedy_never_exceeds_budget() {
    let mut rng = StdRng::seed_from_u64(42);
    let aggregator = ScoreAggregator::new(0.7, 0.3);
    for _ in 0..100 {
        let n = rng.gen_range(1..40);
        let (segments, _) = aggregator.aggregate_all(random_filmstrip(&mut rng, n, 6));
        let (index, _) = SimilarityIndex::from_segments(&segments);
        let budget = rng.gen_range(0.0..60.0);
        let lambda = if rng.gen_bool(0.3) { 1.0 } else { rng.gen_range(0.0..1.0) };

        let selection = GreedySelector::new(lambda, Some(&index)).select(&segments, budget);
        let used: f64 = segments
            .iter()
            .filter(|s| selection.segment_ids.contains(&s.segment_id))
            .map(|s| s.duration())
            .sum();
        assert!(used <= budget + 1e-9, "used {} of {}", used, budget);
        assert!((used - selection.total_time).abs() < 1e-9);
    }
}

#[test]
fn test_pipeline_output_never_overlaps() {
    let mut rng = StdRng::seed_from_u64(7);
    for round in 0..60 {
        let n = rng.gen_range(1..30);
        let segments = random_filmstrip(&mut rng, n, 4);
        let video_end = segments.last().map(|s| s.end_time).unwrap_or(0.0);

        let cues: Vec<TranscriptCue> = (0..rng.gen_range(0..25))
            .filter_map(|_| {
                let start = rng.gen_range(0.0..video_end.max(1.0));
                TranscriptCue::new(start, start + rng.gen_range(0.2..6.0), "line")
            })
            .collect();

        let config = DigestConfig {
            strategy: if round % 2 == 0 {
                SelectionStrategy::Knapsack
            } else {
                SelectionStrategy::Greedy
            },
            mixing_weight: rng.gen_range(0.0..=1.0),
            top_ratio: Some(rng.gen_range(0.05..=1.0)),
            threads: 2,
            ..DigestConfig::default()
        };

        let mut input = DigestInput::new(segments);
        input.cues = cues;
        let report = DigestEngine::new(config).run(input).unwrap();

        let out = &report.output.segments;
        for seg in out {
            assert!(seg.start_time >= 0.0);
            assert!(seg.start_time <= seg.end_time);
        }
        for pair in out.windows(2) {
            assert!(pair[0].start_time <= pair[1].start_time);
            assert!(
                pair[0].end_time <= pair[1].start_time,
                "segment {} overlaps segment {}",
                pair[0].segment_id,
                pair[1].segment_id
            );
        }
        let mut ids: Vec<_> = out.iter().map(|s| s.segment_id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), out.len());
    }
}

#[test]
fn test_refine_and_resolve_twice_is_stable() {
    let config = DigestConfig::default();
    let refiner = BoundaryRefiner::from_config(&config);
    let resolver = OverlapResolver::from_config(&config);
    let cues = vec![
        TranscriptCue::new(14.0, 16.2, "b").unwrap(),
        TranscriptCue::new(16.4, 19.0, "c").unwrap(),
        TranscriptCue::new(31.0, 34.0, "d").unwrap(),
    ];
    let segments = vec![
        Segment::new(1, 10.0, 15.0),
        Segment::new(2, 16.3, 20.0),
        Segment::new(3, 30.0, 35.0),
        Segment::new(4, 50.0, 55.0),
    ];

    let (once, _) = resolver.resolve(refiner.refine_all(&segments, &cues));
    let (twice, _) = resolver.resolve(refiner.refine_all(&once, &cues));
    assert_eq!(once, twice);

    let bounds: Vec<_> = once.iter().map(|s| (s.segment_id, s.start_time, s.end_time)).collect();
    assert_eq!(
        bounds,
        vec![
            (1, 13.8, 16.19),
            (2, 16.2, 19.35),
            (3, 30.8, 34.35),
            (4, 50.0, 55.0),
        ]
    );
}

/// Cues on whole seconds, at least 2s apart, and segment cuts placed 1s clear
/// of every cue. No cue can then fall inside a margin extension, and refined
/// segments stay inside their original cuts.
fn spaced_transcript(rng: &mut StdRng) -> (Vec<Segment>, Vec<TranscriptCue>) {
    let mut cursor = 0.0;
    let cues: Vec<TranscriptCue> = (0..rng.gen_range(1..15))
        .filter_map(|_| {
            let start = cursor + rng.gen_range(2..5) as f64;
            let end = start + rng.gen_range(1..6) as f64;
            cursor = end;
            TranscriptCue::new(start, end, "line")
        })
        .collect();

    let mut cuts = vec![0.0];
    for cue in &cues {
        if rng.gen_bool(0.5) {
            cuts.push(cue.start - 1.0);
        }
        if rng.gen_bool(0.5) {
            cuts.push(cue.end + 1.0);
        }
    }
    cuts.push(cursor + 1.0);
    cuts.sort_by(f64::total_cmp);
    cuts.dedup();

    let segments = cuts
        .windows(2)
        .enumerate()
        .filter(|_| rng.gen_bool(0.8))
        .map(|(i, w)| Segment::new(i as u32, w[0], w[1]))
        .collect();
    (segments, cues)
}

#[test]
fn test_refine_and_resolve_is_idempotent_on_spaced_cues() {
    let mut rng = StdRng::seed_from_u64(0xC0E5);
    let config = DigestConfig::default();
    let refiner = BoundaryRefiner::from_config(&config);
    let resolver = OverlapResolver::from_config(&config);

    for _ in 0..200 {
        let (segments, cues) = spaced_transcript(&mut rng);
        let (once, _) = resolver.resolve(refiner.refine_all(&segments, &cues));
        let (twice, warnings) = resolver.resolve(refiner.refine_all(&once, &cues));
        assert_eq!(once, twice, "cues {:?}", cues);
        assert!(warnings.is_empty());
        for pair in once.windows(2) {
            assert!(pair[0].end_time <= pair[1].start_time);
        }
    }
}

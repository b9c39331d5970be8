// SYNOID Digest - Summary Quality Score
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Scores a finished summary on two axes and blends them into one 0-100 number:
//   representativeness  how well the picks cover the whole video's content
//   RCI_SPS             share of score-per-second mass the picks retain

use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::engine::similarity::cosine;
use crate::segment::{OutputSegment, Segment, SegmentId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    /// Raw, in [0, 1].
    pub representativeness: f64,
    /// Raw ratio; may exceed 1 before scaling.
    pub rci_sps: f64,
    pub representativeness_scaled: f64,
    pub rci_sps_scaled: f64,
    pub weight: f64,
    /// Weighted blend, rounded to one decimal.
    pub score: f64,
}

/// Square root of the clipped value, scaled to 0-100.
fn scaled(raw: f64) -> f64 {
    raw.clamp(0.0, 1.0).sqrt() * 100.0
}

/// Mean over original segments of the best cosine similarity to any pick.
pub fn representativeness(original: &[&[f64]], selected: &[&[f64]]) -> f64 {
    if original.is_empty() || selected.is_empty() {
        return 0.0;
    }
    let total: f64 = original
        .iter()
        .map(|o| {
            selected
                .iter()
                .map(|s| cosine(o, s))
                .fold(f64::NEG_INFINITY, f64::max)
        })
        .sum();
    (total / original.len() as f64).clamp(0.0, 1.0)
}

fn score_per_second(items: impl Iterator<Item = (f64, f64)>) -> f64 {
    items
        .filter(|(_, duration)| *duration > 0.0)
        .map(|(score, duration)| score / duration)
        .sum()
}

/// Selected score-per-second over original score-per-second.
pub fn rci_sps(original: &[Segment], selected: &[OutputSegment]) -> f64 {
    let total = score_per_second(original.iter().map(|s| (s.combined_score(), s.duration())));
    if total == 0.0 {
        warn!("[EVAL] Original score-per-second total is zero");
        return 0.0;
    }
    let picked = score_per_second(
        selected
            .iter()
            .map(|s| (s.combined_score, s.end_time - s.start_time)),
    );
    picked / total
}

pub fn evaluate(original: &[Segment], selected: &[OutputSegment], weight: f64) -> QualityReport {
    let weight = if (0.0..=1.0).contains(&weight) {
        weight
    } else {
        warn!("[EVAL] Weight {} outside [0, 1]; clamping", weight);
        weight.clamp(0.0, 1.0)
    };

    let vectors: HashMap<SegmentId, &[f64]> = original
        .iter()
        .filter_map(|s| s.feature_vector.as_deref().map(|v| (s.segment_id, v)))
        .collect();
    let dim = original
        .iter()
        .find_map(|s| s.feature_vector.as_ref().map(|v| v.len()));

    let original_vectors: Vec<&[f64]> = original
        .iter()
        .filter_map(|s| s.feature_vector.as_deref())
        .filter(|v| Some(v.len()) == dim)
        .collect();
    let selected_vectors: Vec<&[f64]> = selected
        .iter()
        .filter_map(|s| vectors.get(&s.segment_id).copied())
        .filter(|v| Some(v.len()) == dim)
        .collect();

    let rep = representativeness(&original_vectors, &selected_vectors);
    let rci = rci_sps(original, selected);
    let rep_scaled = scaled(rep);
    let rci_scaled = scaled(rci);
    let blended = rep_scaled * (1.0 - weight) + rci_scaled * weight;
    let score = (blended * 10.0).round() / 10.0;

    info!(
        "[EVAL] representativeness {:.4} ({:.2}), RCI_SPS {:.4} ({:.2}), score {}",
        rep, rep_scaled, rci, rci_scaled, score
    );

    QualityReport {
        representativeness: rep,
        rci_sps: rci,
        representativeness_scaled: rep_scaled,
        rci_sps_scaled: rci_scaled,
        weight,
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::aggregate::ScoreAggregator;

    fn scored(id: SegmentId, start: f64, end: f64, score: f64, v: Vec<f64>) -> Segment {
        let mut seg = Segment::new(id, start, end)
            .with_frame_scores(vec![score])
            .with_feature_vector(v);
        ScoreAggregator::new(1.0, 0.0).aggregate(&mut seg).unwrap();
        seg
    }

    #[test]
    fn test_full_selection_scores_100() {
        let original = vec![
            scored(0, 0.0, 4.0, 2.0, vec![1.0, 0.0]),
            scored(1, 4.0, 8.0, 1.0, vec![0.0, 1.0]),
        ];
        let selected: Vec<OutputSegment> = original.iter().map(OutputSegment::from).collect();
        let report = evaluate(&original, &selected, 0.5);
        assert!((report.representativeness - 1.0).abs() < 1e-9);
        assert!((report.rci_sps - 1.0).abs() < 1e-9);
        assert_eq!(report.score, 100.0);
    }

    #[test]
    fn test_partial_selection() {
        let original = vec![
            scored(0, 0.0, 4.0, 2.0, vec![1.0, 0.0]),
            scored(1, 4.0, 8.0, 2.0, vec![0.0, 1.0]),
        ];
        let selected = vec![OutputSegment::from(&original[0])];
        let report = evaluate(&original, &selected, 0.0);
        // Originals score 1.0 and 0.0 against the only pick.
        assert!((report.representativeness - 0.5).abs() < 1e-9);
        assert!((report.rci_sps - 0.5).abs() < 1e-9);
        assert_eq!(report.score, (0.5f64.sqrt() * 1000.0).round() / 10.0);
    }

    #[test]
    fn test_empty_selection_and_weight_clamp() {
        let original = vec![scored(0, 0.0, 4.0, 2.0, vec![1.0])];
        let report = evaluate(&original, &[], 3.0);
        assert_eq!(report.weight, 1.0);
        assert_eq!(report.score, 0.0);
    }
}

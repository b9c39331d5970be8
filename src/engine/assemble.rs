// SYNOID Digest - Segment Assembler
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Last gate before the cutter: verifies identity and ordering invariants and
// packages the cut list with duration totals.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

use crate::config::OutputOrder;
use crate::error::{DigestError, DigestResult};
use crate::segment::{OutputSegment, Segment};

/// The cut list plus duration accounting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigestOutput {
    pub original_duration: f64,
    pub selected_duration: f64,
    /// `selected_duration / original_duration`, 0 for an empty source.
    pub compression_ratio: f64,
    pub segments: Vec<OutputSegment>,
}

pub struct SegmentAssembler {
    order: OutputOrder,
}

impl SegmentAssembler {
    pub fn new(order: OutputOrder) -> Self {
        Self { order }
    }

    pub fn assemble(&self, segments: &[Segment], original_duration: f64) -> DigestResult<DigestOutput> {
        let mut seen = HashSet::with_capacity(segments.len());
        for seg in segments {
            if !seen.insert(seg.segment_id) {
                return Err(DigestError::DuplicateSegmentId(seg.segment_id));
            }
            if !(seg.start_time.is_finite() && seg.end_time.is_finite() && seg.start_time <= seg.end_time) {
                return Err(DigestError::InvariantViolation(format!(
                    "segment {} has interval [{}, {}]",
                    seg.segment_id, seg.start_time, seg.end_time
                )));
            }
        }

        let mut by_start: Vec<&Segment> = segments.iter().collect();
        by_start.sort_by(|a, b| {
            a.start_time
                .total_cmp(&b.start_time)
                .then(a.segment_id.cmp(&b.segment_id))
        });
        if let Some(pair) = by_start.windows(2).find(|p| p[0].end_time > p[1].start_time) {
            return Err(DigestError::InvariantViolation(format!(
                "segment {} ends at {} after segment {} starts at {}",
                pair[0].segment_id, pair[0].end_time, pair[1].segment_id, pair[1].start_time
            )));
        }

        let ordered: Vec<OutputSegment> = match self.order {
            OutputOrder::StartTime => by_start.into_iter().map(OutputSegment::from).collect(),
            OutputOrder::SegmentId => {
                let mut by_id = by_start;
                by_id.sort_by_key(|s| s.segment_id);
                by_id.into_iter().map(OutputSegment::from).collect()
            }
        };

        let selected_duration: f64 = ordered.iter().map(|s| s.end_time - s.start_time).sum();
        let compression_ratio = if original_duration > 0.0 {
            selected_duration / original_duration
        } else {
            0.0
        };

        info!(
            "[ASSEMBLE] {} segments, {:.2}s of {:.2}s ({:.1}%)",
            ordered.len(),
            selected_duration,
            original_duration,
            compression_ratio * 100.0
        );

        Ok(DigestOutput {
            original_duration,
            selected_duration,
            compression_ratio,
            segments: ordered,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orders_and_totals() {
        let segments = vec![Segment::new(4, 20.0, 25.0), Segment::new(1, 30.0, 35.0), Segment::new(9, 0.0, 10.0)];

        let out = SegmentAssembler::new(OutputOrder::StartTime)
            .assemble(&segments, 100.0)
            .unwrap();
        let ids: Vec<_> = out.segments.iter().map(|s| s.segment_id).collect();
        assert_eq!(ids, vec![9, 4, 1]);
        assert!((out.selected_duration - 20.0).abs() < 1e-9);
        assert!((out.compression_ratio - 0.2).abs() < 1e-9);

        let out = SegmentAssembler::new(OutputOrder::SegmentId)
            .assemble(&segments, 100.0)
            .unwrap();
        let ids: Vec<_> = out.segments.iter().map(|s| s.segment_id).collect();
        assert_eq!(ids, vec![1, 4, 9]);
    }

    #[test]
    fn test_rejects_duplicates_and_overlaps() {
        let assembler = SegmentAssembler::new(OutputOrder::StartTime);
        let dup = vec![Segment::new(1, 0.0, 2.0), Segment::new(1, 5.0, 6.0)];
        assert_eq!(assembler.assemble(&dup, 10.0), Err(DigestError::DuplicateSegmentId(1)));

        let overlapping = vec![Segment::new(1, 0.0, 5.0), Segment::new(2, 4.0, 6.0)];
        assert!(matches!(
            assembler.assemble(&overlapping, 10.0),
            Err(DigestError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_empty_source_has_zero_ratio() {
        let out = SegmentAssembler::new(OutputOrder::StartTime).assemble(&[], 0.0).unwrap();
        assert!(out.segments.is_empty());
        assert_eq!(out.compression_ratio, 0.0);
    }
}

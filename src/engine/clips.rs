// SYNOID Digest - Clip Ranker
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Highlight-clip mode: instead of a time budget, keep the N best-scoring
// segments that are long enough to stand alone.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::segment::{Segment, SegmentId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedClip {
    /// 1-based.
    pub rank: usize,
    pub segment_id: SegmentId,
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    pub combined_score: f64,
}

pub fn top_clips(segments: &[Segment], top_n: usize, min_clip_duration: f64) -> Vec<RankedClip> {
    let mut candidates: Vec<&Segment> = segments
        .iter()
        .filter(|s| !s.invalid && s.duration() >= min_clip_duration)
        .collect();

    candidates.sort_by(|a, b| {
        b.combined_score()
            .total_cmp(&a.combined_score())
            .then(a.segment_id.cmp(&b.segment_id))
    });

    let clips: Vec<RankedClip> = candidates
        .into_iter()
        .take(top_n)
        .enumerate()
        .map(|(i, seg)| RankedClip {
            rank: i + 1,
            segment_id: seg.segment_id,
            start_time: seg.start_time,
            end_time: seg.end_time,
            duration: seg.duration(),
            combined_score: seg.combined_score(),
        })
        .collect();

    info!(
        "[CLIPS] Kept {} of {} segments (min {:.1}s, top {})",
        clips.len(),
        segments.len(),
        min_clip_duration,
        top_n
    );
    clips
}

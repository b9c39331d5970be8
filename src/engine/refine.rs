// SYNOID Digest - Boundary Refiner
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Snaps selected segments onto the transcript so cuts land between sentences
// instead of mid-word.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::{DigestConfig, OverlapPolicy};
use crate::segment::{round_centis, Segment, TranscriptCue};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryRefiner {
    pub policy: OverlapPolicy,
    pub margin_before: f64,
    pub margin_after: f64,
    pub round_boundaries: bool,
}

impl BoundaryRefiner {
    pub fn new(policy: OverlapPolicy, margin_before: f64, margin_after: f64) -> Self {
        Self {
            policy,
            margin_before,
            margin_after,
            round_boundaries: false,
        }
    }

    pub fn from_config(config: &DigestConfig) -> Self {
        Self {
            policy: config.overlap_policy,
            margin_before: config.boundary_margin_before,
            margin_after: config.boundary_margin_after,
            round_boundaries: config.round_boundaries,
        }
    }

    /// Cue span `(min start, max end)` over cues that qualify for `segment`.
    fn cue_span(&self, segment: &Segment, cues: &[TranscriptCue]) -> Option<(f64, f64)> {
        cues.iter()
            .filter(|cue| self.policy.qualifies(cue.overlap(segment.start_time, segment.end_time)))
            .fold(None, |span, cue| match span {
                None => Some((cue.start, cue.end)),
                Some((lo, hi)) => Some((f64::min(lo, cue.start), f64::max(hi, cue.end))),
            })
    }

    /// Refine one segment. Without a qualifying cue the segment is returned as is.
    pub fn refine(&self, segment: &Segment, cues: &[TranscriptCue]) -> Segment {
        let Some((cue_start, cue_end)) = self.cue_span(segment, cues) else {
            return segment.clone();
        };

        let mut start = (cue_start - self.margin_before).max(0.0);
        let mut end = cue_end + self.margin_after;
        if self.round_boundaries {
            start = round_centis(start);
            end = round_centis(end);
        }
        if end < start {
            debug!(
                "[REFINE] Segment {} collapsed to zero length at {:.2}s",
                segment.segment_id, start
            );
            end = start;
        }
        segment.with_bounds(start, end)
    }

    /// Refine every segment in parallel, preserving order.
    pub fn refine_all(&self, segments: &[Segment], cues: &[TranscriptCue]) -> Vec<Segment> {
        if cues.is_empty() {
            info!("[REFINE] No transcript cues; boundaries unchanged");
            return segments.to_vec();
        }
        let refined: Vec<Segment> = segments
            .par_iter()
            .map(|seg| self.refine(seg, cues))
            .collect();

        let moved = segments
            .iter()
            .zip(&refined)
            .filter(|(a, b)| a.start_time != b.start_time || a.end_time != b.end_time)
            .count();
        info!(
            "[REFINE] Aligned {} of {} segments to speech boundaries",
            moved,
            segments.len()
        );
        refined
    }
}

// SYNOID Digest - Score Aggregator
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Reduces per-frame importance scores inside a segment to avg/max/std and a
// single combined score:
//   combined = avg*alpha + max*(1-alpha) - std_weight*std

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::DigestConfig;
use crate::error::{DigestError, DigestResult, DigestWarning};
use crate::segment::{Segment, SegmentScores};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreAggregator {
    pub alpha: f64,
    pub std_weight: f64,
}

impl ScoreAggregator {
    pub fn new(alpha: f64, std_weight: f64) -> Self {
        Self { alpha, std_weight }
    }

    pub fn from_config(config: &DigestConfig) -> Self {
        Self::new(config.alpha, config.std_weight)
    }

    pub fn combined(&self, avg_score: f64, max_score: f64, std_score: f64) -> f64 {
        avg_score * self.alpha + max_score * (1.0 - self.alpha) - self.std_weight * std_score
    }

    /// Mean, max and population standard deviation. `None` for an empty slice.
    pub fn summarize(&self, frame_scores: &[f64]) -> Option<SegmentScores> {
        if frame_scores.is_empty() {
            return None;
        }
        let n = frame_scores.len() as f64;
        let avg_score = frame_scores.iter().sum::<f64>() / n;
        let max_score = frame_scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let variance = frame_scores
            .iter()
            .map(|s| (s - avg_score).powi(2))
            .sum::<f64>()
            / n;
        let std_score = variance.sqrt();

        Some(SegmentScores {
            avg_score,
            max_score,
            std_score,
            combined_score: self.combined(avg_score, max_score, std_score),
        })
    }

    /// Attach derived scores to one segment.
    pub fn aggregate(&self, segment: &mut Segment) -> DigestResult<()> {
        let scores = self
            .summarize(segment.frame_scores())
            .ok_or(DigestError::EmptyScoreRange {
                segment_id: segment.segment_id,
                start_time: segment.start_time,
                end_time: segment.end_time,
            })?;
        segment.attach_scores(scores);
        Ok(())
    }

    /// Aggregate every segment in parallel. Segments without samples are
    /// excluded and reported as warnings; input order is preserved.
    pub fn aggregate_all(&self, segments: Vec<Segment>) -> (Vec<Segment>, Vec<DigestWarning>) {
        let results: Vec<Result<Segment, DigestError>> = segments
            .into_par_iter()
            .map(|mut seg| self.aggregate(&mut seg).map(|_| seg))
            .collect();

        let mut scored = Vec::with_capacity(results.len());
        let mut warnings = Vec::new();
        for result in results {
            match result {
                Ok(seg) => scored.push(seg),
                Err(e) => {
                    warn!("[SCORE] Excluding segment: {}", e);
                    warnings.extend(e.into_warning());
                }
            }
        }
        debug!("[SCORE] Aggregated {} segments", scored.len());
        (scored, warnings)
    }
}

/// A global per-frame score sequence sampled at `fps`.
#[derive(Debug, Clone, Copy)]
pub struct ScoreTrack<'a> {
    scores: &'a [f64],
    fps: f64,
}

impl<'a> ScoreTrack<'a> {
    pub fn new(scores: &'a [f64], fps: f64) -> Self {
        Self { scores, fps }
    }

    /// Inclusive frame window `[floor(start*fps), min(floor(end*fps), len-1)]`.
    pub fn window(&self, start_time: f64, end_time: f64) -> Option<(usize, usize)> {
        frame_window(self.scores.len(), start_time, end_time, self.fps)
    }

    pub fn frame_scores_for(&self, segment: &Segment) -> DigestResult<Vec<f64>> {
        self.window(segment.start_time, segment.end_time)
            .map(|(first, last)| self.scores[first..=last].to_vec())
            .ok_or(DigestError::EmptyScoreRange {
                segment_id: segment.segment_id,
                start_time: segment.start_time,
                end_time: segment.end_time,
            })
    }

    /// Fill `frame_scores` for segments that arrived without any. Segments
    /// whose window misses the track keep their empty scores and are reported.
    pub fn attach(&self, segments: &mut [Segment]) -> Vec<DigestWarning> {
        let mut warnings = Vec::new();
        for seg in segments.iter_mut().filter(|s| s.frame_scores().is_empty()) {
            match self.frame_scores_for(seg) {
                Ok(scores) => seg.set_frame_scores(scores),
                Err(e) => {
                    warn!("[SCORE] {}", e);
                    warnings.extend(e.into_warning());
                }
            }
        }
        warnings
    }
}

/// Shared window arithmetic for score tracks and feature matrices.
pub(crate) fn frame_window(len: usize, start_time: f64, end_time: f64, fps: f64) -> Option<(usize, usize)> {
    if len == 0 || !(end_time >= start_time) {
        return None;
    }
    let first = (start_time.max(0.0) * fps).floor() as usize;
    let last = ((end_time.max(0.0) * fps).floor() as usize).min(len - 1);
    if first >= len || first > last {
        return None;
    }
    Some((first, last))
}

// SYNOID Digest - Segment Data Model
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Typed records for scene segments and transcript cues. Derived score fields
// are owned by the score aggregator and are reset whenever frame scores change.

use serde::{Deserialize, Serialize};

/// Stable per-run identity of a scene segment.
pub type SegmentId = u32;

/// Summary statistics derived from a segment's frame scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentScores {
    pub avg_score: f64,
    pub max_score: f64,
    pub std_score: f64,
    pub combined_score: f64,
}

/// A contiguous time interval of the source video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub segment_id: SegmentId,
    pub start_time: f64,
    pub end_time: f64,
    #[serde(default)]
    frame_scores: Vec<f64>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    scores: Option<SegmentScores>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_vector: Option<Vec<f64>>,
    #[serde(default)]
    pub invalid: bool,
}

impl Segment {
    pub fn new(segment_id: SegmentId, start_time: f64, end_time: f64) -> Self {
        Self {
            segment_id,
            start_time,
            end_time,
            frame_scores: Vec::new(),
            scores: None,
            feature_vector: None,
            invalid: !(end_time >= start_time),
        }
    }

    pub fn with_frame_scores(mut self, frame_scores: Vec<f64>) -> Self {
        self.set_frame_scores(frame_scores);
        self
    }

    pub fn with_feature_vector(mut self, vector: Vec<f64>) -> Self {
        self.feature_vector = Some(vector);
        self
    }

    pub fn frame_scores(&self) -> &[f64] {
        &self.frame_scores
    }

    /// Replaces the score samples and clears anything derived from the old ones.
    pub fn set_frame_scores(&mut self, frame_scores: Vec<f64>) {
        self.frame_scores = frame_scores;
        self.scores = None;
    }

    pub fn scores(&self) -> Option<&SegmentScores> {
        self.scores.as_ref()
    }

    pub(crate) fn attach_scores(&mut self, scores: SegmentScores) {
        self.scores = Some(scores);
    }

    /// Combined score, or 0.0 when the segment has not been aggregated yet.
    pub fn combined_score(&self) -> f64 {
        self.scores.map(|s| s.combined_score).unwrap_or(0.0)
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Flags the segment when its interval is inverted or not finite.
    pub fn validate_interval(&mut self) -> bool {
        let ok = self.start_time.is_finite()
            && self.end_time.is_finite()
            && self.end_time >= self.start_time;
        self.invalid = !ok;
        ok
    }

    /// Shallow copy with new boundaries; identity and scores are preserved.
    pub fn with_bounds(&self, start_time: f64, end_time: f64) -> Self {
        Self {
            start_time,
            end_time,
            ..self.clone()
        }
    }
}

/// One transcript sentence with its time span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptCue {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TranscriptCue {
    /// Returns `None` for cues with blank text or an inverted span.
    pub fn new(start: f64, end: f64, text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() || !(end >= start) {
            return None;
        }
        Some(Self {
            start,
            end,
            text: text.to_string(),
        })
    }

    /// Overlap in seconds with the half-open window `[start, end)`.
    pub fn overlap(&self, start: f64, end: f64) -> f64 {
        (self.end.min(end) - self.start.max(start)).max(0.0)
    }
}

/// Final record handed to the video cutter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSegment {
    pub segment_id: SegmentId,
    pub start_time: f64,
    pub end_time: f64,
    pub combined_score: f64,
}

impl From<&Segment> for OutputSegment {
    fn from(seg: &Segment) -> Self {
        Self {
            segment_id: seg.segment_id,
            start_time: seg.start_time,
            end_time: seg.end_time,
            combined_score: seg.combined_score(),
        }
    }
}

/// Rounds to centiseconds, the precision transcript timestamps carry.
pub fn round_centis(t: f64) -> f64 {
    (t * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_interval_is_marked_invalid() {
        let seg = Segment::new(1, 10.0, 5.0);
        assert!(seg.invalid);

        let mut seg = Segment::new(2, 0.0, f64::NAN);
        assert!(!seg.validate_interval());
        assert!(seg.invalid);
    }

    #[test]
    fn test_setting_frame_scores_clears_derived_fields() {
        let mut seg = Segment::new(0, 0.0, 3.0).with_frame_scores(vec![0.1, 0.2]);
        seg.attach_scores(SegmentScores {
            avg_score: 0.15,
            max_score: 0.2,
            std_score: 0.05,
            combined_score: 0.1,
        });
        assert!(seg.scores().is_some());

        seg.set_frame_scores(vec![0.9]);
        assert!(seg.scores().is_none());
        assert_eq!(seg.combined_score(), 0.0);
    }

    #[test]
    fn test_cue_rejects_blank_text() {
        assert!(TranscriptCue::new(1.0, 2.0, "   ").is_none());
        assert!(TranscriptCue::new(3.0, 2.0, "hello").is_none());
        let cue = TranscriptCue::new(1.0, 2.0, "  hello ").unwrap();
        assert_eq!(cue.text, "hello");
    }

    #[test]
    fn test_cue_overlap_is_half_open() {
        let cue = TranscriptCue::new(8.5, 9.8, "a").unwrap();
        assert_eq!(cue.overlap(10.0, 15.0), 0.0);
        let cue = TranscriptCue::new(14.0, 16.2, "b").unwrap();
        assert!((cue.overlap(10.0, 15.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_segment_json_shape() {
        let json = r#"{"segment_id": 3, "start_time": 1.5, "end_time": 4.0, "frame_scores": [0.2, 0.4]}"#;
        let seg: Segment = serde_json::from_str(json).unwrap();
        assert_eq!(seg.segment_id, 3);
        assert_eq!(seg.frame_scores(), &[0.2, 0.4]);
        assert!(seg.scores().is_none());
        assert!(!seg.invalid);
    }
}

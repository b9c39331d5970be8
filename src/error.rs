// SYNOID Digest - Error Taxonomy
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Fatal errors surface through `DigestError`. Per-segment problems are
// recovered locally and recorded as `DigestWarning` entries on the run report.

use serde::Serialize;

use crate::segment::SegmentId;

/// Errors raised by the digest engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DigestError {
    #[error("segment {segment_id} has no score samples in [{start_time:.2}s, {end_time:.2}s]")]
    EmptyScoreRange {
        segment_id: SegmentId,
        start_time: f64,
        end_time: f64,
    },

    #[error("both top_ratio ({top_ratio}) and budget_time ({budget_time}s) were supplied; pick one")]
    AmbiguousBudget { top_ratio: f64, budget_time: f64 },

    #[error("neither top_ratio nor budget_time was supplied")]
    MissingBudget,

    #[error("segment {segment_id} feature vector has dimension {found}, expected {expected}")]
    DimensionMismatch {
        segment_id: SegmentId,
        expected: usize,
        found: usize,
    },

    #[error("segment {segment_id} collapsed to [{start_time:.2}s, {end_time:.2}s]")]
    DegenerateInterval {
        segment_id: SegmentId,
        start_time: f64,
        end_time: f64,
    },

    #[error("invalid configuration: {field} = {value} ({reason})")]
    InvalidConfig {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("unknown {field} '{value}' (expected one of: {expected})")]
    UnknownOption {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("segment id {0} appears more than once")]
    DuplicateSegmentId(SegmentId),

    #[error("output invariant violated: {0}")]
    InvariantViolation(String),
}

pub type DigestResult<T> = Result<T, DigestError>;

/// A recovered per-segment problem. The segment is dropped or degraded, the run continues.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DigestWarning {
    /// `end_time < start_time` on input; excluded before scoring.
    InvalidInterval {
        segment_id: SegmentId,
        start_time: f64,
        end_time: f64,
    },
    /// No score samples; excluded from selection.
    EmptyScoreRange { segment_id: SegmentId },
    /// Feature vector dimension differs from the run's reference dimension.
    DimensionMismatch {
        segment_id: SegmentId,
        expected: usize,
        found: usize,
    },
    /// No feature vector; similarity row/column is zero.
    MissingFeatureVector { segment_id: SegmentId },
    /// Refined duration fell under `min_duration`.
    BelowMinDuration { segment_id: SegmentId, duration: f64 },
    /// Overlap trimming would have left `end_time <= start_time`.
    DroppedByTrim { segment_id: SegmentId },
}

impl DigestWarning {
    pub fn segment_id(&self) -> SegmentId {
        match self {
            Self::InvalidInterval { segment_id, .. }
            | Self::EmptyScoreRange { segment_id }
            | Self::DimensionMismatch { segment_id, .. }
            | Self::MissingFeatureVector { segment_id }
            | Self::BelowMinDuration { segment_id, .. }
            | Self::DroppedByTrim { segment_id } => *segment_id,
        }
    }
}

impl DigestError {
    /// Per-segment errors that the engine downgrades to warnings.
    pub fn into_warning(self) -> Option<DigestWarning> {
        match self {
            DigestError::EmptyScoreRange { segment_id, .. } => {
                Some(DigestWarning::EmptyScoreRange { segment_id })
            }
            DigestError::DimensionMismatch {
                segment_id,
                expected,
                found,
            } => Some(DigestWarning::DimensionMismatch {
                segment_id,
                expected,
                found,
            }),
            DigestError::DegenerateInterval { segment_id, .. } => {
                Some(DigestWarning::DroppedByTrim { segment_id })
            }
            _ => None,
        }
    }
}

// SYNOID Digest Library
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Budgeted segment selection and transcript-aware boundary refinement for
// video summaries.

pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod quality;
pub mod segment;

pub use config::{DigestConfig, OutputOrder, OverlapPolicy, SelectionStrategy};
pub use engine::{DigestEngine, DigestInput, DigestOutput, DigestReport, FeatureSource};
pub use error::{DigestError, DigestResult, DigestWarning};
pub use segment::{OutputSegment, Segment, SegmentId, TranscriptCue};

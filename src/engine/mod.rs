// SYNOID Engine Module
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Segment selection and boundary refinement stages, leaf-first.

pub mod aggregate;
pub mod assemble;
pub mod clips;
pub mod overlap;
pub mod pipeline;
pub mod refine;
pub mod selector;
pub mod similarity;

pub use aggregate::{ScoreAggregator, ScoreTrack};
pub use assemble::{DigestOutput, SegmentAssembler};
pub use clips::{top_clips, RankedClip};
pub use overlap::OverlapResolver;
pub use pipeline::{DigestEngine, DigestInput, DigestReport, FeatureSource};
pub use refine::BoundaryRefiner;
pub use selector::{knapsack, GreedySelector, KnapsackSelector, SegmentSelector, Selection, SelectionBudget};
pub use similarity::{cosine, FeatureMatrix, SimilarityIndex};

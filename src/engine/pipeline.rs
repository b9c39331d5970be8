// SYNOID Digest - Pipeline
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Runs the full digest in one batch call:
//   score -> (similarity) -> select -> refine -> resolve overlaps -> assemble
// Nothing is persisted mid-run, so a caller may abandon a run at any point.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

use crate::config::{DigestConfig, SelectionStrategy};
use crate::engine::aggregate::{ScoreAggregator, ScoreTrack};
use crate::engine::assemble::{DigestOutput, SegmentAssembler};
use crate::engine::clips::{top_clips, RankedClip};
use crate::engine::overlap::OverlapResolver;
use crate::engine::refine::BoundaryRefiner;
use crate::engine::selector::{select_segments, SelectionBudget};
use crate::engine::similarity::{FeatureMatrix, SimilarityIndex};
use crate::error::{DigestError, DigestResult, DigestWarning};
use crate::segment::{Segment, SegmentId, TranscriptCue};

/// Where segment content vectors come from.
#[derive(Debug, Clone)]
pub enum FeatureSource {
    /// Pre-pooled vector per segment.
    PerSegment(HashMap<SegmentId, Vec<f64>>),
    /// Per-frame rows, mean-pooled over each segment window.
    PerFrame(FeatureMatrix),
}

impl FeatureSource {
    /// Fill `feature_vector` for segments that have none.
    pub fn attach(&self, segments: &mut [Segment], fps: f64) {
        match self {
            Self::PerSegment(map) => {
                for seg in segments.iter_mut().filter(|s| s.feature_vector.is_none()) {
                    seg.feature_vector = map.get(&seg.segment_id).cloned();
                }
            }
            Self::PerFrame(matrix) => matrix.attach(segments, fps),
        }
    }
}

/// Everything one run needs, already loaded in memory.
#[derive(Debug, Clone, Default)]
pub struct DigestInput {
    pub segments: Vec<Segment>,
    /// Global per-frame scores, used for segments without their own samples.
    pub score_track: Option<Vec<f64>>,
    pub features: Option<FeatureSource>,
    pub cues: Vec<TranscriptCue>,
    /// Source video length. Defaults to the latest segment end.
    pub video_duration: Option<f64>,
}

impl DigestInput {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self {
            segments,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DigestReport {
    #[serde(flatten)]
    pub output: DigestOutput,
    pub strategy: SelectionStrategy,
    pub budget_time: f64,
    pub warnings: Vec<DigestWarning>,
}

pub struct DigestEngine {
    config: DigestConfig,
}

impl DigestEngine {
    pub fn new(config: DigestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DigestConfig {
        &self.config
    }

    /// Run `f` on a pool sized by `threads`, or on the global pool if that fails.
    fn in_pool<T, F>(&self, f: F) -> T
    where
        T: Send,
        F: FnOnce() -> T + Send,
    {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads.max(1))
            .build()
        {
            Ok(pool) => pool.install(f),
            Err(e) => {
                warn!("[DIGEST] Failed to build worker pool ({}); using global pool", e);
                f()
            }
        }
    }

    /// Validation, frame-score attachment and aggregation shared by both modes.
    fn prepare(&self, input: &mut DigestInput) -> DigestResult<(Vec<Segment>, Vec<DigestWarning>)> {
        let mut seen = HashSet::with_capacity(input.segments.len());
        if let Some(dup) = input.segments.iter().find(|s| !seen.insert(s.segment_id)) {
            return Err(DigestError::DuplicateSegmentId(dup.segment_id));
        }

        let mut warnings = Vec::new();
        let mut valid = Vec::with_capacity(input.segments.len());
        for mut seg in std::mem::take(&mut input.segments) {
            if seg.validate_interval() {
                valid.push(seg);
            } else {
                warn!(
                    "[DIGEST] Segment {} has invalid interval [{}, {}]; excluded",
                    seg.segment_id, seg.start_time, seg.end_time
                );
                warnings.push(DigestWarning::InvalidInterval {
                    segment_id: seg.segment_id,
                    start_time: seg.start_time,
                    end_time: seg.end_time,
                });
            }
        }

        if let Some(track) = &input.score_track {
            warnings.extend(ScoreTrack::new(track, self.config.fps).attach(&mut valid));
        }

        if let Some(features) = &input.features {
            features.attach(&mut valid, self.config.fps);
        }

        let aggregator = ScoreAggregator::from_config(&self.config);
        let (scored, agg_warnings) = self.in_pool(|| aggregator.aggregate_all(valid));
        warnings.extend(agg_warnings);
        Ok((scored, warnings))
    }

    /// Budgeted summary: the full pipeline.
    pub fn run(&self, mut input: DigestInput) -> DigestResult<DigestReport> {
        self.config.validate()?;
        let budget = SelectionBudget::from_config(&self.config)?;

        let original_duration = input.video_duration.unwrap_or_else(|| {
            input
                .segments
                .iter()
                .map(|s| s.end_time)
                .filter(|t| t.is_finite())
                .fold(0.0, f64::max)
        });

        let (scored, mut warnings) = self.prepare(&mut input)?;
        let budget_time = budget.resolve(original_duration);
        info!(
            "[DIGEST] {} scored segments, budget {:.2}s ({:?})",
            scored.len(),
            budget_time,
            budget
        );

        let similarity = if self.config.strategy == SelectionStrategy::Greedy && self.config.mixing_weight < 1.0 {
            if scored.iter().any(|s| s.feature_vector.is_some()) {
                let (index, sim_warnings) = SimilarityIndex::from_segments(&scored);
                warnings.extend(sim_warnings);
                Some(index)
            } else {
                warn!("[SELECT] No feature vectors; diversity term disabled");
                None
            }
        } else {
            None
        };

        let selection = select_segments(&self.config, &scored, budget_time, similarity.as_ref());
        let picked: HashSet<SegmentId> = selection.segment_ids.iter().copied().collect();
        let chosen: Vec<Segment> = scored
            .into_iter()
            .filter(|s| picked.contains(&s.segment_id))
            .collect();

        let refiner = BoundaryRefiner::from_config(&self.config);
        let refined = self.in_pool(|| refiner.refine_all(&chosen, &input.cues));

        let (resolved, overlap_warnings) = OverlapResolver::from_config(&self.config).resolve(refined);
        warnings.extend(overlap_warnings);

        let output = SegmentAssembler::new(self.config.output_order).assemble(&resolved, original_duration)?;

        if !warnings.is_empty() {
            info!("[DIGEST] Completed with {} warnings", warnings.len());
        }
        Ok(DigestReport {
            output,
            strategy: self.config.strategy,
            budget_time,
            warnings,
        })
    }

    /// Highlight clips: the `top_n` best segments of at least `min_clip_duration`.
    pub fn rank_clips(&self, mut input: DigestInput) -> DigestResult<(Vec<RankedClip>, Vec<DigestWarning>)> {
        self.config.validate()?;
        let (scored, warnings) = self.prepare(&mut input)?;
        let clips = top_clips(&scored, self.config.top_n, self.config.min_clip_duration);
        Ok((clips, warnings))
    }
}

// SYNOID Digest - Budget Selector
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Picks the subset of scored segments that fits the summary budget.
// Two interchangeable strategies:
//   * exact 0/1 knapsack over frame-discretized lengths
//   * greedy submodular knapsack (importance density + coverage diversity)

use std::ops::ControlFlow;
use tracing::{debug, info};

use crate::config::{DigestConfig, SelectionStrategy};
use crate::engine::similarity::SimilarityIndex;
use crate::error::{DigestError, DigestResult};
use crate::segment::{Segment, SegmentId};

/// Summary length budget. Exactly one form must be configured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionBudget {
    /// Absolute length in seconds.
    Time(f64),
    /// Fraction of the video length.
    Ratio(f64),
}

impl SelectionBudget {
    pub fn from_options(top_ratio: Option<f64>, budget_time: Option<f64>) -> DigestResult<Self> {
        match (top_ratio, budget_time) {
            (Some(top_ratio), Some(budget_time)) => Err(DigestError::AmbiguousBudget {
                top_ratio,
                budget_time,
            }),
            (None, None) => Err(DigestError::MissingBudget),
            (Some(ratio), None) => Ok(Self::Ratio(ratio)),
            (None, Some(time)) => Ok(Self::Time(time)),
        }
    }

    pub fn from_config(config: &DigestConfig) -> DigestResult<Self> {
        Self::from_options(config.top_ratio, config.budget_time)
    }

    /// Budget in seconds. A ratio is applied to the full video length.
    pub fn resolve(&self, video_duration: f64) -> f64 {
        match *self {
            Self::Time(t) => t,
            Self::Ratio(r) => video_duration * r,
        }
    }
}

/// Result of a selection pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Knapsack: original relative order. Greedy: pick order.
    pub segment_ids: Vec<SegmentId>,
    /// Sum of selected durations in seconds.
    pub total_time: f64,
    /// Sum of selected combined scores.
    pub total_value: f64,
}

impl Selection {
    fn empty() -> Self {
        Self {
            segment_ids: Vec::new(),
            total_time: 0.0,
            total_value: 0.0,
        }
    }

    fn from_indices(segments: &[Segment], indices: &[usize]) -> Self {
        Self {
            segment_ids: indices.iter().map(|&i| segments[i].segment_id).collect(),
            total_time: indices.iter().map(|&i| segments[i].duration()).sum(),
            total_value: indices.iter().map(|&i| segments[i].combined_score()).sum(),
        }
    }
}

/// A strategy that chooses segments under a time budget.
pub trait SegmentSelector {
    fn select(&self, segments: &[Segment], budget_time: f64) -> Selection;
}

/// Run the configured strategy.
pub fn select_segments(
    config: &DigestConfig,
    segments: &[Segment],
    budget_time: f64,
    similarity: Option<&SimilarityIndex>,
) -> Selection {
    let selection = match config.strategy {
        SelectionStrategy::Knapsack => KnapsackSelector::new(config.fps).select(segments, budget_time),
        SelectionStrategy::Greedy => {
            GreedySelector::new(config.mixing_weight, similarity).select(segments, budget_time)
        }
    };
    info!(
        "[SELECT] {:?}: {} of {} segments, {:.2}s of {:.2}s budget",
        config.strategy,
        selection.segment_ids.len(),
        segments.len(),
        selection.total_time,
        budget_time
    );
    selection
}

// ─────────────────────────────────────────────────────────────────────────────
// Exact knapsack
// ─────────────────────────────────────────────────────────────────────────────

pub struct KnapsackSelector {
    fps: f64,
}

impl KnapsackSelector {
    pub fn new(fps: f64) -> Self {
        Self { fps }
    }

    /// Length in frame units, rounded up so the chosen set never overruns the budget.
    fn weight(&self, duration: f64) -> usize {
        (duration.max(0.0) * self.fps - 1e-9).ceil().max(0.0) as usize
    }
}

impl SegmentSelector for KnapsackSelector {
    fn select(&self, segments: &[Segment], budget_time: f64) -> Selection {
        let capacity = (budget_time.max(0.0) * self.fps + 1e-9).floor() as usize;
        let weights: Vec<usize> = segments.iter().map(|s| self.weight(s.duration())).collect();
        let values: Vec<f64> = segments.iter().map(|s| s.combined_score()).collect();
        let chosen = knapsack(&weights, &values, capacity);
        Selection::from_indices(segments, &chosen)
    }
}

/// Optimal 0/1 knapsack. Returns chosen item indices in ascending order.
///
/// Items are taken only on strict improvement, so items with non-positive
/// or non-finite value are never chosen. Capacity beyond the total item
/// weight is never used, so the tables are sized to that total.
pub fn knapsack(weights: &[usize], values: &[f64], capacity: usize) -> Vec<usize> {
    let n = weights.len().min(values.len());
    if n == 0 || capacity == 0 {
        return Vec::new();
    }
    let total_weight = weights[..n].iter().fold(0usize, |acc, &w| acc.saturating_add(w));
    let capacity = capacity.min(total_weight.max(1));

    let width = capacity + 1;
    let mut best = vec![0.0f64; width];
    let mut keep = vec![false; n * width];

    for i in 0..n {
        let (w, v) = (weights[i], values[i]);
        if w > capacity || !v.is_finite() {
            continue;
        }
        let prev = best.clone();
        for c in w..=capacity {
            let with_item = prev[c - w] + v;
            if with_item > prev[c] {
                best[c] = with_item;
                keep[i * width + c] = true;
            }
        }
    }

    let mut chosen = Vec::new();
    let mut c = capacity;
    for i in (0..n).rev() {
        if keep[i * width + c] {
            chosen.push(i);
            c -= weights[i];
        }
    }
    chosen.reverse();
    debug!("[SELECT] Knapsack value {:.4} at capacity {}", best[capacity], capacity);
    chosen
}

// ─────────────────────────────────────────────────────────────────────────────
// Greedy submodular knapsack
// ─────────────────────────────────────────────────────────────────────────────

pub struct GreedySelector<'a> {
    mixing_weight: f64,
    similarity: Option<&'a SimilarityIndex>,
}

/// Accumulator threaded through each greedy iteration.
#[derive(Debug, Clone)]
struct GreedyState {
    picked: Vec<usize>,
    taken: Vec<bool>,
    /// Best similarity so far between each segment and any selected one.
    coverage: Vec<f64>,
    total_time: f64,
}

impl GreedyState {
    fn new(n: usize) -> Self {
        Self {
            picked: Vec::new(),
            taken: vec![false; n],
            coverage: vec![0.0; n],
            total_time: 0.0,
        }
    }
}

impl<'a> GreedySelector<'a> {
    pub fn new(mixing_weight: f64, similarity: Option<&'a SimilarityIndex>) -> Self {
        Self {
            mixing_weight,
            similarity,
        }
    }

    fn pure_importance(&self) -> bool {
        self.mixing_weight >= 1.0
    }

    /// Candidates without a usable vector fall back to plain density.
    fn has_vector(&self, j: usize) -> bool {
        match self.similarity {
            Some(index) if j < index.len() => index.has_vector(j),
            _ => false,
        }
    }

    fn similarity(&self, i: usize, j: usize) -> f64 {
        match self.similarity {
            Some(index) if i < index.len() && j < index.len() => index.get(i, j),
            _ => 0.0,
        }
    }

    fn gain(&self, j: usize, state: &GreedyState, costs: &[f64], importance: &[f64]) -> f64 {
        let density = importance[j] / costs[j];
        if self.pure_importance() || !self.has_vector(j) {
            return density;
        }
        let coverage_gain: f64 = importance
            .iter()
            .zip(&state.coverage)
            .enumerate()
            .map(|(i, (imp, cov))| imp * (self.similarity(i, j) - cov).max(0.0))
            .sum();
        let diversity = coverage_gain / costs[j];
        self.mixing_weight * density + (1.0 - self.mixing_weight) * diversity
    }

    /// One iteration: pick the best fitting candidate and fold it into the state.
    fn step(
        &self,
        state: GreedyState,
        segments: &[Segment],
        costs: &[f64],
        importance: &[f64],
        budget_time: f64,
    ) -> ControlFlow<GreedyState, GreedyState> {
        let mut best: Option<(usize, f64)> = None;
        for j in 0..segments.len() {
            if state.taken[j] || !(costs[j] > 0.0) || state.total_time + costs[j] > budget_time {
                continue;
            }
            let gain = self.gain(j, &state, costs, importance);
            if gain.is_nan() {
                continue;
            }
            let better = match best {
                None => true,
                Some((b, best_gain)) => {
                    gain > best_gain
                        || (gain == best_gain && segments[j].segment_id < segments[b].segment_id)
                }
            };
            if better {
                best = Some((j, gain));
            }
        }

        let Some((chosen, gain)) = best else {
            return ControlFlow::Break(state);
        };
        debug!(
            "[SELECT] Greedy pick: segment {} (gain {:.4})",
            segments[chosen].segment_id, gain
        );

        let mut next = state;
        next.picked.push(chosen);
        next.taken[chosen] = true;
        next.total_time += costs[chosen];
        if !self.pure_importance() {
            next.coverage = next
                .coverage
                .iter()
                .enumerate()
                .map(|(i, cov)| cov.max(self.similarity(i, chosen)))
                .collect();
        }
        ControlFlow::Continue(next)
    }
}

impl SegmentSelector for GreedySelector<'_> {
    fn select(&self, segments: &[Segment], budget_time: f64) -> Selection {
        if segments.is_empty() || !(budget_time > 0.0) {
            return Selection::empty();
        }
        let costs: Vec<f64> = segments.iter().map(|s| s.duration()).collect();
        let importance: Vec<f64> = segments.iter().map(|s| s.combined_score()).collect();

        let mut state = GreedyState::new(segments.len());
        let done = loop {
            match self.step(state, segments, &costs, &importance, budget_time) {
                ControlFlow::Continue(next) => state = next,
                ControlFlow::Break(done) => break done,
            }
        };

        Selection {
            segment_ids: done.picked.iter().map(|&i| segments[i].segment_id).collect(),
            total_time: done.total_time,
            total_value: done.picked.iter().map(|&i| importance[i]).sum(),
        }
    }
}

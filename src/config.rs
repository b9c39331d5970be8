// SYNOID Digest - Configuration
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Every knob the source pipelines hard-coded in separate variants (strategy,
// overlap policy, margins, epsilon) lives here as an explicit value.

use serde::{Deserialize, Serialize};
use std::fs;
use std::str::FromStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{DigestError, DigestResult};

const CONFIG_FILE_NAME: &str = "digest_config.json";
const CONFIG_ENV_VAR: &str = "SYNOID_DIGEST_CONFIG";

/// Which budget selector to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Exact 0/1 knapsack over frame-discretized durations.
    Knapsack,
    /// Greedy submodular knapsack with the diversity term.
    Greedy,
}

impl FromStr for SelectionStrategy {
    type Err = DigestError;

    fn from_str(s: &str) -> DigestResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "knapsack" | "dp" | "exact" => Ok(Self::Knapsack),
            "greedy" | "submodular" => Ok(Self::Greedy),
            _ => Err(DigestError::UnknownOption {
                field: "strategy",
                value: s.to_string(),
                expected: "knapsack, greedy",
            }),
        }
    }
}

/// How much a transcript cue must overlap a segment to pull its boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Any non-zero overlap qualifies.
    AnyOverlap,
    /// Overlap must be at least `seconds`.
    MinOverlap { seconds: f64 },
}

impl OverlapPolicy {
    pub fn qualifies(&self, overlap: f64) -> bool {
        match self {
            Self::AnyOverlap => overlap > 0.0,
            Self::MinOverlap { seconds } => overlap > 0.0 && overlap >= *seconds,
        }
    }
}

/// Ordering of the emitted segment list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputOrder {
    StartTime,
    /// Original filmstrip order.
    SegmentId,
}

impl FromStr for OutputOrder {
    type Err = DigestError;

    fn from_str(s: &str) -> DigestResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "start" | "start_time" | "time" => Ok(Self::StartTime),
            "id" | "segment_id" | "filmstrip" => Ok(Self::SegmentId),
            _ => Err(DigestError::UnknownOption {
                field: "order",
                value: s.to_string(),
                expected: "start, id",
            }),
        }
    }
}

/// Digest engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    /// Weight of the mean frame score in the combined score.
    pub alpha: f64,
    /// Penalty applied to the frame score standard deviation.
    pub std_weight: f64,
    /// Fraction of the video length to keep. Mutually exclusive with `budget_time`.
    pub top_ratio: Option<f64>,
    /// Absolute summary length in seconds. Mutually exclusive with `top_ratio`.
    pub budget_time: Option<f64>,
    pub strategy: SelectionStrategy,
    /// λ: 1.0 is pure importance density, 0.0 is pure coverage.
    pub mixing_weight: f64,
    /// Frame sampling rate of the score track (frames per second).
    pub fps: f64,
    pub min_duration: f64,
    pub boundary_margin_before: f64,
    pub boundary_margin_after: f64,
    pub overlap_policy: OverlapPolicy,
    pub overlap_epsilon: f64,
    pub round_boundaries: bool,
    pub output_order: OutputOrder,
    /// Clip mode: number of clips to keep.
    pub top_n: usize,
    /// Clip mode: shortest acceptable clip in seconds.
    pub min_clip_duration: f64,
    /// Worker threads for per-segment stages.
    pub threads: usize,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            alpha: 0.7,
            std_weight: 0.3,
            top_ratio: Some(0.2),
            budget_time: None,
            strategy: SelectionStrategy::Greedy,
            mixing_weight: 1.0,
            fps: 1.0,
            min_duration: 0.5,
            boundary_margin_before: 0.2,
            boundary_margin_after: 0.35,
            overlap_policy: OverlapPolicy::AnyOverlap,
            overlap_epsilon: 0.01,
            round_boundaries: true,
            output_order: OutputOrder::StartTime,
            top_n: 10,
            min_clip_duration: 3.0,
            threads: num_cpus::get(),
        }
    }
}

impl DigestConfig {
    /// Load from an explicit path, `$SYNOID_DIGEST_CONFIG`, the working
    /// directory, or the platform config dir, falling back to defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            let config = Self::read(path)?;
            info!("[DIGEST] Loaded config from {:?}", path);
            return Ok(config);
        }

        for path in Self::candidate_paths() {
            if !path.exists() {
                continue;
            }
            match Self::read(&path) {
                Ok(config) => {
                    info!("[DIGEST] Loaded config from {:?}", path);
                    return Ok(config);
                }
                Err(e) => warn!("[DIGEST] Ignoring unreadable config {:?}: {}", path, e),
            }
        }

        info!("[DIGEST] Using default config");
        Ok(Self::default())
    }

    fn read(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse config {:?}", path))
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
            paths.push(PathBuf::from(env_path));
        }
        paths.push(PathBuf::from(CONFIG_FILE_NAME));
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("synoid").join(CONFIG_FILE_NAME));
        }
        paths
    }

    /// Reject values outside their documented ranges.
    pub fn validate(&self) -> DigestResult<()> {
        check(self.alpha, "alpha", (0.0..=1.0).contains(&self.alpha), "must be in [0, 1]")?;
        check(self.std_weight, "std_weight", self.std_weight >= 0.0, "must be >= 0")?;
        check(
            self.mixing_weight,
            "mixing_weight",
            (0.0..=1.0).contains(&self.mixing_weight),
            "must be in [0, 1]",
        )?;
        check(self.fps, "fps", self.fps > 0.0 && self.fps.is_finite(), "must be > 0")?;
        check(self.min_duration, "min_duration", self.min_duration >= 0.0, "must be >= 0")?;
        check(
            self.boundary_margin_before,
            "boundary_margin_before",
            self.boundary_margin_before >= 0.0,
            "must be >= 0",
        )?;
        check(
            self.boundary_margin_after,
            "boundary_margin_after",
            self.boundary_margin_after >= 0.0,
            "must be >= 0",
        )?;
        check(self.overlap_epsilon, "overlap_epsilon", self.overlap_epsilon > 0.0, "must be > 0")?;
        if let OverlapPolicy::MinOverlap { seconds } = self.overlap_policy {
            check(seconds, "overlap_policy.seconds", seconds >= 0.0, "must be >= 0")?;
        }
        if let Some(ratio) = self.top_ratio {
            check(ratio, "top_ratio", ratio > 0.0 && ratio <= 1.0, "must be in (0, 1]")?;
        }
        if let Some(budget) = self.budget_time {
            check(budget, "budget_time", budget > 0.0 && budget.is_finite(), "must be > 0")?;
        }
        Ok(())
    }
}

fn check(value: f64, field: &'static str, ok: bool, reason: &'static str) -> DigestResult<()> {
    if ok {
        Ok(())
    } else {
        Err(DigestError::InvalidConfig {
            field,
            value,
            reason,
        })
    }
}

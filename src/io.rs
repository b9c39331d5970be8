// SYNOID Digest - Artifact I/O
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Async loaders for the JSON artifacts produced by the upstream stages
// (scene detection, scoring, feature extraction, transcription).

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use crate::engine::pipeline::FeatureSource;
use crate::engine::similarity::FeatureMatrix;
use crate::segment::{OutputSegment, Segment, SegmentId, TranscriptCue};

/// Bare list or `{"segments": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Listed<T> {
    Bare(Vec<T>),
    Wrapped { segments: Vec<T> },
}

impl<T> Listed<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::Bare(items) | Self::Wrapped { segments: items } => items,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScoresFile {
    Bare(Vec<f64>),
    Wrapped { scores: Vec<f64> },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FeaturesFile {
    PerFrame(Vec<Vec<f64>>),
    PerSegment(HashMap<String, Vec<f64>>),
    Wrapped { features: Vec<Vec<f64>> },
}

#[derive(Deserialize)]
struct RawCue {
    start: f64,
    end: f64,
    #[serde(default)]
    text: String,
}

async fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {} file {:?}", what, path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {} file {:?}", what, path))
}

pub async fn load_segments(path: &Path) -> Result<Vec<Segment>> {
    let segments = read_json::<Listed<Segment>>(path, "segments").await?.into_vec();
    info!("[DIGEST] Loaded {} segments from {:?}", segments.len(), path);
    Ok(segments)
}

/// Cut list written by a previous `summarize` run, or a bare list of records.
pub async fn load_selected(path: &Path) -> Result<Vec<OutputSegment>> {
    Ok(read_json::<Listed<OutputSegment>>(path, "selection").await?.into_vec())
}

pub async fn load_scores(path: &Path) -> Result<Vec<f64>> {
    let scores = match read_json::<ScoresFile>(path, "scores").await? {
        ScoresFile::Bare(s) | ScoresFile::Wrapped { scores: s } => s,
    };
    info!("[DIGEST] Loaded {} frame scores from {:?}", scores.len(), path);
    Ok(scores)
}

pub async fn load_features(path: &Path) -> Result<FeatureSource> {
    let source = match read_json::<FeaturesFile>(path, "features").await? {
        FeaturesFile::PerFrame(rows) | FeaturesFile::Wrapped { features: rows } => {
            info!("[DIGEST] Loaded {} feature frames from {:?}", rows.len(), path);
            FeatureSource::PerFrame(FeatureMatrix::new(rows))
        }
        FeaturesFile::PerSegment(raw) => {
            let map = raw
                .into_iter()
                .map(|(id, v)| {
                    id.trim()
                        .parse::<SegmentId>()
                        .map(|id| (id, v))
                        .with_context(|| format!("Bad segment id {:?} in {:?}", id, path))
                })
                .collect::<Result<HashMap<_, _>>>()?;
            info!("[DIGEST] Loaded {} segment vectors from {:?}", map.len(), path);
            FeatureSource::PerSegment(map)
        }
    };
    Ok(source)
}

/// Whisper-style cues. Blank or inverted cues are skipped.
pub async fn load_cues(path: &Path) -> Result<Vec<TranscriptCue>> {
    let raw = read_json::<Listed<RawCue>>(path, "transcript").await?.into_vec();
    let total = raw.len();
    let cues: Vec<TranscriptCue> = raw
        .into_iter()
        .filter_map(|c| TranscriptCue::new(c.start, c.end, &c.text))
        .collect();
    if cues.len() < total {
        warn!("[DIGEST] Skipped {} unusable transcript cues", total - cues.len());
    }
    info!("[DIGEST] Loaded {} transcript cues from {:?}", cues.len(), path);
    Ok(cues)
}

pub async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {:?}", parent))?;
    }
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {:?}", path))?;
    info!("[DIGEST] Wrote {:?}", path);
    Ok(())
}

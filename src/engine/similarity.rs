// SYNOID Digest - Similarity Index
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Pairwise cosine similarity between segment content vectors. Only the
// diversity branch of the greedy selector reads it.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::engine::aggregate::frame_window;
use crate::error::{DigestError, DigestWarning};
use crate::segment::{Segment, SegmentId};

/// Symmetric N×N cosine-similarity matrix, row-major.
///
/// Segments without a usable vector have an all-zero row and column,
/// diagonal included, so they never boost or block a selection.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityIndex {
    n: usize,
    matrix: Vec<f64>,
    present: Vec<bool>,
}

impl SimilarityIndex {
    /// Index over `segments` in the given order.
    pub fn from_segments(segments: &[Segment]) -> (Self, Vec<DigestWarning>) {
        let entries: Vec<(SegmentId, Option<&[f64]>)> = segments
            .iter()
            .map(|s| (s.segment_id, s.feature_vector.as_deref()))
            .collect();
        Self::build(&entries)
    }

    pub fn build(entries: &[(SegmentId, Option<&[f64]>)]) -> (Self, Vec<DigestWarning>) {
        let n = entries.len();
        let mut warnings = Vec::new();
        let reference_dim = entries.iter().find_map(|(_, v)| v.map(|v| v.len()));

        let units: Vec<Option<Vec<f64>>> = entries
            .iter()
            .map(|(id, vector)| match (vector, reference_dim) {
                (Some(v), Some(dim)) if v.len() == dim => unit(v),
                (Some(v), Some(dim)) => {
                    let mismatch = DigestError::DimensionMismatch {
                        segment_id: *id,
                        expected: dim,
                        found: v.len(),
                    };
                    warn!("[SIMILARITY] {}; treating as missing", mismatch);
                    warnings.extend(mismatch.into_warning());
                    None
                }
                _ => {
                    warnings.push(DigestWarning::MissingFeatureVector { segment_id: *id });
                    None
                }
            })
            .collect();

        let matrix: Vec<f64> = (0..n)
            .into_par_iter()
            .flat_map_iter(|i| {
                let units = &units;
                (0..n).map(move |j| match (&units[i], &units[j]) {
                    (Some(_), Some(_)) if i == j => 1.0,
                    (Some(a), Some(b)) => dot(a, b),
                    _ => 0.0,
                })
            })
            .collect();

        let present = units.iter().map(Option::is_some).collect();
        debug!(
            "[SIMILARITY] Built {}x{} index (dim {:?})",
            n, n, reference_dim
        );
        (Self { n, matrix, present }, warnings)
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Whether segment `i` had a usable vector when the index was built.
    pub fn has_vector(&self, i: usize) -> bool {
        self.present.get(i).copied().unwrap_or(false)
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.matrix[i * self.n + j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.matrix[i * self.n..(i + 1) * self.n]
    }
}

/// Cosine similarity; zero when either vector has zero norm.
pub fn cosine(a: &[f64], b: &[f64]) -> f64 {
    match (unit(a), unit(b)) {
        (Some(a), Some(b)) if a.len() == b.len() => dot(&a, &b),
        _ => 0.0,
    }
}

fn unit(v: &[f64]) -> Option<Vec<f64>> {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 && norm.is_finite() {
        Some(v.iter().map(|x| x / norm).collect())
    } else {
        None
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Per-frame content features, one row per sampled frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    pub fn new(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }

    pub fn frames(&self) -> usize {
        self.rows.len()
    }

    /// Mean of the frame rows covering `[start, end]`, clipped to the matrix.
    pub fn mean_pool(&self, start_time: f64, end_time: f64, fps: f64) -> Option<Vec<f64>> {
        let (first, last) = frame_window(self.rows.len(), start_time, end_time, fps)?;
        let window = &self.rows[first..=last];
        let dim = window[0].len();
        if window.iter().any(|r| r.len() != dim) {
            return None;
        }
        let mut mean = vec![0.0; dim];
        for row in window {
            for (acc, x) in mean.iter_mut().zip(row) {
                *acc += x;
            }
        }
        let count = window.len() as f64;
        mean.iter_mut().for_each(|x| *x /= count);
        Some(mean)
    }

    /// Fill `feature_vector` for segments that have none.
    pub fn attach(&self, segments: &mut [Segment], fps: f64) {
        for seg in segments.iter_mut().filter(|s| s.feature_vector.is_none()) {
            seg.feature_vector = self.mean_pool(seg.start_time, seg.end_time, fps);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_is_symmetric_with_unit_diagonal() {
        let a = [1.0, 0.0];
        let b = [1.0, 1.0];
        let c = [0.0, 2.0];
        let (index, warnings) =
            SimilarityIndex::build(&[(0, Some(&a[..])), (1, Some(&b[..])), (2, Some(&c[..]))]);
        assert!(warnings.is_empty());
        for i in 0..3 {
            assert_eq!(index.get(i, i), 1.0);
            for j in 0..3 {
                assert!((index.get(i, j) - index.get(j, i)).abs() < 1e-12);
            }
        }
        assert!((index.get(0, 1) - 1.0 / 2f64.sqrt()).abs() < 1e-9);
        assert_eq!(index.get(0, 2), 0.0);
    }

    #[test]
    fn test_missing_and_mismatched_vectors_are_zeroed() {
        let a = [1.0, 0.0];
        let bad = [1.0, 0.0, 0.0];
        let (index, warnings) = SimilarityIndex::build(&[(0, Some(&a[..])), (1, None), (2, Some(&bad[..]))]);
        assert_eq!(index.row(1), &[0.0, 0.0, 0.0]);
        assert_eq!(index.row(2), &[0.0, 0.0, 0.0]);
        assert_eq!(index.get(0, 0), 1.0);
        assert!(index.has_vector(0));
        assert!(!index.has_vector(1));
        assert!(!index.has_vector(2));
        assert_eq!(
            warnings,
            vec![
                DigestWarning::MissingFeatureVector { segment_id: 1 },
                DigestWarning::DimensionMismatch {
                    segment_id: 2,
                    expected: 2,
                    found: 3
                },
            ]
        );
    }

    #[test]
    fn test_zero_norm_vector_never_matches() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        let z = [0.0, 0.0];
        let (index, _) = SimilarityIndex::build(&[(0, Some(&z[..]))]);
        assert_eq!(index.get(0, 0), 0.0);
    }

    #[test]
    fn test_mean_pool_clips_to_matrix() {
        let features = FeatureMatrix::new(vec![vec![0.0, 2.0], vec![2.0, 4.0], vec![4.0, 6.0]]);
        assert_eq!(features.mean_pool(1.0, 9.0, 1.0), Some(vec![3.0, 5.0]));
        assert_eq!(features.mean_pool(0.0, 0.5, 1.0), Some(vec![0.0, 2.0]));
        assert_eq!(features.mean_pool(5.0, 6.0, 1.0), None);
    }
}

// SYNOID Digest - Overlap Resolver
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Refinement can push neighbouring segments into each other. One sorted sweep
// trims each trailing overlap and drops whatever becomes degenerate.

use tracing::{debug, info, warn};

use crate::config::DigestConfig;
use crate::error::{DigestError, DigestWarning};
use crate::segment::{round_centis, Segment};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapResolver {
    pub min_duration: f64,
    pub epsilon: f64,
    pub round_boundaries: bool,
}

impl OverlapResolver {
    pub fn new(min_duration: f64, epsilon: f64) -> Self {
        Self {
            min_duration,
            epsilon,
            round_boundaries: false,
        }
    }

    pub fn from_config(config: &DigestConfig) -> Self {
        Self {
            min_duration: config.min_duration,
            epsilon: config.overlap_epsilon,
            round_boundaries: config.round_boundaries,
        }
    }

    /// End time that stops `epsilon` short of `next_start`.
    fn trimmed_end(&self, next_start: f64) -> f64 {
        let target = next_start - self.epsilon;
        if !self.round_boundaries {
            return target;
        }
        let rounded = round_centis(target);
        if rounded > next_start {
            (target * 100.0).floor() / 100.0
        } else {
            rounded
        }
    }

    /// Returns segments sorted by `(start_time, segment_id)` with no overlaps.
    ///
    /// Segments shorter than `min_duration` are dropped before the sweep. A
    /// trimmed segment may end up slightly shorter than that and is kept.
    pub fn resolve(&self, segments: Vec<Segment>) -> (Vec<Segment>, Vec<DigestWarning>) {
        let mut warnings = Vec::new();
        let input_count = segments.len();

        let mut kept: Vec<Segment> = segments
            .into_iter()
            .filter(|seg| {
                let duration = seg.duration();
                if duration > 0.0 && duration >= self.min_duration {
                    return true;
                }
                debug!(
                    "[OVERLAP] Dropping segment {} ({:.2}s < {:.2}s)",
                    seg.segment_id, duration, self.min_duration
                );
                warnings.push(DigestWarning::BelowMinDuration {
                    segment_id: seg.segment_id,
                    duration,
                });
                false
            })
            .collect();

        kept.sort_by(|a, b| {
            a.start_time
                .total_cmp(&b.start_time)
                .then(a.segment_id.cmp(&b.segment_id))
        });

        let next_starts: Vec<Option<f64>> = (0..kept.len())
            .map(|i| kept.get(i + 1).map(|next| next.start_time))
            .collect();

        let mut trimmed = 0usize;
        let resolved: Vec<Segment> = kept
            .into_iter()
            .zip(next_starts)
            .filter_map(|(mut seg, next_start)| {
                match next_start {
                    Some(next_start) if seg.end_time > next_start => {
                        seg.end_time = self.trimmed_end(next_start);
                        trimmed += 1;
                    }
                    _ => return Some(seg),
                }
                if seg.end_time <= seg.start_time {
                    let degenerate = DigestError::DegenerateInterval {
                        segment_id: seg.segment_id,
                        start_time: seg.start_time,
                        end_time: seg.end_time,
                    };
                    warn!("[OVERLAP] {}; dropped", degenerate);
                    warnings.extend(degenerate.into_warning());
                    return None;
                }
                Some(seg)
            })
            .collect();

        info!(
            "[OVERLAP] {} in, {} out, {} trimmed",
            input_count,
            resolved.len(),
            trimmed
        );
        (resolved, warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ends(segments: &[Segment]) -> Vec<(u32, f64, f64)> {
        segments
            .iter()
            .map(|s| (s.segment_id, s.start_time, s.end_time))
            .collect()
    }

    #[test]
    fn test_trailing_overlap_is_trimmed() {
        let resolver = OverlapResolver::new(0.5, 0.01);
        let (out, warnings) = resolver.resolve(vec![
            Segment::new(2, 15.0, 20.0),
            Segment::new(1, 10.0, 16.55),
        ]);
        assert!(warnings.is_empty());
        assert_eq!(out[0].segment_id, 1);
        assert!((out[0].end_time - 14.99).abs() < 1e-9);
        assert_eq!(out[1].start_time, 15.0);
    }

    #[test]
    fn test_short_and_swallowed_segments_are_dropped() {
        let resolver = OverlapResolver::new(1.0, 0.01);
        let (out, warnings) = resolver.resolve(vec![
            Segment::new(0, 0.0, 0.4),
            Segment::new(1, 5.0, 9.0),
            // Same start as 1 but a larger id: 1 gets trimmed to nothing.
            Segment::new(2, 5.0, 8.0),
        ]);
        assert_eq!(ends(&out), vec![(2, 5.0, 8.0)]);
        assert_eq!(
            warnings,
            vec![
                DigestWarning::BelowMinDuration {
                    segment_id: 0,
                    duration: 0.4
                },
                DigestWarning::DroppedByTrim { segment_id: 1 },
            ]
        );
    }

    #[test]
    fn test_zero_length_never_survives() {
        let resolver = OverlapResolver::new(0.0, 0.01);
        let (out, _) = resolver.resolve(vec![Segment::new(3, 4.0, 4.0)]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut resolver = OverlapResolver::new(0.5, 0.01);
        resolver.round_boundaries = true;
        let input = vec![
            Segment::new(0, 0.0, 6.2),
            Segment::new(1, 6.0, 12.0),
            Segment::new(2, 11.0, 18.0),
            Segment::new(3, 30.0, 31.0),
        ];
        let (once, _) = resolver.resolve(input);
        let (twice, warnings) = resolver.resolve(once.clone());
        assert_eq!(once, twice);
        assert!(warnings.is_empty());
        for pair in once.windows(2) {
            assert!(pair[0].end_time <= pair[1].start_time);
        }
    }

    #[test]
    fn test_rounded_trim_never_crosses_next_start() {
        let mut resolver = OverlapResolver::new(0.0, 0.001);
        resolver.round_boundaries = true;
        let (out, _) = resolver.resolve(vec![Segment::new(0, 0.0, 20.0), Segment::new(1, 15.006, 18.0)]);
        assert!(out[0].end_time <= 15.006);
        assert_eq!(out[0].end_time, 15.0);
    }
}

use thiserror::Error;

use crate::landmarks::LandmarkSet;

/// Mean per-landmark distance below which two poses count as a match, in the
/// same normalized units the estimator emits. Not derived from calibration;
/// override per deployment via `--threshold`.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.3;

#[derive(Debug, Error)]
pub enum CompareError {
    #[error("landmark sets differ in length (live: {live}, reference: {reference})")]
    LengthMismatch { live: usize, reference: usize },
}

/// Score similarity between a live landmark set and a reference landmark set.
///
/// Absence of either set is a valid "no match" signal, not an error. A length
/// mismatch breaks positional correspondence and would silently corrupt the
/// score, so it is surfaced as [`CompareError::LengthMismatch`] instead.
pub fn compare_poses(
    live: Option<&LandmarkSet>,
    reference: Option<&LandmarkSet>,
    threshold: f32,
) -> Result<bool, CompareError> {
    let (live, reference) = match (live, reference) {
        (Some(live), Some(reference)) => (live, reference),
        _ => return Ok(false),
    };

    if live.len() != reference.len() {
        return Err(CompareError::LengthMismatch {
            live: live.len(),
            reference: reference.len(),
        });
    }
    if live.is_empty() {
        return Ok(false);
    }

    let total: f32 = live
        .points()
        .iter()
        .zip(reference.points())
        .map(|(a, b)| {
            let dx = a[0] - b[0];
            let dy = a[1] - b[1];
            let dz = a[2] - b[2];
            (dx * dx + dy * dy + dz * dz).sqrt()
        })
        .sum();
    let mean = total / live.len() as f32;

    Ok(mean < threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_set(value: f32, len: usize) -> LandmarkSet {
        LandmarkSet::from_points(vec![[value, value, value]; len])
    }

    #[test]
    fn identical_sets_match() {
        let set = uniform_set(0.5, 33);
        assert!(compare_poses(Some(&set), Some(&set), DEFAULT_MATCH_THRESHOLD).unwrap());
    }

    #[test]
    fn distant_sets_do_not_match() {
        let live = uniform_set(0.0, 33);
        // Every point is 0.5 * sqrt(3) ~ 0.87 away, well past the threshold.
        let reference = uniform_set(0.5, 33);
        assert!(!compare_poses(Some(&live), Some(&reference), DEFAULT_MATCH_THRESHOLD).unwrap());
    }

    #[test]
    fn absent_sets_never_match() {
        let set = uniform_set(0.5, 33);
        assert!(!compare_poses(None, Some(&set), DEFAULT_MATCH_THRESHOLD).unwrap());
        assert!(!compare_poses(Some(&set), None, DEFAULT_MATCH_THRESHOLD).unwrap());
        assert!(!compare_poses(None, None, DEFAULT_MATCH_THRESHOLD).unwrap());
    }

    #[test]
    fn threshold_is_strict() {
        let live = uniform_set(0.0, 4);
        let reference = LandmarkSet::from_points(vec![[0.3, 0.0, 0.0]; 4]);
        // Mean distance is exactly 0.3, which must not count as a match.
        assert!(!compare_poses(Some(&live), Some(&reference), 0.3).unwrap());
        assert!(compare_poses(Some(&live), Some(&reference), 0.31).unwrap());
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let live = uniform_set(0.5, 33);
        let reference = uniform_set(0.5, 17);
        let err = compare_poses(Some(&live), Some(&reference), DEFAULT_MATCH_THRESHOLD)
            .unwrap_err();
        assert!(matches!(
            err,
            CompareError::LengthMismatch {
                live: 33,
                reference: 17
            }
        ));
    }
}

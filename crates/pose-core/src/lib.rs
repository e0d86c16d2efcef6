//! Landmark data model, pose similarity scoring, and the estimator boundary.
//!
//! Nothing in this crate touches the camera or the HTTP layer; it only deals
//! with normalized landmark sets and images handed to it as raw RGB buffers.

pub use compare::{CompareError, DEFAULT_MATCH_THRESHOLD, compare_poses};
pub use estimator::{BlazePoseEstimator, PoseEstimator};
pub use landmarks::{LANDMARK_COUNT, LandmarkSet, POSE_CONNECTIONS};

mod compare;
mod estimator;
mod landmarks;

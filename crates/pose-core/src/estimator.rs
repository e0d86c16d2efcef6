//! Body-landmark estimator boundary.
//!
//! The pipeline only depends on [`PoseEstimator`]; the production
//! implementation wraps a BlazePose-style landmark model through ONNX
//! Runtime. The model contract is 33 landmarks per detected body, in a fixed
//! anatomical order, with x/y/z emitted in input-image pixel units.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use image::{RgbImage, imageops::FilterType};
use ndarray::Array4;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;
use tracing::debug;

use crate::landmarks::{LANDMARK_COUNT, LandmarkSet};

/// Black-box capability: image in, ordered landmark set (or nothing) out.
///
/// Implementations must keep the landmark count and order stable across
/// calls; the comparator relies on positional correspondence.
pub trait PoseEstimator {
    /// Estimate body landmarks from a tightly packed RGB8 buffer.
    ///
    /// Returns `Ok(None)` when no body is detected — absence is a valid
    /// result, not an error.
    fn estimate(&mut self, rgb: &[u8], width: u32, height: u32) -> Result<Option<LandmarkSet>>;
}

/// Pose presence score below which a frame counts as "no body detected".
const PRESENCE_THRESHOLD: f32 = 0.5;

/// Values per landmark in the model output: x, y, z, visibility, presence.
const VALUES_PER_LANDMARK: usize = 5;

/// BlazePose landmark model running on ONNX Runtime.
pub struct BlazePoseEstimator {
    session: Session,
    input_size: u32,
}

impl BlazePoseEstimator {
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(2)?
            .commit_from_file(model_path.as_ref())
            .with_context(|| {
                format!(
                    "failed to load pose model from {}",
                    model_path.as_ref().display()
                )
            })?;

        Ok(Self {
            session,
            input_size: 256,
        })
    }

    /// Resize to the square model input and normalize to `[0, 1]` NHWC.
    fn prepare_input(&self, rgb: &[u8], width: u32, height: u32) -> Result<Array4<f32>> {
        let expected = (width as usize) * (height as usize) * 3;
        if rgb.len() != expected {
            return Err(anyhow!(
                "frame buffer size mismatch: got {}, expected {}",
                rgb.len(),
                expected
            ));
        }

        let image = RgbImage::from_raw(width, height, rgb.to_vec())
            .ok_or_else(|| anyhow!("failed to wrap frame buffer as image"))?;
        let side = self.input_size;
        let resized = image::imageops::resize(&image, side, side, FilterType::Triangle);

        let normalized: Vec<f32> = resized
            .into_raw()
            .into_iter()
            .map(|value| value as f32 / 255.0)
            .collect();

        Array4::from_shape_vec((1, side as usize, side as usize, 3), normalized)
            .context("failed to shape model input tensor")
    }
}

impl PoseEstimator for BlazePoseEstimator {
    fn estimate(&mut self, rgb: &[u8], width: u32, height: u32) -> Result<Option<LandmarkSet>> {
        let input = self.prepare_input(rgb, width, height)?;
        let tensor = Tensor::from_array(input)?;

        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .context("pose landmark inference failed")?;
        if outputs.len() < 2 {
            return Err(anyhow!(
                "pose model returned {} outputs, expected landmarks and presence score",
                outputs.len()
            ));
        }

        // Output 0: [1, 33 * 5] raw landmarks, output 1: [1, 1] presence.
        let landmarks = outputs[0].try_extract_array::<f32>()?;
        let presence = outputs[1].try_extract_array::<f32>()?;

        let score = presence
            .iter()
            .next()
            .copied()
            .ok_or_else(|| anyhow!("pose model emitted an empty presence tensor"))?;
        if score < PRESENCE_THRESHOLD {
            debug!("no body detected (presence {score:.3})");
            return Ok(None);
        }

        let raw = landmarks
            .as_slice()
            .ok_or_else(|| anyhow!("landmark tensor not contiguous"))?;
        if raw.len() < LANDMARK_COUNT * VALUES_PER_LANDMARK {
            return Err(anyhow!(
                "landmark tensor too short: got {} values, expected {}",
                raw.len(),
                LANDMARK_COUNT * VALUES_PER_LANDMARK
            ));
        }

        let scale = self.input_size as f32;
        let points = raw
            .chunks_exact(VALUES_PER_LANDMARK)
            .take(LANDMARK_COUNT)
            .map(|chunk| [chunk[0] / scale, chunk[1] / scale, chunk[2] / scale])
            .collect();

        Ok(Some(LandmarkSet::from_points(points)))
    }
}

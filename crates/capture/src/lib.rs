//! Camera acquisition boundary.
//!
//! One [`Webcam`] handle maps to one exclusive device session; the pipeline
//! never shares a frame or a handle across sessions. Everything upstream
//! programs against [`FrameSource`] so the device can be stubbed in tests.

pub use types::{CaptureError, Frame, FrameSource};
pub use webcam::Webcam;

mod types;
mod webcam;

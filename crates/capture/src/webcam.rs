//! Nokhwa-backed webcam capture.

use anyhow::anyhow;
use chrono::Utc;
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
};
use tracing::debug;

use crate::types::{CaptureError, Frame, FrameSource};

/// Exclusive handle on a local camera device.
///
/// The stream is opened eagerly so an unavailable device fails at
/// construction, before the session produces any output. Dropping the handle
/// stops the stream and releases the device.
pub struct Webcam {
    camera: Camera,
    device: String,
}

impl Webcam {
    /// Open camera `index`, optionally requesting a capture resolution.
    pub fn open(index: u32, resolution: Option<(u32, u32)>) -> Result<Self, CaptureError> {
        let device = format!("camera #{index}");
        let requested = match resolution {
            Some((width, height)) => {
                RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
                    Resolution::new(width, height),
                    FrameFormat::MJPEG,
                    30,
                )))
            }
            None => {
                RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate)
            }
        };

        let mut camera = Camera::new(CameraIndex::Index(index), requested).map_err(|err| {
            debug!("{device}: {err}");
            CaptureError::Open {
                device: device.clone(),
            }
        })?;
        camera.open_stream().map_err(|err| {
            debug!("{device}: {err}");
            CaptureError::Open {
                device: device.clone(),
            }
        })?;

        let format = camera.camera_format();
        debug!("{device} opened at {}x{}", format.width(), format.height());

        Ok(Self { camera, device })
    }
}

impl FrameSource for Webcam {
    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        let buffer = self
            .camera
            .frame()
            .map_err(|err| anyhow!("{}: {err}", self.device))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|err| anyhow!("{}: decode failed: {err}", self.device))?;

        let (width, height) = decoded.dimensions();
        let data = decoded.into_raw();
        if data.is_empty() {
            return Err(CaptureError::Read(anyhow!(
                "{}: empty frame buffer",
                self.device
            )));
        }

        Ok(Frame {
            data,
            width,
            height,
            timestamp_ms: Utc::now().timestamp_millis(),
        })
    }
}

impl Drop for Webcam {
    fn drop(&mut self) {
        if let Err(err) = self.camera.stop_stream() {
            debug!("{}: stop_stream failed on release: {err}", self.device);
        }
    }
}

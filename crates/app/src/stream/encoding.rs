//! JPEG encoding and multipart framing for the MJPEG stream.

use anyhow::{Result, anyhow};
use image::{RgbImage, codecs::jpeg::JpegEncoder};

/// Boundary token announced in the `multipart/x-mixed-replace` content type.
pub(crate) const MULTIPART_BOUNDARY: &str = "frame";

/// Encoding stage of the session loop.
///
/// Like the capture and estimator boundaries, kept behind a trait so the
/// loop's failure handling can be exercised without a real codec.
pub(crate) trait FrameEncoder {
    fn encode(&mut self, image: &RgbImage) -> Result<Vec<u8>>;
}

/// Production encoder: JPEG at a fixed quality.
pub(crate) struct JpegFrameEncoder {
    quality: u8,
}

impl JpegFrameEncoder {
    pub(crate) fn new(quality: u8) -> Self {
        Self { quality }
    }
}

impl FrameEncoder for JpegFrameEncoder {
    fn encode(&mut self, image: &RgbImage) -> Result<Vec<u8>> {
        encode_jpeg(image, self.quality)
    }
}

pub(crate) fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
        .encode_image(image)
        .map_err(|err| anyhow!("JPEG encode failed: {err}"))?;
    Ok(buffer)
}

/// Frame one encoded image as a part of the multipart body.
///
/// The byte layout is fixed for client compatibility: boundary line, a
/// `Content-Type` header, a blank line, the image bytes, then a line break.
/// The stream never carries a closing terminator; it ends with the
/// connection.
pub(crate) fn multipart_chunk(jpeg: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(jpeg.len() + 48);
    payload.extend_from_slice(b"--frame\r\n");
    payload.extend_from_slice(b"Content-Type: image/jpeg\r\n\r\n");
    payload.extend_from_slice(jpeg);
    payload.extend_from_slice(b"\r\n");
    payload
}

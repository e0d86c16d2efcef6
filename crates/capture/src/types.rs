use thiserror::Error;

/// Raw RGB8 frame captured from a video source.
pub struct Frame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp_ms: i64,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    /// The device could not be opened at all. Fatal for the session.
    #[error("failed to open capture device {device:?}")]
    Open { device: String },
    /// A single read failed. Recoverable: skip the frame and retry.
    #[error("frame read failed: {0}")]
    Read(#[from] anyhow::Error),
}

/// Source of frames for one streaming session.
///
/// A source is exclusively owned by its session; dropping it releases the
/// underlying device.
pub trait FrameSource {
    fn read_frame(&mut self) -> Result<Frame, CaptureError>;
}

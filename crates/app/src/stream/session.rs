//! Per-client streaming session.
//!
//! A session exclusively owns one capture handle and one estimator for the
//! lifetime of a streaming connection. The reference landmarks are computed
//! once from the catalog snapshot taken at session start; later cursor moves
//! only affect sessions started afterwards.

use anyhow::{Context, Result};
use capture::{FrameSource, Webcam};
use pose_core::{BlazePoseEstimator, LandmarkSet, PoseEstimator, compare_poses};
use tokio::sync::mpsc::Sender;
use tracing::{debug, error, warn};

use crate::stream::{
    annotation::annotate_frame,
    catalog::ReferenceEntry,
    config::StreamConfig,
    data::Verdict,
    encoding::{FrameEncoder, JpegFrameEncoder, multipart_chunk},
};

/// One annotated, encoded frame ready for the wire.
pub(crate) struct FrameUpdate {
    pub(crate) chunk: Vec<u8>,
    pub(crate) verdict: Verdict,
}

pub(crate) struct StreamSession<S, E, C> {
    source: S,
    estimator: E,
    encoder: C,
    reference: Option<LandmarkSet>,
    threshold: f32,
    frame_number: u64,
}

impl StreamSession<Webcam, BlazePoseEstimator, JpegFrameEncoder> {
    /// Acquire the camera, load the selected reference image, and compute its
    /// landmarks. Any failure here aborts the session before a single frame
    /// is produced.
    pub(crate) fn start(config: &StreamConfig, entry: &ReferenceEntry) -> Result<Self> {
        let source = Webcam::open(config.camera_index, config.capture_size())?;
        let mut estimator = BlazePoseEstimator::new(&config.model_path)?;

        let reference_image = image::open(&entry.path)
            .with_context(|| format!("failed to load reference image {:?}", entry.path))?
            .to_rgb8();
        let (width, height) = reference_image.dimensions();
        let reference = estimator
            .estimate(reference_image.as_raw(), width, height)
            .with_context(|| format!("failed to estimate reference pose for {}", entry.name))?;
        if reference.is_none() {
            warn!(
                "no body detected in reference image {}; every verdict will be negative",
                entry.name
            );
        }

        metrics::counter!("pose_stream_sessions_total").increment(1);
        debug!("stream session started against reference {}", entry.name);

        Ok(Self::new(
            source,
            estimator,
            JpegFrameEncoder::new(config.jpeg_quality),
            reference,
            config.match_threshold,
        ))
    }
}

impl<S: FrameSource, E: PoseEstimator, C: FrameEncoder> StreamSession<S, E, C> {
    pub(crate) fn new(
        source: S,
        estimator: E,
        encoder: C,
        reference: Option<LandmarkSet>,
        threshold: f32,
    ) -> Self {
        Self {
            source,
            estimator,
            encoder,
            reference,
            threshold,
            frame_number: 0,
        }
    }

    /// Produce at most one frame.
    ///
    /// `Ok(None)` means a transient capture or encode failure was skipped;
    /// the caller just loops again. `Err` is reserved for defects that poison
    /// every later verdict, such as an estimator contract violation.
    pub(crate) fn next_frame(&mut self) -> Result<Option<FrameUpdate>> {
        let frame = match self.source.read_frame() {
            Ok(frame) => frame,
            Err(err) => {
                metrics::counter!("pose_capture_retries_total").increment(1);
                debug!("dropped frame: {err}");
                return Ok(None);
            }
        };
        self.frame_number = self.frame_number.wrapping_add(1);
        if self.frame_number % 120 == 0 {
            debug!(
                "capture heartbeat: frame #{}, ts={}",
                self.frame_number, frame.timestamp_ms
            );
        }

        let live = self
            .estimator
            .estimate(&frame.data, frame.width, frame.height)?;
        let matched = compare_poses(live.as_ref(), self.reference.as_ref(), self.threshold)?;
        let verdict = Verdict::from_match(matched);
        if matched {
            metrics::counter!("pose_verdict_matches_total").increment(1);
        }

        let annotated = annotate_frame(&frame, live.as_ref(), verdict)?;
        let jpeg = match self.encoder.encode(&annotated) {
            Ok(jpeg) => jpeg,
            Err(err) => {
                metrics::counter!("pose_encode_failures_total").increment(1);
                warn!("encode failed for frame #{}: {err}", self.frame_number);
                return Ok(None);
            }
        };

        metrics::counter!("pose_stream_frames_total").increment(1);
        Ok(Some(FrameUpdate {
            chunk: multipart_chunk(&jpeg),
            verdict,
        }))
    }

    /// Drive the production loop until the output channel closes.
    ///
    /// The capture handle is released when the session drops at the end of
    /// this function, on every exit path.
    pub(crate) fn run(mut self, tx: Sender<Vec<u8>>) {
        let mut last_verdict = None;
        loop {
            match self.next_frame() {
                Ok(Some(update)) => {
                    if last_verdict != Some(update.verdict) {
                        debug!("verdict: {}", update.verdict.label());
                        last_verdict = Some(update.verdict);
                    }
                    if tx.blocking_send(update.chunk).is_err() {
                        debug!("client disconnected; releasing capture device");
                        break;
                    }
                }
                Ok(None) => continue,
                Err(err) => {
                    error!("stream session failed: {err:?}");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use anyhow::anyhow;
    use capture::{CaptureError, Frame};
    use pose_core::{DEFAULT_MATCH_THRESHOLD, LANDMARK_COUNT};

    const CHUNK_PREFIX: &[u8] = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n";

    struct ScriptedSource {
        reads: VecDeque<Result<(), ()>>,
    }

    impl ScriptedSource {
        fn new(reads: &[Result<(), ()>]) -> Self {
            Self {
                reads: reads.iter().copied().collect(),
            }
        }
    }

    impl FrameSource for ScriptedSource {
        fn read_frame(&mut self) -> Result<Frame, CaptureError> {
            match self.reads.pop_front() {
                Some(Ok(())) | None => Ok(Frame {
                    data: vec![64; 64 * 48 * 3],
                    width: 64,
                    height: 48,
                    timestamp_ms: 0,
                }),
                Some(Err(())) => Err(CaptureError::Read(anyhow!("simulated read failure"))),
            }
        }
    }

    struct ScriptedEstimator {
        results: VecDeque<Option<LandmarkSet>>,
    }

    impl PoseEstimator for ScriptedEstimator {
        fn estimate(
            &mut self,
            _rgb: &[u8],
            _width: u32,
            _height: u32,
        ) -> Result<Option<LandmarkSet>> {
            Ok(self.results.pop_front().unwrap_or(None))
        }
    }

    /// Delegates to the real encoder, except where a failure is scripted.
    struct ScriptedEncoder {
        encodes: VecDeque<Result<(), ()>>,
    }

    impl FrameEncoder for ScriptedEncoder {
        fn encode(&mut self, image: &image::RgbImage) -> Result<Vec<u8>> {
            match self.encodes.pop_front() {
                Some(Err(())) => Err(anyhow!("simulated encode failure")),
                Some(Ok(())) | None => JpegFrameEncoder::new(85).encode(image),
            }
        }
    }

    fn uniform_set(value: f32, len: usize) -> LandmarkSet {
        LandmarkSet::from_points(vec![[value, value, value]; len])
    }

    fn session_with(
        reads: &[Result<(), ()>],
        live: Vec<Option<LandmarkSet>>,
        reference: Option<LandmarkSet>,
    ) -> StreamSession<ScriptedSource, ScriptedEstimator, JpegFrameEncoder> {
        StreamSession::new(
            ScriptedSource::new(reads),
            ScriptedEstimator {
                results: live.into_iter().collect(),
            },
            JpegFrameEncoder::new(85),
            reference,
            DEFAULT_MATCH_THRESHOLD,
        )
    }

    #[test]
    fn identical_live_and_reference_yield_match() {
        let pose = uniform_set(0.5, LANDMARK_COUNT);
        let mut session = session_with(&[Ok(())], vec![Some(pose.clone())], Some(pose));

        let update = session.next_frame().unwrap().expect("frame expected");
        assert_eq!(update.verdict, Verdict::Match);
        assert!(update.chunk.starts_with(CHUNK_PREFIX));
        assert!(update.chunk.ends_with(b"\r\n"));
    }

    #[test]
    fn absent_live_landmarks_yield_no_match() {
        let reference = uniform_set(0.5, LANDMARK_COUNT);
        let mut session = session_with(
            &[Ok(()), Ok(())],
            vec![Some(reference.clone()), None],
            Some(reference),
        );

        assert_eq!(
            session.next_frame().unwrap().unwrap().verdict,
            Verdict::Match
        );
        // A previous match must not leak into a frame with no detected body.
        assert_eq!(
            session.next_frame().unwrap().unwrap().verdict,
            Verdict::NoMatch
        );
    }

    #[test]
    fn absent_reference_yields_no_match() {
        let mut session = session_with(
            &[Ok(())],
            vec![Some(uniform_set(0.5, LANDMARK_COUNT))],
            None,
        );
        assert_eq!(
            session.next_frame().unwrap().unwrap().verdict,
            Verdict::NoMatch
        );
    }

    #[test]
    fn single_read_failure_skips_frame_and_resumes() {
        let pose = uniform_set(0.5, LANDMARK_COUNT);
        let mut session = session_with(&[Err(()), Ok(())], vec![Some(pose.clone())], Some(pose));

        assert!(session.next_frame().unwrap().is_none());
        let update = session.next_frame().unwrap().expect("recovered frame");
        assert_eq!(update.verdict, Verdict::Match);
    }

    #[test]
    fn single_encode_failure_skips_frame_and_resumes() {
        let pose = uniform_set(0.5, LANDMARK_COUNT);
        let mut session = StreamSession::new(
            ScriptedSource::new(&[Ok(()), Ok(())]),
            ScriptedEstimator {
                results: vec![Some(pose.clone()), Some(pose.clone())]
                    .into_iter()
                    .collect(),
            },
            ScriptedEncoder {
                encodes: [Err(()), Ok(())].into_iter().collect(),
            },
            Some(pose),
            DEFAULT_MATCH_THRESHOLD,
        );

        assert!(session.next_frame().unwrap().is_none());
        let update = session.next_frame().unwrap().expect("recovered frame");
        assert_eq!(update.verdict, Verdict::Match);
        assert!(update.chunk.starts_with(CHUNK_PREFIX));
    }

    #[test]
    fn landmark_length_mismatch_fails_loudly() {
        let mut session = session_with(
            &[Ok(())],
            vec![Some(uniform_set(0.5, 17))],
            Some(uniform_set(0.5, LANDMARK_COUNT)),
        );
        assert!(session.next_frame().is_err());
    }
}

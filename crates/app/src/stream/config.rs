use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use pose_core::DEFAULT_MATCH_THRESHOLD;

const USAGE: &str = "Usage: pose-mirror [--images <dir>] [--model <path>] \
[--camera <index>] [--width <px>] [--height <px>] [--jpeg-quality <1-100>] \
[--threshold <mean-distance>] [--port <port>] [--verbose]";

#[derive(Clone, Debug)]
pub struct StreamConfig {
    pub image_dir: PathBuf,
    pub model_path: PathBuf,
    pub camera_index: u32,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub jpeg_quality: u8,
    pub match_threshold: f32,
    pub port: u16,
    pub verbose: bool,
}

impl StreamConfig {
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut image_dir: Option<PathBuf> = None;
        let mut model_path: Option<PathBuf> = None;
        let mut camera_index: Option<u32> = None;
        let mut width: Option<u32> = None;
        let mut height: Option<u32> = None;
        let mut jpeg_quality: Option<u8> = None;
        let mut match_threshold: Option<f32> = None;
        let mut port: Option<u16> = None;
        let mut verbose = false;

        let mut idx = 1;
        while idx < args.len() {
            match args[idx].as_str() {
                "--images" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--images requires a value"))?;
                    image_dir = Some(PathBuf::from(value));
                    idx += 1;
                }
                "--model" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--model requires a value"))?;
                    model_path = Some(PathBuf::from(value));
                    idx += 1;
                }
                "--camera" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--camera requires a value"))?
                        .parse::<u32>()
                        .with_context(|| "--camera must be a device index".to_string())?;
                    camera_index = Some(value);
                    idx += 1;
                }
                "--width" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--width requires a value"))?
                        .parse::<u32>()
                        .with_context(|| "--width must be a positive integer".to_string())?;
                    if value == 0 {
                        bail!("--width must be a positive integer");
                    }
                    width = Some(value);
                    idx += 1;
                }
                "--height" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--height requires a value"))?
                        .parse::<u32>()
                        .with_context(|| "--height must be a positive integer".to_string())?;
                    if value == 0 {
                        bail!("--height must be a positive integer");
                    }
                    height = Some(value);
                    idx += 1;
                }
                "--jpeg-quality" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--jpeg-quality requires a value"))?
                        .parse::<u8>()
                        .with_context(|| {
                            "--jpeg-quality must be an integer between 1 and 100".to_string()
                        })?;
                    if !(1..=100).contains(&value) {
                        bail!("--jpeg-quality must be an integer between 1 and 100");
                    }
                    jpeg_quality = Some(value);
                    idx += 1;
                }
                "--threshold" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--threshold requires a value"))?
                        .parse::<f32>()
                        .with_context(|| "--threshold must be a number".to_string())?;
                    if value <= 0.0 {
                        bail!("--threshold must be greater than zero");
                    }
                    match_threshold = Some(value);
                    idx += 1;
                }
                "--port" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--port requires a value"))?
                        .parse::<u16>()
                        .with_context(|| "--port must be a port number".to_string())?;
                    port = Some(value);
                    idx += 1;
                }
                "--verbose" => {
                    verbose = true;
                    idx += 1;
                }
                "--help" | "-h" => {
                    bail!(USAGE);
                }
                arg => {
                    bail!("Unrecognised argument: {arg}\n\n{USAGE}");
                }
            }
        }

        if width.is_some() != height.is_some() {
            bail!("--width and --height must be provided together");
        }

        Ok(Self {
            image_dir: image_dir.unwrap_or_else(|| PathBuf::from("static/images")),
            model_path: model_path.unwrap_or_else(|| PathBuf::from("models/pose_landmark.onnx")),
            camera_index: camera_index.unwrap_or(0),
            width,
            height,
            jpeg_quality: jpeg_quality.unwrap_or(85),
            match_threshold: match_threshold.unwrap_or(DEFAULT_MATCH_THRESHOLD),
            port: port.unwrap_or(8080),
            verbose,
        })
    }

    /// Requested capture resolution, when both dimensions were given.
    pub fn capture_size(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }
}

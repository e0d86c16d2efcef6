//! Live pose-matching MJPEG pipeline.
//!
//! The module is split into focused submodules:
//! - `config`: CLI configuration parsing.
//! - `catalog`: Reference image catalog and its cursor state machine.
//! - `session`: Per-client capture → infer → compare → annotate → encode loop.
//! - `annotation`: Skeleton overlay and verdict label drawing.
//! - `encoding`: JPEG encode and multipart frame framing.
//! - `server`: Actix Web endpoints (stream, navigation, reference, metrics).
//! - `telemetry`: Tracing subscriber and Prometheus recorder setup.
//! - `data`: Shared structs passed between stages.

pub use config::StreamConfig;
pub use server::run;

mod annotation;
mod catalog;
mod config;
mod data;
mod encoding;
mod server;
mod session;
mod telemetry;

//! Error types for voxcap
//!
//! Uses thiserror for ergonomic error definitions with clear messages
//! that guide users toward fixing common issues.

use thiserror::Error;

/// Top-level error type for the voxcap application
#[derive(Error, Debug)]
pub enum VoxcapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Recorder error: {0}")]
    Recorder(#[from] RecorderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by the voice recorder.
///
/// All of these are recoverable: callers are expected to report them and
/// fall back (for example, skip the voice part of a query) rather than abort.
#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("Audio input device not found: {0}. List devices with: voxcap devices")]
    DeviceNotFound(String),

    #[error("Failed to open capture device: {0}")]
    DeviceUnavailable(String),

    #[error("A recording is already in progress")]
    AlreadyActive,

    #[error("No audio was captured. Check your microphone.")]
    EmptyRecording,

    #[error("Audio stream error: {0}")]
    Stream(String),

    #[error("Failed to encode recording: {0}")]
    Encoding(String),
}

/// Result type alias using VoxcapError
pub type Result<T> = std::result::Result<T, VoxcapError>;

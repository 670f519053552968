//! Error types for the transcoder
//!
//! This module defines all error types used throughout the crate. A failed
//! transcode is reported as a [`TranscodeError`] naming the stage that
//! failed; the boolean call boundary in [`crate::bridge`] collapses it.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Request validation errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Sample rate is zero or negative
    #[error("Sample rate must be positive, got {0} Hz")]
    NonPositiveSampleRate(i32),

    /// Channel count is zero or negative
    #[error("Channel count must be positive, got {0}")]
    NonPositiveChannels(i32),

    /// Channel count does not fit the encoder's channel field
    #[error("Channel count {0} exceeds the maximum of {max}", max = u8::MAX)]
    TooManyChannels(i32),

    /// Bitrate is zero or negative
    #[error("Bitrate must be positive, got {0} kbps")]
    NonPositiveBitrate(i32),
}

/// Errors reported by an encoder backend
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncoderError {
    /// The encoding capability is not compiled into this build
    #[error("Encoder backend `{0}` is not available")]
    Unavailable(&'static str),

    /// The encoder session could not be created
    #[error("Encoder initialisation failed: {0}")]
    Init(String),

    /// The encoder rejected the sample rate, channel count or bitrate
    #[error("Encoder configuration rejected: {0}")]
    Configure(String),

    /// An encode step returned a failure code
    #[error("Encode step failed: {0}")]
    Encode(String),

    /// The final flush returned a failure code
    #[error("Encoder flush failed: {0}")]
    Flush(String),
}

/// Failure of a single transcode call
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// No encoder capability in this build
    #[error("MP3 encoding is not available (backend `{backend}`)")]
    Unavailable { backend: &'static str },

    /// The request failed validation before any file was touched
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] ConfigError),

    /// The PCM input could not be opened for reading
    #[error("Could not open input {}: {source}", .path.display())]
    OpenInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The MP3 output could not be created
    #[error("Could not open output {}: {source}", .path.display())]
    OpenOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Encoder initialisation or configuration failed
    #[error("Encoder setup failed: {0}")]
    Setup(#[source] EncoderError),

    /// Reading PCM samples failed mid-stream
    #[error("Failed to read PCM frame {frame}: {source}")]
    Read {
        frame: u64,
        #[source]
        source: io::Error,
    },

    /// The encoder reported a failure for a frame
    #[error("Failed to encode frame {frame}: {source}")]
    Encode {
        frame: u64,
        #[source]
        source: EncoderError,
    },

    /// Encoded bytes for a frame could not be written in full
    #[error("Short write of {len} encoded bytes at frame {frame}: {source}")]
    Write {
        frame: u64,
        len: usize,
        #[source]
        source: io::Error,
    },

    /// The encoder flush failed (strict flush policy only)
    #[error("Failed to flush encoder: {0}")]
    Flush(#[source] EncoderError),

    /// Flushed bytes could not be written (strict flush policy only)
    #[error("Short write of {len} flushed bytes: {source}")]
    FlushWrite {
        len: usize,
        #[source]
        source: io::Error,
    },
}

/// Specialized result types for different modules
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
pub type EncoderResult<T> = std::result::Result<T, EncoderError>;
pub type TranscodeResult<T> = std::result::Result<T, TranscodeError>;

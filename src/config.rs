//! Configuration management for a transcode call
//!
//! A [`TranscodeRequest`] carries the values exactly as a caller supplied
//! them. [`TranscodeRequest::validate`] turns it into [`EncoderSettings`],
//! the only form the encoder backends ever see.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{ConfigError, ConfigResult};
use crate::pcm::SAMPLES_PER_FRAME;

/// Default input sample rate (Hz)
pub const DEFAULT_SAMPLE_RATE: i32 = 44100;
/// Default channel count
pub const DEFAULT_CHANNELS: i32 = 2;
/// Default target bitrate (kbps)
pub const DEFAULT_BITRATE: i32 = 128;

/// Bitrate presets offered to end users
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitratePreset {
    /// 320 kbps
    High,
    /// 192 kbps
    Standard,
    /// 128 kbps
    Compact,
}

impl BitratePreset {
    pub fn kbps(self) -> i32 {
        match self {
            BitratePreset::High => 320,
            BitratePreset::Standard => 192,
            BitratePreset::Compact => 128,
        }
    }
}

impl FromStr for BitratePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(BitratePreset::High),
            "standard" => Ok(BitratePreset::Standard),
            "compact" => Ok(BitratePreset::Compact),
            other => Err(format!("Unknown preset: {}", other)),
        }
    }
}

impl fmt::Display for BitratePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BitratePreset::High => "high",
            BitratePreset::Standard => "standard",
            BitratePreset::Compact => "compact",
        };
        write!(f, "{} ({} kbps)", name, self.kbps())
    }
}

/// What to do when the final encoder flush fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushPolicy {
    /// Log flush and flush-write failures and still report success
    #[default]
    BestEffort,
    /// Treat flush and flush-write failures as a failed call
    Strict,
}

/// One transcode call as the caller described it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeRequest {
    /// Raw little-endian 16-bit PCM input
    pub input: PathBuf,
    /// MP3 output, created or truncated
    pub output: PathBuf,
    /// Sample rate (Hz)
    pub sample_rate: i32,
    /// Interleaved channel count
    pub channels: i32,
    /// Target bitrate (kbps)
    pub bitrate_kbps: i32,
}

impl TranscodeRequest {
    /// Create a request with default audio parameters
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            bitrate_kbps: DEFAULT_BITRATE,
        }
    }

    /// Set the sample rate
    pub fn sample_rate(mut self, sample_rate: i32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set the channel count
    pub fn channels(mut self, channels: i32) -> Self {
        self.channels = channels;
        self
    }

    /// Set the bitrate
    pub fn bitrate(mut self, bitrate_kbps: i32) -> Self {
        self.bitrate_kbps = bitrate_kbps;
        self
    }

    /// Set the bitrate from a preset
    pub fn preset(self, preset: BitratePreset) -> Self {
        self.bitrate(preset.kbps())
    }

    /// Channel count clamped to at least one, for buffer sizing
    pub fn buffer_channels(&self) -> usize {
        self.channels.max(1) as usize
    }

    /// Validate the request
    ///
    /// Non-positive channel counts are rejected here rather than clamped,
    /// so the channel count used for buffers always equals the one the
    /// encoder is configured with.
    pub fn validate(&self) -> ConfigResult<EncoderSettings> {
        if self.sample_rate <= 0 {
            return Err(ConfigError::NonPositiveSampleRate(self.sample_rate));
        }
        if self.channels <= 0 {
            return Err(ConfigError::NonPositiveChannels(self.channels));
        }
        let channels =
            u8::try_from(self.channels).map_err(|_| ConfigError::TooManyChannels(self.channels))?;
        if self.bitrate_kbps <= 0 {
            return Err(ConfigError::NonPositiveBitrate(self.bitrate_kbps));
        }

        Ok(EncoderSettings {
            sample_rate: self.sample_rate as u32,
            channels,
            bitrate_kbps: self.bitrate_kbps as u32,
        })
    }
}

/// Validated encoder parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "diagnostics", derive(serde::Serialize, serde::Deserialize))]
pub struct EncoderSettings {
    /// Sample rate (Hz)
    pub sample_rate: u32,
    /// Channel count, at least one
    pub channels: u8,
    /// Target bitrate (kbps)
    pub bitrate_kbps: u32,
}

impl EncoderSettings {
    pub fn new(sample_rate: u32, channels: u8, bitrate_kbps: u32) -> Self {
        Self {
            sample_rate,
            channels,
            bitrate_kbps,
        }
    }

    pub fn buffer_channels(&self) -> usize {
        usize::from(self.channels.max(1))
    }

    /// Interleaved samples in one full frame
    pub fn frame_samples(&self) -> usize {
        SAMPLES_PER_FRAME * self.buffer_channels()
    }
}

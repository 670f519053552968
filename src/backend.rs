//! Encoder capability interface
//!
//! The transcode loop never talks to an encoding library directly. It is
//! handed an [`EncoderBackend`], opens one [`EncoderSession`] per call and
//! drops it when the call ends. Whether a real encoder was compiled in is
//! decided once, in [`default_backend`].

use std::sync::Arc;

use crate::config::EncoderSettings;
use crate::error::{EncoderError, EncoderResult};

/// One frame of PCM handed to an encoder session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcmFrame<'a> {
    /// Single-channel samples
    Mono(&'a [i16]),
    /// Samples interleaved across `channels` channels
    Interleaved { samples: &'a [i16], channels: usize },
}

impl<'a> PcmFrame<'a> {
    /// Build the frame variant matching a channel count
    pub fn new(samples: &'a [i16], channels: usize) -> Self {
        if channels <= 1 {
            PcmFrame::Mono(samples)
        } else {
            PcmFrame::Interleaved { samples, channels }
        }
    }

    /// Samples per channel in this frame
    pub fn sample_frames(&self) -> usize {
        match *self {
            PcmFrame::Mono(samples) => samples.len(),
            PcmFrame::Interleaved { samples, channels } => samples.len() / channels,
        }
    }

    pub fn samples(&self) -> &'a [i16] {
        match *self {
            PcmFrame::Mono(samples) => samples,
            PcmFrame::Interleaved { samples, .. } => samples,
        }
    }
}

/// A live, configured encoder
///
/// Dropping the session releases it.
pub trait EncoderSession {
    /// Encode one frame, appending the produced bytes to `output`
    ///
    /// `output` arrives empty with at least the worst-case capacity
    /// reserved. `Ok(0)` means the encoder buffered the input internally.
    fn encode(&mut self, frame: PcmFrame<'_>, output: &mut Vec<u8>) -> EncoderResult<usize>;

    /// Emit whatever the encoder still holds once input is exhausted
    fn flush(&mut self, output: &mut Vec<u8>) -> EncoderResult<usize>;
}

/// Something that can open encoder sessions
pub trait EncoderBackend: Send + Sync {
    /// Short name used in logs and reports
    fn name(&self) -> &'static str;

    /// Whether sessions can be opened at all
    fn is_available(&self) -> bool;

    /// Initialise a session and apply `settings` to it
    ///
    /// Failing to create the session is [`EncoderError::Init`]; the encoder
    /// rejecting the parameters is [`EncoderError::Configure`].
    fn open_session(&self, settings: &EncoderSettings) -> EncoderResult<Box<dyn EncoderSession>>;
}

/// Backend standing in for a build without an encoder
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableBackend;

impl EncoderBackend for UnavailableBackend {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn open_session(&self, _settings: &EncoderSettings) -> EncoderResult<Box<dyn EncoderSession>> {
        Err(EncoderError::Unavailable(self.name()))
    }
}

/// The backend compiled into this build
#[cfg(feature = "lame")]
pub fn default_backend() -> Arc<dyn EncoderBackend> {
    Arc::new(crate::lame::LameBackend::new())
}

/// The backend compiled into this build
#[cfg(not(feature = "lame"))]
pub fn default_backend() -> Arc<dyn EncoderBackend> {
    Arc::new(UnavailableBackend)
}

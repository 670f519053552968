//! # PCM to MP3 transcoder
//!
//! Streams raw little-endian 16-bit PCM from a file (or any reader) through
//! an MP3 encoder and writes the encoded frames out. The encoder is reached
//! through the [`backend::EncoderBackend`] trait; the LAME backend is
//! compiled in with the `lame` feature.
//!
//! ```no_run
//! use pcm2mp3_rs::{TranscodeRequest, Transcoder};
//!
//! let request = TranscodeRequest::new("take.pcm", "take.mp3")
//!     .sample_rate(44100)
//!     .channels(2)
//!     .bitrate(192);
//! let stats = Transcoder::default().transcode(&request)?;
//! println!("{} frames encoded", stats.frames);
//! # Ok::<(), pcm2mp3_rs::TranscodeError>(())
//! ```

pub mod backend;
pub mod bridge;
pub mod config;
pub mod error;
#[cfg(feature = "lame")]
pub mod lame;
pub mod pcm;
#[cfg(feature = "diagnostics")]
pub mod report;
pub mod transcode;

#[cfg(test)]
mod tests;

pub use backend::{default_backend, EncoderBackend, EncoderSession, PcmFrame, UnavailableBackend};
pub use config::{BitratePreset, EncoderSettings, FlushPolicy, TranscodeRequest};
pub use error::{ConfigError, EncoderError, TranscodeError};
pub use transcode::{TranscodeStats, Transcoder};

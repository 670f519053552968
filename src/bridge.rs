//! Coarse call boundary
//!
//! Callers on the other side of a language boundary only get a yes/no
//! answer. Both functions here use the backend compiled into this build,
//! never unwind, and report every failure as `false`.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use lazy_static::lazy_static;

use crate::backend::{default_backend, EncoderBackend};
use crate::config::TranscodeRequest;
use crate::transcode::Transcoder;

lazy_static! {
    /// Backend shared by every boundary call
    static ref BACKEND: Arc<dyn EncoderBackend> = default_backend();

    /// Availability is probed once per process
    static ref AVAILABLE: bool = BACKEND.is_available();
}

/// Whether MP3 encoding is compiled into this build
pub fn is_encoder_available() -> bool {
    *AVAILABLE
}

/// Transcode raw PCM at `input_path` into MP3 at `output_path`
///
/// Returns `true` only when every frame was encoded and written. The cause
/// of a failure is logged, not returned.
pub fn encode(
    input_path: &str,
    output_path: &str,
    sample_rate: i32,
    channels: i32,
    bitrate_kbps: i32,
) -> bool {
    if !is_encoder_available() {
        log::warn!("MP3 encode requested but no encoder is available");
        return false;
    }

    let request = TranscodeRequest::new(input_path, output_path)
        .sample_rate(sample_rate)
        .channels(channels)
        .bitrate(bitrate_kbps);
    let transcoder = Transcoder::new(Arc::clone(&BACKEND));

    match panic::catch_unwind(AssertUnwindSafe(|| transcoder.transcode(&request))) {
        Ok(Ok(stats)) => {
            log::debug!(
                "Encoded {} -> {}: {} frames, {} bytes",
                input_path,
                output_path,
                stats.frames,
                stats.bytes_written
            );
            true
        }
        Ok(Err(e)) => {
            log::warn!("Encoding {} -> {} failed: {}", input_path, output_path, e);
            false
        }
        Err(_) => {
            log::error!("Encoding {} -> {} panicked", input_path, output_path);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_matches_build() {
        assert_eq!(is_encoder_available(), cfg!(feature = "lame"));
    }

    #[test]
    fn test_missing_input_reports_false() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("missing.pcm");
        let output = dir.path().join("out.mp3");

        assert!(!encode(
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            44100,
            2,
            128
        ));
        assert!(!output.exists(), "output must not be created when input is missing");
    }

    #[test]
    fn test_non_positive_channels_report_false() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pcm");
        std::fs::write(&input, [0u8; 4608]).unwrap();
        let output = dir.path().join("out.mp3");

        for channels in [0, -1, i32::MIN] {
            assert!(!encode(
                input.to_str().unwrap(),
                output.to_str().unwrap(),
                44100,
                channels,
                128
            ));
        }
    }
}

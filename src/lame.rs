//! LAME encoder backend
//!
//! Available when the crate is built with the `lame` feature.

use mp3lame_encoder::{Bitrate, Builder, DualPcm, Encoder, FlushGap, InterleavedPcm, Quality};

use crate::backend::{EncoderBackend, EncoderSession, PcmFrame};
use crate::config::EncoderSettings;
use crate::error::{EncoderError, EncoderResult};

/// Constant bitrates the encoder binding exposes (kbps)
///
/// MPEG-1 Layer III also defines 56 kbps, but the binding has no variant for
/// it, so a 56 kbps request ties between 48 and 64 and lands on 48.
pub const SUPPORTED_BITRATES: &[u32] = &[
    8, 16, 24, 32, 40, 48, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320,
];

/// Snap a requested bitrate to the closest supported one
///
/// Follows LAME's own nearest-bitrate rule: ties resolve to the lower rate,
/// anything above 320 becomes 320.
pub fn nearest_bitrate(kbps: u32) -> u32 {
    SUPPORTED_BITRATES
        .iter()
        .copied()
        .fold(SUPPORTED_BITRATES[0], |best, rate| {
            if rate.abs_diff(kbps) < best.abs_diff(kbps) {
                rate
            } else {
                best
            }
        })
}

fn lame_bitrate(kbps: u32) -> Bitrate {
    match nearest_bitrate(kbps) {
        8 => Bitrate::Kbps8,
        16 => Bitrate::Kbps16,
        24 => Bitrate::Kbps24,
        32 => Bitrate::Kbps32,
        40 => Bitrate::Kbps40,
        48 => Bitrate::Kbps48,
        64 => Bitrate::Kbps64,
        80 => Bitrate::Kbps80,
        96 => Bitrate::Kbps96,
        112 => Bitrate::Kbps112,
        128 => Bitrate::Kbps128,
        160 => Bitrate::Kbps160,
        192 => Bitrate::Kbps192,
        224 => Bitrate::Kbps224,
        256 => Bitrate::Kbps256,
        _ => Bitrate::Kbps320,
    }
}

fn lame_quality(level: u8) -> Quality {
    match level {
        0 => Quality::Best,
        1 => Quality::SecondBest,
        2 => Quality::NearBest,
        3 => Quality::VeryNice,
        4 => Quality::Nice,
        5 => Quality::Good,
        6 => Quality::Decent,
        7 => Quality::Ok,
        8 => Quality::SecondWorst,
        _ => Quality::Worst,
    }
}

/// Opens LAME encoder sessions
#[derive(Debug, Default, Clone, Copy)]
pub struct LameBackend {
    quality: Option<u8>,
}

impl LameBackend {
    /// Backend using LAME's default quality
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the algorithm quality, 0 (best) to 9 (worst)
    pub fn with_quality(mut self, level: u8) -> Self {
        self.quality = Some(level.min(9));
        self
    }
}

impl EncoderBackend for LameBackend {
    fn name(&self) -> &'static str {
        "lame"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn open_session(&self, settings: &EncoderSettings) -> EncoderResult<Box<dyn EncoderSession>> {
        let mut builder =
            Builder::new().ok_or_else(|| EncoderError::Init("lame_init() failed".to_string()))?;

        builder.set_sample_rate(settings.sample_rate).map_err(|e| {
            EncoderError::Configure(format!("sample rate {}: {:?}", settings.sample_rate, e))
        })?;
        builder.set_num_channels(settings.channels).map_err(|e| {
            EncoderError::Configure(format!("channels {}: {:?}", settings.channels, e))
        })?;

        let kbps = nearest_bitrate(settings.bitrate_kbps);
        if kbps != settings.bitrate_kbps {
            log::debug!(
                "Bitrate {} kbps snapped to {} kbps",
                settings.bitrate_kbps,
                kbps
            );
        }
        builder
            .set_brate(lame_bitrate(kbps))
            .map_err(|e| EncoderError::Configure(format!("bitrate {}: {:?}", kbps, e)))?;

        if let Some(level) = self.quality {
            builder
                .set_quality(lame_quality(level))
                .map_err(|e| EncoderError::Configure(format!("quality {}: {:?}", level, e)))?;
        }

        // Equivalent of lame_init_params()
        let encoder = builder
            .build()
            .map_err(|e| EncoderError::Configure(format!("{:?}", e)))?;

        log::debug!(
            "LAME session opened: {} Hz, {} ch, {} kbps",
            settings.sample_rate,
            settings.channels,
            kbps
        );

        Ok(Box::new(LameSession { encoder }))
    }
}

/// A configured LAME encoder; released on drop
struct LameSession {
    encoder: Encoder,
}

impl EncoderSession for LameSession {
    fn encode(&mut self, frame: PcmFrame<'_>, output: &mut Vec<u8>) -> EncoderResult<usize> {
        let result = match frame {
            // Mono goes through the two-buffer entry point with the same
            // buffer on both sides; LAME only reads the left one.
            PcmFrame::Mono(samples) => self.encoder.encode_to_vec(
                DualPcm {
                    left: samples,
                    right: samples,
                },
                output,
            ),
            PcmFrame::Interleaved { samples, .. } => {
                self.encoder.encode_to_vec(InterleavedPcm(samples), output)
            }
        };
        result.map_err(|e| EncoderError::Encode(format!("{:?}", e)))
    }

    /// Pads and encodes the PCM LAME still holds, then drains it
    fn flush(&mut self, output: &mut Vec<u8>) -> EncoderResult<usize> {
        self.encoder
            .flush_to_vec::<FlushGap>(output)
            .map_err(|e| EncoderError::Flush(format!("{:?}", e)))
    }
}

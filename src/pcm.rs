//! Raw PCM input handling
//!
//! This module reads headerless little-endian 16-bit PCM in fixed-size
//! frames of interleaved samples, and sizes the encoded-byte buffer that
//! goes with each frame.

use std::io::{self, Read};

use byteorder::{ByteOrder, LittleEndian};

/// Sample-frames per MPEG Layer III frame
pub const SAMPLES_PER_FRAME: usize = 1152;

/// Fixed slack added to the worst-case encoded frame size
pub const MP3_BUFFER_OVERHEAD: usize = 7200;

/// Bytes per 16-bit sample
const BYTES_PER_SAMPLE: usize = 2;

/// Worst-case encoded size for `frame_samples` sample-frames
///
/// This is the bound LAME documents for its output buffer: 1.25 times the
/// number of samples plus 7200 bytes.
pub fn mp3_buffer_size(frame_samples: usize) -> usize {
    frame_samples * 5 / 4 + MP3_BUFFER_OVERHEAD
}

/// Reads interleaved PCM in frames of up to [`SAMPLES_PER_FRAME`] sample-frames
///
/// A frame is only ever made of whole sample-frames (one sample per
/// channel). Bytes of an incomplete sample-frame at end of input are
/// dropped and counted in [`discarded_bytes`](Self::discarded_bytes).
pub struct PcmFrameReader<R> {
    inner: R,
    channels: usize,
    bytes: Vec<u8>,
    samples: Vec<i16>,
    bytes_read: u64,
    discarded_bytes: usize,
    eof: bool,
}

impl<R: Read> PcmFrameReader<R> {
    /// Create a reader; `channels` below one is treated as one
    pub fn new(inner: R, channels: usize) -> Self {
        let channels = channels.max(1);
        let frame_samples = SAMPLES_PER_FRAME * channels;
        Self {
            inner,
            channels,
            bytes: vec![0u8; frame_samples * BYTES_PER_SAMPLE],
            samples: vec![0i16; frame_samples],
            bytes_read: 0,
            discarded_bytes: 0,
            eof: false,
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Total bytes consumed from the input so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Trailing bytes that did not form a whole sample-frame
    pub fn discarded_bytes(&self) -> usize {
        self.discarded_bytes
    }

    /// Read the next frame of interleaved samples
    ///
    /// Returns `Ok(None)` once a read yields no whole sample-frame.
    pub fn next_frame(&mut self) -> io::Result<Option<&[i16]>> {
        if self.eof {
            return Ok(None);
        }

        let filled = self.fill()?;
        let sample_frame_bytes = self.channels * BYTES_PER_SAMPLE;
        let whole = filled / sample_frame_bytes;
        let remainder = filled % sample_frame_bytes;

        if remainder != 0 {
            log::debug!(
                "Dropping {} trailing bytes of an incomplete sample-frame",
                remainder
            );
            self.discarded_bytes += remainder;
        }
        if whole == 0 {
            return Ok(None);
        }

        let sample_count = whole * self.channels;
        LittleEndian::read_i16_into(
            &self.bytes[..sample_count * BYTES_PER_SAMPLE],
            &mut self.samples[..sample_count],
        );
        Ok(Some(&self.samples[..sample_count]))
    }

    /// Fill the byte buffer until it is full or the input is exhausted
    fn fill(&mut self) -> io::Result<usize> {
        let mut filled = 0;
        while filled < self.bytes.len() {
            match self.inner.read(&mut self.bytes[filled..]) {
                Ok(0) => {
                    self.eof = true;
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        self.bytes_read += filled as u64;
        Ok(filled)
    }
}

/// Encode interleaved samples as little-endian bytes
pub fn samples_to_le_bytes(samples: &[i16]) -> Vec<u8> {
    let mut bytes = vec![0u8; samples.len() * BYTES_PER_SAMPLE];
    LittleEndian::write_i16_into(samples, &mut bytes);
    bytes
}

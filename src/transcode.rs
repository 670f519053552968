//! Streaming PCM to MP3 transcoding
//!
//! [`Transcoder`] opens the input and output, opens an encoder session from
//! its backend, then pushes the input through the encoder one frame at a
//! time. Every resource lives in a value that drops in a fixed order: the
//! encoder session first, then the input, then the output.

use std::fs::File;
use std::io::{self, Read, Write};
use std::sync::Arc;

use crate::backend::{default_backend, EncoderBackend, EncoderSession, PcmFrame};
use crate::config::{EncoderSettings, FlushPolicy, TranscodeRequest};
use crate::error::{TranscodeError, TranscodeResult};
use crate::pcm::{mp3_buffer_size, PcmFrameReader, SAMPLES_PER_FRAME};

/// Counters for one completed transcode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "diagnostics", derive(serde::Serialize, serde::Deserialize))]
pub struct TranscodeStats {
    /// Frames handed to the encoder
    pub frames: u64,
    /// Samples per channel handed to the encoder
    pub sample_frames: u64,
    /// Bytes consumed from the input
    pub bytes_read: u64,
    /// Encoded bytes written, flush included
    pub bytes_written: u64,
    /// Encoded bytes from the final flush that reached the output
    ///
    /// Under [`FlushPolicy::BestEffort`] a flush write that fails partway
    /// counts only the bytes the writer accepted.
    pub flush_bytes: usize,
    /// Trailing input bytes that did not form a whole sample-frame
    pub discarded_bytes: usize,
}

impl TranscodeStats {
    /// Duration of the consumed audio
    pub fn duration_secs(&self, sample_rate: u32) -> f64 {
        if sample_rate == 0 {
            return 0.0;
        }
        self.sample_frames as f64 / sample_rate as f64
    }
}

/// Input and output of one call; the input closes first
struct Streams<R, W> {
    frames: PcmFrameReader<R>,
    writer: W,
}

/// Everything a running transcode owns, in release order
struct Pipeline<R, W> {
    session: Box<dyn EncoderSession>,
    streams: Streams<R, W>,
    mp3_buffer: Vec<u8>,
    channels: usize,
}

impl<R: Read, W: Write> Pipeline<R, W> {
    fn run(mut self, flush_policy: FlushPolicy) -> TranscodeResult<TranscodeStats> {
        let mut stats = TranscodeStats::default();

        loop {
            let frame_index = stats.frames;
            let samples = match self.streams.frames.next_frame() {
                Ok(Some(samples)) => samples,
                Ok(None) => break,
                Err(source) => {
                    return Err(TranscodeError::Read {
                        frame: frame_index,
                        source,
                    })
                }
            };

            let frame = PcmFrame::new(samples, self.channels);
            stats.frames += 1;
            stats.sample_frames += frame.sample_frames() as u64;

            self.mp3_buffer.clear();
            let encoded = self
                .session
                .encode(frame, &mut self.mp3_buffer)
                .map_err(|source| TranscodeError::Encode {
                    frame: frame_index,
                    source,
                })?;

            log::trace!("Frame {}: {} encoded bytes", frame_index, encoded);

            if encoded > 0 {
                self.streams
                    .writer
                    .write_all(&self.mp3_buffer[..encoded])
                    .map_err(|source| TranscodeError::Write {
                        frame: frame_index,
                        len: encoded,
                        source,
                    })?;
                stats.bytes_written += encoded as u64;
            }
        }

        stats.flush_bytes = self.flush(flush_policy)?;
        stats.bytes_written += stats.flush_bytes as u64;

        self.streams
            .writer
            .flush()
            .map_err(|source| TranscodeError::Write {
                frame: stats.frames,
                len: 0,
                source,
            })?;

        stats.bytes_read = self.streams.frames.bytes_read();
        stats.discarded_bytes = self.streams.frames.discarded_bytes();
        Ok(stats)
    }

    /// Drain the encoder; returns the flushed byte count actually written
    fn flush(&mut self, policy: FlushPolicy) -> TranscodeResult<usize> {
        self.mp3_buffer.clear();
        let flushed = match self.session.flush(&mut self.mp3_buffer) {
            Ok(flushed) => flushed,
            Err(e) if policy == FlushPolicy::BestEffort => {
                log::warn!("Ignoring encoder flush failure: {}", e);
                return Ok(0);
            }
            Err(e) => return Err(TranscodeError::Flush(e)),
        };
        if flushed == 0 {
            return Ok(0);
        }

        let mut written = 0;
        match write_counted(
            &mut self.streams.writer,
            &self.mp3_buffer[..flushed],
            &mut written,
        ) {
            Ok(()) => Ok(flushed),
            Err(e) if policy == FlushPolicy::BestEffort => {
                log::warn!(
                    "Ignoring failed write of flushed bytes ({} of {} written): {}",
                    written,
                    flushed,
                    e
                );
                Ok(written)
            }
            Err(source) => Err(TranscodeError::FlushWrite {
                len: flushed,
                source,
            }),
        }
    }
}

/// `write_all` that keeps count of what the writer accepted
fn write_counted<W: Write>(writer: &mut W, buf: &[u8], written: &mut usize) -> io::Result<()> {
    while *written < buf.len() {
        match writer.write(&buf[*written..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "failed to write whole buffer",
                ))
            }
            Ok(n) => *written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Transcodes raw PCM into MP3 through an injected encoder backend
#[derive(Clone)]
pub struct Transcoder {
    backend: Arc<dyn EncoderBackend>,
    flush_policy: FlushPolicy,
}

impl Default for Transcoder {
    fn default() -> Self {
        Self::new(default_backend())
    }
}

impl Transcoder {
    pub fn new(backend: Arc<dyn EncoderBackend>) -> Self {
        Self {
            backend,
            flush_policy: FlushPolicy::default(),
        }
    }

    /// Set how failures of the final flush are treated
    pub fn flush_policy(mut self, policy: FlushPolicy) -> Self {
        self.flush_policy = policy;
        self
    }

    pub fn backend(&self) -> &dyn EncoderBackend {
        self.backend.as_ref()
    }

    /// Transcode the file named by `request.input` into `request.output`
    ///
    /// The output is created or truncated once the input is open. A failed
    /// call may leave a truncated or empty output file behind.
    pub fn transcode(&self, request: &TranscodeRequest) -> TranscodeResult<TranscodeStats> {
        if !self.backend.is_available() {
            return Err(TranscodeError::Unavailable {
                backend: self.backend.name(),
            });
        }
        let settings = request.validate()?;

        let input = File::open(&request.input).map_err(|source| TranscodeError::OpenInput {
            path: request.input.clone(),
            source,
        })?;
        let output = File::create(&request.output).map_err(|source| TranscodeError::OpenOutput {
            path: request.output.clone(),
            source,
        })?;

        log::debug!(
            "Transcoding {} -> {} ({} Hz, {} ch, {} kbps) with {}",
            request.input.display(),
            request.output.display(),
            settings.sample_rate,
            settings.channels,
            settings.bitrate_kbps,
            self.backend.name()
        );

        self.transcode_stream(&settings, input, output)
    }

    /// Transcode everything `reader` yields into `writer`
    pub fn transcode_stream<R: Read, W: Write>(
        &self,
        settings: &EncoderSettings,
        reader: R,
        writer: W,
    ) -> TranscodeResult<TranscodeStats> {
        let channels = settings.buffer_channels();
        let streams = Streams {
            frames: PcmFrameReader::new(reader, channels),
            writer,
        };

        let session = self
            .backend
            .open_session(settings)
            .map_err(TranscodeError::Setup)?;

        let pipeline = Pipeline {
            session,
            streams,
            mp3_buffer: Vec::with_capacity(mp3_buffer_size(SAMPLES_PER_FRAME)),
            channels,
        };

        let stats = pipeline.run(self.flush_policy)?;
        log::debug!(
            "Transcoded {} frames ({} sample-frames), {} bytes written",
            stats.frames,
            stats.sample_frames,
            stats.bytes_written
        );
        Ok(stats)
    }
}

//! Test doubles for the transcode loop
//!
//! A scripted encoder backend plus reader and writer wrappers, all writing
//! to one shared journal so tests can check call order and release order.

use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, Mutex};

use crate::backend::{EncoderBackend, EncoderSession, PcmFrame};
use crate::config::EncoderSettings;
use crate::error::{EncoderError, EncoderResult};
use crate::pcm::{mp3_buffer_size, samples_to_le_bytes, SAMPLES_PER_FRAME};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Opened(EncoderSettings),
    Encoded { mono: bool, sample_frames: usize },
    Flushed,
    SessionReleased,
    InputClosed,
    OutputClosed,
}

#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Event>>>);

impl Journal {
    pub fn record(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    /// The trailing events, for checking release order
    pub fn tail(&self, n: usize) -> Vec<Event> {
        let events = self.events();
        events[events.len().saturating_sub(n)..].to_vec()
    }

    pub fn encoded(&self) -> Vec<(bool, usize)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Encoded { mono, sample_frames } => Some((mono, sample_frames)),
                _ => None,
            })
            .collect()
    }
}

/// What the fake encoder does on each call
#[derive(Debug, Clone)]
pub struct Script {
    pub fail_init: bool,
    pub fail_configure: bool,
    /// Zero-based encode call that fails
    pub fail_encode_at: Option<usize>,
    pub fail_flush: bool,
    /// Bytes produced per encode call, cycled
    pub encode_bytes: Vec<usize>,
    pub flush_bytes: usize,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            fail_init: false,
            fail_configure: false,
            fail_encode_at: None,
            fail_flush: false,
            encode_bytes: vec![100],
            flush_bytes: 10,
        }
    }
}

pub struct FakeBackend {
    pub journal: Journal,
    pub script: Script,
    pub available: bool,
}

impl FakeBackend {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            script: Script::default(),
            available: true,
        }
    }

    pub fn with_script(mut self, script: Script) -> Self {
        self.script = script;
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }
}

impl EncoderBackend for FakeBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn open_session(&self, settings: &EncoderSettings) -> EncoderResult<Box<dyn EncoderSession>> {
        if self.script.fail_init {
            return Err(EncoderError::Init("scripted init failure".to_string()));
        }
        self.journal.record(Event::Opened(*settings));

        let session = FakeSession {
            journal: self.journal.clone(),
            script: self.script.clone(),
            channels: settings.buffer_channels(),
            calls: 0,
        };
        if self.script.fail_configure {
            // dropped here, released before the caller sees the error
            drop(session);
            return Err(EncoderError::Configure("scripted configure failure".to_string()));
        }
        Ok(Box::new(session))
    }
}

struct FakeSession {
    journal: Journal,
    script: Script,
    channels: usize,
    calls: usize,
}

impl EncoderSession for FakeSession {
    fn encode(&mut self, frame: PcmFrame<'_>, output: &mut Vec<u8>) -> EncoderResult<usize> {
        assert!(output.is_empty(), "output buffer must arrive empty");
        assert!(
            output.capacity() >= mp3_buffer_size(SAMPLES_PER_FRAME),
            "output buffer must hold the worst case"
        );
        assert!(!frame.samples().is_empty(), "empty frames must not be encoded");
        assert!(frame.samples().len() <= SAMPLES_PER_FRAME * self.channels);
        assert_eq!(frame.samples().len() % self.channels, 0);

        self.journal.record(Event::Encoded {
            mono: matches!(frame, PcmFrame::Mono(_)),
            sample_frames: frame.sample_frames(),
        });

        let call = self.calls;
        self.calls += 1;
        if self.script.fail_encode_at == Some(call) {
            return Err(EncoderError::Encode("scripted result -1".to_string()));
        }

        let n = self.script.encode_bytes[call % self.script.encode_bytes.len()];
        output.extend(std::iter::repeat(call as u8).take(n));
        Ok(n)
    }

    fn flush(&mut self, output: &mut Vec<u8>) -> EncoderResult<usize> {
        self.journal.record(Event::Flushed);
        if self.script.fail_flush {
            return Err(EncoderError::Flush("scripted flush failure".to_string()));
        }
        output.extend(std::iter::repeat(0xFF).take(self.script.flush_bytes));
        Ok(self.script.flush_bytes)
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.journal.record(Event::SessionReleased);
    }
}

/// In-memory PCM input that journals its release
pub struct JournalReader {
    inner: Cursor<Vec<u8>>,
    journal: Journal,
    /// Bytes served before every read fails
    fail_after: Option<usize>,
}

impl JournalReader {
    pub fn new(journal: &Journal, samples: &[i16]) -> Self {
        Self {
            inner: Cursor::new(samples_to_le_bytes(samples)),
            journal: journal.clone(),
            fail_after: None,
        }
    }

    pub fn failing_after(mut self, bytes: usize) -> Self {
        self.fail_after = Some(bytes);
        self
    }
}

impl Read for JournalReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(limit) = self.fail_after {
            let position = self.inner.position() as usize;
            if position >= limit {
                return Err(io::Error::new(io::ErrorKind::Other, "scripted read failure"));
            }
            let n = buf.len().min(limit - position);
            return self.inner.read(&mut buf[..n]);
        }
        self.inner.read(buf)
    }
}

impl Drop for JournalReader {
    fn drop(&mut self) {
        self.journal.record(Event::InputClosed);
    }
}

/// In-memory MP3 output that journals its release
pub struct JournalWriter {
    pub data: Arc<Mutex<Vec<u8>>>,
    journal: Journal,
    /// Total bytes accepted before writes return zero
    capacity: Option<usize>,
}

impl JournalWriter {
    pub fn new(journal: &Journal) -> Self {
        Self {
            data: Arc::new(Mutex::new(Vec::new())),
            journal: journal.clone(),
            capacity: None,
        }
    }

    pub fn accepting(mut self, bytes: usize) -> Self {
        self.capacity = Some(bytes);
        self
    }
}

impl Write for JournalWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut data = self.data.lock().unwrap();
        let room = match self.capacity {
            Some(capacity) => capacity.saturating_sub(data.len()),
            None => buf.len(),
        };
        let n = buf.len().min(room);
        data.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for JournalWriter {
    fn drop(&mut self) {
        self.journal.record(Event::OutputClosed);
    }
}

/// Interleaved test signal of `sample_frames` sample-frames
pub fn test_signal(sample_frames: usize, channels: usize) -> Vec<i16> {
    (0..sample_frames * channels)
        .map(|i| ((i % 2000) as i16 - 1000) * 16)
        .collect()
}

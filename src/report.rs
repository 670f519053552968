//! JSON run reports
//!
//! This module is only available when the "diagnostics" feature is enabled.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{EncoderSettings, TranscodeRequest};
use crate::transcode::TranscodeStats;

/// Summary of one successful transcode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeReport {
    pub created_at: DateTime<Utc>,
    pub backend: String,
    pub input: String,
    pub output: String,
    pub settings: EncoderSettings,
    pub stats: TranscodeStats,
    /// Audio duration in seconds
    pub duration_secs: f64,
    pub elapsed_ms: u64,
    /// Audio seconds encoded per wall-clock second
    pub realtime_factor: Option<f64>,
}

impl TranscodeReport {
    pub fn new(
        request: &TranscodeRequest,
        settings: &EncoderSettings,
        stats: &TranscodeStats,
        elapsed: Duration,
        backend: &str,
    ) -> Self {
        let duration_secs = stats.duration_secs(settings.sample_rate);
        let elapsed_secs = elapsed.as_secs_f64();
        Self {
            created_at: Utc::now(),
            backend: backend.to_string(),
            input: request.input.display().to_string(),
            output: request.output.display().to_string(),
            settings: *settings,
            stats: *stats,
            duration_secs,
            elapsed_ms: elapsed.as_millis() as u64,
            realtime_factor: (elapsed_secs > 0.0).then(|| duration_secs / elapsed_secs),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write the report to `path`
    pub fn save(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let json = self.to_json().map_err(io::Error::from)?;
        let mut file = File::create(path.as_ref())?;
        file.write_all(json.as_bytes())?;
        log::info!("Report saved to: {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_round_trips_through_json() {
        let request = TranscodeRequest::new("in.pcm", "out.mp3");
        let settings = request.validate().unwrap();
        let stats = TranscodeStats {
            frames: 39,
            sample_frames: 44100,
            bytes_read: 176400,
            bytes_written: 16718,
            flush_bytes: 418,
            discarded_bytes: 0,
        };

        let elapsed = Duration::from_millis(250);
        let report = TranscodeReport::new(&request, &settings, &stats, elapsed, "lame");
        assert!((report.duration_secs - 1.0).abs() < 1e-9);
        assert_eq!(report.realtime_factor, Some(4.0));

        let json = report.to_json().unwrap();
        let parsed: TranscodeReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.stats, stats);
        assert_eq!(parsed.settings, settings);
        assert_eq!(parsed.output, "out.mp3");
    }

    #[test]
    fn test_save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let request = TranscodeRequest::new("in.pcm", "out.mp3");
        let settings = request.validate().unwrap();

        let stats = TranscodeStats::default();
        TranscodeReport::new(&request, &settings, &stats, Duration::ZERO, "fake")
            .save(&path)
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"backend\": \"fake\""));
        assert!(contents.contains("\"realtime_factor\": null"));
    }
}

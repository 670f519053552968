//! Raw PCM to MP3 converter command line tool
//!
//! Reads headerless little-endian 16-bit PCM from a file or standard input
//! and writes an MP3 stream using the encoder compiled into this build.

use std::env;
use std::fs::File;
use std::io::{self, Read, Write};
use std::process;
use std::time::Instant;

use pcm2mp3_rs::{
    BitratePreset, FlushPolicy, TranscodeError, TranscodeRequest, TranscodeStats, Transcoder,
};

/// Command line arguments structure
struct Args {
    input_file: String,
    output_file: String,
    sample_rate: i32,
    channels: i32,
    bitrate: i32,
    strict_flush: bool,
    quiet: bool,
    verbose: bool,
    report_file: Option<String>,
}

impl Args {
    /// Parse command line arguments
    fn parse() -> Result<Self, String> {
        let args: Vec<String> = env::args().collect();

        if args.len() < 3 {
            return Err(String::new()); // Empty error triggers usage display
        }

        let mut request = TranscodeRequest::new("", "");
        let mut strict_flush = false;
        let mut quiet = false;
        let mut verbose = false;
        let mut report_file = None;

        let mut i = 1;

        // Parse options (flags starting with -)
        while i < args.len() && args[i].starts_with('-') && args[i] != "-" {
            let arg = &args[i];
            let flag = arg.chars().nth(1).unwrap_or('h');

            match flag {
                'r' | 'c' | 'b' | 'p' | 'j' => {
                    i += 1;
                    let value = args
                        .get(i)
                        .ok_or_else(|| format!("Option -{} requires a value", flag))?;
                    match flag {
                        'r' => request = request.sample_rate(parse_int(value, "sample rate")?),
                        'c' => request = request.channels(parse_int(value, "channel count")?),
                        'b' => request = request.bitrate(parse_int(value, "bitrate")?),
                        'p' => request = request.preset(value.parse::<BitratePreset>()?),
                        _ => report_file = Some(value.clone()),
                    }
                }
                's' => strict_flush = true,
                'q' => {
                    quiet = true;
                    verbose = false;
                }
                'v' => {
                    verbose = true;
                    quiet = false;
                }
                'h' => return Err(String::new()),
                _ => return Err(format!("Unknown option: {}", arg)),
            }
            i += 1;
        }

        // Parse input and output files
        if i + 1 >= args.len() {
            return Err(String::new());
        }

        Ok(Args {
            input_file: args[i].clone(),
            output_file: args[i + 1].clone(),
            sample_rate: request.sample_rate,
            channels: request.channels,
            bitrate: request.bitrate_kbps,
            strict_flush,
            quiet,
            verbose,
            report_file,
        })
    }

    fn request(&self) -> TranscodeRequest {
        TranscodeRequest::new(&self.input_file, &self.output_file)
            .sample_rate(self.sample_rate)
            .channels(self.channels)
            .bitrate(self.bitrate)
    }
}

fn parse_int(value: &str, what: &str) -> Result<i32, String> {
    value
        .parse::<i32>()
        .map_err(|_| format!("Invalid {}: {}", what, value))
}

/// Print usage information
fn print_usage() {
    println!("Usage: pcm2mp3 [options] <infile> <outfile>");
    println!();
    println!("Input is raw little-endian 16-bit PCM, interleaved by channel.");
    println!("Use \"-\" for standard input or output.");
    println!();
    println!("Options:");
    println!(" -h            this help message");
    println!(" -r <rate>     input sample rate in Hz, default 44100");
    println!(" -c <count>    input channel count, default 2");
    println!(" -b <bitrate>  set the bitrate in kbit, default 128");
    println!(" -p <preset>   bitrate preset: high, standard or compact");
    println!(" -s            fail if the final encoder flush fails");
    println!(" -j <file>     write a JSON run report (diagnostics builds)");
    println!(" -q            quiet mode");
    println!(" -v            verbose mode");
}

fn format_hms(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Convert PCM to MP3
fn convert_pcm_to_mp3(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    // Writing MP3 to stdout leaves no room for chatter
    let quiet = args.quiet || args.output_file == "-";

    let transcoder = Transcoder::default().flush_policy(if args.strict_flush {
        FlushPolicy::Strict
    } else {
        FlushPolicy::BestEffort
    });
    if !transcoder.backend().is_available() {
        return Err(TranscodeError::Unavailable {
            backend: transcoder.backend().name(),
        }
        .into());
    }

    let request = args.request();
    let settings = request.validate().map_err(TranscodeError::from)?;

    if !quiet {
        println!("pcm2mp3 (encoder: {})", transcoder.backend().name());
        println!(
            "PCM {}Hz 16bit, {} channel{}, {} kbps",
            settings.sample_rate,
            settings.channels,
            if settings.channels == 1 { "" } else { "s" },
            settings.bitrate_kbps
        );
        println!("Encoding \"{}\" to \"{}\"", args.input_file, args.output_file);
    }

    let start_time = Instant::now();

    let stats: TranscodeStats = match (args.input_file.as_str(), args.output_file.as_str()) {
        (input, output) if input != "-" && output != "-" => transcoder.transcode(&request)?,
        (input, output) => {
            let reader: Box<dyn Read> = if input == "-" {
                Box::new(io::stdin().lock())
            } else {
                Box::new(File::open(input).map_err(|source| TranscodeError::OpenInput {
                    path: input.into(),
                    source,
                })?)
            };
            let writer: Box<dyn Write> = if output == "-" {
                Box::new(io::stdout().lock())
            } else {
                Box::new(File::create(output).map_err(|source| TranscodeError::OpenOutput {
                    path: output.into(),
                    source,
                })?)
            };
            transcoder.transcode_stream(&settings, reader, writer)?
        }
    };

    let elapsed = start_time.elapsed();
    let duration = stats.duration_secs(settings.sample_rate);

    if !quiet {
        if elapsed.as_secs_f64() > 0.0 {
            println!(
                "Finished in {} ({:.1}x realtime)",
                format_hms(elapsed.as_secs()),
                duration / elapsed.as_secs_f64()
            );
        } else {
            println!("Finished in {} (infx realtime)", format_hms(elapsed.as_secs()));
        }
    }

    if args.verbose && !quiet {
        println!();
        println!("=== Additional Statistics ===");
        println!("Frames encoded:   {}", stats.frames);
        println!("Audio duration:   {} ({:.3} s)", format_hms(duration as u64), duration);
        println!("Input size:       {} bytes", stats.bytes_read);
        println!("Output size:      {} bytes", stats.bytes_written);
        println!("Flushed:          {} bytes", stats.flush_bytes);
        if stats.discarded_bytes > 0 {
            println!("Discarded:        {} trailing bytes", stats.discarded_bytes);
        }
        if stats.bytes_written > 0 {
            println!(
                "Compression:      {:.1}:1",
                stats.bytes_read as f64 / stats.bytes_written as f64
            );
        }
        if duration > 0.0 {
            println!(
                "Actual bitrate:   {:.1} kbps",
                (stats.bytes_written as f64 * 8.0) / (duration * 1000.0)
            );
        }
    }

    if let Some(path) = &args.report_file {
        write_report(path, &request, &settings, &stats, elapsed, transcoder.backend().name())?;
    }

    Ok(())
}

#[cfg(feature = "diagnostics")]
fn write_report(
    path: &str,
    request: &TranscodeRequest,
    settings: &pcm2mp3_rs::EncoderSettings,
    stats: &TranscodeStats,
    elapsed: std::time::Duration,
    backend: &str,
) -> io::Result<()> {
    pcm2mp3_rs::report::TranscodeReport::new(request, settings, stats, elapsed, backend).save(path)
}

#[cfg(not(feature = "diagnostics"))]
fn write_report(
    path: &str,
    _request: &TranscodeRequest,
    _settings: &pcm2mp3_rs::EncoderSettings,
    _stats: &TranscodeStats,
    _elapsed: std::time::Duration,
    _backend: &str,
) -> io::Result<()> {
    log::warn!("Not writing report {}: built without the diagnostics feature", path);
    Ok(())
}

fn main() {
    // Parse command line arguments
    let args = match Args::parse() {
        Ok(args) => args,
        Err(err) => {
            if err.is_empty() {
                // Empty error means show usage
                print_usage();
            } else {
                eprintln!("Error: {}", err);
            }
            process::exit(1);
        }
    };

    // Errors only by default, everything from this crate with -v
    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Error
        })
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    if let Err(err) = convert_pcm_to_mp3(&args) {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

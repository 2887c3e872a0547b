//! Timeslice CLI
//!
//! Usage:
//!   timeslice --input frames.ndjson              # Decode a file of timeslices
//!   cat frames.ndjson | timeslice --json         # JSON output, one line per frame
//!   timeslice --config parser.json --exclude /lidar --verbose

use clap::Parser;
use std::io::{self, BufRead, BufReader};

use chrono::{DateTime, Utc};
use timeslice::types::{DecodedStream, ParsedTimeslice, TimesliceMessage};
use timeslice::{ParserConfig, TimesliceParser, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "timeslice",
    version = VERSION,
    about = "Decode XVIZ v2 timeslice messages into stream snapshots",
    long_about = "Reads newline-delimited JSON timeslice messages and decodes each one\n\
                  into a snapshot of decoded streams.\n\n\
                  Output types:\n  \
                  TIMESLICE  - Usable frame with timestamp and streams\n  \
                  INCOMPLETE - No timestamp yet, frame can be skipped"
)]
struct Args {
    /// Input file with one JSON timeslice per line (default: stdin)
    #[arg(short, long)]
    input: Option<String>,

    /// Parser config file (JSON)
    #[arg(short, long)]
    config: Option<String>,

    /// Stream name to exclude from decoding (repeatable)
    #[arg(short, long = "exclude")]
    exclude: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// List decoded streams per frame
    #[arg(short, long)]
    verbose: bool,

    /// Do not print INCOMPLETE frames
    #[arg(long)]
    skip_incomplete: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(1);
        }
    };

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => match std::fs::File::open(path) {
            Ok(file) => Box::new(BufReader::new(file)),
            Err(e) => {
                eprintln!("Cannot open {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => Box::new(BufReader::new(io::stdin())),
    };

    if let Err(e) = run(reader, &config, &args) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

/// Config file first, then --exclude names on top
fn load_config(args: &Args) -> Result<ParserConfig, timeslice::ConfigError> {
    let config = match &args.config {
        Some(path) => ParserConfig::load(path)?,
        None => ParserConfig::default(),
    };
    Ok(config.with_blacklist(args.exclude.iter().cloned()))
}

/// Decode every line, stopping at the first failure
fn run(reader: Box<dyn BufRead>, config: &ParserConfig, args: &Args) -> Result<(), String> {
    let parser = TimesliceParser::new(config);
    let mut frames = 0usize;
    let mut incomplete = 0usize;

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|e| format!("line {}: read error: {}", line_no, e))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let message = TimesliceMessage::from_json(line)
            .map_err(|e| format!("line {}: malformed timeslice: {}", line_no, e))?;
        let parsed = parser
            .parse(&message, None)
            .map_err(|e| format!("line {}: {}", line_no, e))?;

        frames += 1;
        if parsed.is_incomplete() {
            incomplete += 1;
            if args.skip_incomplete {
                continue;
            }
        }

        if args.json {
            let json = serde_json::to_string(&parsed)
                .map_err(|e| format!("line {}: cannot serialize: {}", line_no, e))?;
            println!("{}", json);
        } else {
            print_frame(&parsed, args.verbose);
        }
    }

    log::info!("{} frames decoded, {} incomplete", frames, incomplete);
    Ok(())
}

/// Print one frame as text
fn print_frame(parsed: &ParsedTimeslice<DecodedStream>, verbose: bool) {
    match parsed {
        ParsedTimeslice::Incomplete => println!("[{}]", parsed.message_type()),
        ParsedTimeslice::Timeslice { timestamp, streams } => {
            println!(
                "[{}] t={:.3} ({}) | streams={}",
                parsed.message_type(),
                timestamp,
                format_time(*timestamp),
                streams.len()
            );
            if verbose {
                for (name, stream) in streams {
                    println!("  {:<12} {}", stream.label(), name);
                }
            }
        }
    }
}

/// Render a timestamp in seconds as UTC
fn format_time(timestamp: f64) -> String {
    let secs = timestamp.floor() as i64;
    let nanos = ((timestamp - timestamp.floor()) * 1e9) as u32;
    match DateTime::<Utc>::from_timestamp(secs, nanos) {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string(),
        None => "out of range".to_string(),
    }
}

//! dimscan: measure an object against a reference of known width.
//!
//! Reads frames from an image file (treated as a fixed camera looking at
//! a static scene) or from a directory of frames (one per capture, in
//! file name order), runs the measurement pipeline on each, and prints
//! the averaged dimensions.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin dimscan -- [OPTIONS] <SOURCE>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use dimscan_io::{PathSource, save_artifacts};
use dimscan_pipeline::{AnalysisConfig, AnalysisResult, analyze, test_connection};
use tracing::Level;

/// Calibrated dimensional measurement from a sequence of frames.
///
/// Each frame must show a reference object of known width with the object
/// to measure lying on it or next to it.
#[derive(Parser)]
#[command(name = "dimscan", version)]
struct Cli {
    /// Image file or directory of frames (PNG, JPEG, BMP, WebP).
    source: PathBuf,

    /// Real width of the reference object in centimeters.
    #[arg(long, default_value_t = AnalysisConfig::DEFAULT_REFERENCE_WIDTH_CM)]
    reference_width_cm: f64,

    /// Number of capture attempts.
    #[arg(long, default_value_t = AnalysisConfig::DEFAULT_NUM_CAPTURES, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    captures: usize,

    /// Directory to write the annotated artifacts to.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print the result as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,

    /// Full analysis config as a JSON string.
    ///
    /// When provided, `--reference-width-cm` and `--captures` are ignored.
    #[arg(long)]
    config_json: Option<String>,

    /// Only check that the source opens and delivers a frame.
    #[arg(long)]
    check_connection: bool,

    /// Log per-frame details.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Log warnings and errors only.
    #[arg(short, long)]
    quiet: bool,
}

/// Build the analysis config from CLI arguments.
fn config_from_cli(cli: &Cli) -> Result<AnalysisConfig, String> {
    let config = match cli.config_json {
        Some(ref json) => serde_json::from_str(json)
            .map_err(|e| format!("Error parsing --config-json: {e}"))?,
        None => AnalysisConfig {
            reference_width_cm: cli.reference_width_cm,
            num_captures: cli.captures,
        },
    };
    config
        .validate()
        .map_err(|e| format!("Invalid configuration: {e}"))?;
    Ok(config)
}

const fn log_level(cli: &Cli) -> Level {
    if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::WARN
    } else {
        Level::INFO
    }
}

fn print_report(result: &AnalysisResult) {
    println!("{}", result.message);
    if let Some(m) = &result.measurements {
        println!("  width:  {:.2} cm", m.width_cm);
        println!("  length: {:.2} cm", m.length_cm);
        println!("  height: {:.2} cm", m.height_cm);
    }
    println!(
        "  captures: {} delivered, {} valid, {} invalid",
        result.num_frames_captured, result.num_valid_captures, result.num_invalid_captures
    );
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(log_level(&cli))
        .with_writer(std::io::stderr)
        .init();

    let mut source = PathSource::new(&cli.source);

    if cli.check_connection {
        let status = test_connection(&mut source);
        if cli.json {
            match serde_json::to_string_pretty(&status) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Error serializing status: {e}");
                    return ExitCode::FAILURE;
                }
            }
        } else {
            println!("{}", status.message);
        }
        return if status.success {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let result = match analyze(&mut source, &config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let saved = match cli.output {
        Some(ref dir) => match save_artifacts(&result, dir) {
            Ok(saved) => saved,
            Err(e) => {
                eprintln!("Error writing artifacts to {}: {e}", dir.display());
                return ExitCode::FAILURE;
            }
        },
        None => Vec::new(),
    };

    if cli.json {
        let mut value = match serde_json::to_value(&result) {
            Ok(v) => v,
            Err(e) => {
                eprintln!("Error serializing result: {e}");
                return ExitCode::FAILURE;
            }
        };
        if cli.output.is_some() {
            value["saved"] = serde_json::json!(saved);
        }
        match serde_json::to_string_pretty(&value) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing result: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_report(&result);
        for s in &saved {
            println!("  saved: {}", s.path.display());
        }
    }

    if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("dimscan").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_library_defaults() {
        let cli = parse(&["frames/"]);
        assert_eq!(config_from_cli(&cli).unwrap(), AnalysisConfig::default());
        assert_eq!(log_level(&cli), Level::INFO);
    }

    #[test]
    fn flags_build_config() {
        let cli = parse(&["frames/", "--reference-width-cm", "8.5", "--captures", "3"]);
        let config = config_from_cli(&cli).unwrap();
        assert!((config.reference_width_cm - 8.5).abs() < f64::EPSILON);
        assert_eq!(config.num_captures, 3);
    }

    #[test]
    fn config_json_overrides_flags() {
        let cli = parse(&[
            "frames/",
            "--captures",
            "3",
            "--config-json",
            r#"{"reference_width_cm": 21.0}"#,
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert!((config.reference_width_cm - 21.0).abs() < f64::EPSILON);
        assert_eq!(config.num_captures, AnalysisConfig::DEFAULT_NUM_CAPTURES);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cli = parse(&["frames/", "--reference-width-cm", "0"]);
        assert!(config_from_cli(&cli).is_err());
        let cli = parse(&["frames/", "--config-json", "{not json"]);
        assert!(config_from_cli(&cli).is_err());
    }

    #[test]
    fn zero_captures_is_a_parse_error() {
        let args = ["dimscan", "frames/", "--captures", "0"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn verbosity_flags() {
        assert_eq!(log_level(&parse(&["x", "-v"])), Level::DEBUG);
        assert_eq!(log_level(&parse(&["x", "-q"])), Level::WARN);
        assert!(Cli::try_parse_from(["dimscan", "x", "-v", "-q"]).is_err());
    }

    #[test]
    fn check_connection_flag() {
        assert!(parse(&["x", "--check-connection"]).check_connection);
        assert!(!parse(&["x"]).check_connection);
    }
}

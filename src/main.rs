//! marshal -- plays seeded matches of the command engine against the
//! reference game engine and writes one JSON summary per match.
//!
//! Usage:
//!   marshal [OPTIONS]
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use std::env;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;
use std::time::Instant;

use tracing_subscriber::EnvFilter;

use marshal::config::StrategyConfig;
use marshal::selfplay::{self, MatchConfig};

const DEFAULT_SCENARIO: &str = "scenarios/skirmish.json";

struct Options {
    scenario: String,
    config: Option<String>,
    output: Option<String>,
    matches: MatchConfig,
}

enum Parsed {
    Run(Options),
    Help,
}

fn value<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> Result<T, String> {
    let raw = args
        .get(i)
        .ok_or_else(|| format!("{} needs a value", flag))?;
    raw.parse()
        .map_err(|_| format!("invalid {} value: {}", flag, raw))
}

fn parse_args(args: &[String]) -> Result<Parsed, String> {
    let mut options = Options {
        scenario: DEFAULT_SCENARIO.to_string(),
        config: None,
        output: None,
        matches: MatchConfig::default(),
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--scenario" => {
                i += 1;
                options.scenario = value(args, i, "--scenario")?;
            }
            "--config" => {
                i += 1;
                options.config = Some(value(args, i, "--config")?);
            }
            "--matches" => {
                i += 1;
                options.matches.matches = value(args, i, "--matches")?;
            }
            "--turns" => {
                i += 1;
                options.matches.turns = value(args, i, "--turns")?;
            }
            "--threads" => {
                i += 1;
                options.matches.threads = value(args, i, "--threads")?;
            }
            "--seed" => {
                i += 1;
                options.matches.seed = value(args, i, "--seed")?;
            }
            "--output" => {
                i += 1;
                options.output = Some(value(args, i, "--output")?);
            }
            "--quiet" => options.matches.quiet = true,
            "--help" | "-h" => return Ok(Parsed::Help),
            other => return Err(format!("unknown argument: {}", other)),
        }
        i += 1;
    }
    Ok(Parsed::Run(options))
}

fn run(options: Options) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = selfplay::load_scenario(&options.scenario)?;
    let strategy = match &options.config {
        Some(path) => StrategyConfig::from_file(path)?,
        None => StrategyConfig::default(),
    };
    let config = options.matches;

    if !config.quiet {
        eprintln!(
            "marshal: scenario '{}' ({}x{}), {} matches, {} turns, {} threads",
            scenario.name,
            scenario.snapshot.width,
            scenario.snapshot.height,
            config.matches,
            config.turns,
            config.threads
        );
    }

    let start = Instant::now();
    let records = selfplay::run_matches(&scenario, &strategy, &config)?;

    if !config.quiet {
        eprintln!(
            "Completed {} matches in {:.2}s",
            records.len(),
            start.elapsed().as_secs_f64()
        );
        selfplay::print_summary(&records);
    }

    match &options.output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            selfplay::write_jsonl(&records, &mut writer)?;
            if !config.quiet {
                eprintln!("Wrote {} records to {}", records.len(), path);
            }
        }
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            selfplay::write_jsonl(&records, &mut writer)?;
            writer.flush()?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let args: Vec<String> = env::args().collect();
    let options = match parse_args(&args) {
        Ok(Parsed::Run(options)) => options,
        Ok(Parsed::Help) => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("error: {}", e);
            print_usage();
            return ExitCode::from(2);
        }
    };

    match run(options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    eprintln!("Usage: marshal [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario FILE  Scenario JSON (default: {})", DEFAULT_SCENARIO);
    eprintln!("  --config FILE    Strategy config JSON (default: built-in)");
    eprintln!("  --matches N      Number of matches to play (default: 4)");
    eprintln!("  --turns N        Turn limit per match (default: 200)");
    eprintln!("  --threads N      Number of parallel threads (default: 4)");
    eprintln!("  --seed N         Base seed, 0 for the config seed (default: 0)");
    eprintln!("  --output FILE    Output file path (default: stdout)");
    eprintln!("  --quiet          Suppress progress and summary output");
    eprintln!("  --help           Show this help");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("marshal")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn parses_all_flags() {
        let parsed = parse_args(&args(&[
            "--scenario", "a.json", "--config", "c.json", "--matches", "7", "--turns", "50",
            "--threads", "1", "--seed", "42", "--output", "out.jsonl", "--quiet",
        ]))
        .unwrap();
        let Parsed::Run(o) = parsed else {
            panic!("expected options");
        };
        assert_eq!(o.scenario, "a.json");
        assert_eq!(o.config.as_deref(), Some("c.json"));
        assert_eq!(o.output.as_deref(), Some("out.jsonl"));
        assert_eq!(o.matches.matches, 7);
        assert_eq!(o.matches.turns, 50);
        assert_eq!(o.matches.threads, 1);
        assert_eq!(o.matches.seed, 42);
        assert!(o.matches.quiet);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(parse_args(&args(&["--matches", "many"])).is_err());
        assert!(parse_args(&args(&["--turns"])).is_err());
        assert!(parse_args(&args(&["--bogus"])).is_err());
    }

    #[test]
    fn help_short_circuits() {
        assert!(matches!(parse_args(&args(&["-h", "--bogus"])), Ok(Parsed::Help)));
    }
}

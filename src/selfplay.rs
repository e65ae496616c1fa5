//! Match generation against the reference engine.
//!
//! Loads a scenario, then plays independent seeded matches: each match gets
//! its own `Engine` and `Simulator` and runs until the turn limit or until
//! no enemy tile is left. Matches can run concurrently on a rayon pool.
//! Results are summarized per match and written as JSON Lines.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::board::{Country, PieceKind, Snapshot};
use crate::config::{ConfigError, StrategyConfig};
use crate::engine::Engine;
use crate::eval::{classify, Danger};
use crate::resolve::Simulator;

/// Errors raised while loading a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("failed to read scenario: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid scenario: {0}")]
    Invalid(String),
}

/// Errors raised while running a batch of matches.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A named starting position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    pub snapshot: Snapshot,
}

impl Scenario {
    pub fn from_json(text: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = serde_json::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Every piece in a scenario must belong to the agent's country.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let me = &self.snapshot.my_country;
        if let Some(p) = self.snapshot.pieces().find(|p| p.country != *me) {
            return Err(ScenarioError::Invalid(format!(
                "piece {} belongs to {}, not {}",
                p.id, p.country, me
            )));
        }
        Ok(())
    }
}

/// Loads and validates a scenario file.
pub fn load_scenario(path: impl AsRef<Path>) -> Result<Scenario, ScenarioError> {
    let text = fs::read_to_string(path)?;
    Scenario::from_json(&text)
}

/// Settings for a batch of matches.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Number of matches to play.
    pub matches: usize,
    /// Turn limit per match.
    pub turns: u32,
    /// Worker threads; 1 plays matches sequentially.
    pub threads: usize,
    /// Base seed (0 = use the strategy's seed, or entropy if that is 0 too).
    pub seed: u64,
    /// Suppress per-match progress output.
    pub quiet: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            matches: 4,
            turns: 200,
            threads: 4,
            seed: 0,
            quiet: false,
        }
    }
}

/// Command outcome counts at the end of a match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandTally {
    pub in_progress: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Summary of one finished match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: usize,
    pub seed: u64,
    pub turns: u32,
    /// True if the match ended because no enemy tile was left.
    pub conquered: bool,
    /// Tiles held per country at the end.
    pub tiles: BTreeMap<Country, usize>,
    /// The agent's pieces per kind at the end.
    pub pieces: BTreeMap<PieceKind, usize>,
    /// Money on owned tiles plus money carried by builders.
    pub money: u64,
    pub actions: usize,
    pub commands: CommandTally,
    pub faults: usize,
}

fn enemy_tiles(snapshot: &Snapshot) -> usize {
    snapshot
        .tiles()
        .filter(|t| classify(t, snapshot) == Danger::Enemy)
        .count()
}

/// Plays one match from `scenario` with the given engine seed.
pub fn play_match(
    scenario: &Scenario,
    strategy: &StrategyConfig,
    turns: u32,
    match_id: usize,
    seed: u64,
) -> Result<MatchRecord, ConfigError> {
    let mut engine = Engine::new(StrategyConfig {
        seed,
        ..strategy.clone()
    })?;
    let mut sim = Simulator::new(scenario.snapshot.clone(), strategy.prices.clone());
    let mut actions = 0;
    let mut faults = 0;

    while sim.turn() < turns && enemy_tiles(sim.snapshot()) > 0 {
        let view = sim.snapshot().clone();
        let report = engine.play_turn(&view, &mut sim);
        faults += report.faults.len();
        actions += sim.end_turn().len();
    }

    let snapshot = sim.snapshot();
    let tiles = snapshot
        .countries()
        .into_iter()
        .map(|c| {
            let n = snapshot.tiles_owned_by(&c);
            (c, n)
        })
        .collect();
    let mut pieces = BTreeMap::new();
    for p in snapshot.pieces() {
        *pieces.entry(p.kind()).or_insert(0) += 1;
    }
    let (in_progress, succeeded, failed) = engine.tally();

    Ok(MatchRecord {
        match_id,
        seed,
        turns: sim.turn(),
        conquered: enemy_tiles(snapshot) == 0,
        tiles,
        pieces,
        money: snapshot.country_money() + snapshot.builders_money(),
        actions,
        commands: CommandTally {
            in_progress,
            succeeded,
            failed,
        },
        faults,
    })
}

/// Engine seed for match `i` of a batch.
fn match_seed(config: &MatchConfig, strategy: &StrategyConfig, i: usize) -> u64 {
    let base = if config.seed != 0 { config.seed } else { strategy.seed };
    if base == 0 {
        0
    } else {
        base.wrapping_add(i as u64)
    }
}

/// Plays a batch of matches and returns their records in match order.
pub fn run_matches(
    scenario: &Scenario,
    strategy: &StrategyConfig,
    config: &MatchConfig,
) -> Result<Vec<MatchRecord>, MatchError> {
    let mut records = Vec::with_capacity(config.matches);
    run_matches_with_callback(scenario, strategy, config, |r| records.push(r))?;
    records.sort_by_key(|r| r.match_id);
    Ok(records)
}

/// Plays a batch of matches, handing each record to `on_match` as soon as it
/// finishes. With more than one thread, records arrive in completion order.
pub fn run_matches_with_callback<F>(
    scenario: &Scenario,
    strategy: &StrategyConfig,
    config: &MatchConfig,
    on_match: F,
) -> Result<(), MatchError>
where
    F: FnMut(MatchRecord) + Send,
{
    strategy.validate()?;
    if config.threads > 1 {
        run_parallel(scenario, strategy, config, on_match)
    } else {
        run_sequential(scenario, strategy, config, on_match)
    }
}

fn report_progress(config: &MatchConfig, n: usize, record: &MatchRecord, started: Instant) {
    if config.quiet {
        return;
    }
    let outcome = if record.conquered { "conquered" } else { "turn limit" };
    eprintln!(
        "Match {}/{}: {} after {} turns ({:.2}s)",
        n,
        config.matches,
        outcome,
        record.turns,
        started.elapsed().as_secs_f64(),
    );
}

fn run_sequential<F>(
    scenario: &Scenario,
    strategy: &StrategyConfig,
    config: &MatchConfig,
    mut on_match: F,
) -> Result<(), MatchError>
where
    F: FnMut(MatchRecord),
{
    for i in 0..config.matches {
        let started = Instant::now();
        let record = play_match(scenario, strategy, config.turns, i, match_seed(config, strategy, i))?;
        report_progress(config, i + 1, &record, started);
        on_match(record);
    }
    Ok(())
}

fn run_parallel<F>(
    scenario: &Scenario,
    strategy: &StrategyConfig,
    config: &MatchConfig,
    mut on_match: F,
) -> Result<(), MatchError>
where
    F: FnMut(MatchRecord) + Send,
{
    use rayon::prelude::*;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()?;
    let completed = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel::<Result<MatchRecord, ConfigError>>();
    let mut failure = None;

    std::thread::scope(|s| {
        let completed = &completed;
        s.spawn(move || {
            pool.install(|| {
                (0..config.matches)
                    .into_par_iter()
                    .for_each_with(tx, |tx, i| {
                        let started = Instant::now();
                        let result =
                            play_match(scenario, strategy, config.turns, i, match_seed(config, strategy, i));
                        if let Ok(record) = &result {
                            let n = completed.fetch_add(1, Ordering::Relaxed) + 1;
                            report_progress(config, n, record, started);
                        }
                        let _ = tx.send(result);
                    });
            });
        });

        for result in rx {
            match result {
                Ok(record) => on_match(record),
                Err(e) => {
                    failure.get_or_insert(e);
                }
            }
        }
    });
    match failure {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Writes one JSON object per record, one per line.
pub fn write_jsonl<W: Write>(records: &[MatchRecord], out: &mut W) -> io::Result<()> {
    for record in records {
        write_record(record, out)?;
    }
    out.flush()
}

pub fn write_record<W: Write>(record: &MatchRecord, out: &mut W) -> io::Result<()> {
    serde_json::to_writer(&mut *out, record)?;
    writeln!(out)
}

/// Prints a summary of a batch to stderr.
pub fn print_summary(records: &[MatchRecord]) {
    let total = records.len();
    let conquered = records.iter().filter(|r| r.conquered).count();
    let turns: u64 = records.iter().map(|r| u64::from(r.turns)).sum();
    let faults: usize = records.iter().map(|r| r.faults).sum();
    let succeeded: usize = records.iter().map(|r| r.commands.succeeded).sum();
    let failed: usize = records.iter().map(|r| r.commands.failed).sum();

    eprintln!("=== Match Summary ===");
    eprintln!("Matches: {}", total);
    eprintln!(
        "Conquered: {} ({:.1}%)",
        conquered,
        100.0 * conquered as f64 / total.max(1) as f64
    );
    eprintln!("Avg turns/match: {:.1}", turns as f64 / total.max(1) as f64);
    eprintln!("Commands succeeded: {}, failed: {}", succeeded, failed);
    eprintln!("Faults: {}", faults);
}

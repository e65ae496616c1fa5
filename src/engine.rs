//! Command lifecycle engine.
//!
//! Holds the command registry, the seeded random source and the per-turn
//! ledger, and runs one turn at a time: purge commands of vanished pieces,
//! advance movement commands, advance economic commands, hand out new
//! commands to idle pieces, then give the freshly commanded pieces their
//! first step. A fault while advancing one piece fails that piece's command
//! and is recorded in the `TurnReport`; the other pieces are unaffected.

use std::collections::BTreeMap;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::board::{
    Action, ActionError, ActionSink, Coordinate, Piece, PieceId, PieceKind, Snapshot, SnapshotError,
};
use crate::command::{Command, CommandId, CommandStatus, CommandStore, Intent};
use crate::config::{ConfigError, StrategyConfig};
use crate::eval::{self, Danger};
use crate::movegen::{plan_build, plan_collection, plan_step, BuildPlan, Collect, PlanError, Step, TurnLedger};
use crate::search::{assign_targets, choose_production, escort_targets};

/// Reasons a command cannot be issued. Nothing is logged when these occur.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IssueError {
    #[error("no pieces given")]
    NoPieces,

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("piece {piece} is a {actual}, this command needs a {expected}")]
    WrongRole {
        piece: PieceId,
        actual: PieceKind,
        expected: PieceKind,
    },

    #[error("piece type {0} has no price")]
    Unpriced(PieceKind),
}

/// A fault while advancing one piece's command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdvanceError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("engine rejected `{action}`: {source}")]
    Rejected {
        action: Action,
        #[source]
        source: ActionError,
    },

    #[error("piece {piece} is now a {actual}, its command needs a {expected}")]
    RoleChanged {
        piece: PieceId,
        actual: PieceKind,
        expected: PieceKind,
    },
}

/// What happened to one piece's command during a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceOutcome {
    pub piece: PieceId,
    pub command: CommandId,
    /// The action submitted for the piece, if any.
    pub action: Option<Action>,
    /// Command status after this turn.
    pub status: CommandStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub piece: PieceId,
    pub command: CommandId,
    pub error: AdvanceError,
}

/// Everything `play_turn` did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnReport {
    pub turn: u32,
    /// Commands failed because their piece left the snapshot.
    pub purged: Vec<(PieceId, CommandId)>,
    /// Commands created by the assignment phase.
    pub issued: Vec<CommandId>,
    pub outcomes: Vec<PieceOutcome>,
    pub faults: Vec<Fault>,
}

impl TurnReport {
    /// Actions submitted this turn, in submission order.
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.outcomes.iter().filter_map(|o| o.action.as_ref())
    }

    pub fn outcome_for(&self, piece: PieceId) -> Option<&PieceOutcome> {
        self.outcomes.iter().find(|o| o.piece == piece)
    }

    pub fn completed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == CommandStatus::Success)
            .count()
    }
}

/// Result of advancing a command by one turn.
enum Progress {
    Continue(Option<Action>),
    Complete(Option<Action>),
}

pub struct Engine {
    config: StrategyConfig,
    store: CommandStore,
    ledger: TurnLedger,
    rng: SmallRng,
    turn: u32,
}

impl Engine {
    /// Creates an engine after validating `config`. A config seed of 0 draws
    /// the seed from entropy.
    pub fn new(config: StrategyConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.seed {
            0 => SmallRng::from_entropy(),
            seed => SmallRng::seed_from_u64(seed),
        };
        Ok(Engine {
            config,
            store: CommandStore::new(),
            ledger: TurnLedger::new(),
            rng,
            turn: 0,
        })
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Number of turns played so far.
    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn command(&self, id: CommandId) -> Option<&Command> {
        self.store.command(id)
    }

    /// Every command ever issued, oldest first.
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.store.log().iter()
    }

    /// The piece's in-progress command, if any.
    pub fn active_command(&self, piece: PieceId) -> Option<&Command> {
        self.store.active_for(piece)
    }

    /// (in progress, succeeded, failed) command counts.
    pub fn tally(&self) -> (usize, usize, usize) {
        self.store.log().tally()
    }

    // ----- per-turn orchestration -----

    /// Plays one turn against `snapshot`, submitting at most one action per
    /// piece to `sink`.
    pub fn play_turn<S: ActionSink>(&mut self, snapshot: &Snapshot, sink: &mut S) -> TurnReport {
        self.ledger.clear();
        self.turn += 1;
        let mut report = TurnReport {
            turn: self.turn,
            ..TurnReport::default()
        };

        report.purged = self.store.purge_missing(snapshot);
        for (piece, command) in &report.purged {
            info!(piece = %piece, command = %command, "piece is gone, command failed");
        }

        let (movement, economic): (Vec<Command>, Vec<Command>) = self
            .store
            .active()
            .filter_map(|(_, id)| self.store.command(id).cloned())
            .partition(|c| c.intent.is_movement());

        for command in movement.iter().chain(economic.iter()) {
            self.advance_and_record(snapshot, command, sink, &mut report);
        }

        report.issued = self.assign_idle(snapshot);

        for id in report.issued.clone() {
            let Some(command) = self.store.command(id).cloned() else {
                continue;
            };
            if self.ledger.has_acted(command.piece) {
                continue;
            }
            self.advance_and_record(snapshot, &command, sink, &mut report);
        }

        debug!(
            turn = self.turn,
            actions = report.actions().count(),
            issued = report.issued.len(),
            faults = report.faults.len(),
            "turn complete"
        );
        report
    }

    fn advance_and_record<S: ActionSink>(
        &mut self,
        snapshot: &Snapshot,
        command: &Command,
        sink: &mut S,
        report: &mut TurnReport,
    ) {
        let (action, status) = match self.advance(snapshot, command, sink) {
            Ok(Progress::Continue(action)) => {
                self.store.tick(command.id);
                (action, CommandStatus::InProgress)
            }
            Ok(Progress::Complete(action)) => {
                self.store.settle(command.id, CommandStatus::Success);
                info!(piece = %command.piece, command = %command.id, "command succeeded");
                (action, CommandStatus::Success)
            }
            Err(error) => {
                warn!(piece = %command.piece, command = %command.id, %error, "command failed");
                self.store.settle(command.id, CommandStatus::Failed);
                report.faults.push(Fault {
                    piece: command.piece,
                    command: command.id,
                    error,
                });
                (None, CommandStatus::Failed)
            }
        };
        report.outcomes.push(PieceOutcome {
            piece: command.piece,
            command: command.id,
            action,
            status,
        });
    }

    fn advance<S: ActionSink>(
        &mut self,
        snapshot: &Snapshot,
        command: &Command,
        sink: &mut S,
    ) -> Result<Progress, AdvanceError> {
        let piece = snapshot.piece(command.piece)?;
        let expected = required_kind(&command.intent);
        if piece.kind() != expected {
            return Err(AdvanceError::RoleChanged {
                piece: piece.id,
                actual: piece.kind(),
                expected,
            });
        }

        match command.intent {
            Intent::Attack {
                destination,
                radius,
            } => {
                let step = plan_step(snapshot, piece.position, destination, radius, true, &mut self.rng)?;
                debug!(piece = %piece.id, ?step, "attack step");
                match step {
                    Step::Arrived => {
                        let action = self.submit(sink, Action::Attack {
                            piece: piece.id,
                            target: None,
                        })?;
                        Ok(Progress::Complete(Some(action)))
                    }
                    Step::Engage => {
                        let action = self.submit(sink, Action::Attack {
                            piece: piece.id,
                            target: None,
                        })?;
                        Ok(Progress::Continue(Some(action)))
                    }
                    Step::Move(to) => {
                        let action = self.submit(sink, Action::Move { piece: piece.id, to })?;
                        Ok(Progress::Continue(Some(action)))
                    }
                    Step::Blocked => Ok(Progress::Continue(None)),
                }
            }
            Intent::Defend {
                destination,
                radius,
            } => {
                let step = plan_step(snapshot, piece.position, destination, radius, false, &mut self.rng)?;
                debug!(piece = %piece.id, ?step, "defend step");
                match step {
                    Step::Arrived => Ok(Progress::Complete(None)),
                    Step::Move(to) => {
                        let action = self.submit(sink, Action::Move { piece: piece.id, to })?;
                        Ok(Progress::Continue(Some(action)))
                    }
                    Step::Engage | Step::Blocked => Ok(Progress::Continue(None)),
                }
            }
            Intent::Build { kind } => {
                let plan = plan_build(snapshot, piece, kind, &self.config, &mut self.ledger, &mut self.rng)?;
                debug!(piece = %piece.id, ?plan, "build plan");
                match plan {
                    BuildPlan::Build(kind) => {
                        let action = self.submit(sink, Action::Build { piece: piece.id, kind })?;
                        Ok(Progress::Complete(Some(action)))
                    }
                    BuildPlan::Collect(collect) => {
                        let (action, _) = self.carry_out(sink, piece, collect)?;
                        Ok(Progress::Continue(action))
                    }
                }
            }
            Intent::CollectMoney { amount } => {
                let collect =
                    plan_collection(snapshot, piece, amount, &self.config, &mut self.ledger, &mut self.rng)?;
                debug!(piece = %piece.id, ?collect, "collect plan");
                let (action, done) = self.carry_out(sink, piece, collect)?;
                Ok(if done {
                    Progress::Complete(action)
                } else {
                    Progress::Continue(action)
                })
            }
        }
    }

    /// Submits the action a collection plan calls for. Returns the action
    /// and whether the collection target is now met.
    fn carry_out<S: ActionSink>(
        &mut self,
        sink: &mut S,
        piece: &Piece,
        collect: Collect,
    ) -> Result<(Option<Action>, bool), AdvanceError> {
        match collect {
            Collect::Done => Ok((None, true)),
            Collect::Gather { amount, done } => {
                let action = self.submit(sink, Action::CollectMoney {
                    piece: piece.id,
                    amount,
                })?;
                Ok((Some(action), done))
            }
            Collect::Move { to, .. } => {
                let action = self.submit(sink, Action::Move { piece: piece.id, to })?;
                Ok((Some(action), false))
            }
            Collect::Blocked => Ok((None, false)),
        }
    }

    fn submit<S: ActionSink>(&mut self, sink: &mut S, action: Action) -> Result<Action, AdvanceError> {
        sink.submit(action)
            .map_err(|source| AdvanceError::Rejected { action, source })?;
        self.ledger.mark_acted(action.piece());
        Ok(action)
    }

    // ----- assignment of idle pieces -----

    fn idle_of(&self, snapshot: &Snapshot, kind: PieceKind) -> Vec<(PieceId, Coordinate)> {
        snapshot
            .pieces_of(kind)
            .filter(|p| !self.store.is_busy(p.id))
            .map(|p| (p.id, p.position))
            .collect()
    }

    /// Hands out commands to idle tanks, artillery and builders.
    fn assign_idle(&mut self, snapshot: &Snapshot) -> Vec<CommandId> {
        let mut issued = Vec::new();

        let tanks = self.idle_of(snapshot, PieceKind::Tank);
        for a in assign_targets(snapshot, &tanks, &self.config, &mut self.rng) {
            let intent = Intent::Attack {
                destination: a.target,
                radius: self.config.attack_radius,
            };
            let estimate = snapshot
                .piece(a.piece)
                .map_or(0, |p| travel_estimate(p.position.distance(a.target), p.role.walk()));
            issued.push(self.record(a.piece, intent, estimate));
        }

        let objectives: BTreeMap<PieceId, Coordinate> = snapshot
            .pieces_of(PieceKind::Tank)
            .filter_map(|t| match self.store.active_for(t.id)?.intent {
                Intent::Attack { destination, .. } => Some((t.id, destination)),
                _ => None,
            })
            .collect();
        let artillery = self.idle_of(snapshot, PieceKind::Artillery);
        let radius = self.config.defend_radius;
        for e in escort_targets(snapshot, &artillery, &objectives) {
            let Ok(piece) = snapshot.piece(e.piece) else {
                continue;
            };
            let gap = piece.position.distance(e.destination);
            // Already within range of the escort point.
            if gap <= radius {
                continue;
            }
            let intent = Intent::Defend {
                destination: e.destination,
                radius,
            };
            let estimate = travel_estimate(gap - radius, piece.role.walk());
            issued.push(self.record(e.piece, intent, estimate));
        }

        for builder in snapshot.pieces_of(PieceKind::Builder) {
            if self.store.is_busy(builder.id) {
                continue;
            }
            let Some(kind) = choose_production(&self.config, &mut self.rng) else {
                break;
            };
            let Some(price) = self.config.price(kind) else {
                continue;
            };
            let estimate = self.collection_estimate(builder.money(), price);
            issued.push(self.record(builder.id, Intent::Build { kind }, estimate));
        }

        issued
    }

    fn record(&mut self, piece: PieceId, intent: Intent, estimated_turns: i64) -> CommandId {
        let (id, superseded) = self.store.issue(piece, intent, estimated_turns);
        if let Some(old) = superseded {
            info!(piece = %piece, command = %old, "command superseded");
        }
        info!(piece = %piece, command = %id, ?intent, estimated_turns, "command issued");
        id
    }

    /// Turns of collecting needed to go from `carried` to `price`, plus the
    /// turn spent acting on it.
    fn collection_estimate(&self, carried: u32, price: u32) -> i64 {
        let short = price.saturating_sub(carried);
        i64::from(short.div_ceil(self.config.collect_cap)) + 1
    }

    // ----- issuance -----

    fn require(&self, snapshot: &Snapshot, piece: PieceId, expected: PieceKind) -> Result<(), IssueError> {
        let actual = snapshot.piece(piece)?.kind();
        if actual != expected {
            return Err(IssueError::WrongRole {
                piece,
                actual,
                expected,
            });
        }
        Ok(())
    }

    /// Sends tanks to attack `destination`, replacing any command they had.
    ///
    /// All pieces are checked before anything is issued; on error no command
    /// is created.
    pub fn attack(
        &mut self,
        snapshot: &Snapshot,
        pieces: &[PieceId],
        destination: Coordinate,
        radius: u32,
    ) -> Result<Vec<CommandId>, IssueError> {
        self.issue_group(snapshot, pieces, PieceKind::Tank, Intent::Attack {
            destination,
            radius,
        })
    }

    /// Sends artillery to hold within `radius` of `destination`.
    pub fn defend(
        &mut self,
        snapshot: &Snapshot,
        pieces: &[PieceId],
        destination: Coordinate,
        radius: u32,
    ) -> Result<Vec<CommandId>, IssueError> {
        self.issue_group(snapshot, pieces, PieceKind::Artillery, Intent::Defend {
            destination,
            radius,
        })
    }

    fn issue_group(
        &mut self,
        snapshot: &Snapshot,
        pieces: &[PieceId],
        expected: PieceKind,
        intent: Intent,
    ) -> Result<Vec<CommandId>, IssueError> {
        if pieces.is_empty() {
            return Err(IssueError::NoPieces);
        }
        for &piece in pieces {
            self.require(snapshot, piece, expected)?;
        }
        let mut ids = Vec::with_capacity(pieces.len());
        for &piece in pieces {
            let estimate = match intent.target() {
                Some((destination, _)) => self.estimate_attack_time(snapshot, piece, destination)?,
                None => 0,
            };
            ids.push(self.record(piece, intent, estimate));
        }
        Ok(ids)
    }

    /// Orders a builder to build `kind`, collecting money first if needed.
    pub fn build_piece(
        &mut self,
        snapshot: &Snapshot,
        piece: PieceId,
        kind: PieceKind,
    ) -> Result<CommandId, IssueError> {
        self.require(snapshot, piece, PieceKind::Builder)?;
        let price = self.config.price(kind).ok_or(IssueError::Unpriced(kind))?;
        let estimate = self.collection_estimate(snapshot.piece(piece)?.money(), price);
        Ok(self.record(piece, Intent::Build { kind }, estimate))
    }

    /// Orders a builder to collect until it carries `amount`.
    pub fn collect_money(
        &mut self,
        snapshot: &Snapshot,
        piece: PieceId,
        amount: u32,
    ) -> Result<CommandId, IssueError> {
        self.require(snapshot, piece, PieceKind::Builder)?;
        let estimate = self.collection_estimate(snapshot.piece(piece)?.money(), amount);
        Ok(self.record(piece, Intent::CollectMoney { amount }, estimate))
    }

    // ----- reports and estimates -----

    fn report_kind<'a>(
        &'a self,
        snapshot: &Snapshot,
        kind: PieceKind,
    ) -> BTreeMap<PieceId, Option<&'a Command>> {
        snapshot
            .pieces_of(kind)
            .map(|p| (p.id, self.store.active_for(p.id)))
            .collect()
    }

    /// Every tank with its active command.
    pub fn report_attacking_pieces<'a>(
        &'a self,
        snapshot: &Snapshot,
    ) -> BTreeMap<PieceId, Option<&'a Command>> {
        self.report_kind(snapshot, PieceKind::Tank)
    }

    /// Every artillery piece with its active command.
    pub fn report_defending_pieces<'a>(
        &'a self,
        snapshot: &Snapshot,
    ) -> BTreeMap<PieceId, Option<&'a Command>> {
        self.report_kind(snapshot, PieceKind::Artillery)
    }

    /// Every builder with its active command.
    pub fn report_builders<'a>(&'a self, snapshot: &Snapshot) -> BTreeMap<PieceId, Option<&'a Command>> {
        self.report_kind(snapshot, PieceKind::Builder)
    }

    pub fn estimate_tile_danger(&self, snapshot: &Snapshot, at: Coordinate) -> Result<Danger, SnapshotError> {
        eval::estimate_tile_danger(snapshot, at)
    }

    /// Turns for `piece` to reach `destination`: `distance / walk + 1`.
    pub fn estimate_attack_time(
        &self,
        snapshot: &Snapshot,
        piece: PieceId,
        destination: Coordinate,
    ) -> Result<i64, SnapshotError> {
        let p = snapshot.piece(piece)?;
        Ok(travel_estimate(p.position.distance(destination), p.role.walk()))
    }
}

fn travel_estimate(distance: u32, walk: u32) -> i64 {
    i64::from(distance / walk.max(1)) + 1
}

/// The piece kind a command's intent drives.
fn required_kind(intent: &Intent) -> PieceKind {
    match intent {
        Intent::Attack { .. } => PieceKind::Tank,
        Intent::Defend { .. } => PieceKind::Artillery,
        Intent::Build { .. } | Intent::CollectMoney { .. } => PieceKind::Builder,
    }
}

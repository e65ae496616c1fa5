//! Append-only command log.
//!
//! Commands are never removed: a command id is its index in the log, so ids
//! are never reused. Status only ever moves from `InProgress` to one of the
//! two terminal states.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::{Coordinate, PieceId, PieceKind};

/// Index of a command in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(pub usize);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    InProgress,
    Success,
    Failed,
}

impl CommandStatus {
    pub const fn is_terminal(self) -> bool {
        !matches!(self, CommandStatus::InProgress)
    }
}

/// What a command asks its piece to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    /// Walk to within `radius` of `destination` and attack there.
    Attack { destination: Coordinate, radius: u32 },
    /// Walk to within `radius` of `destination` and hold.
    Defend { destination: Coordinate, radius: u32 },
    /// Build a piece, collecting money first if needed.
    Build { kind: PieceKind },
    /// Collect until the builder carries `amount`.
    CollectMoney { amount: u32 },
}

impl Intent {
    /// Destination and radius for movement intents.
    pub const fn target(&self) -> Option<(Coordinate, u32)> {
        match self {
            Intent::Attack {
                destination,
                radius,
            }
            | Intent::Defend {
                destination,
                radius,
            } => Some((*destination, *radius)),
            _ => None,
        }
    }

    pub const fn is_movement(&self) -> bool {
        matches!(self, Intent::Attack { .. } | Intent::Defend { .. })
    }
}

/// A tracked, possibly multi-turn intent for one piece.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub id: CommandId,
    pub piece: PieceId,
    pub intent: Intent,
    pub status: CommandStatus,
    /// Turns this command has been advanced.
    pub elapsed_turns: u32,
    /// Advisory remaining-turn estimate; may go negative.
    pub estimated_turns: i64,
}

#[derive(Debug, Clone, Default)]
pub struct CommandLog {
    commands: Vec<Command>,
}

impl CommandLog {
    pub fn new() -> Self {
        CommandLog::default()
    }

    /// Appends a new in-progress command and returns its id.
    pub fn push(&mut self, piece: PieceId, intent: Intent, estimated_turns: i64) -> CommandId {
        let id = CommandId(self.commands.len());
        self.commands.push(Command {
            id,
            piece,
            intent,
            status: CommandStatus::InProgress,
            elapsed_turns: 0,
            estimated_turns,
        });
        id
    }

    pub fn get(&self, id: CommandId) -> Option<&Command> {
        self.commands.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    /// Moves an in-progress command to a terminal status.
    ///
    /// Returns false (and changes nothing) if the command is unknown, already
    /// terminal, or `status` is `InProgress`.
    pub fn settle(&mut self, id: CommandId, status: CommandStatus) -> bool {
        if !status.is_terminal() {
            return false;
        }
        match self.commands.get_mut(id.0) {
            Some(c) if c.status == CommandStatus::InProgress => {
                c.status = status;
                true
            }
            _ => false,
        }
    }

    pub fn fail(&mut self, id: CommandId) -> bool {
        self.settle(id, CommandStatus::Failed)
    }

    /// Records one more turn of progress on an in-progress command.
    pub fn tick(&mut self, id: CommandId) {
        if let Some(c) = self.commands.get_mut(id.0) {
            if c.status == CommandStatus::InProgress {
                c.elapsed_turns += 1;
                c.estimated_turns -= 1;
            }
        }
    }

    /// Counts commands per status: (in progress, success, failed).
    pub fn tally(&self) -> (usize, usize, usize) {
        self.commands
            .iter()
            .fold((0, 0, 0), |(p, s, f), c| match c.status {
                CommandStatus::InProgress => (p + 1, s, f),
                CommandStatus::Success => (p, s + 1, f),
                CommandStatus::Failed => (p, s, f + 1),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attack() -> Intent {
        Intent::Attack {
            destination: Coordinate::new(5, 5),
            radius: 0,
        }
    }

    #[test]
    fn ids_are_sequential() {
        let mut log = CommandLog::new();
        assert_eq!(log.push(PieceId(1), attack(), 10), CommandId(0));
        assert_eq!(log.push(PieceId(2), attack(), 10), CommandId(1));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn terminal_states_are_final() {
        let mut log = CommandLog::new();
        let id = log.push(PieceId(1), attack(), 3);
        assert!(log.settle(id, CommandStatus::Success));
        assert!(!log.fail(id));
        assert!(!log.settle(id, CommandStatus::Success));
        assert_eq!(log.get(id).unwrap().status, CommandStatus::Success);

        let other = log.push(PieceId(1), attack(), 3);
        assert!(log.fail(other));
        assert!(!log.settle(other, CommandStatus::Success));
        assert_eq!(log.get(other).unwrap().status, CommandStatus::Failed);
    }

    #[test]
    fn settle_rejects_in_progress_and_unknown() {
        let mut log = CommandLog::new();
        let id = log.push(PieceId(1), attack(), 3);
        assert!(!log.settle(id, CommandStatus::InProgress));
        assert!(!log.fail(CommandId(99)));
    }

    #[test]
    fn tick_counts_turns_and_estimate_may_go_negative() {
        let mut log = CommandLog::new();
        let id = log.push(PieceId(1), attack(), 1);
        log.tick(id);
        log.tick(id);
        let c = log.get(id).unwrap();
        assert_eq!(c.elapsed_turns, 2);
        assert_eq!(c.estimated_turns, -1);

        log.fail(id);
        log.tick(id);
        assert_eq!(log.get(id).unwrap().elapsed_turns, 2);
    }

    #[test]
    fn tally_counts_statuses() {
        let mut log = CommandLog::new();
        let a = log.push(PieceId(1), attack(), 1);
        let b = log.push(PieceId(2), attack(), 1);
        log.push(PieceId(3), Intent::CollectMoney { amount: 5 }, 1);
        log.settle(a, CommandStatus::Success);
        log.fail(b);
        assert_eq!(log.tally(), (1, 1, 1));
    }

    #[test]
    fn intent_target() {
        assert_eq!(attack().target(), Some((Coordinate::new(5, 5), 0)));
        assert!(attack().is_movement());
        let build = Intent::Build {
            kind: PieceKind::Tank,
        };
        assert_eq!(build.target(), None);
        assert!(!build.is_movement());
    }
}

//! Cross-turn command state.
//!
//! `CommandStore` pairs the append-only log with the piece → active command
//! association. It enforces "one active command per piece": issuing for a
//! busy piece fails the old command before the new one is logged, and
//! settling a command drops the association.

use std::collections::BTreeMap;

use crate::board::{PieceId, Snapshot};

use super::log::{Command, CommandId, CommandLog, CommandStatus, Intent};

#[derive(Debug, Clone, Default)]
pub struct CommandStore {
    log: CommandLog,
    active: BTreeMap<PieceId, CommandId>,
}

impl CommandStore {
    pub fn new() -> Self {
        CommandStore::default()
    }

    pub fn log(&self) -> &CommandLog {
        &self.log
    }

    pub fn command(&self, id: CommandId) -> Option<&Command> {
        self.log.get(id)
    }

    /// Logs a new command for `piece`.
    ///
    /// Returns the new id and, if the piece was busy, the id of the command
    /// that was failed to make room for it.
    pub fn issue(
        &mut self,
        piece: PieceId,
        intent: Intent,
        estimated_turns: i64,
    ) -> (CommandId, Option<CommandId>) {
        let superseded = self.active.remove(&piece);
        if let Some(old) = superseded {
            self.log.fail(old);
        }
        let id = self.log.push(piece, intent, estimated_turns);
        self.active.insert(piece, id);
        (id, superseded)
    }

    /// The piece's in-progress command, if any.
    pub fn active_for(&self, piece: PieceId) -> Option<&Command> {
        self.active.get(&piece).and_then(|id| self.log.get(*id))
    }

    pub fn is_busy(&self, piece: PieceId) -> bool {
        self.active.contains_key(&piece)
    }

    /// Active (piece, command) pairs in piece order.
    pub fn active(&self) -> impl Iterator<Item = (PieceId, CommandId)> + '_ {
        self.active.iter().map(|(p, c)| (*p, *c))
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Records one more turn of progress on the piece's command.
    pub fn tick(&mut self, id: CommandId) {
        self.log.tick(id);
    }

    /// Settles the command with a terminal status and drops its association.
    pub fn settle(&mut self, id: CommandId, status: CommandStatus) -> bool {
        let Some(piece) = self.log.get(id).map(|c| c.piece) else {
            return false;
        };
        if self.active.get(&piece) == Some(&id) {
            self.active.remove(&piece);
        }
        self.log.settle(id, status)
    }

    /// Fails and forgets every command whose piece is absent from the snapshot.
    ///
    /// Returns the (piece, command) pairs that were purged.
    pub fn purge_missing(&mut self, snapshot: &Snapshot) -> Vec<(PieceId, CommandId)> {
        let gone: Vec<(PieceId, CommandId)> = self
            .active
            .iter()
            .filter(|(piece, _)| !snapshot.has_piece(**piece))
            .map(|(p, c)| (*p, *c))
            .collect();
        for &(piece, id) in &gone {
            self.active.remove(&piece);
            self.log.fail(id);
        }
        gone
    }
}

//! Command registry: the log of issued commands and the cross-turn
//! association from pieces to their active command.

pub mod log;
pub mod store;

pub use log::{Command, CommandId, CommandLog, CommandStatus, Intent};
pub use store::CommandStore;

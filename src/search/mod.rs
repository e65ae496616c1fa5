//! Assignment of standing orders to idle pieces.
//!
//! Each planner here looks at the idle pieces of one role and proposes
//! commands for them: tanks get attack objectives, artillery gets an escort
//! destination, builders get something to produce. The engine turns the
//! proposals into logged commands.

pub mod assign;
pub mod escort;
pub mod production;

pub use assign::{assign_targets, candidate_targets, Assignment};
pub use escort::{escort_targets, Escort};
pub use production::choose_production;

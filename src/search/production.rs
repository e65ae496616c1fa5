//! What idle builders should produce.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::board::PieceKind;
use crate::config::StrategyConfig;

/// Draws a piece kind from the configured production weights.
///
/// Returns `None` when nothing is configured or every weight is zero.
pub fn choose_production<R: Rng>(config: &StrategyConfig, rng: &mut R) -> Option<PieceKind> {
    let (kinds, weights): (Vec<PieceKind>, Vec<u32>) = config
        .production
        .iter()
        .filter(|(_, w)| **w > 0)
        .map(|(k, w)| (*k, *w))
        .unzip();
    let dist = WeightedIndex::new(&weights).ok()?;
    Some(kinds[dist.sample(rng)])
}

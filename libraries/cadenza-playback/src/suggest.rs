//! Random suggestions drawn from the catalog

use cadenza_core::PlayableItem;
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};

/// Pick up to `count` distinct items at random
///
/// The item at `exclude` (usually the current selection) is never returned.
/// If the remaining pool has no more than `count` items, the whole pool is
/// returned in catalog order.
pub fn random_suggestions(
    catalog: &[PlayableItem],
    exclude: Option<usize>,
    count: usize,
) -> Vec<PlayableItem> {
    random_suggestions_with(catalog, exclude, count, &mut thread_rng())
}

/// [`random_suggestions`] with a caller-provided RNG
pub fn random_suggestions_with<R: Rng + ?Sized>(
    catalog: &[PlayableItem],
    exclude: Option<usize>,
    count: usize,
    rng: &mut R,
) -> Vec<PlayableItem> {
    if count == 0 {
        return Vec::new();
    }

    let pool: Vec<&PlayableItem> = catalog
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != exclude)
        .map(|(_, item)| item)
        .collect();

    if pool.len() <= count {
        return pool.into_iter().cloned().collect();
    }

    pool.choose_multiple(rng, count)
        .map(|item| (*item).clone())
        .collect()
}

//! Shuffle ordering
//!
//! Uniform Fisher-Yates permutation of the queue, with the playing track
//! pinned to the front.

use rand::seq::SliceRandom;
use rand::Rng;

/// Build a shuffled play order
///
/// Returns indices into the original queue. When `current` is set, that index
/// comes first and every other index follows in uniformly random order.
pub fn shuffle_order<R: Rng + ?Sized>(len: usize, current: Option<usize>, rng: &mut R) -> Vec<usize> {
    let current = current.filter(|&i| i < len);

    let mut others: Vec<usize> = (0..len).filter(|&i| Some(i) != current).collect();
    others.shuffle(rng);

    let mut order = Vec::with_capacity(len);
    order.extend(current);
    order.extend(others);
    order
}

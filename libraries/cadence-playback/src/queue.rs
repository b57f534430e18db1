//! Play queue with shuffle bookkeeping
//!
//! The queue owns its tracks by value: the list passed to
//! [`Queue::load`] is copied in, so later changes to the caller's collection
//! never reach a playing queue.

use crate::shuffle::shuffle_order;
use crate::types::{Track, TrackId};
use rand::Rng;
use serde::Serialize;

/// Ordered play queue
///
/// Structure while shuffled:
/// ```text
/// tracks:   [C, A, D, B]      <- what the engine plays
/// original: [A, B, C, D]      <- restored on un-shuffle
/// order:    [2, 0, 3, 1]      <- tracks[i] == original[order[i]]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Queue {
    /// Tracks in play order
    tracks: Vec<Track>,

    /// Pre-shuffle order (empty unless shuffled)
    original: Vec<Track>,

    /// Maps play position to original position (empty unless shuffled)
    #[serde(skip)]
    order: Vec<usize>,

    /// Active position in `tracks`
    current_index: usize,

    /// Whether `tracks` is a shuffled view of `original`
    is_shuffled: bool,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the queue
    ///
    /// `start` is clamped into range. Shuffle bookkeeping is discarded.
    pub(crate) fn load(&mut self, tracks: Vec<Track>, start: usize) {
        self.current_index = if tracks.is_empty() {
            0
        } else {
            start.min(tracks.len() - 1)
        };
        self.tracks = tracks;
        self.original.clear();
        self.order.clear();
        self.is_shuffled = false;
    }

    /// Tracks in play order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Pre-shuffle order (empty unless shuffled)
    pub fn original(&self) -> &[Track] {
        &self.original
    }

    /// Ids in play order
    pub fn ids(&self) -> Vec<TrackId> {
        self.tracks.iter().map(|t| t.id.clone()).collect()
    }

    /// Number of tracks
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Active index, `None` for an empty queue
    pub fn current_index(&self) -> Option<usize> {
        (!self.tracks.is_empty()).then_some(self.current_index)
    }

    /// Active track
    pub fn current(&self) -> Option<&Track> {
        self.tracks.get(self.current_index)
    }

    /// Whether a track follows the active one
    pub fn has_next(&self) -> bool {
        self.current_index()
            .is_some_and(|i| i + 1 < self.tracks.len())
    }

    /// Whether a track precedes the active one
    pub fn has_previous(&self) -> bool {
        self.current_index().is_some_and(|i| i > 0)
    }

    /// Whether the queue is shuffled
    pub fn is_shuffled(&self) -> bool {
        self.is_shuffled
    }

    /// First position of a track id
    pub fn position_of(&self, id: &TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| &t.id == id)
    }

    /// Move the active index
    ///
    /// Returns false (and changes nothing) when `index` is out of range.
    pub(crate) fn set_current_index(&mut self, index: usize) -> bool {
        if index < self.tracks.len() {
            self.current_index = index;
            true
        } else {
            false
        }
    }

    /// Shuffle around the active track
    ///
    /// The active track moves to the front and becomes index 0; the others
    /// follow in uniformly random order.
    pub(crate) fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.is_shuffled {
            return;
        }

        let order = shuffle_order(self.tracks.len(), self.current_index(), rng);
        self.original = std::mem::take(&mut self.tracks);
        self.tracks = order.iter().map(|&i| self.original[i].clone()).collect();
        self.order = order;
        self.current_index = 0;
        self.is_shuffled = true;
    }

    /// Restore the pre-shuffle order
    ///
    /// The active index follows the active track into its original position.
    pub(crate) fn unshuffle(&mut self) {
        if !self.is_shuffled {
            return;
        }

        let current_id = self.current().map(|t| t.id.clone());
        let mapped = self
            .order
            .get(self.current_index)
            .copied()
            .filter(|&i| self.original.get(i).map(|t| &t.id) == current_id.as_ref());

        self.tracks = std::mem::take(&mut self.original);
        self.order.clear();
        self.is_shuffled = false;
        self.current_index = mapped
            .or_else(|| current_id.as_ref().and_then(|id| self.position_of(id)))
            .unwrap_or(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_track;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tracks(ids: &[&str]) -> Vec<Track> {
        ids.iter().map(|id| test_track(id, 120.0)).collect()
    }

    fn id_list(queue: &Queue) -> Vec<String> {
        queue.tracks().iter().map(|t| t.id.to_string()).collect()
    }

    #[test]
    fn load_clamps_start_index() {
        let mut queue = Queue::new();
        queue.load(tracks(&["a", "b"]), 9);
        assert_eq!(queue.current_index(), Some(1));

        queue.load(Vec::new(), 3);
        assert_eq!(queue.current_index(), None);
        assert!(queue.current().is_none());
    }

    #[test]
    fn next_and_previous_flags() {
        let mut queue = Queue::new();
        assert!(!queue.has_next());
        assert!(!queue.has_previous());

        queue.load(tracks(&["a", "b", "c"]), 0);
        assert!(queue.has_next());
        assert!(!queue.has_previous());

        queue.set_current_index(2);
        assert!(!queue.has_next());
        assert!(queue.has_previous());

        assert!(!queue.set_current_index(3));
        assert_eq!(queue.current_index(), Some(2));
    }

    #[test]
    fn shuffle_pins_current_and_keeps_multiset() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut queue = Queue::new();
        queue.load(tracks(&["a", "b", "c", "d", "e"]), 2);

        queue.shuffle(&mut rng);

        assert!(queue.is_shuffled());
        assert_eq!(queue.current_index(), Some(0));
        assert_eq!(queue.current().unwrap().id.as_str(), "c");

        let mut shuffled = id_list(&queue);
        shuffled.sort();
        assert_eq!(shuffled, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(queue.original().len(), 5);
    }

    #[test]
    fn unshuffle_follows_the_active_track() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut queue = Queue::new();
        queue.load(tracks(&["a", "b", "c", "d"]), 1);
        queue.shuffle(&mut rng);

        // Engine advanced two tracks while shuffled
        queue.set_current_index(2);
        let playing = queue.current().unwrap().id.clone();

        queue.unshuffle();

        assert!(!queue.is_shuffled());
        assert!(queue.original().is_empty());
        assert_eq!(id_list(&queue), vec!["a", "b", "c", "d"]);
        assert_eq!(queue.current().unwrap().id, playing);
    }

    #[test]
    fn unshuffle_with_duplicate_ids_restores_exact_position() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut queue = Queue::new();
        queue.load(tracks(&["a", "b", "a", "c"]), 2);

        queue.shuffle(&mut rng);
        queue.unshuffle();

        assert_eq!(queue.current_index(), Some(2));
    }

    #[test]
    fn shuffle_empty_queue_sets_flag_only() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut queue = Queue::new();
        queue.shuffle(&mut rng);
        assert!(queue.is_shuffled());
        assert!(queue.is_empty());

        queue.unshuffle();
        assert!(!queue.is_shuffled());
        assert_eq!(queue.current_index(), None);
    }
}

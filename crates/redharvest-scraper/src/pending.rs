//! Posts accepted from a listing but not yet emitted.
//!
//! A post enters the arena when its comment thread is queued and leaves it
//! either when that thread is handled or when the run ends and the arena is
//! drained in listing order.

use std::collections::HashMap;

use parking_lot::Mutex;

use redharvest_core::records::PostRecord;

#[derive(Debug, Default)]
struct Arena {
    slots: Vec<Option<PostRecord>>,
    index: HashMap<String, usize>,
}

#[derive(Debug, Default)]
pub struct PendingPosts {
    arena: Mutex<Arena>,
}

impl PendingPosts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Holds `post` under `post_id`. Returns `false`, leaving the held post
    /// untouched, if the id is already pending.
    pub fn insert(&self, post_id: &str, post: PostRecord) -> bool {
        let mut arena = self.arena.lock();
        if arena.index.contains_key(post_id) {
            return false;
        }
        let slot = arena.slots.len();
        arena.slots.push(Some(post));
        arena.index.insert(post_id.to_owned(), slot);
        true
    }

    /// Removes and returns the post held under `post_id`.
    pub fn take(&self, post_id: &str) -> Option<PostRecord> {
        let mut arena = self.arena.lock();
        let slot = arena.index.remove(post_id)?;
        arena.slots.get_mut(slot).and_then(Option::take)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.lock().index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every pending post, oldest first.
    pub fn drain(&self) -> Vec<PostRecord> {
        let mut arena = self.arena.lock();
        arena.index.clear();
        arena.slots.drain(..).flatten().collect()
    }
}

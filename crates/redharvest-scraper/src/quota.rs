//! Run-scoped counters and caps.
//!
//! Every counter lives behind one lock, so each check and its matching
//! increment happen as a single step even when pages are handled
//! concurrently. Counters only ever grow.

use std::collections::HashMap;

use parking_lot::Mutex;

use redharvest_core::{RunBudget, SeedAllocation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaLimits {
    pub max_items: u32,
    pub max_posts: u32,
    pub per_seed_posts: u32,
    pub max_comments_per_post: u32,
    pub max_communities: u32,
    pub max_users: u32,
}

impl QuotaLimits {
    #[must_use]
    pub fn new(budget: &RunBudget, allocation: &SeedAllocation) -> Self {
        Self {
            max_items: budget.max_items,
            max_posts: budget.max_post_count,
            per_seed_posts: allocation.per_seed_quota,
            max_comments_per_post: budget.max_comments_per_post,
            max_communities: budget.max_communities_count,
            max_users: budget.max_user_count,
        }
    }
}

/// Point-in-time copy of the aggregate counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuotaSnapshot {
    pub items_pushed: u32,
    pub posts: u32,
    pub comments: u32,
    pub communities: u32,
    pub users: u32,
}

#[derive(Debug, Default)]
struct QuotaState {
    totals: QuotaSnapshot,
    posts_by_seed: HashMap<String, u32>,
    comments_by_post: HashMap<String, u32>,
}

impl QuotaState {
    fn can_push(&self, limits: &QuotaLimits) -> bool {
        self.totals.items_pushed < limits.max_items
    }

    fn can_take_post(&self, limits: &QuotaLimits, seed: Option<&str>) -> bool {
        if self.totals.posts >= limits.max_posts {
            return false;
        }
        seed.is_none_or(|key| {
            self.posts_by_seed.get(key).copied().unwrap_or(0) < limits.per_seed_posts
        })
    }

    fn can_take_comment(&self, limits: &QuotaLimits, post_id: &str) -> bool {
        self.comments_by_post.get(post_id).copied().unwrap_or(0) < limits.max_comments_per_post
    }

    fn record_post(&mut self, seed: Option<&str>) {
        self.totals.posts += 1;
        if let Some(key) = seed {
            *self.posts_by_seed.entry(key.to_owned()).or_insert(0) += 1;
        }
    }

    fn record_comment(&mut self, post_id: &str) {
        *self.comments_by_post.entry(post_id.to_owned()).or_insert(0) += 1;
        self.totals.comments += 1;
    }
}

/// Shared budget ledger for one run.
#[derive(Debug)]
pub struct QuotaTracker {
    limits: QuotaLimits,
    state: Mutex<QuotaState>,
}

impl QuotaTracker {
    #[must_use]
    pub fn new(limits: QuotaLimits) -> Self {
        Self {
            limits,
            state: Mutex::new(QuotaState::default()),
        }
    }

    #[must_use]
    pub fn limits(&self) -> &QuotaLimits {
        &self.limits
    }

    #[must_use]
    pub fn snapshot(&self) -> QuotaSnapshot {
        self.state.lock().totals
    }

    #[must_use]
    pub fn seed_posts(&self, seed: &str) -> u32 {
        self.state.lock().posts_by_seed.get(seed).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn post_comments(&self, post_id: &str) -> u32 {
        self.state
            .lock()
            .comments_by_post
            .get(post_id)
            .copied()
            .unwrap_or(0)
    }

    // -- queries ---------------------------------------------------------

    #[must_use]
    pub fn can_push_more(&self) -> bool {
        self.state.lock().can_push(&self.limits)
    }

    #[must_use]
    pub fn can_scrape_more_posts_global(&self) -> bool {
        self.state.lock().can_take_post(&self.limits, None)
    }

    /// Per-seed share and the global post cap. Without a seed key only the
    /// global cap applies.
    #[must_use]
    pub fn can_scrape_more_posts_for_seed(&self, seed: Option<&str>) -> bool {
        self.state.lock().can_take_post(&self.limits, seed)
    }

    #[must_use]
    pub fn can_push_more_comments(&self, post_id: &str) -> bool {
        self.state.lock().can_take_comment(&self.limits, post_id)
    }

    #[must_use]
    pub fn can_scrape_more_communities(&self) -> bool {
        self.state.lock().totals.communities < self.limits.max_communities
    }

    #[must_use]
    pub fn can_scrape_more_users(&self) -> bool {
        self.state.lock().totals.users < self.limits.max_users
    }

    // -- unconditional increments ------------------------------------------

    pub fn record_post(&self, seed: Option<&str>) {
        self.state.lock().record_post(seed);
    }

    pub fn record_comment(&self, post_id: &str) {
        self.state.lock().record_comment(post_id);
    }

    pub fn record_push(&self) {
        self.state.lock().totals.items_pushed += 1;
    }

    // -- atomic claims -------------------------------------------------------

    /// Reserves one post slot for `seed` if both the per-seed share and the
    /// global post cap allow it.
    pub fn try_claim_post(&self, seed: Option<&str>) -> bool {
        let mut state = self.state.lock();
        if !state.can_take_post(&self.limits, seed) {
            return false;
        }
        state.record_post(seed);
        true
    }

    /// Reserves one emission against `maxItems`.
    pub fn try_claim_push(&self) -> bool {
        let mut state = self.state.lock();
        if !state.can_push(&self.limits) {
            return false;
        }
        state.totals.items_pushed += 1;
        true
    }

    /// Reserves one comment of `post_id` together with its emission.
    pub fn try_claim_comment(&self, post_id: &str) -> bool {
        let mut state = self.state.lock();
        if !state.can_push(&self.limits) || !state.can_take_comment(&self.limits, post_id) {
            return false;
        }
        state.record_comment(post_id);
        state.totals.items_pushed += 1;
        true
    }

    /// Reserves one comment that has no post key, counted only against
    /// `maxItems`.
    pub fn try_claim_unkeyed_comment(&self) -> bool {
        let mut state = self.state.lock();
        if !state.can_push(&self.limits) {
            return false;
        }
        state.totals.comments += 1;
        state.totals.items_pushed += 1;
        true
    }

    /// Reserves one community together with its emission.
    pub fn try_claim_community(&self) -> bool {
        let mut state = self.state.lock();
        if !state.can_push(&self.limits) || state.totals.communities >= self.limits.max_communities
        {
            return false;
        }
        state.totals.communities += 1;
        state.totals.items_pushed += 1;
        true
    }

    /// Reserves one user together with its emission.
    pub fn try_claim_user(&self) -> bool {
        let mut state = self.state.lock();
        if !state.can_push(&self.limits) || state.totals.users >= self.limits.max_users {
            return false;
        }
        state.totals.users += 1;
        state.totals.items_pushed += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn limits() -> QuotaLimits {
        QuotaLimits {
            max_items: 10,
            max_posts: 5,
            per_seed_posts: 3,
            max_comments_per_post: 2,
            max_communities: 1,
            max_users: 1,
        }
    }

    #[test]
    fn per_seed_share_and_global_cap_both_apply() {
        let quota = QuotaTracker::new(limits());
        for _ in 0..3 {
            assert!(quota.try_claim_post(Some("a")));
        }
        assert!(!quota.try_claim_post(Some("a")));
        assert!(quota.try_claim_post(Some("b")));
        assert!(quota.try_claim_post(None));
        // Global cap of 5 reached; seed b still has share left.
        assert!(!quota.can_scrape_more_posts_for_seed(Some("b")));
        assert!(!quota.try_claim_post(Some("b")));
        assert_eq!(quota.seed_posts("a"), 3);
        assert_eq!(quota.snapshot().posts, 5);
    }

    #[test]
    fn comment_cap_is_per_post() {
        let quota = QuotaTracker::new(limits());
        assert!(quota.try_claim_comment("p1"));
        assert!(quota.try_claim_comment("p1"));
        assert!(!quota.try_claim_comment("p1"));
        assert!(quota.try_claim_comment("p2"));
        let snap = quota.snapshot();
        assert_eq!(snap.comments, 3);
        assert_eq!(snap.items_pushed, 3);
        assert_eq!(quota.post_comments("p1"), 2);
    }

    #[test]
    fn item_cap_blocks_every_claim() {
        let quota = QuotaTracker::new(QuotaLimits {
            max_items: 1,
            ..limits()
        });
        assert!(quota.try_claim_community());
        assert!(!quota.can_push_more());
        assert!(!quota.try_claim_push());
        assert!(!quota.try_claim_user());
        assert!(!quota.try_claim_comment("p1"));
        assert!(!quota.try_claim_unkeyed_comment());
        assert_eq!(quota.snapshot().items_pushed, 1);
    }

    #[test]
    fn community_and_user_caps_are_independent() {
        let quota = QuotaTracker::new(limits());
        assert!(quota.try_claim_community());
        assert!(!quota.try_claim_community());
        assert!(!quota.can_scrape_more_communities());
        assert!(quota.can_scrape_more_users());
        assert!(quota.try_claim_user());
        assert!(!quota.try_claim_user());
    }

    #[test]
    fn plain_increments_match_the_queries() {
        let quota = QuotaTracker::new(limits());
        quota.record_post(Some("a"));
        quota.record_comment("p1");
        quota.record_push();
        let snap = quota.snapshot();
        assert_eq!((snap.posts, snap.comments, snap.items_pushed), (1, 1, 1));
        assert!(quota.can_push_more_comments("p1"));
        quota.record_comment("p1");
        assert!(!quota.can_push_more_comments("p1"));
    }

    #[test]
    fn concurrent_claims_never_exceed_the_cap() {
        let quota = Arc::new(QuotaTracker::new(QuotaLimits {
            max_items: 50,
            ..limits()
        }));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let quota = Arc::clone(&quota);
                std::thread::spawn(move || (0..100).filter(|_| quota.try_claim_push()).count())
            })
            .collect();
        let granted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(granted, 50);
        assert_eq!(quota.snapshot().items_pushed, 50);
    }
}

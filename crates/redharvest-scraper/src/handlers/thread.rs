//! Post-detail seeds and comment threads.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use redharvest_core::CanonicalRecord;

use crate::dispatch::RecordSink;
use crate::flatten::flatten_comments;
use crate::normalize::ThreadContext;
use crate::types::{Listing, RawThing, Thing};

use super::{Harvester, PostClaim};

/// The listing at `index` of a `[post, comments]` response.
fn thread_part(body: &Value, index: usize) -> Option<Listing> {
    let part = body.as_array()?.get(index)?;
    match Listing::deserialize(part) {
        Ok(listing) => Some(listing),
        Err(e) => {
            tracing::warn!(index, error = %e, "thread response part is not a listing");
            None
        }
    }
}

impl<S: RecordSink> Harvester<S> {
    /// A post seed: the post is emitted right away and its comments come
    /// from the same response.
    pub(super) fn handle_post_detail(&self, seed_key: &str, body: &Value) {
        if !self.quota.can_push_more() {
            tracing::info!(seed = seed_key, "maxItems reached, skipping post");
            return;
        }

        let Some(post_listing) = thread_part(body, 0) else {
            tracing::warn!(seed = seed_key, "invalid post response format");
            return;
        };
        let Some(raw) = post_listing.data.children.first().and_then(|child| {
            match Thing::from_raw(child) {
                Thing::Post(post) => Some(post),
                _ => None,
            }
        }) else {
            tracing::warn!(seed = seed_key, "no post data found");
            return;
        };

        let now = (self.clock)();
        if let Err(reason) = self.filters.evaluate(&raw, now) {
            tracing::debug!(seed = seed_key, %reason, "skipping post");
            return;
        }
        let Some(post_id) = raw.id.clone().filter(|id| !id.is_empty()) else {
            tracing::warn!(seed = seed_key, "skipping post without id");
            return;
        };
        match self.claim_post(&post_id, Some(seed_key)) {
            PostClaim::Granted => {
                if !self.emit(CanonicalRecord::Post(self.normalizer.post(&raw, now))) {
                    return;
                }
                tracing::info!(
                    title = raw.title.as_deref().unwrap_or_default(),
                    posts = self.quota.snapshot().posts,
                    max_posts = self.budget.max_post_count,
                    "extracted post"
                );
            }
            PostClaim::Duplicate => {
                // A listing may have deferred this post behind a thread fetch
                // with the same URL as this seed; that fetch never runs.
                let Some(pending) = self.pending.take(&post_id) else {
                    return;
                };
                if !self.emit(CanonicalRecord::Post(pending)) {
                    tracing::info!(post_id = %post_id, "maxItems reached, dropping deferred post");
                    return;
                }
            }
            PostClaim::CapReached => {
                tracing::info!(seed = seed_key, "post cap reached, skipping post");
                return;
            }
        }

        if !self.budget.fetches_comments() {
            return;
        }
        if let Some(comments) = thread_part(body, 1) {
            let thread = ThreadContext {
                post_id,
                post_title: raw.title.clone(),
                community_name: raw.subreddit_name_prefixed.clone(),
            };
            self.emit_thread(&comments.data.children, &thread, now);
        }
    }

    /// A deferred post's comment thread: the post goes out first, then its
    /// flattened comments.
    pub(super) fn handle_comment_thread(&self, thread: &ThreadContext, body: &Value) {
        if let Some(post) = self.pending.take(&thread.post_id) {
            if !self.emit(CanonicalRecord::Post(post)) {
                tracing::info!(post_id = %thread.post_id, "maxItems reached, dropping deferred post");
            }
        }

        let Some(comments) = thread_part(body, 1) else {
            tracing::warn!(post_id = %thread.post_id, "no comments listing in thread response");
            return;
        };
        self.emit_thread(&comments.data.children, thread, (self.clock)());
    }

    fn emit_thread(&self, forest: &[RawThing], thread: &ThreadContext, now: DateTime<Utc>) {
        let cap = usize::try_from(self.budget.max_comments_per_post).unwrap_or(usize::MAX);
        let comments = flatten_comments(forest, cap, &self.normalizer, thread, now);

        let mut pushed = 0u32;
        for comment in comments {
            if !self.quota.try_claim_comment(&thread.post_id) {
                tracing::info!(post_id = %thread.post_id, "comment cap reached for post");
                break;
            }
            self.sink.emit(CanonicalRecord::Comment(comment));
            pushed += 1;
        }

        let totals = self.quota.snapshot();
        tracing::info!(
            post = thread.post_title.as_deref().unwrap_or_default(),
            pushed,
            comments = totals.comments,
            items = totals.items_pushed,
            max_items = self.budget.max_items,
            "extracted comments"
        );
    }
}

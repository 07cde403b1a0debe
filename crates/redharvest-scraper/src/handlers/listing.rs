//! Post streams: community listings, user listings and post search.

use chrono::{DateTime, Utc};

use redharvest_core::CanonicalRecord;

use crate::dispatch::{RecordSink, Task, TaskKind};
use crate::normalize::ThreadContext;
use crate::pagination::PageCursor;
use crate::types::{RawPost, RawThing, Thing};

use super::{Harvester, PostClaim};

impl<S: RecordSink> Harvester<S> {
    /// Accepts posts from one page until a cap stops it. Returns the comment
    /// thread fetches for posts that were deferred.
    pub(super) fn extract_posts(
        &self,
        cursor: &PageCursor,
        children: &[RawThing],
        now: DateTime<Utc>,
    ) -> Vec<Task> {
        let seed = cursor.seed_key();
        let mut tasks = Vec::new();
        let mut accepted = 0u32;

        for child in children {
            if !self.quota.can_push_more() {
                tracing::info!(max_items = self.budget.max_items, "maxItems reached, stopping page");
                break;
            }
            if !self.quota.can_scrape_more_posts_for_seed(seed) {
                tracing::info!(source = %cursor.source, "post cap reached, stopping page");
                break;
            }

            let post = match Thing::from_raw(child) {
                Thing::Post(post) => post,
                Thing::Malformed { kind, error } => {
                    tracing::warn!(kind = %kind, error = %error, "skipping malformed child");
                    continue;
                }
                Thing::Comment(_) | Thing::User(_) | Thing::Community(_) | Thing::Other => {
                    continue;
                }
            };

            if let Err(reason) = self.filters.evaluate(&post, now) {
                tracing::debug!(
                    title = post.title.as_deref().unwrap_or_default(),
                    %reason,
                    "skipping post"
                );
                continue;
            }

            match self.accept_post(&post, seed, now) {
                Accepted::Deferred(task) => {
                    accepted += 1;
                    tasks.push(*task);
                }
                Accepted::Emitted => accepted += 1,
                Accepted::Skipped => {}
                Accepted::CapReached => break,
            }
        }

        let totals = self.quota.snapshot();
        tracing::info!(
            stream = %cursor.stream,
            page = cursor.page,
            source = %cursor.source,
            accepted,
            seed_posts = seed.map(|key| self.quota.seed_posts(key)),
            posts = totals.posts,
            max_posts = self.budget.max_post_count,
            items = totals.items_pushed,
            max_items = self.budget.max_items,
            "extracted posts"
        );
        tasks
    }

    /// Counts a filtered post against its caps, then either defers it behind
    /// a comment fetch or emits it straight away.
    fn accept_post(&self, raw: &RawPost, seed: Option<&str>, now: DateTime<Utc>) -> Accepted {
        let Some(post_id) = raw.id.as_deref().filter(|id| !id.is_empty()) else {
            tracing::warn!("skipping post without id");
            return Accepted::Skipped;
        };
        match self.claim_post(post_id, seed) {
            PostClaim::Granted => {}
            PostClaim::Duplicate => {
                tracing::debug!(post_id, "post already harvested");
                return Accepted::Skipped;
            }
            PostClaim::CapReached => return Accepted::CapReached,
        }

        let record = self.normalizer.post(raw, now);
        let permalink = raw.permalink.as_deref().filter(|p| !p.is_empty());

        if let (true, Some(permalink)) = (self.budget.fetches_comments(), permalink) {
            self.pending.insert(post_id, record);
            let task = Task {
                url: self.pagination.urls().comments_url(permalink),
                kind: TaskKind::FetchComments(ThreadContext {
                    post_id: post_id.to_owned(),
                    post_title: raw.title.clone(),
                    community_name: raw.subreddit_name_prefixed.clone(),
                }),
            };
            return Accepted::Deferred(Box::new(task));
        }

        if !self.emit(CanonicalRecord::Post(record)) {
            tracing::info!(post_id, "maxItems reached before post could be emitted");
        }
        Accepted::Emitted
    }
}

enum Accepted {
    Deferred(Box<Task>),
    Emitted,
    Skipped,
    CapReached,
}

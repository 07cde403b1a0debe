//! Per-response stream handlers.
//!
//! [`Harvester`] owns the run's quota ledger, pending-post arena and sink.
//! The crawl loop hands it one fetched response at a time through
//! [`Harvester::handle`], which emits accepted records and returns the
//! follow-up requests to enqueue. Every method takes `&self`, so one
//! harvester is shared by all concurrent workers.

mod listing;
mod search;
mod thread;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use redharvest_core::{CanonicalRecord, HarvestPlan, RunBudget, SeedKind};

use crate::dispatch::{RecordSink, Task, TaskKind};
use crate::filter::FilterPipeline;
use crate::normalize::Normalizer;
use crate::pagination::{
    PageCursor, PageState, PageWindow, PaginationController, StreamKind, UrlBuilder,
};
use crate::pending::PendingPosts;
use crate::quota::{QuotaLimits, QuotaTracker};
use crate::summary::{CrawlStats, RunSummary};
use crate::types::Listing;

pub struct Harvester<S> {
    budget: RunBudget,
    normalizer: Normalizer,
    filters: FilterPipeline,
    pagination: PaginationController,
    quota: QuotaTracker,
    pending: PendingPosts,
    /// Post ids accepted so far; a post reached through two streams is
    /// harvested once.
    seen_posts: Mutex<HashSet<String>>,
    sink: S,
    clock: fn() -> DateTime<Utc>,
}

impl<S: RecordSink> Harvester<S> {
    #[must_use]
    pub fn new(plan: &HarvestPlan, platform_origin: &str, sink: S) -> Self {
        let platform_host = reqwest::Url::parse(platform_origin)
            .ok()
            .and_then(|u| u.host_str().map(str::to_owned))
            .unwrap_or_else(|| platform_origin.to_owned());
        let budget = plan.budget.clone();
        let window = PageWindow {
            start_page: budget.start_page,
            end_page: budget.end_page,
        };
        Self {
            normalizer: Normalizer::new(platform_origin, &platform_host),
            filters: FilterPipeline::from_budget(&budget),
            pagination: PaginationController::new(
                window,
                UrlBuilder::new(platform_origin, &budget),
            ),
            quota: QuotaTracker::new(QuotaLimits::new(&budget, &plan.allocation)),
            pending: PendingPosts::new(),
            seen_posts: Mutex::new(HashSet::new()),
            sink,
            clock: Utc::now,
            budget,
        }
    }

    /// Replaces the wall clock used for age filters and `scrapedAt`.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn quota(&self) -> &QuotaTracker {
        &self.quota
    }

    #[must_use]
    pub fn pending(&self) -> &PendingPosts {
        &self.pending
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// First request of every search stream, then of every seed.
    #[must_use]
    pub fn initial_tasks(&self, plan: &HarvestPlan) -> Vec<Task> {
        let urls = self.pagination.urls();
        let toggles = plan.search_toggles;
        let mut tasks = Vec::new();

        for query in &plan.searches {
            for (enabled, stream) in [
                (toggles.posts, StreamKind::SearchPosts),
                (toggles.communities, StreamKind::SearchCommunities),
                (toggles.users, StreamKind::SearchUsers),
                (toggles.comments, StreamKind::SearchComments),
            ] {
                if !enabled {
                    continue;
                }
                match urls.page_url(stream, query, None) {
                    Ok(url) => tasks.push(Task::list_page(url, PageCursor::first(stream, query))),
                    Err(e) => tracing::warn!(query = %query, error = %e, "skipping search"),
                }
            }
        }

        for seed in &plan.seeds {
            let url = match urls.seed_url(seed) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(seed = %seed.key, error = %e, "skipping seed");
                    continue;
                }
            };
            let kind = match seed.kind {
                SeedKind::Community => TaskKind::ListPage(PageCursor::first(
                    StreamKind::CommunityListing,
                    &seed.key,
                )),
                SeedKind::User => {
                    TaskKind::ListPage(PageCursor::first(StreamKind::UserListing, &seed.key))
                }
                SeedKind::Post => TaskKind::PostDetail {
                    seed_key: seed.key.clone(),
                },
            };
            tasks.push(Task { url, kind });
        }

        tasks
    }

    /// Handles one successfully fetched response and returns the requests it
    /// leads to. Bodies of the wrong shape are logged and skipped.
    pub fn handle(&self, task: &Task, body: &Value) -> Vec<Task> {
        match &task.kind {
            TaskKind::ListPage(cursor) => self.handle_list_page(cursor, body),
            TaskKind::PostDetail { seed_key } => {
                self.handle_post_detail(seed_key, body);
                Vec::new()
            }
            TaskKind::FetchComments(thread) => {
                self.handle_comment_thread(thread, body);
                Vec::new()
            }
        }
    }

    fn handle_list_page(&self, cursor: &PageCursor, body: &Value) -> Vec<Task> {
        let state = self.pagination.state(cursor);
        match state {
            PageState::SkippingToStart => {
                tracing::debug!(
                    stream = %cursor.stream,
                    page = cursor.page,
                    start_page = self.budget.start_page,
                    "skipping page before startPage"
                );
                let after = body.pointer("/data/after").and_then(Value::as_str);
                return self
                    .pagination
                    .next_task(cursor, after, state, &self.quota)
                    .into_iter()
                    .collect();
            }
            PageState::Done => {
                tracing::info!(stream = %cursor.stream, page = cursor.page, "page is past endPage");
                return Vec::new();
            }
            PageState::Active => {}
        }

        if !self.pagination.stream_open(cursor, &self.quota) {
            tracing::info!(
                stream = %cursor.stream,
                source = %cursor.source,
                "cap reached, stream stops"
            );
            return Vec::new();
        }

        let listing = match Listing::deserialize(body) {
            Ok(listing) => listing,
            Err(e) => {
                tracing::warn!(
                    stream = %cursor.stream,
                    page = cursor.page,
                    error = %e,
                    "response is not a listing, skipping page"
                );
                return Vec::new();
            }
        };

        let now = (self.clock)();
        let children = &listing.data.children;
        let mut tasks = match cursor.stream {
            StreamKind::CommunityListing | StreamKind::UserListing | StreamKind::SearchPosts => {
                self.extract_posts(cursor, children, now)
            }
            StreamKind::SearchCommunities => {
                self.extract_communities(cursor, children, now);
                Vec::new()
            }
            StreamKind::SearchUsers => {
                self.extract_users(cursor, children, now);
                Vec::new()
            }
            StreamKind::SearchComments => {
                self.extract_search_comments(cursor, children, now);
                Vec::new()
            }
        };

        tasks.extend(self.pagination.next_task(
            cursor,
            listing.data.after.as_deref(),
            state,
            &self.quota,
        ));
        tasks
    }

    /// Claims an emission slot and emits `record`. Returns `false`, dropping
    /// the record, once `maxItems` is spent.
    fn emit(&self, record: CanonicalRecord) -> bool {
        if !self.quota.try_claim_push() {
            return false;
        }
        self.sink.emit(record);
        true
    }

    /// Marks `post_id` as seen and claims a post slot for it.
    fn claim_post(&self, post_id: &str, seed: Option<&str>) -> PostClaim {
        if !self.seen_posts.lock().insert(post_id.to_owned()) {
            return PostClaim::Duplicate;
        }
        if self.quota.try_claim_post(seed) {
            PostClaim::Granted
        } else {
            self.seen_posts.lock().remove(post_id);
            PostClaim::CapReached
        }
    }

    /// Emits every post still waiting for its comments and builds the run
    /// summary. Posts that no longer fit under `maxItems` are dropped.
    pub fn finish(&self, run_id: Uuid, stats: CrawlStats) -> RunSummary {
        let pending = self.pending.drain();
        let waiting = pending.len();
        let mut flushed = 0usize;
        for post in pending {
            if !self.emit(CanonicalRecord::Post(post)) {
                break;
            }
            flushed += 1;
        }
        if waiting > 0 {
            tracing::info!(
                flushed,
                dropped = waiting - flushed,
                "emitted pending posts without comments"
            );
        }

        let totals = self.quota.snapshot();
        RunSummary {
            run_id,
            items: totals.items_pushed,
            posts: totals.posts,
            comments: totals.comments,
            communities: totals.communities,
            users: totals.users,
            pages_fetched: stats.pages_fetched,
            pages_failed: stats.pages_failed,
            flushed_posts: u32::try_from(flushed).unwrap_or(u32::MAX),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PostClaim {
    Granted,
    Duplicate,
    CapReached,
}

#[cfg(test)]
#[path = "handlers_test.rs"]
mod tests;

//! Per-stream page window and next-page request construction.
//!
//! Each paginated stream instance moves through
//! `SkippingToStart -> Active -> Done`. Pages before `startPage` are fetched
//! only to follow their `after` cursor; pages inside the window are
//! extracted; the stream ends when a cap, the window end or the cursor runs
//! out.

use redharvest_core::{RunBudget, Seed, SeedKind, Sort};

use crate::dispatch::Task;
use crate::error::ScraperError;
use crate::quota::QuotaTracker;

/// One independently paginated content source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    CommunityListing,
    UserListing,
    SearchPosts,
    SearchCommunities,
    SearchUsers,
    SearchComments,
}

impl StreamKind {
    /// The `type=` value of a search stream.
    #[must_use]
    pub fn search_type(self) -> Option<&'static str> {
        match self {
            StreamKind::SearchPosts => Some("link"),
            StreamKind::SearchCommunities => Some("sr"),
            StreamKind::SearchUsers => Some("user"),
            StreamKind::SearchComments => Some("comment"),
            StreamKind::CommunityListing | StreamKind::UserListing => None,
        }
    }

    fn sends_sort(self) -> bool {
        !matches!(self, StreamKind::UserListing | StreamKind::SearchUsers)
    }

    fn sends_time(self) -> bool {
        matches!(
            self,
            StreamKind::CommunityListing | StreamKind::SearchPosts | StreamKind::SearchComments
        )
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StreamKind::CommunityListing => "community",
            StreamKind::UserListing => "user",
            StreamKind::SearchPosts => "search_posts",
            StreamKind::SearchCommunities => "search_communities",
            StreamKind::SearchUsers => "search_users",
            StreamKind::SearchComments => "search_comments",
        };
        f.write_str(name)
    }
}

/// Continuation state of one in-flight page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    pub stream: StreamKind,
    /// 1-based page number.
    pub page: u32,
    /// Seed key for listings, query text for searches.
    pub source: String,
}

impl PageCursor {
    #[must_use]
    pub fn first(stream: StreamKind, source: impl Into<String>) -> Self {
        Self {
            stream,
            page: 1,
            source: source.into(),
        }
    }

    /// Seed key for listing streams; searches are not tied to a seed.
    #[must_use]
    pub fn seed_key(&self) -> Option<&str> {
        match self.stream {
            StreamKind::CommunityListing | StreamKind::UserListing => Some(&self.source),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    SkippingToStart,
    Active,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub start_page: u32,
    pub end_page: Option<u32>,
}

impl PageWindow {
    #[must_use]
    pub fn state(&self, page: u32) -> PageState {
        if page < self.start_page {
            PageState::SkippingToStart
        } else if self.end_page.is_some_and(|end| page > end) {
            PageState::Done
        } else {
            PageState::Active
        }
    }

    /// Whether a page after `page` still falls inside the window.
    #[must_use]
    pub fn allows_next(&self, page: u32) -> bool {
        self.end_page.is_none_or(|end| page < end)
    }
}

/// Builds every URL the harvester requests, rooted at one origin.
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    origin: String,
    sort: Sort,
    time: Option<&'static str>,
}

impl UrlBuilder {
    #[must_use]
    pub fn new(origin: &str, budget: &RunBudget) -> Self {
        Self {
            origin: origin.trim_end_matches('/').to_owned(),
            sort: budget.sort,
            time: budget.time_param(),
        }
    }

    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// URL of a stream page. `source` is the seed key for listings and the
    /// query for searches.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if the resulting URL does not parse.
    pub fn page_url(
        &self,
        stream: StreamKind,
        source: &str,
        after: Option<&str>,
    ) -> Result<String, ScraperError> {
        let mut params: Vec<(&str, &str)> = Vec::with_capacity(5);
        let base = if let Some(kind) = stream.search_type() {
            params.push(("q", source));
            params.push(("type", kind));
            format!("{}/search.json", self.origin)
        } else {
            format!("{source}.json")
        };
        if stream.sends_sort() {
            params.push(("sort", self.sort.as_str()));
        }
        if let Some(after) = after {
            params.push(("after", after));
        }
        if stream.sends_time() {
            if let Some(time) = self.time {
                params.push(("t", time));
            }
        }
        build_url(&base, &params)
    }

    /// URL of the first request for a seed. A query string carried by the
    /// seed URL is kept verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if the resulting URL does not parse.
    pub fn seed_url(&self, seed: &Seed) -> Result<String, ScraperError> {
        match (&seed.query, seed.kind) {
            (Some(query), _) => build_url(&format!("{}.json?{query}", seed.key), &[]),
            (None, SeedKind::Community) => self.page_url(StreamKind::CommunityListing, &seed.key, None),
            (None, SeedKind::User) => self.page_url(StreamKind::UserListing, &seed.key, None),
            (None, SeedKind::Post) => build_url(&format!("{}.json", seed.key), &[]),
        }
    }

    /// URL of a post's comment thread.
    #[must_use]
    pub fn comments_url(&self, permalink: &str) -> String {
        format!("{}{}.json", self.origin, permalink.trim_end_matches('/'))
    }
}

fn build_url(base: &str, params: &[(&str, &str)]) -> Result<String, ScraperError> {
    let mut url = reqwest::Url::parse(base).map_err(|e| ScraperError::InvalidUrl {
        url: base.to_owned(),
        reason: e.to_string(),
    })?;
    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params);
    }
    Ok(url.into())
}

/// Decides what happens after each stream page.
#[derive(Debug, Clone)]
pub struct PaginationController {
    window: PageWindow,
    urls: UrlBuilder,
}

impl PaginationController {
    #[must_use]
    pub fn new(window: PageWindow, urls: UrlBuilder) -> Self {
        Self { window, urls }
    }

    #[must_use]
    pub fn urls(&self) -> &UrlBuilder {
        &self.urls
    }

    #[must_use]
    pub fn state(&self, cursor: &PageCursor) -> PageState {
        self.window.state(cursor.page)
    }

    /// Whether the stream may still produce records: the item cap plus the
    /// stream's own cap. Comment search has no cap of its own.
    #[must_use]
    pub fn stream_open(&self, cursor: &PageCursor, quota: &QuotaTracker) -> bool {
        if !quota.can_push_more() {
            return false;
        }
        match cursor.stream {
            StreamKind::CommunityListing | StreamKind::UserListing => {
                quota.can_scrape_more_posts_for_seed(cursor.seed_key())
            }
            StreamKind::SearchPosts => quota.can_scrape_more_posts_global(),
            StreamKind::SearchCommunities => quota.can_scrape_more_communities(),
            StreamKind::SearchUsers => quota.can_scrape_more_users(),
            StreamKind::SearchComments => true,
        }
    }

    /// The follow-up page request, if the stream continues.
    ///
    /// While skipping to the window only the cursor matters. Inside the
    /// window the caps and the window end must also allow another page.
    #[must_use]
    pub fn next_task(
        &self,
        cursor: &PageCursor,
        after: Option<&str>,
        state: PageState,
        quota: &QuotaTracker,
    ) -> Option<Task> {
        let after = after.filter(|a| !a.is_empty())?;
        match state {
            PageState::SkippingToStart => {}
            PageState::Active => {
                if !self.window.allows_next(cursor.page) {
                    tracing::info!(
                        stream = %cursor.stream,
                        page = cursor.page,
                        "reached endPage, no more pages for this stream"
                    );
                    return None;
                }
                if !self.stream_open(cursor, quota) {
                    return None;
                }
            }
            PageState::Done => return None,
        }

        match self.urls.page_url(cursor.stream, &cursor.source, Some(after)) {
            Ok(url) => Some(Task::list_page(
                url,
                PageCursor {
                    page: cursor.page + 1,
                    ..cursor.clone()
                },
            )),
            Err(e) => {
                tracing::warn!(stream = %cursor.stream, error = %e, "cannot build next page URL");
                None
            }
        }
    }
}

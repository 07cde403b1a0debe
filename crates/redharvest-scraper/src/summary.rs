use serde::Serialize;
use uuid::Uuid;

/// Page counters kept by the crawl loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    pub pages_fetched: u64,
    pub pages_failed: u64,
}

/// Final aggregate counters of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub items: u32,
    pub posts: u32,
    pub comments: u32,
    pub communities: u32,
    pub users: u32,
    pub pages_fetched: u64,
    pub pages_failed: u64,
    /// Deferred posts emitted at run end without their comments.
    pub flushed_posts: u32,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Items stored: {} | Posts: {} | Comments: {} | Communities: {} | Users: {} | Pages: {} ok, {} failed",
            self.items,
            self.posts,
            self.comments,
            self.communities,
            self.users,
            self.pages_fetched,
            self.pages_failed
        )
    }
}

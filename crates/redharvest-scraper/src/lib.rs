//! Quota-aware harvesting of posts, comments, communities and users from the
//! platform's public JSON endpoints.

pub mod client;
pub mod crawler;
pub mod dispatch;
pub mod error;
pub mod filter;
pub mod flatten;
pub mod handlers;
pub mod normalize;
pub mod pagination;
pub mod pending;
pub mod quota;
pub(crate) mod rate_limit;
pub mod summary;
pub mod types;

pub use client::{HttpFetcher, SessionLease, SessionPool};
pub use crawler::Crawler;
pub use dispatch::{spawn_jsonl_writer, ChannelSink, MemorySink, RecordSink, Task, TaskKind};
pub use error::ScraperError;
pub use filter::{FilterPipeline, Rejection};
pub use handlers::Harvester;
pub use normalize::{Normalizer, ThreadContext};
pub use pagination::{PageCursor, StreamKind};
pub use quota::{QuotaSnapshot, QuotaTracker};
pub use summary::{CrawlStats, RunSummary};

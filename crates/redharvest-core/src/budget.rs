//! Immutable per-run limits and the fair-share post allocation across seeds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Listing/search sort order accepted by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sort {
    Relevance,
    Hot,
    Top,
    #[default]
    New,
    Rising,
    Comments,
}

impl Sort {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Sort::Relevance => "relevance",
            Sort::Hot => "hot",
            Sort::Top => "top",
            Sort::New => "new",
            Sort::Rising => "rising",
            Sort::Comments => "comments",
        }
    }
}

impl std::fmt::Display for Sort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time window for `top` sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    Hour,
    Day,
    Week,
    Month,
    Year,
    #[default]
    All,
}

impl TimeRange {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TimeRange::Hour => "hour",
            TimeRange::Day => "day",
            TimeRange::Week => "week",
            TimeRange::Month => "month",
            TimeRange::Year => "year",
            TimeRange::All => "all",
        }
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only limits for one run, created once from validated input.
#[derive(Debug, Clone, PartialEq)]
pub struct RunBudget {
    pub max_items: u32,
    pub max_post_count: u32,
    pub max_comments_per_post: u32,
    pub max_communities_count: u32,
    pub max_user_count: u32,
    pub start_page: u32,
    pub end_page: Option<u32>,
    pub post_date_limit: Option<DateTime<Utc>>,
    pub max_post_age_days: Option<i64>,
    pub sort: Sort,
    pub time_range: TimeRange,
    pub include_nsfw: bool,
    pub skip_comments: bool,
}

impl RunBudget {
    /// Whether accepted posts get a dependent comment-thread fetch.
    #[must_use]
    pub fn fetches_comments(&self) -> bool {
        !self.skip_comments && self.max_comments_per_post > 0
    }

    /// The `t=` query value, sent only for `top` sorting over a bounded window.
    #[must_use]
    pub fn time_param(&self) -> Option<&'static str> {
        (self.sort == Sort::Top && self.time_range != TimeRange::All)
            .then(|| self.time_range.as_str())
    }

    /// Default `maxItems` when the input omits it: room for every post, each
    /// post's comments, and the community/user caps.
    #[must_use]
    pub fn default_max_items(
        max_post_count: u32,
        max_comments_per_post: u32,
        max_communities_count: u32,
        max_user_count: u32,
    ) -> u32 {
        max_post_count
            .saturating_mul(max_comments_per_post.saturating_add(1))
            .saturating_add(max_communities_count)
            .saturating_add(max_user_count)
    }
}

impl Default for RunBudget {
    fn default() -> Self {
        Self {
            max_items: Self::default_max_items(10, 2, 2, 2),
            max_post_count: 10,
            max_comments_per_post: 2,
            max_communities_count: 2,
            max_user_count: 2,
            start_page: 1,
            end_page: None,
            post_date_limit: None,
            max_post_age_days: None,
            sort: Sort::New,
            time_range: TimeRange::All,
            include_nsfw: true,
            skip_comments: false,
        }
    }
}

/// Fair-share post quota per seed URL.
///
/// Ceiling division means the per-seed shares can sum to more than
/// `max_post_count`; the global post cap remains the hard limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedAllocation {
    pub seed_count: usize,
    pub per_seed_quota: u32,
}

impl SeedAllocation {
    #[must_use]
    pub fn new(max_post_count: u32, seed_count: usize) -> Self {
        let divisor = u32::try_from(seed_count.max(1)).unwrap_or(u32::MAX);
        Self {
            seed_count,
            per_seed_quota: max_post_count.div_ceil(divisor),
        }
    }
}

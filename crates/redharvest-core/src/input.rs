//! Run input: the per-run YAML/JSON document and its validation into a
//! [`HarvestPlan`].

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::budget::{RunBudget, SeedAllocation, Sort, TimeRange};
use crate::seed::{Seed, SeedKind};
use crate::InputError;

/// A start URL given either as a bare string or as `{ url: ... }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UrlEntry {
    Plain(String),
    Object { url: String },
}

impl UrlEntry {
    fn as_str(&self) -> &str {
        match self {
            UrlEntry::Plain(s) | UrlEntry::Object { url: s } => s,
        }
    }
}

/// A search given either as a bare string or as `{ query: ... }` / `{ url: ... }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SearchEntry {
    Plain(String),
    Object {
        #[serde(default)]
        query: Option<String>,
        #[serde(default)]
        url: Option<String>,
    },
}

impl SearchEntry {
    fn query(&self) -> Option<&str> {
        let raw = match self {
            SearchEntry::Plain(s) => Some(s.as_str()),
            SearchEntry::Object { query, url } => query.as_deref().or(url.as_deref()),
        };
        raw.map(str::trim).filter(|q| !q.is_empty())
    }
}

/// The raw run input as supplied by the operator.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct RunInput {
    #[serde(default)]
    pub start_urls: Option<Vec<UrlEntry>>,
    #[serde(default)]
    pub ignore_start_urls: bool,
    #[serde(default)]
    pub skip_user_posts: bool,
    #[serde(default)]
    pub searches: Vec<SearchEntry>,
    #[serde(default = "default_true")]
    pub search_posts: bool,
    #[serde(default)]
    pub search_communities: bool,
    #[serde(default)]
    pub search_users: bool,
    #[serde(default)]
    pub search_comments: bool,
    #[serde(default)]
    pub sort: Sort,
    #[serde(default)]
    pub time: TimeRange,
    #[serde(default = "default_true", rename = "includeNSFW")]
    pub include_nsfw: bool,
    #[serde(default)]
    pub max_items: Option<u32>,
    #[serde(default = "default_max_post_count")]
    pub max_post_count: u32,
    #[serde(default = "default_two")]
    pub max_comments_per_post: u32,
    #[serde(default = "default_two")]
    pub max_communities_count: u32,
    #[serde(default = "default_two")]
    pub max_user_count: u32,
    #[serde(default)]
    pub post_date_limit: Option<String>,
    #[serde(default)]
    pub max_post_age_days: Option<i64>,
    #[serde(default = "default_start_page")]
    pub start_page: u32,
    #[serde(default)]
    pub end_page: Option<u32>,
    #[serde(default)]
    pub skip_comments: bool,
    #[serde(default = "default_max_request_retries")]
    pub max_request_retries: u32,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default)]
    pub debug_mode: bool,
}

fn default_true() -> bool {
    true
}

fn default_max_post_count() -> u32 {
    10
}

fn default_two() -> u32 {
    2
}

fn default_start_page() -> u32 {
    1
}

fn default_max_request_retries() -> u32 {
    3
}

fn default_max_concurrency() -> usize {
    10
}

/// Which search streams to open for every query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct SearchToggles {
    pub posts: bool,
    pub communities: bool,
    pub users: bool,
    pub comments: bool,
}

impl SearchToggles {
    #[must_use]
    pub fn any(&self) -> bool {
        self.posts || self.communities || self.users || self.comments
    }
}

/// Validated, immutable description of one run.
#[derive(Debug, Clone)]
pub struct HarvestPlan {
    pub budget: RunBudget,
    pub seeds: Vec<Seed>,
    pub allocation: SeedAllocation,
    pub searches: Vec<String>,
    pub search_toggles: SearchToggles,
    pub max_request_retries: u32,
    pub max_concurrency: usize,
    pub debug_mode: bool,
}

impl RunInput {
    /// Reads and parses a run input file (YAML or JSON).
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Read`] or [`InputError::Parse`].
    pub fn from_path(path: &Path) -> Result<Self, InputError> {
        let content = std::fs::read_to_string(path).map_err(|e| InputError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parses a run input document. JSON is accepted as a YAML subset.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Parse`] if the document does not match the schema.
    pub fn from_yaml_str(content: &str) -> Result<Self, InputError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Validates the input into a [`HarvestPlan`].
    ///
    /// Seeds that are not URLs on the platform are dropped with a warning;
    /// user seeds are dropped when `skipUserPosts` is set.
    ///
    /// # Errors
    ///
    /// Returns an [`InputError`] for an invalid page range, an explicitly empty
    /// start URL list, an unparseable date limit, or a run with nothing to do.
    pub fn validate(&self, platform_origin: &str) -> Result<HarvestPlan, InputError> {
        if self.start_page < 1 {
            return Err(InputError::StartPageTooLow(self.start_page));
        }
        if let Some(end_page) = self.end_page {
            if end_page < self.start_page {
                return Err(InputError::InvalidPageRange {
                    start_page: self.start_page,
                    end_page,
                });
            }
        }

        let post_date_limit = self
            .post_date_limit
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(parse_date_limit)
            .transpose()?;

        let seeds = if self.ignore_start_urls {
            Vec::new()
        } else {
            self.collect_seeds(platform_origin)?
        };

        let searches: Vec<String> = self
            .searches
            .iter()
            .filter_map(SearchEntry::query)
            .map(str::to_owned)
            .collect();
        let search_toggles = SearchToggles {
            posts: self.search_posts,
            communities: self.search_communities,
            users: self.search_users,
            comments: self.search_comments,
        };

        if seeds.is_empty() && (searches.is_empty() || !search_toggles.any()) {
            return Err(InputError::NoSeeds);
        }

        let max_items = self.max_items.unwrap_or_else(|| {
            RunBudget::default_max_items(
                self.max_post_count,
                self.max_comments_per_post,
                self.max_communities_count,
                self.max_user_count,
            )
        });

        let budget = RunBudget {
            max_items,
            max_post_count: self.max_post_count,
            max_comments_per_post: self.max_comments_per_post,
            max_communities_count: self.max_communities_count,
            max_user_count: self.max_user_count,
            start_page: self.start_page,
            end_page: self.end_page,
            post_date_limit,
            max_post_age_days: self.max_post_age_days,
            sort: self.sort,
            time_range: self.time,
            include_nsfw: self.include_nsfw,
            skip_comments: self.skip_comments,
        };

        let allocation = SeedAllocation::new(budget.max_post_count, seeds.len());

        Ok(HarvestPlan {
            budget,
            seeds,
            allocation,
            searches,
            search_toggles,
            max_request_retries: self.max_request_retries,
            max_concurrency: self.max_concurrency.max(1),
            debug_mode: self.debug_mode,
        })
    }

    fn collect_seeds(&self, platform_origin: &str) -> Result<Vec<Seed>, InputError> {
        let platform_host = reqwest::Url::parse(platform_origin)
            .ok()
            .and_then(|u| u.host_str().map(str::to_owned))
            .unwrap_or_default();

        let defaulted;
        let entries: &[UrlEntry] = match &self.start_urls {
            Some(entries) if entries.is_empty() => return Err(InputError::MissingStartUrls),
            Some(entries) => entries,
            None => {
                defaulted = [UrlEntry::Plain(format!("{platform_origin}/r/all/"))];
                &defaulted
            }
        };

        let mut seeds = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(seed) = Seed::parse(entry.as_str(), &platform_host) else {
                tracing::warn!(url = entry.as_str(), "ignoring start URL outside the platform");
                continue;
            };
            if seed.kind == SeedKind::User && self.skip_user_posts {
                tracing::info!(url = %seed.key, "skipping user URL (skipUserPosts)");
                continue;
            }
            seeds.push(seed);
        }
        Ok(seeds)
    }
}

/// Parses an absolute date limit given as RFC 3339 or a bare `YYYY-MM-DD`
/// (midnight UTC).
fn parse_date_limit(raw: &str) -> Result<DateTime<Utc>, InputError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| InputError::InvalidDate {
            value: raw.to_owned(),
        })
}

#[cfg(test)]
#[path = "input_test.rs"]
mod tests;

//! Maps raw platform records to [`redharvest_core::CanonicalRecord`] shapes.
//!
//! All functions are pure: the `scraped_at` instant is passed in by the
//! caller so a whole page shares one stamp and tests stay deterministic.

use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde_json::Value;

use redharvest_core::records::{CommentRecord, CommunityRecord, PostRecord, UserRecord};
use redharvest_core::same_platform_host;

use crate::types::{RawComment, RawCommunity, RawPost, RawUser};

static IMAGE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(jpg|jpeg|png|gif|webp)$").expect("valid regex"));

/// Origin-aware record mapper.
#[derive(Debug, Clone)]
pub struct Normalizer {
    origin: String,
    platform_host: String,
}

/// Post context carried by a comment-thread fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadContext {
    /// Bare post id, without the `t3_` prefix.
    pub post_id: String,
    pub post_title: Option<String>,
    /// Prefixed community name, e.g. `r/rust`.
    pub community_name: Option<String>,
}

impl Normalizer {
    #[must_use]
    pub fn new(origin: &str, platform_host: &str) -> Self {
        Self {
            origin: origin.trim_end_matches('/').to_owned(),
            platform_host: platform_host.to_owned(),
        }
    }

    fn absolute(&self, permalink: Option<&str>) -> Option<String> {
        permalink
            .filter(|p| !p.is_empty())
            .map(|p| format!("{}{p}", self.origin))
    }

    /// Returns `true` if `url` points back into the platform: same site or a
    /// root-relative path.
    #[must_use]
    pub fn is_platform_link(&self, url: &str) -> bool {
        if url.starts_with('/') {
            return true;
        }
        reqwest::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| same_platform_host(h, &self.platform_host)))
            .unwrap_or(false)
    }

    #[must_use]
    pub fn post(&self, raw: &RawPost, scraped_at: DateTime<Utc>) -> PostRecord {
        let body = raw
            .selftext
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::to_owned);

        let link = raw
            .url
            .as_deref()
            .filter(|u| !u.is_empty() && !is_image_url(u) && !self.is_platform_link(u))
            .map(str::to_owned);

        PostRecord {
            id: non_empty(raw.name.as_deref()),
            parsed_id: non_empty(raw.id.as_deref()),
            url: self.absolute(raw.permalink.as_deref()),
            username: non_empty(raw.author.as_deref()),
            user_id: non_empty(raw.author_fullname.as_deref()),
            title: non_empty(raw.title.as_deref()),
            community_name: non_empty(raw.subreddit_name_prefixed.as_deref()),
            parsed_community_name: non_empty(raw.subreddit.as_deref()),
            body,
            html: raw.selftext_html.as_deref().filter(|h| !h.is_empty()).map(unescape_html),
            link,
            number_of_comments: raw.num_comments.unwrap_or(0),
            flair: non_empty(raw.link_flair_text.as_deref()),
            up_votes: raw.score.unwrap_or(0),
            up_vote_ratio: raw.upvote_ratio.unwrap_or(0.0),
            is_video: raw.is_video.unwrap_or(false),
            is_ad: raw.promoted.unwrap_or(false),
            over18: raw.over_18.unwrap_or(false),
            thumbnail_url: non_empty(raw.thumbnail.as_deref()),
            image_urls: extract_image_urls(raw),
            created_at: raw.created_utc.and_then(epoch_to_iso),
            scraped_at: iso(scraped_at),
        }
    }

    /// Maps a comment from a post's reply tree. `direct_replies` is the
    /// number of visible comment children, not a deep count.
    #[must_use]
    pub fn thread_comment(
        &self,
        raw: &RawComment,
        thread: &ThreadContext,
        direct_replies: u64,
        scraped_at: DateTime<Utc>,
    ) -> CommentRecord {
        self.comment(
            raw,
            Some(format!("t3_{}", thread.post_id)),
            thread.community_name.as_deref(),
            direct_replies,
            scraped_at,
        )
    }

    /// Maps a comment returned by comment search, where post and community
    /// come from the comment itself.
    #[must_use]
    pub fn search_comment(&self, raw: &RawComment, scraped_at: DateTime<Utc>) -> CommentRecord {
        let post_id = search_comment_post_key(raw).map(|key| format!("t3_{key}"));
        self.comment(
            raw,
            post_id,
            raw.subreddit_name_prefixed.as_deref(),
            raw.num_replies.unwrap_or(0),
            scraped_at,
        )
    }

    fn comment(
        &self,
        raw: &RawComment,
        post_id: Option<String>,
        community_name: Option<&str>,
        replies: u64,
        scraped_at: DateTime<Utc>,
    ) -> CommentRecord {
        let community_name = non_empty(community_name);
        CommentRecord {
            id: non_empty(raw.name.as_deref()),
            parsed_id: non_empty(raw.id.as_deref()),
            url: self.absolute(raw.permalink.as_deref()),
            post_id,
            parent_id: non_empty(raw.parent_id.as_deref()),
            username: non_empty(raw.author.as_deref()),
            user_id: non_empty(raw.author_fullname.as_deref()),
            category: community_name
                .as_deref()
                .map(|name| name.strip_prefix("r/").unwrap_or(name).to_owned()),
            community_name,
            body: non_empty(raw.body.as_deref()),
            created_at: raw.created_utc.and_then(epoch_to_iso),
            scraped_at: iso(scraped_at),
            up_votes: raw.score.unwrap_or(0),
            number_of_replies: replies,
            html: raw.body_html.as_deref().filter(|h| !h.is_empty()).map(unescape_html),
        }
    }

    #[must_use]
    pub fn community(&self, raw: &RawCommunity, scraped_at: DateTime<Utc>) -> CommunityRecord {
        CommunityRecord {
            id: non_empty(raw.name.as_deref()),
            parsed_id: non_empty(raw.id.as_deref()),
            community_name: non_empty(raw.display_name_prefixed.as_deref()),
            parsed_community_name: non_empty(raw.display_name.as_deref()),
            title: non_empty(raw.title.as_deref()),
            url: self.absolute(raw.url.as_deref()),
            subscribers: raw.subscribers.unwrap_or(0),
            description: non_empty(raw.public_description.as_deref()),
            created_at: raw.created_utc.and_then(epoch_to_iso),
            over18: raw.over18.unwrap_or(false),
            icon_url: non_empty(raw.icon_img.as_deref()),
            banner_url: non_empty(raw.banner_img.as_deref()),
            active_users: raw.accounts_active.unwrap_or(0),
            scraped_at: iso(scraped_at),
        }
    }

    #[must_use]
    pub fn user(&self, raw: &RawUser, scraped_at: DateTime<Utc>) -> UserRecord {
        UserRecord {
            user_id: non_empty(raw.name.as_deref()),
            parsed_user_id: non_empty(raw.id.as_deref()),
            username: non_empty(raw.name.as_deref()),
            icon_url: non_empty(raw.icon_img.as_deref()),
            link_karma: raw.link_karma.unwrap_or(0),
            comment_karma: raw.comment_karma.unwrap_or(0),
            created_at: raw.created_utc.and_then(epoch_to_iso),
            is_gold: raw.is_gold.unwrap_or(false),
            is_mod: raw.is_mod.unwrap_or(false),
            verified: raw.verified.unwrap_or(false),
            scraped_at: iso(scraped_at),
        }
    }
}

/// Bare post id a search-result comment belongs to, from its `link_id`.
#[must_use]
pub fn search_comment_post_key(raw: &RawComment) -> Option<String> {
    raw.link_id
        .as_deref()
        .map(|id| id.strip_prefix("t3_").unwrap_or(id))
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
}

/// Replaces the five standard HTML entities. `&amp;` goes first, so
/// `&amp;lt;` decodes to `<`.
#[must_use]
pub fn unescape_html(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

#[must_use]
pub fn is_image_url(url: &str) -> bool {
    IMAGE_URL.is_match(url)
}

/// Collects the first preview image, then every gallery item's full-size URL.
#[must_use]
pub fn extract_image_urls(raw: &RawPost) -> Vec<String> {
    let mut urls = Vec::new();

    let preview = raw
        .preview
        .as_ref()
        .and_then(|p| p.images.first())
        .and_then(|img| img.source.as_ref())
        .and_then(|src| src.url.as_deref())
        .filter(|u| !u.is_empty());
    if let Some(url) = preview {
        urls.push(unescape_html(url));
    }

    if let Some(gallery) = &raw.media_metadata {
        urls.extend(
            gallery
                .values()
                .filter_map(|media| media.pointer("/s/u").and_then(Value::as_str))
                .filter(|u| !u.is_empty())
                .map(unescape_html),
        );
    }

    urls
}

/// Converts platform epoch seconds to an ISO-8601 instant with millisecond
/// precision. Zero and non-finite values are treated as missing.
#[must_use]
pub fn epoch_to_iso(secs: f64) -> Option<String> {
    epoch_to_datetime(secs).map(iso)
}

#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn epoch_to_datetime(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() || secs.abs() < f64::EPSILON {
        return None;
    }
    DateTime::from_timestamp_millis((secs * 1000.0).round() as i64)
}

fn iso(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_owned)
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;

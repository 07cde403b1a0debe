//! Raw platform response types for the public `.json` endpoints.
//!
//! ## Observed shapes
//!
//! ### Listings
//! Every paginated endpoint returns `{ "kind": "Listing", "data": { "after",
//! "children": [...] } }`. `after` is `null` on the last page. Post-detail and
//! comment-thread endpoints return a two-element array: the post listing
//! followed by the comment listing.
//!
//! ### Children
//! Each child is `{ "kind": "t1" | "t2" | "t3" | "t5" | "more", "data": {...} }`.
//! Children are kept as raw JSON until [`Thing::from_raw`] classifies them, so
//! one malformed child never fails the whole page.
//!
//! ### `replies`
//! On comments, `replies` is either a nested listing or the empty string `""`
//! when there are none. Anything that does not parse as a listing is treated
//! as "no replies".
//!
//! ### Timestamps
//! `created_utc` / `created` are seconds since the epoch, usually floats
//! (e.g. `1700000000.0`).

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Top-level paginated response.
#[derive(Debug, Clone, Deserialize)]
pub struct Listing {
    pub data: ListingData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingData {
    /// Continuation cursor; `None` on the last page.
    #[serde(default)]
    pub after: Option<String>,
    pub children: Vec<RawThing>,
}

/// One listing child before classification.
#[derive(Debug, Clone, Deserialize)]
pub struct RawThing {
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

/// A classified listing child.
#[derive(Debug)]
pub enum Thing {
    Comment(Box<RawComment>),
    User(Box<RawUser>),
    Post(Box<RawPost>),
    Community(Box<RawCommunity>),
    /// A known kind whose payload did not match the expected shape.
    Malformed {
        kind: String,
        error: serde_json::Error,
    },
    /// `more` stubs and any kind not harvested.
    Other,
}

impl Thing {
    #[must_use]
    pub fn from_raw(raw: &RawThing) -> Self {
        fn parse<'a, T: Deserialize<'a>>(
            raw: &'a RawThing,
            wrap: fn(Box<T>) -> Thing,
        ) -> Thing {
            match T::deserialize(&raw.data) {
                Ok(value) => wrap(Box::new(value)),
                Err(error) => Thing::Malformed {
                    kind: raw.kind.clone(),
                    error,
                },
            }
        }

        match raw.kind.as_str() {
            "t1" => parse(raw, Thing::Comment),
            "t2" => parse(raw, Thing::User),
            "t3" => parse(raw, Thing::Post),
            "t5" => parse(raw, Thing::Community),
            _ => Thing::Other,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPost {
    #[serde(default)]
    pub id: Option<String>,
    /// Fullname, e.g. `t3_abc123`.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub author_fullname: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subreddit: Option<String>,
    #[serde(default)]
    pub subreddit_name_prefixed: Option<String>,
    #[serde(default)]
    pub selftext: Option<String>,
    #[serde(default)]
    pub selftext_html: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub num_comments: Option<u64>,
    #[serde(default)]
    pub link_flair_text: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub upvote_ratio: Option<f64>,
    #[serde(default)]
    pub is_video: Option<bool>,
    #[serde(default)]
    pub promoted: Option<bool>,
    #[serde(default)]
    pub over_18: Option<bool>,
    #[serde(default)]
    pub stickied: Option<bool>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub created_utc: Option<f64>,
    #[serde(default)]
    pub created: Option<f64>,
    #[serde(default)]
    pub preview: Option<Preview>,
    /// Gallery items keyed by media id, in document order.
    #[serde(default)]
    pub media_metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Preview {
    #[serde(default)]
    pub images: Vec<PreviewImage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreviewImage {
    #[serde(default)]
    pub source: Option<ImageSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageSource {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawComment {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Fullname of the post; present on every comment, used by comment search.
    #[serde(default)]
    pub link_id: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub author_fullname: Option<String>,
    #[serde(default)]
    pub subreddit_name_prefixed: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub body_html: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub created_utc: Option<f64>,
    /// Reply count as reported by comment search results.
    #[serde(default)]
    pub num_replies: Option<u64>,
    #[serde(default, deserialize_with = "lenient_listing")]
    pub replies: Option<Listing>,
}

impl RawComment {
    /// Returns `true` when the comment has no visible body.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        matches!(
            self.body.as_deref(),
            None | Some("" | "[deleted]" | "[removed]")
        )
    }

    /// Direct children of this comment's reply listing.
    #[must_use]
    pub fn reply_children(&self) -> &[RawThing] {
        self.replies
            .as_ref()
            .map_or(&[], |listing| listing.data.children.as_slice())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCommunity {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub display_name_prefixed: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Root-relative path, e.g. `/r/rust/`.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub subscribers: Option<u64>,
    #[serde(default)]
    pub public_description: Option<String>,
    #[serde(default)]
    pub created_utc: Option<f64>,
    #[serde(default)]
    pub over18: Option<bool>,
    #[serde(default)]
    pub icon_img: Option<String>,
    #[serde(default)]
    pub banner_img: Option<String>,
    #[serde(default)]
    pub accounts_active: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub icon_img: Option<String>,
    #[serde(default)]
    pub link_karma: Option<i64>,
    #[serde(default)]
    pub comment_karma: Option<i64>,
    #[serde(default)]
    pub created_utc: Option<f64>,
    #[serde(default)]
    pub is_gold: Option<bool>,
    #[serde(default)]
    pub is_mod: Option<bool>,
    #[serde(default)]
    pub verified: Option<bool>,
}

/// Accepts a nested listing, or anything else (`""`, `null`) as no listing.
fn lenient_listing<'de, D>(deserializer: D) -> Result<Option<Listing>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

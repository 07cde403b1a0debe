//! Post acceptance predicates.

use chrono::{DateTime, Utc};

use redharvest_core::RunBudget;

use crate::normalize::epoch_to_datetime;
use crate::types::RawPost;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Why a post was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Stickied,
    Nsfw,
    BeforeDateLimit,
    TooOld { age_days: i64 },
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Stickied => write!(f, "stickied"),
            Rejection::Nsfw => write!(f, "nsfw"),
            Rejection::BeforeDateLimit => write!(f, "before postDateLimit"),
            Rejection::TooOld { age_days } => write!(f, "{age_days} days old"),
        }
    }
}

/// The ordered post filters of one run. Evaluation stops at the first
/// failing predicate.
#[derive(Debug, Clone)]
pub struct FilterPipeline {
    include_nsfw: bool,
    post_date_limit: Option<DateTime<Utc>>,
    max_post_age_days: Option<i64>,
}

impl FilterPipeline {
    #[must_use]
    pub fn from_budget(budget: &RunBudget) -> Self {
        Self {
            include_nsfw: budget.include_nsfw,
            post_date_limit: budget.post_date_limit,
            max_post_age_days: budget.max_post_age_days,
        }
    }

    /// Checks `post` against every filter as of `now`.
    ///
    /// # Errors
    ///
    /// Returns the first [`Rejection`] that applies.
    pub fn evaluate(&self, post: &RawPost, now: DateTime<Utc>) -> Result<(), Rejection> {
        if post.stickied.unwrap_or(false) {
            return Err(Rejection::Stickied);
        }
        if !self.include_nsfw && post.over_18.unwrap_or(false) {
            return Err(Rejection::Nsfw);
        }
        if let Some(limit) = self.post_date_limit {
            // Posts without a creation time pass.
            if let Some(created) = post.created_utc.and_then(epoch_to_datetime) {
                if created < limit {
                    return Err(Rejection::BeforeDateLimit);
                }
            }
        }
        if let Some(max_days) = self.max_post_age_days {
            if let Some(age_days) = age_in_days(post, now) {
                if age_days > max_days {
                    return Err(Rejection::TooOld { age_days });
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn accepts(&self, post: &RawPost, now: DateTime<Utc>) -> bool {
        self.evaluate(post, now).is_ok()
    }
}

/// Whole days between the post's creation and `now`, rounded down. Uses
/// `created_utc`, falling back to `created`. Future posts yield a negative
/// age.
fn age_in_days(post: &RawPost, now: DateTime<Utc>) -> Option<i64> {
    let created = post
        .created_utc
        .and_then(epoch_to_datetime)
        .or_else(|| post.created.and_then(epoch_to_datetime))?;
    let elapsed_ms = now.timestamp_millis() - created.timestamp_millis();
    Some(elapsed_ms.div_euclid(MILLIS_PER_DAY))
}

//! Community, user and comment search streams.

use chrono::{DateTime, Utc};

use redharvest_core::CanonicalRecord;

use crate::dispatch::RecordSink;
use crate::normalize::search_comment_post_key;
use crate::pagination::PageCursor;
use crate::types::{RawThing, Thing};

use super::Harvester;

impl<S: RecordSink> Harvester<S> {
    pub(super) fn extract_communities(
        &self,
        cursor: &PageCursor,
        children: &[RawThing],
        now: DateTime<Utc>,
    ) {
        let mut count = 0u32;
        for child in children {
            let community = match Thing::from_raw(child) {
                Thing::Community(community) => community,
                Thing::Malformed { kind, error } => {
                    tracing::warn!(kind = %kind, error = %error, "skipping malformed child");
                    continue;
                }
                _ => continue,
            };
            if !self.quota.try_claim_community() {
                break;
            }
            self.sink
                .emit(CanonicalRecord::Community(self.normalizer.community(&community, now)));
            count += 1;
        }

        tracing::info!(
            query = %cursor.source,
            page = cursor.page,
            count,
            total = self.quota.snapshot().communities,
            max = self.budget.max_communities_count,
            "extracted communities"
        );
    }

    pub(super) fn extract_users(
        &self,
        cursor: &PageCursor,
        children: &[RawThing],
        now: DateTime<Utc>,
    ) {
        let mut count = 0u32;
        for child in children {
            let user = match Thing::from_raw(child) {
                Thing::User(user) => user,
                Thing::Malformed { kind, error } => {
                    tracing::warn!(kind = %kind, error = %error, "skipping malformed child");
                    continue;
                }
                _ => continue,
            };
            if !self.quota.try_claim_user() {
                break;
            }
            self.sink
                .emit(CanonicalRecord::User(self.normalizer.user(&user, now)));
            count += 1;
        }

        tracing::info!(
            query = %cursor.source,
            page = cursor.page,
            count,
            total = self.quota.snapshot().users,
            max = self.budget.max_user_count,
            "extracted users"
        );
    }

    /// Comment search results are emitted directly. Results tied to a post
    /// count against that post's comment cap.
    pub(super) fn extract_search_comments(
        &self,
        cursor: &PageCursor,
        children: &[RawThing],
        now: DateTime<Utc>,
    ) {
        let mut count = 0u32;
        for child in children {
            if !self.quota.can_push_more() {
                tracing::info!(max_items = self.budget.max_items, "maxItems reached, stopping page");
                break;
            }
            let comment = match Thing::from_raw(child) {
                Thing::Comment(comment) => comment,
                Thing::Malformed { kind, error } => {
                    tracing::warn!(kind = %kind, error = %error, "skipping malformed child");
                    continue;
                }
                _ => continue,
            };
            if comment.is_deleted() {
                continue;
            }

            let claimed = match search_comment_post_key(&comment) {
                Some(post_key) => self.quota.try_claim_comment(&post_key),
                None => self.quota.try_claim_unkeyed_comment(),
            };
            if !claimed {
                continue;
            }
            self.sink.emit(CanonicalRecord::Comment(
                self.normalizer.search_comment(&comment, now),
            ));
            count += 1;
        }

        tracing::info!(
            query = %cursor.source,
            page = cursor.page,
            count,
            total = self.quota.snapshot().comments,
            "extracted search comments"
        );
    }
}

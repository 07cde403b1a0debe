//! Reduces a threaded reply forest to a capped, pre-ordered comment list.

use chrono::{DateTime, Utc};

use redharvest_core::records::CommentRecord;

use crate::normalize::{Normalizer, ThreadContext};
use crate::types::{RawThing, Thing};

/// Walks `forest` depth-first and returns at most `cap` comments, each one
/// ahead of its replies.
///
/// Non-comment children and deleted or empty comments are skipped along with
/// their subtrees. The cap is global: once `cap` records are collected the walk
/// stops at every level.
#[must_use]
pub fn flatten_comments(
    forest: &[RawThing],
    cap: usize,
    normalizer: &Normalizer,
    thread: &ThreadContext,
    scraped_at: DateTime<Utc>,
) -> Vec<CommentRecord> {
    let mut out = Vec::with_capacity(cap.min(forest.len()));
    if cap > 0 {
        walk(forest, cap, normalizer, thread, scraped_at, &mut out);
    }
    out
}

fn walk(
    level: &[RawThing],
    cap: usize,
    normalizer: &Normalizer,
    thread: &ThreadContext,
    scraped_at: DateTime<Utc>,
    out: &mut Vec<CommentRecord>,
) {
    for child in level {
        if out.len() >= cap {
            return;
        }
        let comment = match Thing::from_raw(child) {
            Thing::Comment(comment) => comment,
            Thing::Malformed { kind, error } => {
                tracing::debug!(kind = %kind, error = %error, "skipping malformed reply");
                continue;
            }
            Thing::Post(_) | Thing::User(_) | Thing::Community(_) | Thing::Other => continue,
        };
        if comment.is_deleted() {
            continue;
        }

        let replies = comment.reply_children();
        let direct = u64::try_from(replies.iter().filter(|r| r.kind == "t1").count())
            .unwrap_or(u64::MAX);
        out.push(normalizer.thread_comment(&comment, thread, direct, scraped_at));
        if out.len() >= cap {
            return;
        }

        walk(replies, cap, normalizer, thread, scraped_at, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::{json, Value};

    fn comment(id: &str, replies: &[Value]) -> Value {
        let replies = if replies.is_empty() {
            json!("")
        } else {
            json!({"kind": "Listing", "data": {"after": null, "children": replies}})
        };
        json!({"kind": "t1", "data": {
            "id": id,
            "name": format!("t1_{id}"),
            "body": format!("body {id}"),
            "replies": replies
        }})
    }

    fn forest(values: Vec<Value>) -> Vec<RawThing> {
        serde_json::from_value(Value::Array(values)).unwrap()
    }

    fn run(forest: &[RawThing], cap: usize) -> Vec<CommentRecord> {
        let thread = ThreadContext {
            post_id: "p1".to_owned(),
            post_title: None,
            community_name: Some("r/rust".to_owned()),
        };
        flatten_comments(
            forest,
            cap,
            &Normalizer::new("https://www.reddit.com", "www.reddit.com"),
            &thread,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    fn ids(records: &[CommentRecord]) -> Vec<&str> {
        records.iter().filter_map(|r| r.parsed_id.as_deref()).collect()
    }

    #[test]
    fn pre_order_with_global_cap() {
        let tree = forest(
            (0..10)
                .map(|i| comment(&format!("c{i}"), &[comment(&format!("c{i}r"), &[])]))
                .collect(),
        );
        let out = run(&tree, 3);
        assert_eq!(ids(&out), vec!["c0", "c0r", "c1"]);
    }

    #[test]
    fn cap_stops_inside_deep_branch() {
        let tree = forest(vec![
            comment("a", &[comment("a1", &[comment("a1x", &[])]), comment("a2", &[])]),
            comment("b", &[]),
        ]);
        assert_eq!(ids(&run(&tree, 3)), vec!["a", "a1", "a1x"]);
        assert_eq!(ids(&run(&tree, 10)), vec!["a", "a1", "a1x", "a2", "b"]);
    }

    #[test]
    fn deleted_and_non_comment_nodes_are_skipped_with_their_subtrees() {
        let mut deleted = comment("gone", &[comment("orphan", &[])]);
        deleted["data"]["body"] = json!("[deleted]");
        let mut removed = comment("removed", &[]);
        removed["data"]["body"] = json!("[removed]");
        let tree = forest(vec![
            deleted,
            json!({"kind": "more", "data": {"count": 12, "children": ["x", "y"]}}),
            removed,
            comment("kept", &[]),
        ]);
        assert_eq!(ids(&run(&tree, 10)), vec!["kept"]);
    }

    #[test]
    fn reply_count_is_direct_comment_children_only() {
        let tree = forest(vec![comment(
            "a",
            &[
                comment("a1", &[comment("a1x", &[]), comment("a1y", &[])]),
                json!({"kind": "more", "data": {"count": 3}}),
                comment("a2", &[]),
            ],
        )]);
        let out = run(&tree, 10);
        assert_eq!(out[0].number_of_replies, 2);
        assert_eq!(out[1].number_of_replies, 2);
        assert_eq!(out[2].number_of_replies, 0);
    }

    #[test]
    fn zero_cap_yields_nothing() {
        let tree = forest(vec![comment("a", &[])]);
        assert!(run(&tree, 0).is_empty());
    }

    #[test]
    fn flattening_is_repeatable() {
        let tree = forest(vec![
            comment("a", &[comment("a1", &[])]),
            comment("b", &[comment("b1", &[comment("b1x", &[])])]),
        ]);
        assert_eq!(ids(&run(&tree, 4)), ids(&run(&tree, 4)));
    }
}

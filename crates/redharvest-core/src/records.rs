//! Canonical output records.
//!
//! Every emitted record serializes to one flat JSON object carrying a
//! `dataType` discriminant (`post`, `comment`, `community`, `user`). Field
//! names are the camelCase output schema consumed downstream.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dataType", rename_all = "lowercase")]
pub enum CanonicalRecord {
    Post(PostRecord),
    Comment(CommentRecord),
    Community(CommunityRecord),
    User(UserRecord),
}

impl CanonicalRecord {
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        match self {
            CanonicalRecord::Post(_) => RecordKind::Post,
            CanonicalRecord::Comment(_) => RecordKind::Comment,
            CanonicalRecord::Community(_) => RecordKind::Community,
            CanonicalRecord::User(_) => RecordKind::User,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Post,
    Comment,
    Community,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    /// Platform fullname, e.g. `t3_abc123`.
    pub id: Option<String>,
    /// Bare platform id, e.g. `abc123`.
    pub parsed_id: Option<String>,
    pub url: Option<String>,
    pub username: Option<String>,
    pub user_id: Option<String>,
    pub title: Option<String>,
    pub community_name: Option<String>,
    pub parsed_community_name: Option<String>,
    /// `None` when the post has no text body.
    pub body: Option<String>,
    pub html: Option<String>,
    /// Outbound URL, set only for external link posts.
    pub link: Option<String>,
    pub number_of_comments: u64,
    pub flair: Option<String>,
    pub up_votes: i64,
    pub up_vote_ratio: f64,
    pub is_video: bool,
    pub is_ad: bool,
    pub over18: bool,
    pub thumbnail_url: Option<String>,
    pub image_urls: Vec<String>,
    pub created_at: Option<String>,
    pub scraped_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub id: Option<String>,
    pub parsed_id: Option<String>,
    pub url: Option<String>,
    /// Fullname of the post the comment belongs to.
    pub post_id: Option<String>,
    pub parent_id: Option<String>,
    pub username: Option<String>,
    pub user_id: Option<String>,
    /// Community name without the `r/` prefix.
    pub category: Option<String>,
    pub community_name: Option<String>,
    pub body: Option<String>,
    pub created_at: Option<String>,
    pub scraped_at: String,
    pub up_votes: i64,
    /// Direct visible replies only.
    #[serde(rename = "numberOfreplies")]
    pub number_of_replies: u64,
    pub html: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityRecord {
    pub id: Option<String>,
    pub parsed_id: Option<String>,
    pub community_name: Option<String>,
    pub parsed_community_name: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub subscribers: u64,
    pub description: Option<String>,
    pub created_at: Option<String>,
    pub over18: bool,
    pub icon_url: Option<String>,
    pub banner_url: Option<String>,
    pub active_users: u64,
    pub scraped_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub user_id: Option<String>,
    pub parsed_user_id: Option<String>,
    pub username: Option<String>,
    pub icon_url: Option<String>,
    pub link_karma: i64,
    pub comment_karma: i64,
    pub created_at: Option<String>,
    pub is_gold: bool,
    pub is_mod: bool,
    pub verified: bool,
    pub scraped_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_comment() -> CommentRecord {
        CommentRecord {
            id: Some("t1_c1".to_owned()),
            parsed_id: Some("c1".to_owned()),
            url: None,
            post_id: Some("t3_p1".to_owned()),
            parent_id: Some("t3_p1".to_owned()),
            username: Some("alice".to_owned()),
            user_id: None,
            category: Some("rust".to_owned()),
            community_name: Some("r/rust".to_owned()),
            body: Some("hello".to_owned()),
            created_at: None,
            scraped_at: "2024-01-01T00:00:00.000Z".to_owned(),
            up_votes: 3,
            number_of_replies: 1,
            html: None,
        }
    }

    #[test]
    fn comment_serializes_flat_with_discriminant() {
        let value = serde_json::to_value(CanonicalRecord::Comment(sample_comment())).unwrap();
        assert_eq!(value["dataType"], "comment");
        assert_eq!(value["postId"], "t3_p1");
        assert_eq!(value["numberOfreplies"], 1);
        assert_eq!(value["upVotes"], 3);
        assert!(value["body"].is_string());
        assert!(value["createdAt"].is_null());
    }

    #[test]
    fn record_reads_back_from_json_line() {
        let record = CanonicalRecord::Comment(sample_comment());
        let line = serde_json::to_string(&record).unwrap();
        let back: CanonicalRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(back.kind(), RecordKind::Comment);
        assert_eq!(back, record);
    }
}

//! Seed URL acceptance and classification.

use serde::Serialize;

/// What a seed URL points at, which decides the stream it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedKind {
    Community,
    User,
    Post,
}

impl std::fmt::Display for SeedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeedKind::Community => write!(f, "community"),
            SeedKind::User => write!(f, "user"),
            SeedKind::Post => write!(f, "post"),
        }
    }
}

/// A validated seed URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Seed {
    pub kind: SeedKind,
    /// The URL stripped of query, trailing slash and `.json`; doubles as the
    /// key for per-seed post accounting.
    pub key: String,
    /// Query string carried by the original URL, if any.
    pub query: Option<String>,
}

impl Seed {
    /// Parses `raw` into a seed if it is a URL on `platform_host`'s domain.
    ///
    /// Subdomains are accepted, so `old.reddit.com` matches a platform host of
    /// `www.reddit.com`.
    #[must_use]
    pub fn parse(raw: &str, platform_host: &str) -> Option<Self> {
        let url = reqwest::Url::parse(raw.trim()).ok()?;
        let host = url.host_str()?;
        if !same_platform_host(host, platform_host) {
            return None;
        }

        let path = url.path();
        let kind = if path.contains("/comments/") {
            SeedKind::Post
        } else if path.contains("/user/") || path.contains("/u/") {
            SeedKind::User
        } else {
            SeedKind::Community
        };

        let trimmed = path.trim_end_matches('/');
        let trimmed = trimmed.strip_suffix(".json").unwrap_or(trimmed);
        let key = format!("{}{}", url.origin().ascii_serialization(), trimmed);
        let query = url.query().filter(|q| !q.is_empty()).map(str::to_owned);

        Some(Self { kind, key, query })
    }
}

/// Returns `true` if `host` belongs to the same site as `platform_host`.
///
/// A leading `www.` on the platform host is ignored so sibling subdomains match.
#[must_use]
pub fn same_platform_host(host: &str, platform_host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    let base = platform_host.to_ascii_lowercase();
    let base = base.strip_prefix("www.").unwrap_or(&base);
    host == base || host.ends_with(&format!(".{base}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: &str = "www.reddit.com";

    #[test]
    fn community_url_is_classified_and_keyed() {
        let seed = Seed::parse("https://www.reddit.com/r/rust/", HOST).unwrap();
        assert_eq!(seed.kind, SeedKind::Community);
        assert_eq!(seed.key, "https://www.reddit.com/r/rust");
        assert!(seed.query.is_none());
    }

    #[test]
    fn user_urls_are_classified() {
        for raw in [
            "https://www.reddit.com/user/spez",
            "https://reddit.com/u/spez/submitted",
        ] {
            let seed = Seed::parse(raw, HOST).unwrap();
            assert_eq!(seed.kind, SeedKind::User, "{raw}");
        }
    }

    #[test]
    fn post_url_wins_over_community() {
        let seed = Seed::parse(
            "https://www.reddit.com/r/rust/comments/abc123/some_title/",
            HOST,
        )
        .unwrap();
        assert_eq!(seed.kind, SeedKind::Post);
        assert_eq!(
            seed.key,
            "https://www.reddit.com/r/rust/comments/abc123/some_title"
        );
    }

    #[test]
    fn json_suffix_and_query_are_split_off_the_key() {
        let seed = Seed::parse("https://old.reddit.com/r/rust.json?sort=top&t=week", HOST).unwrap();
        assert_eq!(seed.key, "https://old.reddit.com/r/rust");
        assert_eq!(seed.query.as_deref(), Some("sort=top&t=week"));
    }

    #[test]
    fn foreign_and_malformed_urls_are_rejected() {
        assert!(Seed::parse("https://example.com/r/rust", HOST).is_none());
        assert!(Seed::parse("https://notreddit.com/r/rust", HOST).is_none());
        assert!(Seed::parse("r/rust", HOST).is_none());
    }
}

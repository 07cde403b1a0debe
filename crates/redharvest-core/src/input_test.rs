use super::*;

const ORIGIN: &str = "https://www.reddit.com";

fn parse(doc: &str) -> RunInput {
    RunInput::from_yaml_str(doc).expect("fixture should parse")
}

#[test]
fn defaults_match_documented_values() {
    let input = parse("{}");
    assert!(input.search_posts);
    assert!(!input.search_comments);
    assert!(input.include_nsfw);
    assert_eq!(input.sort, Sort::New);
    assert_eq!(input.time, TimeRange::All);
    assert_eq!(input.max_post_count, 10);
    assert_eq!(input.max_comments_per_post, 2);
    assert_eq!(input.start_page, 1);
    assert_eq!(input.max_concurrency, 10);
}

#[test]
fn missing_start_urls_defaults_to_all() {
    let plan = parse("{}").validate(ORIGIN).unwrap();
    assert_eq!(plan.seeds.len(), 1);
    assert_eq!(plan.seeds[0].key, "https://www.reddit.com/r/all");
    assert_eq!(plan.seeds[0].kind, SeedKind::Community);
}

#[test]
fn json_input_with_mixed_entry_shapes() {
    let input = parse(
        r#"{
            "startUrls": ["https://www.reddit.com/r/rust/", {"url": "https://www.reddit.com/user/spez"}],
            "searches": ["tokio", {"query": "serde"}, {"url": "  "}],
            "sort": "top",
            "time": "week",
            "includeNSFW": false,
            "maxPostCount": 6
        }"#,
    );
    let plan = input.validate(ORIGIN).unwrap();
    assert_eq!(plan.seeds.len(), 2);
    assert_eq!(plan.searches, vec!["tokio".to_owned(), "serde".to_owned()]);
    assert_eq!(plan.allocation.per_seed_quota, 3);
    assert!(!plan.budget.include_nsfw);
    assert_eq!(plan.budget.time_param(), Some("week"));
}

#[test]
fn foreign_urls_do_not_count_toward_seed_allocation() {
    let input = parse(
        "startUrls:\n  - https://www.reddit.com/r/rust\n  - https://example.com/r/rust\nmaxPostCount: 5\n",
    );
    let plan = input.validate(ORIGIN).unwrap();
    assert_eq!(plan.allocation.seed_count, 1);
    assert_eq!(plan.allocation.per_seed_quota, 5);
}

#[test]
fn skip_user_posts_drops_user_seeds() {
    let input = parse(
        "startUrls: [https://www.reddit.com/u/spez, https://www.reddit.com/r/rust]\nskipUserPosts: true\n",
    );
    let plan = input.validate(ORIGIN).unwrap();
    assert_eq!(plan.seeds.len(), 1);
    assert_eq!(plan.seeds[0].kind, SeedKind::Community);
}

#[test]
fn explicit_empty_start_urls_is_fatal() {
    let err = parse("startUrls: []").validate(ORIGIN).unwrap_err();
    assert!(matches!(err, InputError::MissingStartUrls), "got {err:?}");
}

#[test]
fn ignore_start_urls_without_searches_is_fatal() {
    let err = parse("ignoreStartUrls: true").validate(ORIGIN).unwrap_err();
    assert!(matches!(err, InputError::NoSeeds), "got {err:?}");
}

#[test]
fn ignore_start_urls_with_searches_is_valid() {
    let plan = parse("ignoreStartUrls: true\nsearches: [rust]")
        .validate(ORIGIN)
        .unwrap();
    assert!(plan.seeds.is_empty());
    assert_eq!(plan.searches, vec!["rust".to_owned()]);
}

#[test]
fn start_page_zero_is_rejected() {
    let err = parse("startPage: 0").validate(ORIGIN).unwrap_err();
    assert!(matches!(err, InputError::StartPageTooLow(0)), "got {err:?}");
}

#[test]
fn end_page_before_start_page_is_rejected() {
    let err = parse("startPage: 3\nendPage: 2").validate(ORIGIN).unwrap_err();
    assert!(
        matches!(
            err,
            InputError::InvalidPageRange {
                start_page: 3,
                end_page: 2
            }
        ),
        "got {err:?}"
    );
}

#[test]
fn max_items_defaults_from_other_caps() {
    let plan = parse("maxPostCount: 4\nmaxCommentsPerPost: 1\nmaxCommunitiesCount: 0\nmaxUserCount: 0")
        .validate(ORIGIN)
        .unwrap();
    assert_eq!(plan.budget.max_items, 8);

    let plan = parse("maxItems: 3").validate(ORIGIN).unwrap();
    assert_eq!(plan.budget.max_items, 3);
}

#[test]
fn date_limit_accepts_bare_date_and_rfc3339() {
    let plan = parse("postDateLimit: '2024-03-01'").validate(ORIGIN).unwrap();
    assert_eq!(
        plan.budget.post_date_limit.unwrap().to_rfc3339(),
        "2024-03-01T00:00:00+00:00"
    );

    let plan = parse("postDateLimit: '2024-03-01T12:00:00+02:00'")
        .validate(ORIGIN)
        .unwrap();
    assert_eq!(
        plan.budget.post_date_limit.unwrap().to_rfc3339(),
        "2024-03-01T10:00:00+00:00"
    );
}

#[test]
fn invalid_date_limit_is_rejected() {
    let err = parse("postDateLimit: yesterday").validate(ORIGIN).unwrap_err();
    assert!(matches!(err, InputError::InvalidDate { .. }), "got {err:?}");
}

#[test]
fn unknown_sort_fails_to_parse() {
    assert!(RunInput::from_yaml_str("sort: sideways").is_err());
}

#[test]
fn from_path_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("input.yaml");
    std::fs::write(&path, "startUrls: [https://www.reddit.com/r/rust]\n").unwrap();
    let input = RunInput::from_path(&path).unwrap();
    assert_eq!(input.start_urls.unwrap().len(), 1);
}

#[test]
fn from_path_reports_missing_file() {
    let err = RunInput::from_path(Path::new("/definitely/not/here.yaml")).unwrap_err();
    assert!(matches!(err, InputError::Read { .. }), "got {err:?}");
}

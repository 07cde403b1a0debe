use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn build_app_config_uses_defaults_when_env_is_empty() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.platform_origin, "https://www.reddit.com");
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.retry_backoff_base_ms, 1000);
    assert_eq!(cfg.pause_min_ms, 120);
    assert_eq!(cfg.pause_max_ms, 400);
    assert_eq!(cfg.session_max_usage, 20);
    assert_eq!(cfg.session_pool_size, 10);
}

#[test]
fn platform_origin_override_strips_trailing_slash() {
    let mut map = HashMap::new();
    map.insert("REDHARVEST_PLATFORM_ORIGIN", "http://127.0.0.1:8080/");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.platform_origin, "http://127.0.0.1:8080");
    assert_eq!(cfg.platform_host(), "127.0.0.1");
}

#[test]
fn platform_origin_rejects_garbage() {
    let mut map = HashMap::new();
    map.insert("REDHARVEST_PLATFORM_ORIGIN", "not a url");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "REDHARVEST_PLATFORM_ORIGIN"),
        "expected InvalidEnvVar(REDHARVEST_PLATFORM_ORIGIN), got: {result:?}"
    );
}

#[test]
fn request_timeout_override() {
    let mut map = HashMap::new();
    map.insert("REDHARVEST_REQUEST_TIMEOUT_SECS", "60");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.request_timeout_secs, 60);
}

#[test]
fn request_timeout_invalid() {
    let mut map = HashMap::new();
    map.insert("REDHARVEST_REQUEST_TIMEOUT_SECS", "not-a-number");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "REDHARVEST_REQUEST_TIMEOUT_SECS"),
        "expected InvalidEnvVar(REDHARVEST_REQUEST_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn pause_window_must_not_be_inverted() {
    let mut map = HashMap::new();
    map.insert("REDHARVEST_PAUSE_MIN_MS", "500");
    map.insert("REDHARVEST_PAUSE_MAX_MS", "100");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "REDHARVEST_PAUSE_MAX_MS"),
        "expected InvalidEnvVar(REDHARVEST_PAUSE_MAX_MS), got: {result:?}"
    );
}

#[test]
fn session_settings_override() {
    let mut map = HashMap::new();
    map.insert("REDHARVEST_SESSION_MAX_USAGE", "5");
    map.insert("REDHARVEST_SESSION_POOL_SIZE", "3");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.session_max_usage, 5);
    assert_eq!(cfg.session_pool_size, 3);
}

#[test]
fn session_pool_size_invalid() {
    let mut map = HashMap::new();
    map.insert("REDHARVEST_SESSION_POOL_SIZE", "-1");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "REDHARVEST_SESSION_POOL_SIZE"),
        "expected InvalidEnvVar(REDHARVEST_SESSION_POOL_SIZE), got: {result:?}"
    );
}

#[test]
fn load_app_config_reads_the_process_environment() {
    let cfg = load_app_config().expect("process env should yield a config");
    assert!(!cfg.platform_origin.is_empty());
    assert!(cfg.pause_min_ms <= cfg.pause_max_ms);
}

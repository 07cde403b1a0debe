use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load transport configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load transport configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build the configuration using the provided env-var lookup function, so the
/// parsing rules can be tested against a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let log_level = or_default("REDHARVEST_LOG_LEVEL", "info");
    let platform_origin = parse_origin(&or_default(
        "REDHARVEST_PLATFORM_ORIGIN",
        crate::DEFAULT_PLATFORM_ORIGIN,
    ))?;

    let request_timeout_secs = parse_u64("REDHARVEST_REQUEST_TIMEOUT_SECS", "30")?;
    let retry_backoff_base_ms = parse_u64("REDHARVEST_RETRY_BACKOFF_BASE_MS", "1000")?;
    let pause_min_ms = parse_u64("REDHARVEST_PAUSE_MIN_MS", "120")?;
    let pause_max_ms = parse_u64("REDHARVEST_PAUSE_MAX_MS", "400")?;
    if pause_max_ms < pause_min_ms {
        return Err(ConfigError::InvalidEnvVar {
            var: "REDHARVEST_PAUSE_MAX_MS".to_string(),
            reason: format!("must be >= REDHARVEST_PAUSE_MIN_MS ({pause_min_ms})"),
        });
    }
    let session_max_usage = parse_u32("REDHARVEST_SESSION_MAX_USAGE", "20")?;
    let session_pool_size = parse_usize("REDHARVEST_SESSION_POOL_SIZE", "10")?;

    Ok(AppConfig {
        log_level,
        platform_origin,
        request_timeout_secs,
        retry_backoff_base_ms,
        pause_min_ms,
        pause_max_ms,
        session_max_usage,
        session_pool_size,
    })
}

/// Validates the platform origin and strips any trailing slash.
fn parse_origin(raw: &str) -> Result<String, ConfigError> {
    let url = reqwest::Url::parse(raw).map_err(|e| ConfigError::InvalidEnvVar {
        var: "REDHARVEST_PLATFORM_ORIGIN".to_string(),
        reason: e.to_string(),
    })?;
    if url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar {
            var: "REDHARVEST_PLATFORM_ORIGIN".to_string(),
            reason: "origin has no host".to_string(),
        });
    }
    Ok(raw.trim_end_matches('/').to_string())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

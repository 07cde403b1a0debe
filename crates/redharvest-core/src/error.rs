use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Fatal problems with a run input. Any of these aborts the run before the
/// first request is dispatched.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read run input {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse run input: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("startPage must be at least 1 (got {0})")]
    StartPageTooLow(u32),

    #[error("endPage ({end_page}) must be greater than or equal to startPage ({start_page})")]
    InvalidPageRange { start_page: u32, end_page: u32 },

    #[error("invalid or missing startUrls in input")]
    MissingStartUrls,

    #[error("nothing to harvest: no valid start URLs and no search streams enabled")]
    NoSeeds,

    #[error("invalid postDateLimit \"{value}\": expected RFC 3339 or YYYY-MM-DD")]
    InvalidDate { value: String },
}

//! Shared domain types for redharvest: run input and budgets, seed
//! classification, canonical output records and environment configuration.

pub mod app_config;
pub mod budget;
pub mod config;
pub mod error;
pub mod input;
pub mod records;
pub mod seed;

pub use app_config::AppConfig;
pub use budget::{RunBudget, SeedAllocation, Sort, TimeRange};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, InputError};
pub use input::{HarvestPlan, RunInput, SearchToggles};
pub use records::{
    CanonicalRecord, CommentRecord, CommunityRecord, PostRecord, RecordKind, UserRecord,
};
pub use seed::{same_platform_host, Seed, SeedKind};

pub const DEFAULT_PLATFORM_ORIGIN: &str = "https://www.reddit.com";

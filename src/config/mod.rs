pub mod toml_config;

use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_file_extension, validate_path, validate_positive_number, validate_range,
};

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::validation::Validate;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "cli")]
use std::time::Duration;

pub const DEFAULT_INTERVAL_SECONDS: u64 = 60;
pub const DEFAULT_MAX_RUN_SECONDS: u64 = 300;
pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const DEFAULT_MAX_PAGE_SIZE: u64 = 100;

/// 兩種設定來源共用的檢查
pub(crate) fn validate_settings(
    source_path: &str,
    interval_seconds: u64,
    max_run_seconds: u64,
    default_page_size: u64,
    max_page_size: u64,
) -> Result<()> {
    validate_path("source.path", source_path)?;
    validate_file_extension("source.path", source_path, &["csv"])?;
    validate_positive_number("schedule.interval_seconds", interval_seconds, 1)?;
    validate_positive_number("schedule.max_run_seconds", max_run_seconds, 1)?;
    validate_range("query.max_page_size", max_page_size, 1, 1000)?;
    validate_positive_number("query.default_page_size", default_page_size, 1)?;

    if default_page_size > max_page_size {
        return Err(EtlError::InvalidConfigValueError {
            field: "query.default_page_size".to_string(),
            value: default_page_size.to_string(),
            reason: format!("Value must not exceed query.max_page_size ({})", max_page_size),
        });
    }
    Ok(())
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "course-etl")]
#[command(about = "Scheduled course CSV import")]
pub struct CliConfig {
    /// Path to a TOML configuration file; replaces the source/schedule/query flags
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(long, default_value = "./data/courses.csv")]
    pub source_path: String,

    #[arg(long, default_value_t = DEFAULT_INTERVAL_SECONDS)]
    pub interval_seconds: u64,

    #[arg(long, default_value_t = DEFAULT_MAX_RUN_SECONDS)]
    pub max_run_seconds: u64,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub run_on_start: bool,

    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub default_page_size: u64,

    #[arg(long, default_value_t = DEFAULT_MAX_PAGE_SIZE)]
    pub max_page_size: u64,

    #[arg(long, help = "Run a single import pass and exit")]
    pub once: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn source_path(&self) -> &str {
        &self.source_path
    }

    fn schedule_interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    fn max_run_duration(&self) -> Duration {
        Duration::from_secs(self.max_run_seconds)
    }

    fn run_on_start(&self) -> bool {
        self.run_on_start
    }

    fn default_page_size(&self) -> u64 {
        self.default_page_size
    }

    fn max_page_size(&self) -> u64 {
        self.max_page_size
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_settings(
            &self.source_path,
            self.interval_seconds,
            self.max_run_seconds,
            self.default_page_size,
            self.max_page_size,
        )
    }
}

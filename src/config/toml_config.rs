use crate::config::{
    validate_settings, DEFAULT_INTERVAL_SECONDS, DEFAULT_MAX_PAGE_SIZE, DEFAULT_MAX_RUN_SECONDS,
    DEFAULT_PAGE_SIZE,
};
use crate::core::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub source: SourceConfig,
    pub schedule: Option<ScheduleConfig>,
    pub query: Option<QueryConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub interval_seconds: Option<u64>,
    pub max_run_seconds: Option<u64>,
    pub run_on_start: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    pub default_page_size: Option<u64>,
    pub max_page_size: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub json_logs: Option<bool>,
    pub verbose: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${COURSE_CSV_PATH})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_settings(
            &self.source.path,
            self.interval_seconds(),
            self.max_run_seconds(),
            self.default_page_size(),
            self.max_page_size(),
        )
    }

    /// 匯入間隔（秒）
    pub fn interval_seconds(&self) -> u64 {
        self.schedule
            .as_ref()
            .and_then(|s| s.interval_seconds)
            .unwrap_or(DEFAULT_INTERVAL_SECONDS)
    }

    /// 單次匯入的最長執行時間（秒）
    pub fn max_run_seconds(&self) -> u64 {
        self.schedule
            .as_ref()
            .and_then(|s| s.max_run_seconds)
            .unwrap_or(DEFAULT_MAX_RUN_SECONDS)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json_logs)
            .unwrap_or(false)
    }

    pub fn verbose(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.verbose)
            .unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn source_path(&self) -> &str {
        &self.source.path
    }

    fn schedule_interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds())
    }

    fn max_run_duration(&self) -> Duration {
        Duration::from_secs(self.max_run_seconds())
    }

    fn run_on_start(&self) -> bool {
        self.schedule
            .as_ref()
            .and_then(|s| s.run_on_start)
            .unwrap_or(true)
    }

    fn default_page_size(&self) -> u64 {
        self.query
            .as_ref()
            .and_then(|q| q.default_page_size)
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    fn max_page_size(&self) -> u64 {
        self.query
            .as_ref()
            .and_then(|q| q.max_page_size)
            .unwrap_or(DEFAULT_MAX_PAGE_SIZE)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

use crate::domain::model::{ExtractResult, ImportResult, StagedDataset};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::io::Read;
use std::time::Duration;

/// A readable byte stream for one import pass.
pub type SourceReader = Box<dyn Read + Send>;

pub trait Storage: Send + Sync {
    fn open(&self, path: &str) -> impl std::future::Future<Output = Result<SourceReader>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn source_path(&self) -> &str;
    fn schedule_interval(&self) -> Duration;
    fn max_run_duration(&self) -> Duration;
    fn run_on_start(&self) -> bool;
    fn default_page_size(&self) -> u64;
    fn max_page_size(&self) -> u64;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<ExtractResult>;
    async fn transform(&self, extracted: ExtractResult) -> Result<StagedDataset>;
    async fn load(&self, staged: StagedDataset) -> Result<ImportResult>;
}

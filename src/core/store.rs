use crate::domain::model::Dataset;
use crate::utils::error::Result;
use chrono::Utc;
use std::sync::{Arc, PoisonError, RwLock};

/// Holds the active dataset version.
///
/// Readers clone an `Arc` snapshot and never see a half-built pass: an import
/// publishes a complete [`Dataset`] with [`DatasetStore::publish`], which swaps
/// the pointer under the write lock. Mutations are copy-on-write.
#[derive(Debug, Default)]
pub struct DatasetStore {
    active: RwLock<Arc<Dataset>>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<Dataset> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn version(&self) -> u64 {
        self.snapshot().version
    }

    /// Replaces the active dataset and returns the new version number.
    pub fn publish(&self, mut dataset: Dataset) -> u64 {
        let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
        dataset.version = active.version + 1;
        dataset.loaded_at = Some(Utc::now());
        let version = dataset.version;
        *active = Arc::new(dataset);
        version
    }

    /// Applies `change` to the active dataset.
    ///
    /// `change` must check its preconditions before touching the dataset; on
    /// `Err` nothing it wrote is rolled back. Snapshots taken earlier are not
    /// affected.
    pub fn update<T, F>(&self, change: F) -> Result<T>
    where
        F: FnOnce(&mut Dataset) -> Result<T>,
    {
        let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
        change(Arc::make_mut(&mut *active))
    }
}

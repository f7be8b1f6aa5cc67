use crate::core::Storage;
use crate::domain::ports::SourceReader;
use crate::utils::error::{EtlError, Result};
use std::fs::File;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl Storage for LocalStorage {
    async fn open(&self, path: &str) -> Result<SourceReader> {
        // 絕對路徑會取代 base_path
        let full_path = self.base_path.join(path);
        tracing::debug!("Opening local file {}", full_path.display());

        let display = full_path.display().to_string();

        // FIFO 或網路磁碟的 open 可能卡住，不可佔用 async worker
        let file = tokio::task::spawn_blocking(move || File::open(full_path))
            .await
            .map_err(|e| EtlError::source(&display, format!("open task failed: {}", e)))?
            .map_err(|e| EtlError::source(&display, e.to_string()))?;
        Ok(Box::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_relative_and_absolute_paths() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("courses.csv"), "CourseName\nAlgorithms\n").unwrap();

        let storage = LocalStorage::new(temp_dir.path());
        let mut content = String::new();
        storage
            .open("courses.csv")
            .await
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "CourseName\nAlgorithms\n");

        let absolute = temp_dir.path().join("courses.csv");
        let storage = LocalStorage::new(".");
        assert!(storage.open(absolute.to_str().unwrap()).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_file_is_source_error() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());

        let err = storage.open("missing.csv").await.err().unwrap();
        assert!(matches!(err, EtlError::SourceError { .. }));
    }
}

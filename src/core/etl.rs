use crate::core::Pipeline;
use crate::domain::model::ImportResult;
use crate::utils::error::Result;
use std::time::Instant;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Runs one import pass. Nothing becomes visible to readers unless every
    /// phase succeeds.
    pub async fn run(&self) -> Result<ImportResult> {
        let started = Instant::now();
        tracing::info!("Starting course import pass...");

        // Extract
        let extracted = self.pipeline.extract().await?;
        tracing::info!(
            "Extracted {} course rows ({} skipped)",
            extracted.rows.len(),
            extracted.rows_skipped
        );

        // Transform
        let staged = self.pipeline.transform(extracted).await?;
        tracing::info!(
            "Reconciled {} courses, {} countries, {} cities, {} universities",
            staged.dataset.courses.len(),
            staged.dataset.countries.len(),
            staged.dataset.cities.len(),
            staged.dataset.universities.len()
        );

        // Load
        let mut result = self.pipeline.load(staged).await?;
        result.duration = started.elapsed();
        tracing::info!(
            "✅ Dataset version {} published in {:?}",
            result.version,
            result.duration
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::importer::CourseImporter;
    use crate::core::store::DatasetStore;
    use crate::core::test_support::{MockConfig, MockStorage};
    use crate::utils::error::EtlError;
    use std::sync::Arc;

    const CSV: &str = "Country,City,University,CourseName,CourseDescription,StartDate,EndDate,Price,Currency\n\
USA,NYC,MIT,Algorithms,,2024-01-10,,100,USD\n\
USA,Boston,MIT,Systems,,,,,\n\
,,,,,,,,\n";

    fn engine(storage: MockStorage) -> EtlEngine<CourseImporter<MockStorage, MockConfig>> {
        EtlEngine::new(CourseImporter::new(
            storage,
            MockConfig::new("courses.csv"),
            Arc::new(DatasetStore::new()),
        ))
    }

    #[tokio::test]
    async fn test_run_reports_counts() {
        let storage = MockStorage::new();
        storage.insert("courses.csv", CSV.as_bytes().to_vec());
        let engine = engine(storage);

        let result = engine.run().await.unwrap();
        assert_eq!(result.version, 1);
        assert_eq!(result.rows_processed, 2);
        assert_eq!(result.rows_skipped, 1);
        assert_eq!(result.countries, 1);
        assert_eq!(result.cities, 2);
        assert_eq!(result.universities, 1);
    }

    #[tokio::test]
    async fn test_rerun_yields_identical_dataset() {
        let storage = MockStorage::new();
        storage.insert("courses.csv", CSV.as_bytes().to_vec());
        let engine = engine(storage);

        engine.run().await.unwrap();
        let first = engine.pipeline().store().snapshot();
        engine.run().await.unwrap();
        let second = engine.pipeline().store().snapshot();

        assert_eq!(second.version, first.version + 1);
        assert_eq!(first.countries, second.countries);
        assert_eq!(first.cities, second.cities);
        assert_eq!(first.universities, second.universities);
        assert_eq!(first.courses, second.courses);
    }

    #[tokio::test]
    async fn test_interrupted_pass_keeps_previous_dataset() {
        let storage = MockStorage::new();
        storage.insert("courses.csv", CSV.as_bytes().to_vec());
        let engine = engine(storage.clone());
        engine.run().await.unwrap();
        let before = engine.pipeline().store().snapshot();

        let mut csv = "Country,City,University,CourseName\n".to_string();
        for i in 1..=10 {
            csv.push_str(&format!("India,Pune,COEP,Course {}\n", i));
        }
        let fail_at = csv.match_indices('\n').nth(3).map(|(i, _)| i + 1).unwrap();
        storage.insert_interrupted("courses.csv", csv.into_bytes(), fail_at);

        let err = engine.run().await.unwrap_err();
        assert!(matches!(err, EtlError::SourceError { .. }));

        let after = engine.pipeline().store().snapshot();
        assert_eq!(*after, *before);
        assert_eq!(after.courses.len(), 2);
    }
}

use crate::core::resolver::{DimensionKind, DimensionResolver};
use crate::core::store::DatasetStore;
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{
    Course, CourseRow, Dataset, ExtractResult, Id, ImportResult, StagedDataset,
};
use crate::utils::error::{EtlError, Result};
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

const COURSE_NAME_HEADER: &str = "CourseName";
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Header-mapped CSV record. Any column except `CourseName` may be absent.
#[derive(Debug, Deserialize)]
struct CsvCourseRecord {
    #[serde(rename = "Country", default)]
    country: Option<String>,
    #[serde(rename = "City", default)]
    city: Option<String>,
    #[serde(rename = "University", default)]
    university: Option<String>,
    #[serde(rename = "CourseName", default)]
    course_name: Option<String>,
    #[serde(rename = "CourseDescription", default)]
    course_description: Option<String>,
    #[serde(rename = "StartDate", default)]
    start_date: Option<String>,
    #[serde(rename = "EndDate", default)]
    end_date: Option<String>,
    #[serde(rename = "Price", default)]
    price: Option<String>,
    #[serde(rename = "Currency", default)]
    currency: Option<String>,
}

/// Imports the course CSV into a fresh dataset and publishes it.
pub struct CourseImporter<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    store: Arc<DatasetStore>,
}

impl<S: Storage, C: ConfigProvider> CourseImporter<S, C> {
    pub fn new(storage: S, config: C, store: Arc<DatasetStore>) -> Self {
        Self {
            storage,
            config,
            store,
        }
    }

    pub fn store(&self) -> &Arc<DatasetStore> {
        &self.store
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for CourseImporter<S, C> {
    async fn extract(&self) -> Result<ExtractResult> {
        let path = self.config.source_path();
        tracing::debug!("Opening course source: {}", path);

        let reader = self.storage.open(path).await.map_err(|e| match e {
            EtlError::SourceError { .. } => e,
            other => EtlError::source(path, other.to_string()),
        })?;

        // 讀檔是同步 I/O，放到 blocking 執行緒，讓逾時可以中止本次匯入
        let source = path.to_string();
        tokio::task::spawn_blocking(move || parse_course_csv(&source, reader))
            .await
            .map_err(|e| EtlError::source(path, format!("parser task failed: {}", e)))?
    }

    async fn transform(&self, extracted: ExtractResult) -> Result<StagedDataset> {
        let rows_processed = extracted.rows.len();
        let dataset = build_dataset(extracted.rows);

        Ok(StagedDataset {
            dataset,
            rows_processed,
            rows_skipped: extracted.rows_skipped,
        })
    }

    async fn load(&self, staged: StagedDataset) -> Result<ImportResult> {
        let countries = staged.dataset.countries.len();
        let cities = staged.dataset.cities.len();
        let universities = staged.dataset.universities.len();

        let version = self.store.publish(staged.dataset);
        tracing::debug!("Published dataset version {}", version);

        Ok(ImportResult {
            version,
            rows_processed: staged.rows_processed,
            rows_skipped: staged.rows_skipped,
            countries,
            cities,
            universities,
            duration: Duration::ZERO,
        })
    }
}

/// Stream-parses course rows from `reader`.
///
/// Row problems are logged and counted; read failures and a missing
/// `CourseName` header abort with [`EtlError::SourceError`].
pub fn parse_course_csv<R: Read>(path: &str, reader: R) -> Result<ExtractResult> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| EtlError::source(path, format!("cannot read header row: {}", e)))?
        .clone();
    if !headers.iter().any(|h| h == COURSE_NAME_HEADER) {
        return Err(EtlError::source(
            path,
            format!("header row has no {} column", COURSE_NAME_HEADER),
        ));
    }

    let mut result = ExtractResult::default();
    let mut raw_record = csv::ByteRecord::new();
    let mut row_number: u64 = 0;

    loop {
        row_number += 1;
        match csv_reader.read_byte_record(&mut raw_record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => {
                tracing::error!(
                    "❌ Reading {} failed at row {} after {} good rows: {}",
                    path,
                    row_number,
                    result.rows.len(),
                    e
                );
                return Err(EtlError::source(
                    path,
                    format!("read interrupted at row {}: {}", row_number, e),
                ));
            }
            Err(e) => {
                let err = EtlError::RowError {
                    row: row_number,
                    field: "record".to_string(),
                    value: raw_text(&raw_record),
                    reason: e.to_string(),
                };
                tracing::warn!("⚠️ Skipping row of {}: {}", path, err);
                result.rows_skipped += 1;
                continue;
            }
        }

        let mut record =
            match csv::StringRecord::from_byte_record(std::mem::take(&mut raw_record)) {
                Ok(record) => record,
                Err(e) => {
                    let field = headers
                        .get(e.utf8_error().field())
                        .unwrap_or("record")
                        .to_string();
                    let err = EtlError::RowError {
                        row: row_number,
                        field,
                        value: raw_text(&e.into_byte_record()),
                        reason: "invalid UTF-8".to_string(),
                    };
                    tracing::warn!("⚠️ Skipping row of {}: {}", path, err);
                    result.rows_skipped += 1;
                    continue;
                }
            };
        // ByteRecord 只修剪 ASCII 空白
        record.trim();

        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(row_number + 1);

        match parse_row(row_number, line, &record, &headers) {
            Ok(row) => result.rows.push(row),
            Err(e) => {
                tracing::warn!("⚠️ Skipping line {} of {}: {}", line, path, e);
                result.rows_skipped += 1;
            }
        }
    }

    tracing::debug!(
        "Parsed {} course rows from {} ({} skipped)",
        result.rows.len(),
        path,
        result.rows_skipped
    );
    Ok(result)
}

fn raw_text(record: &csv::ByteRecord) -> String {
    record
        .iter()
        .map(String::from_utf8_lossy)
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_row(
    row_number: u64,
    line: u64,
    record: &csv::StringRecord,
    headers: &csv::StringRecord,
) -> Result<CourseRow> {
    let raw: CsvCourseRecord =
        record
            .deserialize(Some(headers))
            .map_err(|e| EtlError::RowError {
                row: row_number,
                field: "record".to_string(),
                value: record.iter().collect::<Vec<_>>().join(","),
                reason: e.to_string(),
            })?;

    let name = clean(raw.course_name).ok_or_else(|| EtlError::RowError {
        row: row_number,
        field: COURSE_NAME_HEADER.to_string(),
        value: String::new(),
        reason: "course name is empty".to_string(),
    })?;

    let start_date = parse_date_field(row_number, "StartDate", raw.start_date)?;
    let end_date = parse_date_field(row_number, "EndDate", raw.end_date)?;
    let price = parse_price_field(row_number, raw.price)?;

    Ok(CourseRow {
        line,
        country: clean(raw.country),
        city: clean(raw.city),
        university: clean(raw.university),
        name,
        description: clean(raw.course_description),
        start_date,
        end_date,
        price,
        currency: clean(raw.currency),
    })
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

fn parse_date_field(row: u64, field: &str, raw: Option<String>) -> Result<Option<NaiveDate>> {
    match clean(raw) {
        None => Ok(None),
        Some(value) => parse_date(&value).map(Some).ok_or_else(|| EtlError::RowError {
            row,
            field: field.to_string(),
            value,
            reason: "expected a date such as 2024-09-01".to_string(),
        }),
    }
}

fn parse_price_field(row: u64, raw: Option<String>) -> Result<Option<f64>> {
    match clean(raw) {
        None => Ok(None),
        Some(value) => match value.parse::<f64>() {
            Ok(price) if price.is_finite() => Ok(Some(price)),
            _ => Err(EtlError::RowError {
                row,
                field: "Price".to_string(),
                value,
                reason: "expected a decimal number".to_string(),
            }),
        },
    }
}

/// Resolves dimensions row by row and assigns course ids in input order.
pub fn build_dataset(rows: Vec<CourseRow>) -> Dataset {
    let mut resolver = DimensionResolver::new();
    let mut courses = BTreeMap::new();

    for (index, row) in rows.into_iter().enumerate() {
        let country_id = resolver.resolve(DimensionKind::Country, row.country.as_deref(), None);
        let city_id = resolver.resolve(DimensionKind::City, row.city.as_deref(), country_id);
        let university_id =
            resolver.resolve(DimensionKind::University, row.university.as_deref(), None);

        let id = index as Id + 1;
        courses.insert(
            id,
            Course {
                id,
                name: row.name,
                description: row.description,
                start_date: row.start_date,
                end_date: row.end_date,
                price: row.price,
                currency: row.currency,
                country_id,
                city_id,
                university_id,
            },
        );
    }

    let dimensions = resolver.into_dimensions();
    Dataset {
        version: 0,
        loaded_at: None,
        countries: dimensions.countries,
        cities: dimensions.cities,
        universities: dimensions.universities,
        courses,
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub type Id = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    pub id: Id,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub id: Id,
    pub name: String,
    pub country_id: Option<Id>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct University {
    pub id: Id,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub country_id: Option<Id>,
    pub city_id: Option<Id>,
    pub university_id: Option<Id>,
}

/// A course joined with its dimension records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseView {
    #[serde(flatten)]
    pub course: Course,
    pub country: Option<Country>,
    pub city: Option<City>,
    pub university: Option<University>,
}

/// One complete, self-consistent version of the course data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub version: u64,
    pub loaded_at: Option<DateTime<Utc>>,
    pub countries: BTreeMap<Id, Country>,
    pub cities: BTreeMap<Id, City>,
    pub universities: BTreeMap<Id, University>,
    pub courses: BTreeMap<Id, Course>,
}

impl Dataset {
    pub fn join(&self, course: &Course) -> CourseView {
        CourseView {
            country: course
                .country_id
                .and_then(|id| self.countries.get(&id).cloned()),
            city: course.city_id.and_then(|id| self.cities.get(&id).cloned()),
            university: course
                .university_id
                .and_then(|id| self.universities.get(&id).cloned()),
            course: course.clone(),
        }
    }

    pub fn next_course_id(&self) -> Id {
        self.courses.keys().next_back().map_or(1, |id| id + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
            && self.countries.is_empty()
            && self.cities.is_empty()
            && self.universities.is_empty()
    }
}

/// One CSV row after trimming and field parsing, before dimension resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseRow {
    pub line: u64,
    pub country: Option<String>,
    pub city: Option<String>,
    pub university: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub price: Option<f64>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ExtractResult {
    pub rows: Vec<CourseRow>,
    pub rows_skipped: usize,
}

/// The workspace built by one pass; not yet visible to readers.
#[derive(Debug, Clone)]
pub struct StagedDataset {
    pub dataset: Dataset,
    pub rows_processed: usize,
    pub rows_skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub version: u64,
    pub rows_processed: usize,
    pub rows_skipped: usize,
    pub countries: usize,
    pub cities: usize,
    pub universities: usize,
    #[serde(skip)]
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total_items: usize,
    pub total_pages: usize,
    pub current_page: u64,
}

/// Fields accepted when creating a course outside the import pipeline.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub country_id: Option<Id>,
    pub city_id: Option<Id>,
    pub university_id: Option<Id>,
}

/// Partial update. The outer `Option` says whether a field was supplied; for
/// nullable fields the inner `None` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursePatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub price: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub currency: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub country_id: Option<Option<Id>>,
    #[serde(default, deserialize_with = "double_option")]
    pub city_id: Option<Option<Id>>,
    #[serde(default, deserialize_with = "double_option")]
    pub university_id: Option<Option<Id>>,
}

fn double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

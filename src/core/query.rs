use crate::core::store::DatasetStore;
use crate::core::ConfigProvider;
use crate::domain::model::{Course, CourseView, Id, Page};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::parse_positive_integer;
use std::sync::Arc;

/// Raw list parameters as they arrive from a caller.
///
/// Signed integers so that zero and negative values can be rejected with a
/// validation error instead of failing to deserialize.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub university_id: Option<i64>,
    pub city_id: Option<i64>,
    pub country_id: Option<i64>,
}

impl ListQuery {
    /// Builds a query from query-string pairs (`page`, `limit`, `search`,
    /// `universityId`, `cityId`, `countryId`). Unknown keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut query = ListQuery::default();
        for (key, value) in pairs {
            let value = value.as_ref();
            match key.as_ref() {
                "page" => query.page = Some(parse_positive_integer("page", value)? as i64),
                "limit" => query.limit = Some(parse_positive_integer("limit", value)? as i64),
                "search" => query.search = Some(value.to_string()),
                "universityId" => {
                    query.university_id =
                        Some(parse_positive_integer("universityId", value)? as i64)
                }
                "cityId" => query.city_id = Some(parse_positive_integer("cityId", value)? as i64),
                "countryId" => {
                    query.country_id = Some(parse_positive_integer("countryId", value)? as i64)
                }
                _ => {}
            }
        }
        Ok(query)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Criteria {
    page: u64,
    limit: u64,
    search: Option<String>,
    university_id: Option<Id>,
    city_id: Option<Id>,
    country_id: Option<Id>,
}

impl Criteria {
    fn matches(&self, course: &Course) -> bool {
        if let Some(needle) = &self.search {
            if !course.name.to_lowercase().contains(needle.as_str()) {
                return false;
            }
        }
        if self.university_id.is_some() && course.university_id != self.university_id {
            return false;
        }
        if self.city_id.is_some() && course.city_id != self.city_id {
            return false;
        }
        if self.country_id.is_some() && course.country_id != self.country_id {
            return false;
        }
        true
    }
}

pub struct QueryService {
    store: Arc<DatasetStore>,
    default_limit: u64,
    max_limit: u64,
}

impl QueryService {
    pub fn new(store: Arc<DatasetStore>, default_limit: u64, max_limit: u64) -> Self {
        Self {
            store,
            default_limit,
            max_limit,
        }
    }

    pub fn from_config<C: ConfigProvider>(store: Arc<DatasetStore>, config: &C) -> Self {
        Self::new(store, config.default_page_size(), config.max_page_size())
    }

    /// Lists courses joined with their country, city and university, filtered
    /// and paginated against a single dataset snapshot.
    pub fn list(&self, query: &ListQuery) -> Result<Page<CourseView>> {
        let criteria = self.validate(query)?;
        let dataset = self.store.snapshot();

        let matching: Vec<&Course> = dataset
            .courses
            .values()
            .filter(|course| criteria.matches(course))
            .collect();

        let total_items = matching.len();
        let total_pages = total_pages(total_items, criteria.limit);
        let offset = (criteria.page - 1).saturating_mul(criteria.limit);

        let data: Vec<CourseView> = matching
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(criteria.limit as usize)
            .map(|course| dataset.join(course))
            .collect();

        tracing::debug!(
            "Course list page {} (limit {}): {} of {} matching courses, dataset version {}",
            criteria.page,
            criteria.limit,
            data.len(),
            total_items,
            dataset.version
        );

        Ok(Page {
            data,
            total_items,
            total_pages,
            current_page: criteria.page,
        })
    }

    fn validate(&self, query: &ListQuery) -> Result<Criteria> {
        let page = positive("page", query.page.unwrap_or(1))?;
        let limit = positive("limit", query.limit.unwrap_or(self.default_limit as i64))?;
        if limit > self.max_limit {
            return Err(EtlError::validation(
                "limit",
                limit,
                format!("must not exceed {}", self.max_limit),
            ));
        }

        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        Ok(Criteria {
            page,
            limit,
            search,
            university_id: query
                .university_id
                .map(|id| positive("universityId", id))
                .transpose()?,
            city_id: query.city_id.map(|id| positive("cityId", id)).transpose()?,
            country_id: query
                .country_id
                .map(|id| positive("countryId", id))
                .transpose()?,
        })
    }
}

fn positive(field: &str, value: i64) -> Result<u64> {
    if value < 1 {
        return Err(EtlError::validation(field, value, "must be a positive integer"));
    }
    Ok(value as u64)
}

pub fn total_pages(total_items: usize, limit: u64) -> usize {
    if limit == 0 {
        return 0;
    }
    let limit = limit as usize;
    total_items.div_ceil(limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::importer::build_dataset;
    use crate::domain::model::CourseRow;

    fn row(country: &str, city: &str, university: &str, name: &str) -> CourseRow {
        let opt = |v: &str| (!v.is_empty()).then(|| v.to_string());
        CourseRow {
            line: 0,
            country: opt(country),
            city: opt(city),
            university: opt(university),
            name: name.to_string(),
            description: None,
            start_date: None,
            end_date: None,
            price: None,
            currency: None,
        }
    }

    fn service() -> QueryService {
        let store = Arc::new(DatasetStore::new());
        store.publish(build_dataset(vec![
            row("USA", "NYC", "MIT", "Data Science"),
            row("USA", "Boston", "MIT", "Systems"),
            row("India", "Pune", "COEP", "Data Structures"),
            row("", "", "", "Philosophy"),
            row("USA", "NYC", "Columbia", "Machine Learning"),
        ]));
        QueryService::new(store, 10, 100)
    }

    fn names(page: &Page<CourseView>) -> Vec<&str> {
        page.data.iter().map(|v| v.course.name.as_str()).collect()
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(25, 7), 4);
    }

    #[test]
    fn test_list_defaults() {
        let page = service().list(&ListQuery::default()).unwrap();
        assert_eq!(page.total_items, 5);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.data.len(), 5);
        assert_eq!(page.data[0].course.id, 1);
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let service = service();
        for term in ["data", "SCIENCE", "ta sc"] {
            let page = service
                .list(&ListQuery {
                    search: Some(term.to_string()),
                    ..Default::default()
                })
                .unwrap();
            assert!(names(&page).contains(&"Data Science"), "term {}", term);
        }
    }

    #[test]
    fn test_filters_combine_with_and() {
        let service = service();
        let page = service
            .list(&ListQuery {
                search: Some("data".to_string()),
                country_id: Some(1),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(names(&page), vec!["Data Science"]);
        assert_eq!(page.total_items, 1);

        let page = service
            .list(&ListQuery {
                city_id: Some(1),
                university_id: Some(3),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(names(&page), vec!["Machine Learning"]);
    }

    #[test]
    fn test_joined_dimensions() {
        let page = service().list(&ListQuery::default()).unwrap();

        let first = &page.data[0];
        assert_eq!(first.country.as_ref().map(|c| c.name.as_str()), Some("USA"));
        assert_eq!(first.city.as_ref().map(|c| c.name.as_str()), Some("NYC"));
        assert_eq!(first.university.as_ref().map(|u| u.name.as_str()), Some("MIT"));

        let philosophy = &page.data[3];
        assert!(philosophy.country.is_none());
        assert!(philosophy.city.is_none());
        assert!(philosophy.university.is_none());
    }

    #[test]
    fn test_pagination() {
        let service = service();
        let page = service
            .list(&ListQuery {
                page: Some(2),
                limit: Some(2),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(names(&page), vec!["Data Structures", "Philosophy"]);
        assert_eq!(page.total_items, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 2);

        let past_end = service
            .list(&ListQuery {
                page: Some(9),
                limit: Some(2),
                ..Default::default()
            })
            .unwrap();
        assert!(past_end.data.is_empty());
        assert_eq!(past_end.total_pages, 3);
    }

    #[test]
    fn test_no_matches_has_zero_pages() {
        let page = service()
            .list(&ListQuery {
                search: Some("astronomy".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(page.total_items, 0);
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let page = service()
            .list(&ListQuery {
                search: Some("   ".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(page.total_items, 5);
    }

    #[test]
    fn test_invalid_parameters_are_rejected() {
        let service = service();
        for query in [
            ListQuery {
                page: Some(0),
                ..Default::default()
            },
            ListQuery {
                limit: Some(-5),
                ..Default::default()
            },
            ListQuery {
                limit: Some(101),
                ..Default::default()
            },
            ListQuery {
                city_id: Some(0),
                ..Default::default()
            },
        ] {
            let err = service.list(&query).unwrap_err();
            assert!(matches!(err, EtlError::ValidationError { .. }), "{:?}", query);
        }
    }

    #[test]
    fn test_from_pairs() {
        let query = ListQuery::from_pairs([
            ("page", "2"),
            ("limit", "5"),
            ("search", "data"),
            ("countryId", "1"),
            ("sort", "ignored"),
        ])
        .unwrap();
        assert_eq!(query.page, Some(2));
        assert_eq!(query.limit, Some(5));
        assert_eq!(query.search.as_deref(), Some("data"));
        assert_eq!(query.country_id, Some(1));
        assert_eq!(query.city_id, None);

        assert!(ListQuery::from_pairs([("cityId", "abc")]).is_err());
        assert!(ListQuery::from_pairs([("page", "-1")]).is_err());
    }

    #[test]
    fn test_empty_dataset() {
        let service = QueryService::new(Arc::new(DatasetStore::new()), 10, 100);
        let page = service.list(&ListQuery::default()).unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.total_pages, 0);
    }
}

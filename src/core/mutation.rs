use crate::core::store::DatasetStore;
use crate::domain::model::{Course, CoursePatch, CourseView, Dataset, Id, NewCourse};
use crate::utils::error::{EtlError, Result};
use std::sync::Arc;

/// Single-course create/read/update/delete against the active dataset.
///
/// Changes last until the next successful import pass replaces the dataset.
pub struct CourseService {
    store: Arc<DatasetStore>,
}

impl CourseService {
    pub fn new(store: Arc<DatasetStore>) -> Self {
        Self { store }
    }

    pub fn create(&self, fields: NewCourse) -> Result<Course> {
        let name = required_name(&fields.name)?;

        let course = self.store.update(|dataset| {
            check_references(
                dataset,
                fields.country_id,
                fields.city_id,
                fields.university_id,
            )?;

            let course = Course {
                id: dataset.next_course_id(),
                name,
                description: fields.description,
                start_date: fields.start_date,
                end_date: fields.end_date,
                price: fields.price,
                currency: fields.currency,
                country_id: fields.country_id,
                city_id: fields.city_id,
                university_id: fields.university_id,
            };
            dataset.courses.insert(course.id, course.clone());
            Ok(course)
        })?;

        tracing::info!("Created course {} '{}'", course.id, course.name);
        Ok(course)
    }

    pub fn get_by_id(&self, id: Id) -> Result<CourseView> {
        let dataset = self.store.snapshot();
        dataset
            .courses
            .get(&id)
            .map(|course| dataset.join(course))
            .ok_or(EtlError::NotFound {
                entity: "Course",
                id,
            })
    }

    pub fn update(&self, id: Id, patch: CoursePatch) -> Result<Course> {
        let name = patch.name.as_deref().map(required_name).transpose()?;

        let course = self.store.update(|dataset| {
            let existing = dataset.courses.get(&id).ok_or(EtlError::NotFound {
                entity: "Course",
                id,
            })?;

            let mut course = existing.clone();
            if let Some(name) = name {
                course.name = name;
            }
            if let Some(description) = patch.description {
                course.description = description;
            }
            if let Some(start_date) = patch.start_date {
                course.start_date = start_date;
            }
            if let Some(end_date) = patch.end_date {
                course.end_date = end_date;
            }
            if let Some(price) = patch.price {
                course.price = price;
            }
            if let Some(currency) = patch.currency {
                course.currency = currency;
            }
            if let Some(country_id) = patch.country_id {
                course.country_id = country_id;
            }
            if let Some(city_id) = patch.city_id {
                course.city_id = city_id;
            }
            if let Some(university_id) = patch.university_id {
                course.university_id = university_id;
            }

            check_references(dataset, course.country_id, course.city_id, course.university_id)?;
            dataset.courses.insert(id, course.clone());
            Ok(course)
        })?;

        tracing::info!("Updated course {}", id);
        Ok(course)
    }

    /// Removes the course and returns it as it was before deletion.
    pub fn delete(&self, id: Id) -> Result<Course> {
        let course = self.store.update(|dataset| {
            dataset.courses.remove(&id).ok_or(EtlError::NotFound {
                entity: "Course",
                id,
            })
        })?;

        tracing::info!("Deleted course {} '{}'", course.id, course.name);
        Ok(course)
    }
}

fn required_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(EtlError::validation("name", name, "course name cannot be empty"));
    }
    Ok(trimmed.to_string())
}

fn check_references(
    dataset: &Dataset,
    country_id: Option<Id>,
    city_id: Option<Id>,
    university_id: Option<Id>,
) -> Result<()> {
    if let Some(id) = country_id.filter(|id| !dataset.countries.contains_key(id)) {
        return Err(EtlError::validation("countryId", id, "unknown country"));
    }
    if let Some(id) = city_id.filter(|id| !dataset.cities.contains_key(id)) {
        return Err(EtlError::validation("cityId", id, "unknown city"));
    }
    if let Some(id) = university_id.filter(|id| !dataset.universities.contains_key(id)) {
        return Err(EtlError::validation("universityId", id, "unknown university"));
    }
    Ok(())
}

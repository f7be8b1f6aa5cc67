pub mod etl;
pub mod importer;
pub mod mutation;
pub mod query;
pub mod resolver;
pub mod scheduler;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::domain::model::{CourseRow, Dataset, ImportResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;

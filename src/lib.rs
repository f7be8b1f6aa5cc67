pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::storage::LocalStorage;
pub use config::toml_config::TomlConfig;
pub use core::{
    etl::EtlEngine,
    importer::CourseImporter,
    mutation::CourseService,
    query::{ListQuery, QueryService},
    scheduler::{ImportScheduler, RunOutcome, SchedulerStats, TriggerOutcome},
    store::DatasetStore,
};
pub use domain::model::{
    City, Country, Course, CoursePatch, CourseView, Dataset, Id, ImportResult, NewCourse, Page,
    University,
};
pub use utils::error::{EtlError, Result};

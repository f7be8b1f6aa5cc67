use anyhow::Context;
use clap::Parser;
use course_etl::core::ConfigProvider;
use course_etl::utils::{logger, validation::Validate};
use course_etl::{
    CliConfig, CourseImporter, CourseService, DatasetStore, EtlEngine, ListQuery, LocalStorage,
    QueryService, TomlConfig,
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "course-query")]
#[command(about = "Import the course CSV once and print a query result as JSON")]
struct Args {
    /// Path to the course CSV file
    #[arg(long, default_value = "./data/courses.csv")]
    source_path: String,

    /// Path to a TOML configuration file (overrides --source-path)
    #[arg(short, long)]
    config: Option<String>,

    /// Print a single course instead of a list
    #[arg(long)]
    id: Option<u64>,

    #[arg(long)]
    page: Option<String>,

    #[arg(long)]
    limit: Option<String>,

    #[arg(long)]
    search: Option<String>,

    #[arg(long)]
    university_id: Option<String>,

    #[arg(long)]
    city_id: Option<String>,

    #[arg(long)]
    country_id: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("page", &self.page),
            ("limit", &self.limit),
            ("search", &self.search),
            ("universityId", &self.university_id),
            ("cityId", &self.city_id),
            ("countryId", &self.country_id),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
        .collect()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    match &args.config {
        Some(path) => {
            let config = TomlConfig::from_file(path)
                .with_context(|| format!("failed to load config file '{}'", path))?;
            query(config, &args).await
        }
        None => {
            // 沿用 CliConfig 的預設分頁與排程設定
            let config =
                CliConfig::parse_from(["course-query", "--source-path", args.source_path.as_str()]);
            query(config, &args).await
        }
    }
}

async fn query<C: ConfigProvider + Validate>(config: C, args: &Args) -> anyhow::Result<()> {
    config.validate().context("invalid configuration")?;

    let store = Arc::new(DatasetStore::new());
    let queries = QueryService::from_config(Arc::clone(&store), &config);
    let courses = CourseService::new(Arc::clone(&store));

    let engine = EtlEngine::new(CourseImporter::new(
        LocalStorage::new("."),
        config,
        Arc::clone(&store),
    ));
    let result = engine.run().await.context("course import failed")?;
    tracing::info!(
        "📊 Imported {} courses ({} rows skipped)",
        result.rows_processed,
        result.rows_skipped
    );

    let output = match args.id {
        Some(id) => serde_json::to_string_pretty(&courses.get_by_id(id)?)?,
        None => {
            let list_query = ListQuery::from_pairs(args.query_pairs())?;
            serde_json::to_string_pretty(&queries.list(&list_query)?)?
        }
    };
    println!("{}", output);

    Ok(())
}

use clap::Parser;
use course_etl::core::ConfigProvider;
use course_etl::utils::{logger, validation::Validate};
use course_etl::{
    CliConfig, CourseImporter, DatasetStore, EtlEngine, ImportScheduler, LocalStorage, TomlConfig,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    let exit_code = match &cli.config {
        Some(path) => {
            // 載入 TOML 配置
            let config = match TomlConfig::from_file(path) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("❌ Failed to load config file '{}': {}", path, e);
                    eprintln!("💡 Make sure the file exists and is valid TOML format");
                    std::process::exit(1);
                }
            };
            init_logger(cli.json_logs || config.json_logs(), cli.verbose || config.verbose());
            tracing::info!("📁 Loaded configuration from: {}", path);
            run(config, cli.once).await
        }
        None => {
            init_logger(cli.json_logs, cli.verbose);
            if cli.verbose {
                tracing::debug!("CLI config: {:?}", cli);
            }
            run(cli.clone(), cli.once).await
        }
    };

    if exit_code > 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}

fn init_logger(json: bool, verbose: bool) {
    if json {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }
}

async fn run<C>(config: C, once: bool) -> i32
where
    C: ConfigProvider + Validate + 'static,
{
    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        return 1;
    }

    tracing::info!("🚀 Starting course-etl for source {}", config.source_path());

    let interval = config.schedule_interval();
    let max_run_duration = config.max_run_duration();
    let run_on_start = config.run_on_start();

    let store = Arc::new(DatasetStore::new());
    let importer = CourseImporter::new(LocalStorage::new("."), config, Arc::clone(&store));
    let engine = EtlEngine::new(importer);

    if once {
        return match engine.run().await {
            Ok(result) => {
                println!("✅ Import completed successfully!");
                println!(
                    "📊 {} courses imported, {} rows skipped ({} countries, {} cities, {} universities) in {:?}",
                    result.rows_processed,
                    result.rows_skipped,
                    result.countries,
                    result.cities,
                    result.universities,
                    result.duration
                );
                0
            }
            Err(e) => {
                // 記錄詳細錯誤信息
                tracing::error!(
                    "❌ Import failed: {} (Category: {:?}, Severity: {:?})",
                    e,
                    e.category(),
                    e.severity()
                );
                tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
                eprintln!("❌ {}", e.user_friendly_message());
                eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
                e.exit_code()
            }
        };
    }

    let scheduler = Arc::new(
        ImportScheduler::new(engine, interval, max_run_duration).with_run_on_start(run_on_start),
    );
    let task = Arc::clone(&scheduler).start();

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("❌ Failed to listen for shutdown signal: {}", e);
    }
    task.abort();

    let stats = scheduler.stats();
    tracing::info!(
        "🛑 Scheduler stopped: {} completed, {} failed, {} timed out, {} dropped triggers",
        stats.completed,
        stats.failed,
        stats.timed_out,
        stats.dropped
    );
    0
}

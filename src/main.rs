use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, bail};
use tokio::runtime::Handle;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use slidecache::application::{BatchReport, ResolveBatchUseCase};
use slidecache::domain::ImageLocator;
use slidecache::infrastructure::{
    AppConfig, CliArgs, Command, DiskImageCache, HttpFetcher, ImageResolver, StorageManager,
};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let storage = StorageManager::new()?;
    let mut config = storage.load_config(args.config.as_deref())?;
    config.merge_with_args(args);
    Ok(config)
}

async fn create_resolver(config: &AppConfig) -> Result<Arc<ImageResolver>> {
    let disk_cache = Arc::new(DiskImageCache::new(config.effective_cache_dir()).await?);
    let fetcher = Arc::new(HttpFetcher::new(&config.fetcher_config())?);

    Ok(Arc::new(ImageResolver::new(
        config.resolver_config(),
        disk_cache,
        fetcher,
        Handle::current(),
    )))
}

async fn run(command: Command, resolver: Arc<ImageResolver>) -> Result<()> {
    match command {
        Command::Resolve { locators, json } => {
            let locators = locators
                .iter()
                .map(|raw| ImageLocator::parse(raw))
                .collect::<Result<Vec<_>, _>>()?;

            let outcomes = ResolveBatchUseCase::new(resolver).execute(&locators).await;
            let report = BatchReport::from_outcomes(&outcomes);

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for line in &report.outcomes {
                    println!("{line}");
                }
            }

            if !report.all_succeeded() {
                bail!("{} of {} images failed", report.failed, outcomes.len());
            }
        }
        Command::Path { locator } => {
            let locator = ImageLocator::parse(&locator)?;
            let cached = if resolver.is_cached(&locator).await {
                "cached"
            } else {
                "absent"
            };
            println!("{}\t{cached}", resolver.cache_path(&locator).display());
        }
        Command::Evict { locator } => {
            let locator = ImageLocator::parse(&locator)?;
            if resolver.evict(&locator).await {
                println!("evicted {locator}");
            } else {
                println!("not cached: {locator}");
            }
        }
        Command::Clear => {
            let removed = resolver.clear().await?;
            println!("removed {removed} entries");
        }
        Command::Stats => {
            println!("{}", resolver.usage().await?);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    let config = load_config(&args)?;

    init_logging(&config)?;

    info!(
        version = slidecache::VERSION,
        cache_dir = %config.effective_cache_dir().display(),
        "Starting slidecache"
    );

    let resolver = create_resolver(&config).await?;

    run(args.command, resolver).await
}

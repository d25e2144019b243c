use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;
use foodscrape::config::{self, FoodscrapeConfig};
use foodscrape::storage::{SqliteStore, StoreOptions};
use foodscrape::ui::{self, Icons, ProgressManager, ProgressMessage};
use foodscrape::Pipeline;
use owo_colors::OwoColorize;

pub fn run_init(config_path: &Path, database: PathBuf, force: bool) -> anyhow::Result<()> {
    ui::header("Initializing foodscrape");

    let config = FoodscrapeConfig::with_defaults(&database);
    config::write_config(config_path, &config, force)?;
    config::ensure_db_dir(&database)?;
    SqliteStore::open_with(&database, store_options(&config))?;

    ui::info("Config", &config_path.display().to_string());
    println!(
        "{} {}",
        Icons::DATABASE.style(ui::theme().info.clone()),
        database.display()
    );
    ui::success("Schema ready");
    Ok(())
}

pub fn run_seed(config: &FoodscrapeConfig, database: PathBuf, postcodes: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::open(postcodes)?;
    let lines = BufReader::new(file).lines().collect::<std::io::Result<Vec<String>>>()?;

    config::ensure_db_dir(&database)?;
    let mut store = SqliteStore::open_with(&database, store_options(config))?;
    let inserted = store.seed_customers(&lines)?;

    tracing::info!("Seeded {} of {} postcodes", inserted, lines.len());
    ui::success(&format!("Seeded {} new customers ({} lines read)", inserted, lines.len()));
    Ok(())
}

pub fn run_ingest(
    config: &FoodscrapeConfig,
    database: PathBuf,
    input: &Path,
    workers: Option<usize>,
) -> anyhow::Result<()> {
    let lines = read_input(input)?;
    let workers = config.worker_count(workers);

    ui::header(&format!("Ingesting {} lines", lines.len()));
    ui::info("Database", &database.display().to_string());
    ui::info("Workers", &workers.to_string());

    config::ensure_db_dir(&database)?;
    let pipeline = Pipeline::new(&database)
        .with_workers(workers)
        .with_options(store_options(config));

    let start = Instant::now();
    let (progress, tx) = ProgressManager::new(lines.len());
    let result = pipeline.run(lines, Some(tx.clone()));
    tx.send(ProgressMessage::Exit).ok();
    drop(tx);
    let report = result?;
    progress.finish_with_summary(start.elapsed(), &report);

    ui::section("Summary");
    ui::summary_row("Discovery records", &format!("{} ({} links)", report.discovery_records, report.links));
    ui::summary_row(
        "Menu records",
        &format!("{} ({} categories, {} items)", report.menu_records, report.categories, report.items),
    );
    ui::summary_row("Tag links", &report.tag_links.to_string());
    ui::timing(&format!("{:.2?}", start.elapsed()));

    if !report.failures.is_empty() {
        ui::section("Dropped records");
        for failure in &report.failures {
            ui::error(&format!("line {}: {}", failure.line, failure.message));
        }
        ui::warn(&format!("{} records dropped", report.failures.len()));
    }
    Ok(())
}

pub fn run_stats(database: &Path) -> anyhow::Result<()> {
    if !database.exists() {
        anyhow::bail!("no database at {} (run `foodscrape init` first)", database.display());
    }
    let store = SqliteStore::open(database)?;
    let stats = store.stats()?;

    println!(
        "{} {}",
        Icons::STATS,
        format!("foodscrape statistics ({})", database.display()).style(ui::theme().header.clone())
    );
    println!("{}", ui::stats_table(&stats.tables));
    Ok(())
}

fn store_options(config: &FoodscrapeConfig) -> StoreOptions {
    StoreOptions {
        busy_timeout: config.busy_timeout(),
        wal: true,
    }
}

fn read_input(input: &Path) -> anyhow::Result<Vec<String>> {
    let lines = if input.as_os_str() == "-" {
        std::io::stdin().lock().lines().collect::<std::io::Result<Vec<String>>>()?
    } else {
        let file = std::fs::File::open(input)?;
        BufReader::new(file).lines().collect::<std::io::Result<Vec<String>>>()?
    };
    Ok(lines)
}

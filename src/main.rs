use anyhow::Result;
use env_logger::Env;
use log::info;

use pool_stats_ingest::config::AppConfig;
use pool_stats_ingest::ingest::run_ingest;
use pool_stats_ingest::store::PlayerStore;

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    let mut store = PlayerStore::open_with_retry(
        &config.db_path,
        config.db_open_attempts,
        config.db_open_delay,
    )?;

    let summary = run_ingest(&mut store, &config)?;

    info!(
        "ingest complete: {}/{} seasons, {} records",
        summary.seasons_succeeded, summary.seasons_total, summary.records_inserted
    );
    for season in &summary.seasons {
        println!(
            "season {}: normalized={} inserted={} pooled={}",
            season.year, season.records_normalized, season.records_inserted, season.records_pooled
        );
        if !season.errors.is_empty() {
            println!("  errors: {}", season.errors.len());
            for err in season.errors.iter().take(6) {
                println!("   - {err}");
            }
        }
    }

    store.close()?;
    Ok(())
}

use anyhow::{Result, anyhow};
use chrono::{Datelike, Utc};
use log::{info, warn};
use rayon::prelude::*;

use crate::config::AppConfig;
use crate::http_client::http_client;
use crate::normalize::{SeasonNormalized, normalize_season};
use crate::provider::fetch_season_payload;
use crate::store::PlayerStore;

#[derive(Debug, Clone)]
pub struct SeasonSummary {
    pub year: i32,
    pub fetched: bool,
    pub records_normalized: usize,
    pub records_inserted: usize,
    pub records_pooled: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct IngestSummary {
    pub seasons: Vec<SeasonSummary>,
    pub seasons_total: usize,
    pub seasons_succeeded: usize,
    pub records_inserted: usize,
}

/// Ingests every season in the configured table, each exactly once, in
/// ascending order. Seasons are fetched and normalized as parallel tasks;
/// the results are then written sequentially through the single store
/// connection. A failed season is captured in the summary and never aborts
/// its siblings.
pub fn run_ingest(store: &mut PlayerStore, config: &AppConfig) -> Result<IngestSummary> {
    let client = http_client(config.provider.timeout)?;
    let years = config.seasons.seasons().collect::<Vec<_>>();
    info!("ingesting {} seasons starting {}", years.len(), config.seasons.starting_year);

    let fetched: Vec<(i32, Result<SeasonNormalized>)> = years
        .par_iter()
        .map(|year| (*year, fetch_and_normalize(client, config, *year)))
        .collect();

    Ok(write_seasons(store, fetched, Utc::now().year()))
}

fn fetch_and_normalize(
    client: &reqwest::blocking::Client,
    config: &AppConfig,
    year: i32,
) -> Result<SeasonNormalized> {
    let path = config
        .seasons
        .path_for(year)
        .ok_or_else(|| anyhow!("season {year} has no provider endpoint"))?;
    let payload = fetch_season_payload(client, &config.provider, &path)?;
    normalize_season(&payload, year)
}

/// Write phase, split out so it can run against prepared season data.
/// `current_year` is evaluated at write time and decides pooling duplication.
pub fn write_seasons(
    store: &mut PlayerStore,
    seasons: Vec<(i32, Result<SeasonNormalized>)>,
    current_year: i32,
) -> IngestSummary {
    let mut summary = IngestSummary {
        seasons_total: seasons.len(),
        ..Default::default()
    };

    for (year, outcome) in seasons {
        let season = match outcome {
            Ok(normalized) => {
                let mut errors = normalized.errors;
                let (inserted, pooled) =
                    match store.insert_season(year, &normalized.records, current_year) {
                        Ok(write) => {
                            errors.extend(write.errors);
                            (write.inserted, write.pooled)
                        }
                        Err(err) => {
                            errors.push(format!("season {year} write failed: {err:#}"));
                            (0, 0)
                        }
                    };
                info!(
                    "season {year}: normalized {} inserted {inserted} pooled {pooled} errors {}",
                    normalized.records.len(),
                    errors.len()
                );
                summary.seasons_succeeded += usize::from(inserted > 0 || errors.is_empty());
                summary.records_inserted += inserted;
                SeasonSummary {
                    year,
                    fetched: true,
                    records_normalized: normalized.records.len(),
                    records_inserted: inserted,
                    records_pooled: pooled,
                    errors,
                }
            }
            Err(err) => {
                warn!("season {year}: ingest failed: {err:#}");
                SeasonSummary {
                    year,
                    fetched: false,
                    records_normalized: 0,
                    records_inserted: 0,
                    records_pooled: 0,
                    errors: vec![format!("season {year}: {err:#}")],
                }
            }
        };
        summary.seasons.push(season);
    }
    summary
}

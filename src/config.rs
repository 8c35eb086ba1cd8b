use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_COLLECTION_PREFIX: &str = "AllStats";
pub const POOLING_COLLECTION: &str = "AllStatsPooling";

const DEFAULT_STARTING_YEAR: i32 = 2014;
const DEFAULT_SEASON_COUNT: u32 = 4;
const DEFAULT_LEADER_LIMIT: usize = 20;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_FETCH_ATTEMPTS: usize = 3;
const DEFAULT_FETCH_RETRY_SECS: u64 = 2;
const DEFAULT_DB_OPEN_ATTEMPTS: usize = 10;
const DEFAULT_DB_OPEN_DELAY_SECS: u64 = 3;

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
    pub fetch_attempts: usize,
    pub fetch_retry_delay: Duration,
}

impl ProviderConfig {
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

/// The fixed contiguous range of seasons the provider is known to serve,
/// keyed by the season's ending year ("2016-2017" -> 2017).
#[derive(Debug, Clone, Copy)]
pub struct SeasonTable {
    pub starting_year: i32,
    pub count: u32,
}

impl SeasonTable {
    pub fn seasons(self) -> impl Iterator<Item = i32> {
        (0..self.count as i32).map(move |offset| self.starting_year + offset)
    }

    pub fn supports(&self, year: i32) -> bool {
        year >= self.starting_year && year < self.starting_year + self.count as i32
    }

    /// Provider endpoint path for a supported season, `None` otherwise.
    pub fn path_for(&self, year: i32) -> Option<String> {
        if !self.supports(year) {
            return None;
        }
        Some(format!(
            "/api/v1.0/pull/nhl/{}-{}-regular/cumulative_player_stats.json",
            year - 1,
            year
        ))
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub seasons: SeasonTable,
    pub db_path: PathBuf,
    pub leader_limit: usize,
    pub db_open_attempts: usize,
    pub db_open_delay: Duration,
}

impl AppConfig {
    /// Reads configuration from the environment (a `.env` file is honored by
    /// the binaries). Credentials are required; everything else has defaults.
    pub fn from_env() -> Result<Self> {
        let username =
            env::var("STATS_API_USER").context("STATS_API_USER must be set (provider login)")?;
        let password = env::var("STATS_API_PASSWORD")
            .context("STATS_API_PASSWORD must be set (provider password)")?;

        let provider = ProviderConfig {
            scheme: env_string("STATS_API_SCHEME", "https"),
            host: env_string("STATS_API_HOST", "api.mysportsfeeds.com"),
            port: env_parsed("STATS_API_PORT", 443u16),
            username,
            password,
            timeout: Duration::from_secs(env_parsed(
                "STATS_HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )),
            fetch_attempts: env_parsed("STATS_FETCH_ATTEMPTS", DEFAULT_FETCH_ATTEMPTS).max(1),
            fetch_retry_delay: Duration::from_secs(env_parsed(
                "STATS_FETCH_RETRY_SECS",
                DEFAULT_FETCH_RETRY_SECS,
            )),
        };

        let seasons = SeasonTable {
            starting_year: env_parsed("SEASONS_STARTING_YEAR", DEFAULT_STARTING_YEAR),
            count: env_parsed("SEASONS_COUNT", DEFAULT_SEASON_COUNT).max(1),
        };

        let db_path = env::var("POOL_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("pool_stats.sqlite"));

        Ok(Self {
            provider,
            seasons,
            db_path,
            leader_limit: env_parsed("PLAYER_RESULT_LIMIT", DEFAULT_LEADER_LIMIT).max(1),
            db_open_attempts: env_parsed("DB_OPEN_ATTEMPTS", DEFAULT_DB_OPEN_ATTEMPTS).max(1),
            db_open_delay: Duration::from_secs(env_parsed(
                "DB_OPEN_DELAY_SECS",
                DEFAULT_DB_OPEN_DELAY_SECS,
            )),
        })
    }
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|val| val.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::SeasonTable;

    #[test]
    fn season_range_is_contiguous_and_ascending() {
        let table = SeasonTable {
            starting_year: 2014,
            count: 4,
        };
        let years = table.seasons().collect::<Vec<_>>();
        assert_eq!(years, vec![2014, 2015, 2016, 2017]);
    }

    #[test]
    fn unsupported_years_resolve_no_path() {
        let table = SeasonTable {
            starting_year: 2014,
            count: 4,
        };
        assert!(table.path_for(2013).is_none());
        assert!(table.path_for(2018).is_none());
        assert_eq!(
            table.path_for(2017).as_deref(),
            Some("/api/v1.0/pull/nhl/2016-2017-regular/cumulative_player_stats.json")
        );
    }
}

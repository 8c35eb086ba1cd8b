use anyhow::{Context, Result, anyhow};
use env_logger::Env;

use pool_stats_ingest::config::AppConfig;
use pool_stats_ingest::store::{LeaderScope, PlayerStore};

/// Prints the top players by a named stat, e.g.:
///   leaders points
///   leaders goals --year 2016 --limit 5
fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let stat = args
        .first()
        .filter(|arg| !arg.starts_with("--"))
        .cloned()
        .ok_or_else(|| anyhow!("usage: leaders <stat> [--year YYYY] [--limit N]"))?;
    let year = flag_value(&args, "--year")
        .map(|raw| raw.parse::<i32>().context("--year must be an integer"))
        .transpose()?;
    let limit = flag_value(&args, "--limit")
        .map(|raw| raw.parse::<usize>().context("--limit must be an integer"))
        .transpose()?
        .unwrap_or(config.leader_limit);

    let store = PlayerStore::open_with_retry(
        &config.db_path,
        config.db_open_attempts,
        config.db_open_delay,
    )?;

    let scope = match year {
        Some(year) => LeaderScope::Season(year),
        None => LeaderScope::Pooling,
    };
    let rows = store.leaders(scope, &stat, limit)?;
    if rows.is_empty() {
        println!("no records for stat '{stat}'");
        return Ok(());
    }
    for (rank, row) in rows.iter().enumerate() {
        println!(
            "{:>3}. {} {} ({}) gp={} {}={}",
            rank + 1,
            row.first_name,
            row.last_name,
            row.team_abbr,
            row.games_played,
            stat,
            row.value
        );
    }
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    let idx = args.iter().position(|arg| arg == flag)?;
    args.get(idx + 1).map(|s| s.as_str())
}

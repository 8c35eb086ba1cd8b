use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use log::warn;
use rusqlite::{Connection, params};

use crate::config::{DEFAULT_COLLECTION_PREFIX, POOLING_COLLECTION};
use crate::normalize::PlayerRecord;
use crate::retry::with_retry;

/// One collection (table) per season, named `<prefix><year>`, plus the shared
/// pooling collection holding only current-season records. The store owns a
/// single connection whose lifecycle belongs to the caller.
pub struct PlayerStore {
    conn: Connection,
    prefix: String,
}

#[derive(Debug, Clone, Default)]
pub struct SeasonWrite {
    pub inserted: usize,
    pub pooled: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub enum LeaderScope {
    Season(i32),
    Pooling,
}

#[derive(Debug, Clone)]
pub struct LeaderRow {
    pub player_id: String,
    pub first_name: String,
    pub last_name: String,
    pub team_abbr: String,
    pub games_played: i64,
    pub value: f64,
}

impl PlayerStore {
    /// Opens the database, retrying a bounded number of times with a fixed
    /// delay. Exhausting the attempts is a hard error; there is no
    /// half-connected state to limp along with.
    pub fn open_with_retry(path: &Path, attempts: usize, delay: Duration) -> Result<Self> {
        let conn = with_retry("open player db", attempts, delay, |_| {
            Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))
        })?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory().context("open in-memory db")?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        Ok(Self {
            conn,
            prefix: DEFAULT_COLLECTION_PREFIX.to_string(),
        })
    }

    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, err)| anyhow!("close player db: {err}"))
    }

    pub fn season_collection(&self, year: i32) -> String {
        format!("{}{}", self.prefix, year)
    }

    /// Writes one season's records in a single transaction. Records are
    /// append-only (re-running an ingest adds duplicates). A failed insert is
    /// logged with season and player id and skips only that record; a record
    /// whose year matches `current_year` also lands in the pooling collection.
    pub fn insert_season(
        &mut self,
        year: i32,
        records: &[PlayerRecord],
        current_year: i32,
    ) -> Result<SeasonWrite> {
        let table = self.season_collection(year);
        ensure_collection(&self.conn, &table)?;
        ensure_collection(&self.conn, POOLING_COLLECTION)?;

        let tx = self.conn.transaction().context("begin season write")?;
        let mut out = SeasonWrite::default();
        for record in records {
            match insert_record(&tx, &table, record) {
                Ok(()) => out.inserted += 1,
                Err(err) => {
                    warn!("season {year}: insert player {} failed: {err:#}", record.id);
                    out.errors
                        .push(format!("season {year} player {}: {err:#}", record.id));
                    continue;
                }
            }
            if record.year == current_year {
                match insert_record(&tx, POOLING_COLLECTION, record) {
                    Ok(()) => out.pooled += 1,
                    Err(err) => {
                        warn!("pooling: insert player {} failed: {err:#}", record.id);
                        out.errors
                            .push(format!("pooling player {}: {err:#}", record.id));
                    }
                }
            }
        }
        tx.commit().context("commit season write")?;
        Ok(out)
    }

    /// Top players by a named numeric stat, descending, capped at `limit`.
    /// Rows where the stat is absent are excluded rather than ranked last.
    pub fn leaders(&self, scope: LeaderScope, stat: &str, limit: usize) -> Result<Vec<LeaderRow>> {
        let column =
            stat_column(stat).ok_or_else(|| anyhow!("unknown stat field '{stat}'"))?;
        let table = match scope {
            LeaderScope::Season(year) => self.season_collection(year),
            LeaderScope::Pooling => POOLING_COLLECTION.to_string(),
        };

        let sql = format!(
            r#"SELECT player_id, first_name, last_name, team_abbr, games_played, "{column}"
               FROM "{table}"
               WHERE "{column}" IS NOT NULL
               ORDER BY "{column}" DESC
               LIMIT ?1"#
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .with_context(|| format!("prepare leaders query on {table}"))?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(LeaderRow {
                    player_id: row.get(0)?,
                    first_name: row.get(1)?,
                    last_name: row.get(2)?,
                    team_abbr: row.get(3)?,
                    games_played: row.get(4)?,
                    value: row.get(5)?,
                })
            })
            .context("query leaders")?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode leader row")?);
        }
        Ok(out)
    }
}

fn ensure_collection(conn: &Connection, table: &str) -> Result<()> {
    conn.execute_batch(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS "{table}" (
            player_id TEXT NOT NULL,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            jersey_number TEXT NULL,
            position TEXT NULL,
            height TEXT NULL,
            weight TEXT NULL,
            birth_date TEXT NULL,
            birth_city TEXT NULL,
            birth_country TEXT NULL,
            is_rookie INTEGER NOT NULL,
            team_id TEXT NOT NULL,
            team_city TEXT NOT NULL,
            team_name TEXT NOT NULL,
            team_abbr TEXT NOT NULL,
            year INTEGER NOT NULL,
            games_played INTEGER NOT NULL,
            goals INTEGER NOT NULL,
            assists INTEGER NOT NULL,
            points INTEGER NOT NULL,
            hat_tricks INTEGER NOT NULL,
            penalty_minutes INTEGER NOT NULL,
            powerplay_goals INTEGER NOT NULL,
            powerplay_assists INTEGER NOT NULL,
            powerplay_points INTEGER NOT NULL,
            shorthanded_goals INTEGER NOT NULL,
            shorthanded_assists INTEGER NOT NULL,
            shorthanded_points INTEGER NOT NULL,
            game_winning_goals INTEGER NOT NULL,
            game_tying_goals INTEGER NOT NULL,
            plus_minus INTEGER NULL,
            shots INTEGER NULL,
            shot_pct REAL NULL,
            hits INTEGER NULL,
            faceoffs INTEGER NULL,
            faceoff_wins INTEGER NULL,
            faceoff_losses INTEGER NULL,
            faceoff_pct REAL NULL,
            ingested_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS "idx_{table}_player" ON "{table}"(player_id);
        "#
    ))
    .with_context(|| format!("create collection {table}"))
}

fn insert_record(conn: &Connection, table: &str, r: &PlayerRecord) -> Result<()> {
    let sql = format!(
        r#"INSERT INTO "{table}" (
            player_id, first_name, last_name, jersey_number, position,
            height, weight, birth_date, birth_city, birth_country, is_rookie,
            team_id, team_city, team_name, team_abbr, year, games_played,
            goals, assists, points, hat_tricks, penalty_minutes,
            powerplay_goals, powerplay_assists, powerplay_points,
            shorthanded_goals, shorthanded_assists, shorthanded_points,
            game_winning_goals, game_tying_goals,
            plus_minus, shots, shot_pct, hits,
            faceoffs, faceoff_wins, faceoff_losses, faceoff_pct, ingested_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
            ?12, ?13, ?14, ?15, ?16, ?17,
            ?18, ?19, ?20, ?21, ?22,
            ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30,
            ?31, ?32, ?33, ?34, ?35, ?36, ?37, ?38, ?39
        )"#
    );
    let s = &r.stats.stats;
    conn.execute(
        &sql,
        params![
            r.id,
            r.player.first_name,
            r.player.last_name,
            r.player.jersey_number,
            r.player.position,
            r.player.height,
            r.player.weight,
            r.player.birth_date,
            r.player.birth_city,
            r.player.birth_country,
            r.player.is_rookie as i64,
            r.team.id,
            r.team.city,
            r.team.name,
            r.team.abbreviation,
            r.year,
            r.stats.games_played,
            s.goals,
            s.assists,
            s.points,
            s.hat_tricks,
            s.penalty_minutes,
            s.powerplay_goals,
            s.powerplay_assists,
            s.powerplay_points,
            s.shorthanded_goals,
            s.shorthanded_assists,
            s.shorthanded_points,
            s.game_winning_goals,
            s.game_tying_goals,
            s.plus_minus,
            s.shots,
            s.shot_pct,
            s.hits,
            s.faceoffs,
            s.faceoff_wins,
            s.faceoff_losses,
            s.faceoff_pct,
            Utc::now().to_rfc3339(),
        ],
    )
    .context("insert player record")?;
    Ok(())
}

/// Allow-list mapping public stat names to columns; leader queries never
/// interpolate caller input directly.
fn stat_column(stat: &str) -> Option<&'static str> {
    Some(match stat {
        "games_played" => "games_played",
        "goals" => "goals",
        "assists" => "assists",
        "points" => "points",
        "hat_tricks" => "hat_tricks",
        "penalty_minutes" => "penalty_minutes",
        "powerplay_goals" => "powerplay_goals",
        "powerplay_assists" => "powerplay_assists",
        "powerplay_points" => "powerplay_points",
        "shorthanded_goals" => "shorthanded_goals",
        "shorthanded_assists" => "shorthanded_assists",
        "shorthanded_points" => "shorthanded_points",
        "game_winning_goals" => "game_winning_goals",
        "game_tying_goals" => "game_tying_goals",
        "plus_minus" => "plus_minus",
        "shots" => "shots",
        "shot_pct" => "shot_pct",
        "hits" => "hits",
        "faceoffs" => "faceoffs",
        "faceoff_wins" => "faceoff_wins",
        "faceoff_losses" => "faceoff_losses",
        "faceoff_pct" => "faceoff_pct",
        _ => return None,
    })
}

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Named wrapper the provider puts around the season payload. The payload
/// must contain exactly this one top-level key; anything else is malformed.
const PAYLOAD_WRAPPER_KEY: &str = "cumulativeplayerstats";
const PLAYER_ENTRIES_KEY: &str = "playerstatsentry";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerRecord {
    pub id: String,
    pub player: PlayerInfo,
    pub team: TeamInfo,
    pub stats: SeasonStats,
    pub year: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerInfo {
    pub first_name: String,
    pub last_name: String,
    pub jersey_number: Option<String>,
    pub position: Option<String>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub birth_date: Option<String>,
    pub birth_city: Option<String>,
    pub birth_country: Option<String>,
    pub is_rookie: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamInfo {
    pub id: String,
    pub city: String,
    pub name: String,
    pub abbreviation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeasonStats {
    pub games_played: i64,
    pub stats: StatBlock,
}

/// Flat per-season counters. The provider omits the optional ones for some
/// players (goalies, call-ups), so those stay `None` rather than a sentinel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatBlock {
    pub goals: i64,
    pub assists: i64,
    pub points: i64,
    pub hat_tricks: i64,
    pub penalty_minutes: i64,
    pub powerplay_goals: i64,
    pub powerplay_assists: i64,
    pub powerplay_points: i64,
    pub shorthanded_goals: i64,
    pub shorthanded_assists: i64,
    pub shorthanded_points: i64,
    pub game_winning_goals: i64,
    pub game_tying_goals: i64,
    pub plus_minus: Option<i64>,
    pub shots: Option<i64>,
    pub shot_pct: Option<f64>,
    pub hits: Option<i64>,
    pub faceoffs: Option<i64>,
    pub faceoff_wins: Option<i64>,
    pub faceoff_losses: Option<i64>,
    pub faceoff_pct: Option<f64>,
}

/// Outcome of normalizing one season's payload. Records that fail to parse
/// are dropped from `records` and reported in `errors`; one bad record never
/// takes its siblings down.
#[derive(Debug, Clone, Default)]
pub struct SeasonNormalized {
    pub records: Vec<PlayerRecord>,
    pub errors: Vec<String>,
}

pub fn normalize_season(payload: &Value, year: i32) -> Result<SeasonNormalized> {
    let entries = unwrap_payload(payload)?;

    let mut out = SeasonNormalized::default();
    for (idx, entry) in entries.iter().enumerate() {
        match normalize_entry(entry, year) {
            Ok(record) => out.records.push(record),
            Err(err) => {
                let player_id = entry
                    .get("player")
                    .and_then(|p| p.get("ID"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("?");
                out.errors
                    .push(format!("entry {idx} (player {player_id}): {err:#}"));
            }
        }
    }
    Ok(out)
}

/// The wrapper is an explicit schema field: the payload must be an object
/// with exactly the `cumulativeplayerstats` key.
fn unwrap_payload(payload: &Value) -> Result<&[Value]> {
    let obj = payload
        .as_object()
        .ok_or_else(|| anyhow!("payload is not a json object"))?;
    if obj.len() != 1 || !obj.contains_key(PAYLOAD_WRAPPER_KEY) {
        return Err(anyhow!(
            "expected a single top-level '{PAYLOAD_WRAPPER_KEY}' key, found {:?}",
            obj.keys().collect::<Vec<_>>()
        ));
    }
    obj[PAYLOAD_WRAPPER_KEY]
        .get(PLAYER_ENTRIES_KEY)
        .and_then(|v| v.as_array())
        .map(|v| v.as_slice())
        .ok_or_else(|| anyhow!("missing '{PLAYER_ENTRIES_KEY}' array"))
}

fn normalize_entry(entry: &Value, year: i32) -> Result<PlayerRecord> {
    let player = entry
        .get("player")
        .ok_or_else(|| anyhow!("missing player block"))?;
    let team = entry.get("team").ok_or_else(|| anyhow!("missing team block"))?;
    let stats = entry
        .get("stats")
        .ok_or_else(|| anyhow!("missing stats block"))?;

    Ok(PlayerRecord {
        id: req_str(player, "ID")?,
        player: PlayerInfo {
            first_name: req_str(player, "FirstName")?,
            last_name: req_str(player, "LastName")?,
            jersey_number: opt_str(player, "JerseyNumber"),
            position: opt_str(player, "Position"),
            height: opt_str(player, "Height"),
            weight: opt_str(player, "Weight"),
            birth_date: opt_str(player, "BirthDate"),
            birth_city: opt_str(player, "BirthCity"),
            birth_country: opt_str(player, "BirthCountry"),
            is_rookie: is_rookie(player.get("IsRookie")),
        },
        team: TeamInfo {
            id: req_str(team, "ID")?,
            city: req_str(team, "City")?,
            name: req_str(team, "Name")?,
            abbreviation: req_str(team, "Abbreviation")?,
        },
        stats: SeasonStats {
            games_played: req_i64(stats, "GamesPlayed")?,
            stats: StatBlock {
                goals: req_i64(stats, "Goals")?,
                assists: req_i64(stats, "Assists")?,
                points: req_i64(stats, "Points")?,
                hat_tricks: req_i64(stats, "HatTricks")?,
                penalty_minutes: req_i64(stats, "PenaltyMinutes")?,
                powerplay_goals: req_i64(stats, "PowerplayGoals")?,
                powerplay_assists: req_i64(stats, "PowerplayAssists")?,
                powerplay_points: req_i64(stats, "PowerplayPoints")?,
                shorthanded_goals: req_i64(stats, "ShorthandedGoals")?,
                shorthanded_assists: req_i64(stats, "ShorthandedAssists")?,
                shorthanded_points: req_i64(stats, "ShorthandedPoints")?,
                game_winning_goals: req_i64(stats, "GameWinningGoals")?,
                game_tying_goals: req_i64(stats, "GameTyingGoals")?,
                plus_minus: opt_i64(stats, "PlusMinus")?,
                shots: opt_i64(stats, "Shots")?,
                shot_pct: opt_f64(stats, "ShotPercentage")?,
                hits: opt_i64(stats, "Hits")?,
                faceoffs: opt_i64(stats, "Faceoffs")?,
                faceoff_wins: opt_i64(stats, "FaceoffWins")?,
                faceoff_losses: opt_i64(stats, "FaceoffLosses")?,
                faceoff_pct: opt_f64(stats, "FaceoffPercent")?,
            },
        },
        year,
    })
}

/// `"true"` exactly; `"True"`, `"false"`, `""` and absent are all false.
fn is_rookie(value: Option<&Value>) -> bool {
    value.and_then(|v| v.as_str()) == Some("true")
}

/// Values arrive wrapped as `{"#text": "<value>", ...}`.
fn text_of<'a>(block: &'a Value, key: &str) -> Option<&'a str> {
    block.get(key)?.get("#text")?.as_str()
}

fn req_str(block: &Value, key: &str) -> Result<String> {
    block
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow!("missing required field '{key}'"))
}

fn opt_str(block: &Value, key: &str) -> Option<String> {
    block
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn req_i64(block: &Value, key: &str) -> Result<i64> {
    let raw = text_of(block, key).ok_or_else(|| anyhow!("missing required stat '{key}'"))?;
    raw.trim()
        .parse::<i64>()
        .with_context(|| format!("stat '{key}' is not an integer: {raw:?}"))
}

fn opt_i64(block: &Value, key: &str) -> Result<Option<i64>> {
    let Some(raw) = text_of(block, key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<i64>()
        .map(Some)
        .with_context(|| format!("stat '{key}' is not an integer: {raw:?}"))
}

fn opt_f64(block: &Value, key: &str) -> Result<Option<f64>> {
    let Some(raw) = text_of(block, key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<f64>()
        .map(Some)
        .with_context(|| format!("stat '{key}' is not a number: {raw:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rookie_flag_requires_exact_lowercase_true() {
        assert!(is_rookie(Some(&json!("true"))));
        assert!(!is_rookie(Some(&json!("True"))));
        assert!(!is_rookie(Some(&json!("false"))));
        assert!(!is_rookie(Some(&json!(""))));
        assert!(!is_rookie(None));
    }

    #[test]
    fn text_wrapped_values_parse() {
        let block = json!({ "Goals": { "@abbreviation": "G", "#text": "31" } });
        assert_eq!(req_i64(&block, "Goals").unwrap(), 31);
    }

    #[test]
    fn absent_optional_stat_is_none() {
        let block = json!({});
        assert_eq!(opt_i64(&block, "Hits").unwrap(), None);
        assert_eq!(opt_f64(&block, "ShotPercentage").unwrap(), None);
    }

    #[test]
    fn present_but_malformed_stat_is_an_error() {
        let block = json!({ "Shots": { "#text": "lots" } });
        assert!(opt_i64(&block, "Shots").is_err());
        assert!(req_i64(&block, "Shots").is_err());
    }

    #[test]
    fn payload_with_extra_top_level_keys_is_rejected() {
        let payload = json!({
            "cumulativeplayerstats": { "playerstatsentry": [] },
            "lastUpdatedOn": "2017-04-10"
        });
        assert!(normalize_season(&payload, 2017).is_err());
    }

    #[test]
    fn payload_without_wrapper_is_rejected() {
        assert!(normalize_season(&json!({}), 2017).is_err());
        assert!(normalize_season(&json!([]), 2017).is_err());
    }
}

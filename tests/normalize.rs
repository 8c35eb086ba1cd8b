use std::fs;
use std::path::PathBuf;

use serde_json::{Value, json};

use pool_stats_ingest::normalize::normalize_season;

fn read_fixture(name: &str) -> Value {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    let raw = fs::read_to_string(path).expect("fixture file should be readable");
    serde_json::from_str(&raw).expect("fixture should be valid json")
}

/// One complete provider entry, for mutation in the omission tests below.
fn full_entry() -> Value {
    let payload = read_fixture("cumulative_player_stats.json");
    payload["cumulativeplayerstats"]["playerstatsentry"][0].clone()
}

fn payload_of(entries: Vec<Value>) -> Value {
    json!({ "cumulativeplayerstats": { "playerstatsentry": entries } })
}

#[test]
fn fully_populated_entry_has_no_missing_stats() {
    let payload = read_fixture("cumulative_player_stats.json");
    let season = normalize_season(&payload, 2017).expect("fixture should normalize");
    assert_eq!(season.records.len(), 3);
    assert!(season.errors.is_empty());

    let rec = &season.records[0];
    assert_eq!(rec.id, "4419");
    assert_eq!(rec.year, 2017);
    assert_eq!(rec.player.last_name, "Abdelkader");
    assert_eq!(rec.team.abbreviation, "DET");
    assert_eq!(rec.stats.games_played, 82);

    let s = &rec.stats.stats;
    assert_eq!(s.goals, 19);
    assert_eq!(s.points, 42);
    assert_eq!(s.plus_minus, Some(11));
    assert_eq!(s.shots, Some(148));
    assert_eq!(s.shot_pct, Some(12.8));
    assert_eq!(s.hits, Some(213));
    assert_eq!(s.faceoffs, Some(47));
    assert_eq!(s.faceoff_wins, Some(22));
    assert_eq!(s.faceoff_losses, Some(25));
    assert_eq!(s.faceoff_pct, Some(46.8));
}

#[test]
fn sparse_entry_keeps_present_stats_and_omits_the_rest() {
    let payload = read_fixture("cumulative_player_stats.json");
    let season = normalize_season(&payload, 2017).unwrap();

    // Aho: no shot/hit/faceoff columns in the fixture.
    let rec = &season.records[1];
    let s = &rec.stats.stats;
    assert_eq!(s.plus_minus, Some(-3));
    assert_eq!(s.shots, Some(200));
    assert_eq!(s.shot_pct, None);
    assert_eq!(s.hits, None);
    assert_eq!(s.faceoffs, None);
    assert_eq!(s.faceoff_wins, None);
    assert_eq!(s.faceoff_losses, None);
    assert_eq!(s.faceoff_pct, None);
}

#[test]
fn each_optional_field_omitted_individually_maps_to_none() {
    let optional_keys = [
        "PlusMinus",
        "Shots",
        "ShotPercentage",
        "Hits",
        "Faceoffs",
        "FaceoffWins",
        "FaceoffLosses",
        "FaceoffPercent",
    ];

    for key in optional_keys {
        let mut entry = full_entry();
        entry["stats"]
            .as_object_mut()
            .unwrap()
            .remove(key)
            .expect("optional key should exist in full entry");

        let season = normalize_season(&payload_of(vec![entry]), 2017).unwrap();
        assert!(season.errors.is_empty(), "omitting {key} should not error");
        let s = &season.records[0].stats.stats;

        let missing = [
            ("PlusMinus", s.plus_minus.is_none()),
            ("Shots", s.shots.is_none()),
            ("ShotPercentage", s.shot_pct.is_none()),
            ("Hits", s.hits.is_none()),
            ("Faceoffs", s.faceoffs.is_none()),
            ("FaceoffWins", s.faceoff_wins.is_none()),
            ("FaceoffLosses", s.faceoff_losses.is_none()),
            ("FaceoffPercent", s.faceoff_pct.is_none()),
        ];
        for (name, is_none) in missing {
            assert_eq!(
                is_none,
                name == key,
                "only {key} should be missing, got wrong state for {name}"
            );
        }
    }
}

#[test]
fn rookie_flag_is_case_sensitive() {
    for (raw, expected) in [("true", true), ("True", false), ("false", false), ("", false)] {
        let mut entry = full_entry();
        entry["player"]["IsRookie"] = json!(raw);
        let season = normalize_season(&payload_of(vec![entry]), 2017).unwrap();
        assert_eq!(season.records[0].player.is_rookie, expected, "raw {raw:?}");
    }

    let mut entry = full_entry();
    entry["player"].as_object_mut().unwrap().remove("IsRookie");
    let season = normalize_season(&payload_of(vec![entry]), 2017).unwrap();
    assert!(!season.records[0].player.is_rookie);
}

#[test]
fn bad_required_stat_fails_only_that_record() {
    let mut payload = read_fixture("cumulative_player_stats.json");
    payload["cumulativeplayerstats"]["playerstatsentry"][1]["stats"]["Goals"]["#text"] =
        json!("N/A");

    let season = normalize_season(&payload, 2017).unwrap();
    assert_eq!(season.records.len(), 2);
    assert_eq!(season.errors.len(), 1);
    assert!(season.errors[0].contains("5571"), "error should name the player");
    assert!(
        season.records.iter().all(|r| r.id != "5571"),
        "bad record should be dropped"
    );
}

#[test]
fn missing_required_stat_fails_only_that_record() {
    let mut payload = read_fixture("cumulative_player_stats.json");
    payload["cumulativeplayerstats"]["playerstatsentry"][0]["stats"]
        .as_object_mut()
        .unwrap()
        .remove("Assists");

    let season = normalize_season(&payload, 2017).unwrap();
    assert_eq!(season.records.len(), 2);
    assert_eq!(season.errors.len(), 1);
}

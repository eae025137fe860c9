//! Merges the three upstream payloads for one game (scoreboard snapshot,
//! game summary, play-by-play feed) into a single canonical [`GameState`].
//!
//! Precedence: the summary is the baseline; the scoreboard's situation block
//! replaces the summary's wholesale (never field-by-field) and its clock is
//! authoritative; the play-by-play feed only fills in a missing last play.
//! The upstream JSON is loosely shaped, so everything is pulled out of
//! `serde_json::Value` with per-field defaults.

use serde_json::Value;
use thiserror::Error;

use super::models::{
    GameClock, GameState, LastPlay, PossessionSide, Situation, TeamScore,
};

/// Shape errors are fatal for the poll cycle that hit them; the caller keeps
/// the previous canonical state and retries on the next tick.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("game summary is missing its header/competition block")]
    MissingHeader,
    #[error("game summary has no home/away competitor records")]
    MissingCompetitors,
}

/// Build the canonical state for `game_id` from the three payloads.
pub fn normalize_game(
    summary: &Value,
    scoreboard: &Value,
    plays: &Value,
    game_id: &str,
) -> Result<GameState, NormalizeError> {
    let mut state = parse_summary(summary, game_id)?;

    if let Some(event) = find_scoreboard_event(scoreboard, game_id) {
        let competition = &event["competitions"][0];

        // The scoreboard is the authority for the live clock; the summary's
        // can lag by a fetch cycle.
        let status = if competition["status"].is_object() {
            &competition["status"]
        } else {
            &event["status"]
        };
        if status.is_object() {
            if let Some(period) = value_u32(&status["period"]) {
                state.status.period = period;
            }
            if let Some(clock) = status["displayClock"].as_str() {
                state.status.clock = clock.to_string();
            }
        }

        // Wholesale replacement: the two sources' situation blocks are never
        // interleaved field-by-field.
        let situation = &competition["situation"];
        if situation.is_object() {
            state.situation = parse_situation(situation);
            if let Some(last_play) = parse_last_play(&situation["lastPlay"]) {
                state.last_play = Some(last_play);
            }
        }
    }

    // Possession is recomputed against this game's team IDs, never carried
    // over as a copied record.
    state.possession = resolve_possession(&state);

    let last_play_empty = state
        .last_play
        .as_ref()
        .map(|lp| lp.text.trim().is_empty())
        .unwrap_or(true);
    if last_play_empty {
        if let Some(last_play) = synthesize_last_play(plays) {
            state.last_play = Some(last_play);
        }
    }

    Ok(state)
}

// ── Summary baseline ─────────────────────────────────────────────────────────

fn parse_summary(summary: &Value, game_id: &str) -> Result<GameState, NormalizeError> {
    let competition = &summary["header"]["competitions"][0];
    if !competition.is_object() {
        return Err(NormalizeError::MissingHeader);
    }

    let competitors = competition["competitors"].as_array();
    let home = competitors
        .and_then(|c| c.iter().find(|v| v["homeAway"] == "home"))
        .map(parse_team)
        .ok_or(NormalizeError::MissingCompetitors)?;
    let away = competitors
        .and_then(|c| c.iter().find(|v| v["homeAway"] == "away"))
        .map(parse_team)
        .ok_or(NormalizeError::MissingCompetitors)?;

    let status = &competition["status"];
    let clock = GameClock {
        period: value_u32(&status["period"]).unwrap_or(1),
        clock: status["displayClock"].as_str().unwrap_or("0:00").to_string(),
        completed: status["type"]["completed"].as_bool().unwrap_or(false),
    };

    let situation = if competition["situation"].is_object() {
        parse_situation(&competition["situation"])
    } else {
        Situation::default()
    };
    let last_play = parse_last_play(&competition["situation"]["lastPlay"]);

    let game_id = value_string(&summary["header"]["id"]).unwrap_or_else(|| game_id.to_string());

    Ok(GameState {
        game_id,
        status: clock,
        situation,
        home_team: home,
        away_team: away,
        possession: None,
        last_play,
    })
}

fn parse_team(competitor: &Value) -> TeamScore {
    let team = &competitor["team"];
    TeamScore {
        id: value_string(&team["id"])
            .or_else(|| value_string(&competitor["id"]))
            .unwrap_or_default(),
        display_name: team["displayName"].as_str().unwrap_or("Unknown").to_string(),
        abbreviation: team["abbreviation"].as_str().unwrap_or("").to_string(),
        logo_url: team["logos"][0]["href"]
            .as_str()
            .or_else(|| team["logo"].as_str())
            .unwrap_or("")
            .to_string(),
        score: value_u32(&competitor["score"]).unwrap_or(0),
    }
}

// ── Scoreboard situation ─────────────────────────────────────────────────────

fn find_scoreboard_event<'a>(scoreboard: &'a Value, game_id: &str) -> Option<&'a Value> {
    scoreboard["events"]
        .as_array()?
        .iter()
        .find(|ev| value_string(&ev["id"]).as_deref() == Some(game_id))
}

fn parse_situation(v: &Value) -> Situation {
    Situation {
        down: value_u32(&v["down"]).unwrap_or(0) as u8,
        distance: value_u32(&v["distance"]).unwrap_or(0),
        yard_line: value_u32(&v["yardLine"]).unwrap_or(0),
        yards_to_endzone: value_u32(&v["yardsToEndzone"]).unwrap_or(0),
        possession_team_id: value_string(&v["possession"]),
        possession_text: v["possessionText"].as_str().unwrap_or("").to_string(),
        is_red_zone: v["isRedZone"].as_bool().unwrap_or(false),
        home_timeouts: value_u32(&v["homeTimeouts"]).unwrap_or(3) as u8,
        away_timeouts: value_u32(&v["awayTimeouts"]).unwrap_or(3) as u8,
    }
}

fn parse_last_play(v: &Value) -> Option<LastPlay> {
    if !v.is_object() {
        return None;
    }
    Some(LastPlay {
        text: v["text"].as_str().unwrap_or("").to_string(),
        short_text: v["shortText"]
            .as_str()
            .or_else(|| v["type"]["text"].as_str())
            .unwrap_or("")
            .to_string(),
        epa: v["epa"].as_f64().unwrap_or(0.0),
        team_id: value_string(&v["team"]["id"]),
        end_yard_line: v["end"]["yardLine"].as_i64().unwrap_or(0),
    })
}

fn resolve_possession(state: &GameState) -> Option<PossessionSide> {
    let id = state.situation.possession_team_id.as_deref()?;
    if id == state.home_team.id {
        Some(PossessionSide::Home)
    } else if id == state.away_team.id {
        Some(PossessionSide::Away)
    } else {
        None
    }
}

// ── Play-by-play fallback ────────────────────────────────────────────────────

/// Synthesize a last play from the most recent play-by-play entry. The feed
/// arrives pre-sorted most-recent-first and carries no EPA or attribution;
/// the end yard line is reconstructed from the snap spot and yardage gained.
fn synthesize_last_play(plays: &Value) -> Option<LastPlay> {
    let list = plays["plays"].as_array().or_else(|| plays.as_array())?;
    let play = list.first()?;
    let text = play["text"].as_str()?.to_string();
    let start = play["start"]["yardLine"].as_i64().unwrap_or(0);
    let gained = play["statYardage"].as_i64().unwrap_or(0);
    Some(LastPlay {
        text,
        short_text: play["type"]["text"].as_str().unwrap_or("").to_string(),
        epa: 0.0,
        team_id: None,
        end_yard_line: start + gained,
    })
}

// ── Value helpers ────────────────────────────────────────────────────────────

// Upstream IDs and scores arrive as either strings or numbers depending on
// the endpoint.
fn value_string(v: &Value) -> Option<String> {
    v.as_str()
        .map(|s| s.to_string())
        .or_else(|| v.as_i64().map(|n| n.to_string()))
}

fn value_u32(v: &Value) -> Option<u32> {
    v.as_u64()
        .map(|n| n as u32)
        .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn summary_fixture() -> Value {
        json!({
            "header": {
                "id": "401547321",
                "competitions": [{
                    "competitors": [
                        {"homeAway": "home", "score": "14",
                         "team": {"id": "12", "displayName": "Kansas City Chiefs",
                                  "abbreviation": "KC",
                                  "logos": [{"href": "https://a.example/kc.png"}]}},
                        {"homeAway": "away", "score": "10",
                         "team": {"id": "2", "displayName": "Buffalo Bills",
                                  "abbreviation": "BUF",
                                  "logos": [{"href": "https://a.example/buf.png"}]}}
                    ],
                    "status": {"period": 2, "displayClock": "05:30",
                               "type": {"completed": false}},
                    "situation": {
                        "down": 2, "distance": 5, "yardLine": 40,
                        "yardsToEndzone": 60, "possession": "2",
                        "possessionText": "BUF 2nd & 5", "isRedZone": false,
                        "homeTimeouts": 2, "awayTimeouts": 3,
                        "lastPlay": {"text": "Allen pass complete for 6 yards",
                                     "shortText": "Allen pass",
                                     "team": {"id": "2"},
                                     "end": {"yardLine": 46}}
                    }
                }]
            }
        })
    }

    fn scoreboard_fixture() -> Value {
        json!({
            "events": [{
                "id": "401547321",
                "status": {"period": 3, "displayClock": "11:02"},
                "competitions": [{
                    "status": {"period": 3, "displayClock": "11:02"},
                    "situation": {
                        "down": 3, "distance": 7, "yardLine": 25,
                        "yardsToEndzone": 75, "possession": "12",
                        "possessionText": "KC 3rd & 7", "isRedZone": false,
                        "homeTimeouts": 3, "awayTimeouts": 2,
                        "lastPlay": {"text": "Mahomes sacked for -8 yards",
                                     "team": {"id": "12"},
                                     "end": {"yardLine": 25}}
                    }
                }]
            }]
        })
    }

    fn plays_fixture() -> Value {
        json!({
            "plays": [
                {"text": "Pacheco rush up the middle for 12 yards",
                 "type": {"text": "Rush"},
                 "start": {"yardLine": 33}, "statYardage": 12},
                {"text": "Older play", "type": {"text": "Pass"},
                 "start": {"yardLine": 20}, "statYardage": 13}
            ]
        })
    }

    #[test]
    fn scoreboard_situation_replaces_summary_wholesale() {
        let state = normalize_game(
            &summary_fixture(),
            &scoreboard_fixture(),
            &plays_fixture(),
            "401547321",
        )
        .unwrap();

        // Every situation field comes from the scoreboard, none from summary
        assert_eq!(state.situation.down, 3);
        assert_eq!(state.situation.distance, 7);
        assert_eq!(state.situation.yard_line, 25);
        assert_eq!(state.situation.yards_to_endzone, 75);
        assert_eq!(state.situation.possession_text, "KC 3rd & 7");
        assert_eq!(state.situation.home_timeouts, 3);
        assert_eq!(state.situation.away_timeouts, 2);
        assert_eq!(state.situation.possession_team_id.as_deref(), Some("12"));
    }

    #[test]
    fn scoreboard_clock_is_authoritative() {
        let state = normalize_game(
            &summary_fixture(),
            &scoreboard_fixture(),
            &plays_fixture(),
            "401547321",
        )
        .unwrap();
        assert_eq!(state.status.period, 3);
        assert_eq!(state.status.clock, "11:02");
    }

    #[test]
    fn scoreboard_last_play_overwrites_summary() {
        let state = normalize_game(
            &summary_fixture(),
            &scoreboard_fixture(),
            &plays_fixture(),
            "401547321",
        )
        .unwrap();
        let lp = state.last_play.unwrap();
        assert_eq!(lp.text, "Mahomes sacked for -8 yards");
        assert_eq!(lp.team_id.as_deref(), Some("12"));
    }

    #[test]
    fn possession_recomputed_from_scoreboard_ids() {
        let state = normalize_game(
            &summary_fixture(),
            &scoreboard_fixture(),
            &plays_fixture(),
            "401547321",
        )
        .unwrap();
        assert_eq!(state.possession, Some(PossessionSide::Home));
        assert_eq!(state.possession_team().unwrap().abbreviation, "KC");
    }

    #[test]
    fn unknown_possession_id_resolves_to_none() {
        let mut scoreboard = scoreboard_fixture();
        scoreboard["events"][0]["competitions"][0]["situation"]["possession"] = json!("999");
        let state = normalize_game(
            &summary_fixture(),
            &scoreboard,
            &plays_fixture(),
            "401547321",
        )
        .unwrap();
        assert_eq!(state.possession, None);
    }

    #[test]
    fn summary_situation_kept_when_scoreboard_lacks_game() {
        let state = normalize_game(
            &summary_fixture(),
            &json!({"events": []}),
            &plays_fixture(),
            "401547321",
        )
        .unwrap();
        assert_eq!(state.situation.down, 2);
        assert_eq!(state.situation.distance, 5);
        assert_eq!(state.status.period, 2);
        assert_eq!(state.possession, Some(PossessionSide::Away));
    }

    #[test]
    fn scoreboard_situation_defaults_per_field() {
        let mut scoreboard = scoreboard_fixture();
        scoreboard["events"][0]["competitions"][0]["situation"] = json!({});
        let state = normalize_game(
            &summary_fixture(),
            &scoreboard,
            &json!({"plays": []}),
            "401547321",
        )
        .unwrap();
        assert_eq!(state.situation.down, 0);
        assert_eq!(state.situation.distance, 0);
        assert_eq!(state.situation.possession_team_id, None);
        assert_eq!(state.situation.home_timeouts, 3);
        assert_eq!(state.situation.away_timeouts, 3);
        assert!(!state.situation.is_red_zone);
        // Empty replacement also clears possession and keeps summary lastPlay
        assert_eq!(state.possession, None);
    }

    #[test]
    fn last_play_synthesized_from_most_recent_play() {
        let mut summary = summary_fixture();
        summary["header"]["competitions"][0]["situation"]
            .as_object_mut()
            .unwrap()
            .remove("lastPlay");
        let state =
            normalize_game(&summary, &json!({"events": []}), &plays_fixture(), "401547321")
                .unwrap();
        let lp = state.last_play.unwrap();
        assert_eq!(lp.text, "Pacheco rush up the middle for 12 yards");
        assert_eq!(lp.short_text, "Rush");
        assert_eq!(lp.end_yard_line, 33 + 12);
        assert_eq!(lp.team_id, None);
        assert_eq!(lp.epa, 0.0);
    }

    #[test]
    fn empty_last_play_text_also_triggers_synthesis() {
        let mut summary = summary_fixture();
        summary["header"]["competitions"][0]["situation"]["lastPlay"]["text"] = json!("");
        let state =
            normalize_game(&summary, &json!({"events": []}), &plays_fixture(), "401547321")
                .unwrap();
        assert_eq!(
            state.last_play.unwrap().text,
            "Pacheco rush up the middle for 12 yards"
        );
    }

    #[test]
    fn missing_header_is_a_shape_error() {
        let err = normalize_game(
            &json!({"boxscore": {}}),
            &scoreboard_fixture(),
            &plays_fixture(),
            "401547321",
        )
        .unwrap_err();
        assert!(matches!(err, NormalizeError::MissingHeader));
    }

    #[test]
    fn missing_competitors_is_a_shape_error() {
        let err = normalize_game(
            &json!({"header": {"competitions": [{"competitors": []}]}}),
            &scoreboard_fixture(),
            &plays_fixture(),
            "401547321",
        )
        .unwrap_err();
        assert!(matches!(err, NormalizeError::MissingCompetitors));
    }

    #[test]
    fn scores_parse_from_strings_and_numbers() {
        let mut summary = summary_fixture();
        summary["header"]["competitions"][0]["competitors"][0]["score"] = json!(21);
        let state = normalize_game(
            &summary,
            &json!({"events": []}),
            &plays_fixture(),
            "401547321",
        )
        .unwrap();
        assert_eq!(state.home_team.score, 21);
        assert_eq!(state.away_team.score, 10);
    }
}

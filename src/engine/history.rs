//! Historical probability dataset: league/team conversion rates, field
//! position impact, and per-player success rates, pre-computed offline from
//! league play-by-play data and loaded once at startup.
//!
//! The document is optional. When it is absent the estimator runs permanently
//! in heuristic fallback mode; a malformed row is skipped at load time and
//! later behaves as "entry not found", never as an error.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use super::estimator::{DistanceBucket, FieldZone, PlayType};

/// League-wide conversion rate row, keyed by (down, distance bucket, play type).
#[derive(Debug, Clone, Deserialize)]
pub struct LeagueRateRow {
    pub down: u8,
    /// Distance bucket name ("short" | "medium" | "long" | "very_long")
    #[serde(alias = "distance_bucket")]
    pub distance: String,
    pub play_type: String,
    pub success_rate: f64,
    pub sample_size: u32,
}

/// Team-specific conversion rate row (team abbreviation, no down dimension).
#[derive(Debug, Clone, Deserialize)]
pub struct TeamRateRow {
    pub team: String,
    #[serde(alias = "distance_bucket")]
    pub distance: String,
    pub play_type: String,
    pub success_rate: f64,
    pub sample_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldImpactRow {
    pub zone: String,
    pub play_type: String,
    pub conversion_rate: f64,
    pub td_rate: f64,
    #[serde(default)]
    pub sample_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerRateRow {
    pub player_id: String,
    #[serde(default)]
    pub player_name: String,
    #[serde(default)]
    pub position: String,
    pub conversion_rate: f64,
}

/// Team rate kept alongside its sample size so the estimator can gate
/// small-sample entries.
#[derive(Debug, Clone, Copy)]
pub struct TeamRate {
    pub success_rate: f64,
    pub sample_size: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldImpact {
    pub conversion_rate: f64,
    pub td_rate: f64,
}

/// Indexed historical dataset. Built once, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct HistoricalData {
    league: HashMap<(u8, DistanceBucket, PlayType), f64>,
    team: HashMap<(String, DistanceBucket, PlayType), TeamRate>,
    field: HashMap<(FieldZone, PlayType), FieldImpact>,
    players: HashMap<String, f64>,
}

impl HistoricalData {
    /// Load and index the probability document from a JSON file.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read probability data: {}", path.display()))?;
        let doc: Value = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid probability data JSON: {}", path.display()))?;
        Ok(Self::from_document(&doc))
    }

    /// Index a parsed probability document. Rows that fail to deserialize or
    /// carry an unknown bucket/play-type/zone name are skipped.
    pub fn from_document(doc: &Value) -> Self {
        let mut data = HistoricalData::default();

        for row in rows::<LeagueRateRow>(doc, "league_conversion_rates") {
            let (Some(bucket), Some(play)) =
                (DistanceBucket::parse(&row.distance), PlayType::parse(&row.play_type))
            else {
                continue;
            };
            data.league.insert((row.down, bucket, play), row.success_rate);
        }

        for row in rows::<TeamRateRow>(doc, "team_conversion_rates") {
            let (Some(bucket), Some(play)) =
                (DistanceBucket::parse(&row.distance), PlayType::parse(&row.play_type))
            else {
                continue;
            };
            data.team.insert(
                (row.team.clone(), bucket, play),
                TeamRate {
                    success_rate: row.success_rate,
                    sample_size: row.sample_size,
                },
            );
        }

        for row in rows::<FieldImpactRow>(doc, "field_position_impact") {
            let (Some(zone), Some(play)) =
                (FieldZone::parse(&row.zone), PlayType::parse(&row.play_type))
            else {
                continue;
            };
            data.field.insert(
                (zone, play),
                FieldImpact {
                    conversion_rate: row.conversion_rate,
                    td_rate: row.td_rate,
                },
            );
        }

        for row in rows::<PlayerRateRow>(doc, "player_success_rates") {
            data.players.insert(row.player_id, row.conversion_rate);
        }

        data
    }

    pub fn league_rate(&self, down: u8, bucket: DistanceBucket, play: PlayType) -> Option<f64> {
        self.league.get(&(down, bucket, play)).copied()
    }

    pub fn team_rate(&self, team: &str, bucket: DistanceBucket, play: PlayType) -> Option<TeamRate> {
        self.team
            .get(&(team.to_string(), bucket, play))
            .copied()
    }

    pub fn field_impact(&self, zone: FieldZone, play: PlayType) -> Option<FieldImpact> {
        self.field.get(&(zone, play)).copied()
    }

    pub fn player_rate(&self, player_id: &str) -> Option<f64> {
        self.players.get(player_id).copied()
    }

    /// Row counts per table, for startup logging.
    pub fn row_counts(&self) -> (usize, usize, usize, usize) {
        (
            self.league.len(),
            self.team.len(),
            self.field.len(),
            self.players.len(),
        )
    }
}

/// Deserialize the rows of one top-level array, skipping malformed entries.
fn rows<'a, T: Deserialize<'a> + 'a>(doc: &'a Value, key: &str) -> impl Iterator<Item = T> + 'a {
    doc[key]
        .as_array()
        .map(|a| a.as_slice())
        .unwrap_or(&[])
        .iter()
        .filter_map(|v| T::deserialize(v).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_doc() -> Value {
        json!({
            "generated_at": "2025-09-01T00:00:00",
            "season": 2025,
            "league_conversion_rates": [
                {"down": 3, "distance": "long", "play_type": "pass",
                 "success_rate": 0.35, "sample_size": 900},
                {"down": 3, "distance": "short", "play_type": "run",
                 "success_rate": 0.68, "sample_size": 700},
                // malformed: missing success_rate
                {"down": 4, "distance": "short", "play_type": "run"}
            ],
            "team_conversion_rates": [
                {"team": "KC", "distance": "long", "play_type": "pass",
                 "success_rate": 0.42, "sample_size": 20},
                // unknown bucket name gets skipped
                {"team": "KC", "distance": "extreme", "play_type": "pass",
                 "success_rate": 0.9, "sample_size": 50}
            ],
            "field_position_impact": [
                {"zone": "red_zone", "play_type": "pass",
                 "conversion_rate": 0.58, "td_rate": 0.22, "sample_size": 300}
            ],
            "player_success_rates": [
                {"player_id": "00-0033873", "player_name": "P. Mahomes",
                 "position": "QB", "conversion_rate": 0.51}
            ]
        })
    }

    #[test]
    fn indexes_valid_rows() {
        let data = HistoricalData::from_document(&sample_doc());
        let (league, team, field, players) = data.row_counts();
        assert_eq!(league, 2);
        assert_eq!(team, 1);
        assert_eq!(field, 1);
        assert_eq!(players, 1);
    }

    #[test]
    fn malformed_rows_are_skipped_not_fatal() {
        let data = HistoricalData::from_document(&sample_doc());
        // The down-4 row lacked a success_rate → absent, not an error
        assert!(data
            .league_rate(4, DistanceBucket::Short, PlayType::Run)
            .is_none());
    }

    #[test]
    fn league_lookup_by_triple() {
        let data = HistoricalData::from_document(&sample_doc());
        let rate = data
            .league_rate(3, DistanceBucket::Long, PlayType::Pass)
            .unwrap();
        assert!((rate - 0.35).abs() < 1e-12);
    }

    #[test]
    fn team_lookup_keeps_sample_size() {
        let data = HistoricalData::from_document(&sample_doc());
        let rate = data
            .team_rate("KC", DistanceBucket::Long, PlayType::Pass)
            .unwrap();
        assert_eq!(rate.sample_size, 20);
        assert!((rate.success_rate - 0.42).abs() < 1e-12);
    }

    #[test]
    fn player_lookup() {
        let data = HistoricalData::from_document(&sample_doc());
        assert!(data.player_rate("00-0033873").is_some());
        assert!(data.player_rate("unknown").is_none());
    }

    #[test]
    fn empty_document_is_empty_dataset() {
        let data = HistoricalData::from_document(&json!({}));
        assert_eq!(data.row_counts(), (0, 0, 0, 0));
    }
}

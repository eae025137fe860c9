//! Situational probability engine for live NFL game state.
//!
//! Converts raw situational inputs (down, distance, score differential,
//! clock, field position, team identity) into pass/run conversion
//! probabilities and win probabilities. When a historical dataset is loaded
//! the engine blends team-specific rates into league-wide rates; without one
//! it runs permanently on closed-form heuristics.
//!
//! The engine is stateless per call: a pure function of its inputs plus the
//! dataset fixed at construction. It never errors on well-formed numeric
//! input; missing data always degrades to a weaker but valid estimate.

use serde::Serialize;

use crate::game::models::GameState;

use super::history::HistoricalData;

/// League rate used when no matching historical entry exists.
const DEFAULT_RATE: f64 = 0.40;
/// Minimum sample size before a team-specific rate is trusted.
const MIN_TEAM_SAMPLE: u32 = 5;
/// Blend weights when a trusted team rate is available.
const TEAM_WEIGHT: f64 = 0.7;
const LEAGUE_WEIGHT: f64 = 0.3;
/// Seconds per quarter / per regulation game.
const QUARTER_SECS: u32 = 900;
const GAME_SECS: f64 = 3600.0;

// ── Vocabulary ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayType {
    Pass,
    Run,
}

impl PlayType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pass" => Some(PlayType::Pass),
            "run" => Some(PlayType::Run),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlayType::Pass => "Pass",
            PlayType::Run => "Run",
        }
    }
}

/// Coarse distance category used to index historical conversion rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceBucket {
    Short,
    Medium,
    Long,
    VeryLong,
}

impl DistanceBucket {
    /// Total over all distances: short ≤3, medium ≤6, long ≤10, else very long.
    pub fn from_yards(yards: u32) -> Self {
        match yards {
            0..=3 => DistanceBucket::Short,
            4..=6 => DistanceBucket::Medium,
            7..=10 => DistanceBucket::Long,
            _ => DistanceBucket::VeryLong,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "short" => Some(DistanceBucket::Short),
            "medium" => Some(DistanceBucket::Medium),
            "long" => Some(DistanceBucket::Long),
            "very_long" => Some(DistanceBucket::VeryLong),
            _ => None,
        }
    }
}

/// Proximity band to the scoring end zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldZone {
    RedZone,
    GreenZone,
    MidField,
    OwnTerritory,
}

impl FieldZone {
    pub fn from_yards_to_endzone(yards: u32) -> Self {
        match yards {
            0..=10 => FieldZone::RedZone,
            11..=20 => FieldZone::GreenZone,
            21..=50 => FieldZone::MidField,
            _ => FieldZone::OwnTerritory,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "red_zone" => Some(FieldZone::RedZone),
            "green_zone" => Some(FieldZone::GreenZone),
            "mid_field" => Some(FieldZone::MidField),
            "own_territory" => Some(FieldZone::OwnTerritory),
            _ => None,
        }
    }
}

// ── Output types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    pub probability: f64,
    pub label: String,
}

/// Pass and run conversion probabilities for the same (down, distance,
/// team-or-league) triple. Both sides are always present.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioComparison {
    pub pass: ScenarioOutcome,
    pub run: ScenarioOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldPositionImpact {
    pub zone: FieldZone,
    pub conversion_rate: f64,
    pub td_rate: f64,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WinProbability {
    pub probability: f64,
    pub score_diff: i64,
    /// Regulation seconds remaining
    pub time_remaining: u32,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerImpact {
    pub player_probability: f64,
    pub boost: f64,
    pub has_data: bool,
}

// ── Estimator ────────────────────────────────────────────────────────────────

/// The estimation engine. Holds the optional historical dataset loaded once
/// at startup; "fallback vs data-backed" is decided at construction and is
/// never partially applied per call.
#[derive(Debug, Default)]
pub struct Estimator {
    data: Option<HistoricalData>,
}

impl Estimator {
    pub fn new(data: Option<HistoricalData>) -> Self {
        Estimator { data }
    }

    /// True when no historical dataset was provided and every estimate comes
    /// from the closed-form heuristics.
    pub fn is_fallback(&self) -> bool {
        self.data.is_none()
    }

    /// Probability that a play of `play` type converts the current down,
    /// in [0, 1].
    ///
    /// Data-backed path: league rate for (down, bucket, play type), blended
    /// 70/30 with the team-specific rate when that rate has a trustworthy
    /// sample size. Fallback path: fixed base rates per bucket with down and
    /// play-type adjustments, plus a deterministic per-team offset.
    pub fn conversion_probability(
        &self,
        down: u8,
        distance: u32,
        play: PlayType,
        team: Option<&str>,
    ) -> f64 {
        let bucket = DistanceBucket::from_yards(distance);

        if let Some(data) = &self.data {
            let league = data.league_rate(down, bucket, play).unwrap_or(DEFAULT_RATE);
            if let Some(team) = team {
                if let Some(rate) = data.team_rate(team, bucket, play) {
                    // Small team samples overfit badly; fall through to the
                    // unblended league rate below the threshold.
                    if rate.sample_size >= MIN_TEAM_SAMPLE {
                        return (TEAM_WEIGHT * rate.success_rate + LEAGUE_WEIGHT * league)
                            .clamp(0.0, 1.0);
                    }
                }
            }
            return league.clamp(0.0, 1.0);
        }

        let mut p = match bucket {
            DistanceBucket::Short => 0.65,
            DistanceBucket::Medium => 0.50,
            DistanceBucket::Long => 0.35,
            DistanceBucket::VeryLong => 0.40,
        };

        // Money downs convert less often than early downs at the same distance
        if matches!(down, 3 | 4) {
            p *= 0.9;
        }

        match play {
            PlayType::Pass => {
                if matches!(bucket, DistanceBucket::Long | DistanceBucket::VeryLong) {
                    p *= 1.1;
                }
            }
            PlayType::Run => match bucket {
                DistanceBucket::Short => p *= 1.15,
                DistanceBucket::Long | DistanceBucket::VeryLong => p *= 0.85,
                _ => {}
            },
        }

        if let Some(team) = team {
            p += team_tendency_offset(team);
        }

        p.clamp(0.0, 1.0)
    }

    /// Pass-vs-run comparison for the game's current down and distance.
    /// A down of 0 (between plays) is treated as 1st down, a distance of 0
    /// as 10 yards.
    pub fn scenario_comparison(&self, state: &GameState, team: Option<&str>) -> ScenarioComparison {
        let down = if state.situation.down == 0 {
            1
        } else {
            state.situation.down
        };
        let distance = if state.situation.distance == 0 {
            10
        } else {
            state.situation.distance
        };

        let outcome = |play: PlayType| ScenarioOutcome {
            probability: self.conversion_probability(down, distance, play, team),
            label: play.label().to_string(),
        };

        ScenarioComparison {
            pass: outcome(PlayType::Pass),
            run: outcome(PlayType::Run),
        }
    }

    /// Conversion and touchdown rates for the current field zone.
    pub fn field_position_impact(&self, yards_to_endzone: u32, play: PlayType) -> FieldPositionImpact {
        let zone = FieldZone::from_yards_to_endzone(yards_to_endzone);

        let (conversion_rate, td_rate) = self
            .data
            .as_ref()
            .and_then(|d| d.field_impact(zone, play))
            .map(|row| (row.conversion_rate, row.td_rate))
            .unwrap_or(match zone {
                FieldZone::RedZone => (0.60, 0.25),
                FieldZone::GreenZone => (0.55, 0.15),
                FieldZone::MidField => (0.50, 0.05),
                FieldZone::OwnTerritory => (0.45, 0.02),
            });

        FieldPositionImpact {
            zone,
            conversion_rate,
            td_rate,
            description: zone_description(zone).to_string(),
        }
    }

    /// In-game win probability for the team with the given ID.
    ///
    /// Linear model on score differential with a time weight that grows from
    /// 0 at kickoff to 1 at the final gun, plus possession and field-position
    /// bonuses. Clamped to [0.01, 0.99]: never certain before completion.
    ///
    /// A `team_id` matching neither team degrades to the away team's
    /// perspective rather than erroring.
    pub fn win_probability(&self, state: &GameState, team_id: &str) -> WinProbability {
        let (team, opponent) = match state.team(team_id) {
            Some(t) if t.id == state.home_team.id => (&state.home_team, &state.away_team),
            _ => (&state.away_team, &state.home_team),
        };

        let score_diff = team.score as i64 - opponent.score as i64;
        let time_remaining = seconds_remaining(state.status.period, &state.status.clock);
        let time_weight = (1.0 - time_remaining as f64 / GAME_SECS).clamp(0.0, 1.0);

        let mut p = 0.5 + score_diff as f64 * (0.05 + 0.10 * time_weight);

        let has_ball = state
            .possession_team()
            .map(|t| t.id == team.id)
            .unwrap_or(false);
        if has_ball {
            p += 0.03;
            if state.situation.yards_to_endzone <= 20 {
                p += 0.05;
            }
        }

        let probability = p.clamp(0.01, 0.99);

        WinProbability {
            probability,
            score_diff,
            time_remaining,
            description: win_description(probability).to_string(),
        }
    }

    /// Adjust a base conversion probability by a player's historical rate.
    /// Without data for the player, the base probability passes through.
    pub fn player_impact(&self, player_id: &str, base_probability: f64) -> PlayerImpact {
        match self.data.as_ref().and_then(|d| d.player_rate(player_id)) {
            Some(rate) => PlayerImpact {
                player_probability: rate,
                boost: rate - base_probability,
                has_data: true,
            },
            None => PlayerImpact {
                player_probability: base_probability,
                boost: 0.0,
                has_data: false,
            },
        }
    }
}

// ── Time / hash utilities ────────────────────────────────────────────────────

/// Regulation seconds remaining given the current period and "MM:SS" clock.
///
/// For overtime (period > 4) the whole-quarters term is clamped at zero so
/// the result stays non-negative; only the current period's clock counts.
pub fn seconds_remaining(period: u32, clock: &str) -> u32 {
    let quarters_left = 4u32.saturating_sub(period);
    quarters_left * QUARTER_SECS + parse_clock_seconds(clock)
}

/// Parse an "MM:SS" display clock to seconds. Malformed input parses as 0
/// rather than propagating invalid math.
fn parse_clock_seconds(clock: &str) -> u32 {
    let mut parts = clock.split(':');
    match (parts.next(), parts.next()) {
        (Some(m), Some(s)) => {
            let minutes: u32 = m.trim().parse().unwrap_or(0);
            // ESPN sub-minute clocks can carry fractions ("0:42.5")
            let seconds = s.trim().parse::<f64>().unwrap_or(0.0).max(0.0) as u32;
            minutes * 60 + seconds
        }
        _ => 0,
    }
}

/// Deterministic per-team offset in [-0.10, 0.10] used by the fallback path
/// to differentiate teams without historical data.
///
/// A plain 31-multiplier polynomial hash over the bytes of the abbreviation:
/// a pure function of the string, so the same team always maps to the same
/// offset across calls, runs, and processes.
fn team_tendency_offset(team: &str) -> f64 {
    let mut h: u32 = 0;
    for b in team.bytes() {
        h = h.wrapping_mul(31).wrapping_add(b as u32);
    }
    ((h % 21) as f64 - 10.0) / 100.0
}

fn zone_description(zone: FieldZone) -> &'static str {
    match zone {
        FieldZone::RedZone => "Inside the 10: compressed field, high touchdown likelihood",
        FieldZone::GreenZone => "Fringe scoring territory, 11-20 yards out",
        FieldZone::MidField => "Between midfield and the 20: standard play calling",
        FieldZone::OwnTerritory => "Backed up in own territory",
    }
}

fn win_description(p: f64) -> &'static str {
    if p >= 0.90 {
        "Highly likely to win"
    } else if p >= 0.75 {
        "Strong advantage"
    } else if p >= 0.60 {
        "Likely to win"
    } else if p >= 0.40 {
        "Competitive game"
    } else if p >= 0.25 {
        "Unlikely to win"
    } else if p >= 0.10 {
        "Significant deficit"
    } else {
        "Very unlikely to win"
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

/// Canonical game snapshot, rebuilt from scratch on every poll cycle.
/// Never mutated in place; the poll loop swaps whole snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Upstream event/game ID
    pub game_id: String,
    pub status: GameClock,
    pub situation: Situation,
    pub home_team: TeamScore,
    pub away_team: TeamScore,
    /// Which side has the ball, if known. A reference by side rather than a
    /// copy of the team record; resolve with [`GameState::possession_team`].
    pub possession: Option<PossessionSide>,
    pub last_play: Option<LastPlay>,
}

impl GameState {
    /// Resolve the possession reference into the owning team record.
    pub fn possession_team(&self) -> Option<&TeamScore> {
        match self.possession? {
            PossessionSide::Home => Some(&self.home_team),
            PossessionSide::Away => Some(&self.away_team),
        }
    }

    /// Look up a team by upstream ID.
    pub fn team(&self, team_id: &str) -> Option<&TeamScore> {
        if self.home_team.id == team_id {
            Some(&self.home_team)
        } else if self.away_team.id == team_id {
            Some(&self.away_team)
        } else {
            None
        }
    }
}

/// Period/clock/completion state. `clock` keeps the upstream "MM:SS" display
/// string; the estimator parses it to seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameClock {
    pub period: u32,
    pub clock: String,
    pub completed: bool,
}

/// Live down-and-distance situation. `down` of 0 means "between plays" and
/// suppresses situational probability output downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Situation {
    pub down: u8,
    /// Yards needed for a first down
    pub distance: u32,
    pub yard_line: u32,
    pub yards_to_endzone: u32,
    pub possession_team_id: Option<String>,
    pub possession_text: String,
    pub is_red_zone: bool,
    pub home_timeouts: u8,
    pub away_timeouts: u8,
}

impl Default for Situation {
    fn default() -> Self {
        Situation {
            down: 0,
            distance: 0,
            yard_line: 0,
            yards_to_endzone: 0,
            possession_team_id: None,
            possession_text: String::new(),
            is_red_zone: false,
            home_timeouts: 3,
            away_timeouts: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamScore {
    pub id: String,
    pub display_name: String,
    pub abbreviation: String,
    pub logo_url: String,
    pub score: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PossessionSide {
    Home,
    Away,
}

/// Most recent play, from whichever source had one (scoreboard situation,
/// game summary, or synthesized from the play-by-play feed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastPlay {
    pub text: String,
    pub short_text: String,
    /// Expected Points Added; passed through opaquely, 0.0 when the source
    /// feed doesn't carry it.
    pub epa: f64,
    pub team_id: Option<String>,
    pub end_yard_line: i64,
}

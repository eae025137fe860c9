pub mod cache;
pub mod espn;
pub mod provider;

pub use cache::TtlCache;
pub use espn::EspnFeed;
pub use provider::GameFeed;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use crate::engine::{
    generate_insight, Estimator, FieldPositionImpact, PlayType, ScenarioComparison,
    WinProbability,
};
use crate::game::{normalize_game, GameState};

/// One fully-processed poll cycle: the canonical state plus everything the
/// estimation engine derived from it.
#[derive(Debug, Clone, Serialize)]
pub struct GameSnapshot {
    pub state: GameState,
    pub home_win: WinProbability,
    pub away_win: WinProbability,
    /// Present only while a down is active; a down of 0 (between plays)
    /// suppresses situational probabilities.
    pub situational: Option<SituationalOutlook>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SituationalOutlook {
    pub league: ScenarioComparison,
    /// Possession team's scenario, when the possession team is known
    pub team: Option<ScenarioComparison>,
    pub field_position: FieldPositionImpact,
    pub insight: Option<String>,
}

/// Stops the monitor task. Dropping the handle stops it too; a cycle already
/// in flight is discarded rather than delivered after stop.
pub struct MonitorHandle {
    stop: watch::Sender<bool>,
}

impl MonitorHandle {
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }
}

/// Spawn the poll loop for one game: every tick, fetch the scoreboard,
/// summary, and play-by-play payloads concurrently, normalize, run the
/// estimation engine, and deliver a [`GameSnapshot`] through the returned
/// channel.
///
/// A cycle fails as a unit: if any fetch or normalization fails, nothing is
/// merged and the previous canonical state stays current until the next
/// scheduled tick. Ticks never overlap; a slow cycle skips missed ticks
/// instead of re-entering.
pub fn start_game_monitor(
    feed: Arc<dyn GameFeed>,
    estimator: Arc<Estimator>,
    game_id: String,
    poll_interval: Duration,
) -> (mpsc::Receiver<GameSnapshot>, MonitorHandle) {
    let (tx, rx) = mpsc::channel(64);
    let (stop_tx, mut stop_rx) = watch::channel(false);

    tokio::spawn(async move {
        info!(
            "Game monitor started (feed={}, game={}, interval={:?})",
            feed.name(),
            game_id,
            poll_interval
        );

        let mut previous: Option<GameState> = None;
        let mut interval = tokio::time::interval(poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = stop_rx.changed() => {
                    info!("Game monitor stopped (game={})", game_id);
                    return;
                }
                _ = interval.tick() => {}
            }

            let (scoreboard, summary, plays) = future::join3(
                feed.fetch_scoreboard(),
                feed.fetch_summary(&game_id),
                feed.fetch_plays(&game_id),
            )
            .await;
            let payloads = (|| -> anyhow::Result<(Value, Value, Value)> {
                Ok((scoreboard?, summary?, plays?))
            })();
            let (scoreboard, summary, plays) = match payloads {
                Ok(p) => p,
                Err(e) => {
                    warn!("Poll cycle failed, keeping previous state: {e:#}");
                    continue;
                }
            };

            let mut state = match normalize_game(&summary, &scoreboard, &plays, &game_id) {
                Ok(s) => s,
                Err(e) => {
                    warn!("Normalization failed, keeping previous state: {e}");
                    continue;
                }
            };

            if let Some(prev) = &previous {
                reconcile_with_previous(prev, &mut state);
            }
            previous = Some(state.clone());

            // Never apply a late-arriving cycle after stop
            if *stop_rx.borrow() {
                info!("Game monitor stopped (game={})", game_id);
                return;
            }

            let snapshot = build_snapshot(&estimator, state);
            match tx.try_send(snapshot) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    info!(
                        "Snapshot receiver dropped, stopping game monitor (game={})",
                        game_id
                    );
                    return;
                }
                Err(e @ mpsc::error::TrySendError::Full(_)) => {
                    error!("Snapshot channel full, snapshot DROPPED: {}", e);
                }
            }
        }
    });

    (rx, MonitorHandle { stop: stop_tx })
}

/// Cross-snapshot invariants a single normalization pass cannot enforce:
/// scores never decrease within a game and `completed` never reverts.
fn reconcile_with_previous(prev: &GameState, next: &mut GameState) {
    if next.home_team.score < prev.home_team.score {
        warn!(
            "Home score went backwards ({} -> {}), keeping previous",
            prev.home_team.score, next.home_team.score
        );
        next.home_team.score = prev.home_team.score;
    }
    if next.away_team.score < prev.away_team.score {
        warn!(
            "Away score went backwards ({} -> {}), keeping previous",
            prev.away_team.score, next.away_team.score
        );
        next.away_team.score = prev.away_team.score;
    }
    if prev.status.completed {
        next.status.completed = true;
    }
}

/// Run the estimation engine over a canonical state.
pub fn build_snapshot(estimator: &Estimator, state: GameState) -> GameSnapshot {
    let home_win = estimator.win_probability(&state, &state.home_team.id);
    let away_win = estimator.win_probability(&state, &state.away_team.id);

    let situational = if (1..=4).contains(&state.situation.down) {
        let league = estimator.scenario_comparison(&state, None);
        let possession = state.possession_team();
        let team = possession
            .map(|t| estimator.scenario_comparison(&state, Some(t.abbreviation.as_str())));
        let insight = team.as_ref().zip(possession).map(|(team_cmp, t)| {
            generate_insight(team_cmp, &league, &t.display_name)
        });
        Some(SituationalOutlook {
            field_position: estimator
                .field_position_impact(state.situation.yards_to_endzone, PlayType::Pass),
            league,
            team,
            insight,
        })
    } else {
        None
    };

    GameSnapshot {
        home_win,
        away_win,
        situational,
        state,
        fetched_at: Utc::now(),
    }
}

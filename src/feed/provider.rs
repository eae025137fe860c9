use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Trait that every upstream game-data feed must implement. Payloads stay
/// raw JSON here; the normalizer owns the shape rules.
#[async_trait]
pub trait GameFeed: Send + Sync {
    /// Lightweight scoreboard snapshot (all current games, live situations).
    async fn fetch_scoreboard(&self) -> Result<Value>;

    /// Detailed game summary (rosters, header, authoritative status).
    async fn fetch_summary(&self, game_id: &str) -> Result<Value>;

    /// Play-by-play list for the game, most-recent-first.
    async fn fetch_plays(&self, game_id: &str) -> Result<Value>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

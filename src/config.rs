use clap::Parser;

/// Live NFL game tracker with situational probability estimates
#[derive(Parser, Debug, Clone)]
#[command(name = "gridiron-live", version, about)]
pub struct Config {
    /// Upstream event ID of the game to track
    #[arg(long, env = "GAME_ID")]
    pub game_id: String,

    /// Base URL of the upstream sports API
    #[arg(
        long,
        env = "ESPN_BASE_URL",
        default_value = "https://site.api.espn.com/apis/site/v2/sports/football/nfl"
    )]
    pub espn_base_url: String,

    /// Path to the pre-computed historical probability JSON; omit to run on
    /// heuristic fallbacks only
    #[arg(long, env = "PROBABILITY_DATA")]
    pub probability_data: Option<String>,

    /// Presentation API listen address
    #[arg(long, env = "DASHBOARD_ADDR", default_value = "0.0.0.0:8080")]
    pub dashboard_addr: String,

    /// Polling interval in seconds
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value = "10")]
    pub poll_interval_secs: u64,

    /// Upstream response cache TTL in seconds (0 disables caching)
    #[arg(long, env = "CACHE_TTL_SECS", default_value = "5")]
    pub cache_ttl_secs: u64,

    /// Retries per upstream request before the poll cycle fails
    #[arg(long, env = "FETCH_RETRIES", default_value = "2")]
    pub fetch_retries: u32,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.game_id.trim().is_empty() {
            anyhow::bail!("game_id must not be empty");
        }
        if self.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be at least 1");
        }
        if self.fetch_retries > 10 {
            anyhow::bail!("fetch_retries must be 10 or fewer");
        }
        if self.cache_ttl_secs >= self.poll_interval_secs.max(2) * 10 {
            anyhow::bail!("cache_ttl_secs is too large relative to the polling interval");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config {
            game_id: "401547321".into(),
            espn_base_url: "https://example.test".into(),
            probability_data: None,
            dashboard_addr: "127.0.0.1:0".into(),
            poll_interval_secs: 10,
            cache_ttl_secs: 5,
            fetch_retries: 2,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn empty_game_id_rejected() {
        let mut c = base();
        c.game_id = "  ".into();
        assert!(c.validate().is_err());
    }

    #[test]
    fn zero_poll_interval_rejected() {
        let mut c = base();
        c.poll_interval_secs = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn oversized_cache_ttl_rejected() {
        let mut c = base();
        c.cache_ttl_secs = 1000;
        assert!(c.validate().is_err());
    }
}

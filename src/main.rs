use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use gridiron_live::config::Config;
use gridiron_live::dashboard::{self, AppState};
use gridiron_live::engine::{Estimator, HistoricalData};
use gridiron_live::feed::{start_game_monitor, EspnFeed, GameFeed};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    // Load the historical probability dataset, if configured. Without it the
    // estimator runs permanently on heuristic fallbacks.
    let historical = match &config.probability_data {
        Some(path) => {
            let data = HistoricalData::load_file(path)?;
            let (league, team, field, players) = data.row_counts();
            info!(
                "Historical data loaded: {} league, {} team, {} field, {} player rates",
                league, team, field, players
            );
            Some(data)
        }
        None => {
            info!("No historical data configured, running on heuristic fallbacks");
            None
        }
    };
    let estimator = Arc::new(Estimator::new(historical));

    let feed: Arc<dyn GameFeed> = Arc::new(EspnFeed::new(
        Some(&config.espn_base_url),
        Duration::from_secs(config.cache_ttl_secs),
        config.fetch_retries,
    )?);

    let (mut snapshots, monitor) = start_game_monitor(
        feed,
        Arc::clone(&estimator),
        config.game_id.clone(),
        Duration::from_secs(config.poll_interval_secs),
    );

    // Publish the latest snapshot for the presentation API; replaced
    // atomically, never edited in place.
    let (latest_tx, latest_rx) = tokio::sync::watch::channel(None);
    tokio::spawn(async move {
        while let Some(snapshot) = snapshots.recv().await {
            info!(
                "{} {} - {} {} | Q{} {} | home win {:.0}%",
                snapshot.state.home_team.abbreviation,
                snapshot.state.home_team.score,
                snapshot.state.away_team.score,
                snapshot.state.away_team.abbreviation,
                snapshot.state.status.period,
                snapshot.state.status.clock,
                snapshot.home_win.probability * 100.0
            );
            if latest_tx.send(Some(snapshot)).is_err() {
                break;
            }
        }
    });

    let app = dashboard::router(AppState { latest: latest_rx });
    let addr: SocketAddr = config.dashboard_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Presentation API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    // Stop the poll loop before exiting; a cycle in flight is discarded.
    monitor.stop();

    Ok(())
}

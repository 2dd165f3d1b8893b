use chrono::Utc;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flood_monitor::common::QueryKind;
use flood_monitor::config::Config;
use flood_monitor::dashboard::Dashboard;
use flood_monitor::influx::InfluxClient;
use flood_monitor::query::QueryAdapter;
use flood_monitor::sensors::SensorRegistry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,flood_monitor=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting flood-monitor...");

    // Load configuration (fail-fast)
    let config = Config::from_env()?;
    tracing::info!(
        deployment = ?config.deployment,
        endpoint = %config.influx.endpoint,
        bucket = %config.influx.bucket,
        "Configuration loaded"
    );

    let registry = Arc::new(SensorRegistry::load(&config.sensors_config_path)?);
    tracing::info!(
        path = %config.sensors_config_path,
        sensors = registry.len(),
        "Sensor registry loaded"
    );

    let client = InfluxClient::new(&config.influx)?;
    let adapter = QueryAdapter::new(Arc::new(client), config.influx.bucket.clone());
    tracing::info!("InfluxDB client initialized");

    let mut builder = Dashboard::builder(registry, adapter)
        .intervals(config.poll_intervals)
        .gauge_max_level(config.gauge_max_level);
    if let Some(sensor_id) = &config.initial_sensor {
        builder = builder.sensor(sensor_id.clone());
    }
    let mut dashboard = builder.start()?;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            update = dashboard.next_update() => {
                let Some(kind) = update else { break };
                log_update(&dashboard, kind);
            }
        }
    }

    dashboard.shutdown();
    tracing::info!("flood-monitor stopped");
    Ok(())
}

fn log_update(dashboard: &Dashboard, kind: QueryKind) {
    let sensor_id = &dashboard.sensor().id;
    match kind {
        QueryKind::Latest => {
            let gauge = dashboard.gauge().snapshot(Utc::now());
            tracing::info!(
                sensor_id = %sensor_id,
                level = gauge.level,
                battery = gauge.battery,
                solar = gauge.solar,
                fill_percent = gauge.fill_percent,
                display = ?gauge.display,
                status = gauge.status,
                updated = %gauge.last_updated,
                "Gauge updated"
            );
        }
        QueryKind::History => {
            let history = dashboard.history();
            tracing::info!(
                sensor_id = %sensor_id,
                window = %history.window(),
                points = history.points().len(),
                status = history.status_label(),
                "History updated"
            );
        }
        QueryKind::Images => {
            let timeline = dashboard.timeline();
            tracing::info!(
                sensor_id = %sensor_id,
                subtitle = %timeline.subtitle(),
                active_index = timeline.active_index(),
                latest = ?timeline.active_timestamp(),
                "Image timeline updated"
            );
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        },
    }
}

//! `tempdog-monitor` -- sensor telemetry ingestion and alerting daemon.
//!
//! Subscribes to the broker's WebSocket bridge, persists every valid
//! temperature reading, and dispatches email alerts on significant
//! per-sensor deltas and cross-sensor divergence.
//!
//! Configuration is environment-based; see
//! [`MonitorConfig::from_env`](tempdog_monitor::config::MonitorConfig::from_env).

use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tempdog_monitor::config::MonitorConfig;
use tempdog_monitor::ingest::Pipeline;
use tempdog_monitor::subscriber;
use tempdog_notify::{Mailer, NotifyWorker, DEFAULT_QUEUE_CAPACITY};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tempdog_monitor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match MonitorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    tracing::info!(
        sensors = config.sensors.len(),
        delta_threshold = config.policy.delta_threshold,
        cross_sensor_threshold = config.policy.cross_sensor_threshold,
        cooldown_secs = config.policy.cooldown.as_secs(),
        "Tempdog monitor starting",
    );

    let pool = tempdog_db::create_pool(&config.database_url)
        .await
        .expect("Failed to open readings database");
    tempdog_db::init_schema(&pool)
        .await
        .expect("Failed to initialise readings schema");
    tempdog_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Readings database ready");

    // Alert delivery: bounded queue consumed by a background worker so a
    // slow mail channel never delays ingestion.
    let (alert_sender, alert_rx) = tempdog_notify::channel(DEFAULT_QUEUE_CAPACITY);
    let cancel = tokio_util::sync::CancellationToken::new();

    let worker_handle = match &config.email {
        Some(email_config) => {
            let mailer = match Mailer::new(email_config) {
                Ok(mailer) => mailer,
                Err(e) => {
                    tracing::error!(error = %e, "Invalid SMTP configuration");
                    std::process::exit(1);
                }
            };
            tokio::spawn(NotifyWorker::new(mailer).run(alert_rx, cancel.clone()))
        }
        None => {
            tracing::warn!("SMTP not configured, alerts will be logged only");
            tokio::spawn(async move {
                let mut rx = alert_rx;
                while let Some(alert) = rx.recv().await {
                    tracing::warn!(key = %alert.key(), subject = %alert.subject(), "ALERT");
                }
            })
        }
    };

    // Transport: subscriber forwards published messages into the ingest
    // channel; the pipeline consumes them strictly in arrival order.
    let (ingest_tx, mut ingest_rx) = tokio::sync::mpsc::channel(256);
    let subscriber_handle = tokio::spawn({
        let ws_url = config.broker_ws_url.clone();
        let prefix = config.topic_prefix.clone();
        async move { subscriber::run(&ws_url, &prefix, ingest_tx).await }
    });

    let mut pipeline = Pipeline::new(
        pool,
        config.sensors.keys().cloned(),
        config.policy.clone(),
        alert_sender,
    );

    while let Some(msg) = ingest_rx.recv().await {
        match pipeline.handle_message(&msg, Utc::now()).await {
            Ok(outcome) => {
                tracing::debug!(topic = %msg.topic, ?outcome, "Message processed");
            }
            Err(e) => {
                // Without a durable record of prior readings the alerting
                // decisions are unreliable; halt rather than continue.
                tracing::error!(error = %e, "Persistence failure, shutting down");
                cancel.cancel();
                std::process::exit(1);
            }
        }
    }

    tracing::info!("Ingest channel closed, monitor exiting");
    cancel.cancel();
    let _ = worker_handle.await;
    subscriber_handle.abort();
}

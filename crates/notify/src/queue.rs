//! Bounded alert queue and background sender worker.
//!
//! The ingestion pipeline hands triggered alerts to [`AlertSender`]
//! without blocking; [`NotifyWorker`] consumes the queue and delivers
//! each alert by email. Delivery is best-effort: failures are logged and
//! never propagate back into the pipeline.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use tempdog_core::alert::TemperatureAlert;

use crate::email::Mailer;

/// Default capacity of the alert queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Create a bounded alert channel.
pub fn channel(capacity: usize) -> (AlertSender, mpsc::Receiver<TemperatureAlert>) {
    let (tx, rx) = mpsc::channel(capacity);
    (AlertSender { tx }, rx)
}

/// Non-blocking producer half of the alert queue.
#[derive(Clone)]
pub struct AlertSender {
    tx: mpsc::Sender<TemperatureAlert>,
}

impl AlertSender {
    /// Queue an alert for delivery.
    ///
    /// Never blocks: when the queue is full or the worker is gone the
    /// alert is dropped with a warning. Alerting is best-effort and must
    /// not delay ingestion of the next reading.
    pub fn dispatch(&self, alert: TemperatureAlert) {
        match self.tx.try_send(alert) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(alert)) => {
                tracing::warn!(key = %alert.key(), "Alert queue full, dropping alert");
            }
            Err(mpsc::error::TrySendError::Closed(alert)) => {
                tracing::warn!(key = %alert.key(), "Notify worker gone, dropping alert");
            }
        }
    }
}

/// Consumes queued alerts and sends them by email.
pub struct NotifyWorker {
    mailer: Mailer,
}

impl NotifyWorker {
    pub fn new(mailer: Mailer) -> Self {
        Self { mailer }
    }

    /// Run the delivery loop until the queue closes or `cancel` fires.
    pub async fn run(self, mut rx: mpsc::Receiver<TemperatureAlert>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Notify worker shutting down");
                    break;
                }
                alert = rx.recv() => {
                    match alert {
                        Some(alert) => self.deliver(alert).await,
                        None => {
                            tracing::info!("Alert queue closed, notify worker exiting");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Deliver one alert; failure is logged, never propagated.
    async fn deliver(&self, alert: TemperatureAlert) {
        let subject = alert.subject();
        if let Err(e) = self.mailer.send(&subject, &alert.body()).await {
            tracing::error!(error = %e, key = %alert.key(), "Failed to send alert email");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

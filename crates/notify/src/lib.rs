//! Alert notification delivery.
//!
//! - [`EmailConfig`] / [`Mailer`] — SMTP delivery of alert emails.
//! - [`queue`] — bounded hand-off between the ingestion pipeline and the
//!   background sender worker, so a slow mail channel never delays
//!   ingestion of the next reading.

pub mod email;
pub mod queue;

pub use email::{EmailConfig, Mailer, NotifyError};
pub use queue::{channel, AlertSender, NotifyWorker, DEFAULT_QUEUE_CAPACITY};

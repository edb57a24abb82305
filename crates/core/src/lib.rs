//! Tempdog domain logic: alert model, detection, cooldown bookkeeping.
//!
//! Pure logic only — no database or network access. The monitor pipeline
//! fetches readings and configuration and passes them in.

pub mod alert;
pub mod cooldown;
pub mod detector;
pub mod error;
pub mod naming;
pub mod policy;
pub mod types;

pub use alert::{AlertKey, Direction, TemperatureAlert};
pub use cooldown::CooldownTracker;
pub use error::CoreError;
pub use policy::AlertPolicy;

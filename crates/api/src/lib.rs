//! `tempdog-api` library crate.
//!
//! Read-only JSON surface over the readings store. The monitor is the
//! only writer; this service just queries what it has persisted.

pub mod config;
pub mod error;
pub mod response;
pub mod routes;
pub mod state;

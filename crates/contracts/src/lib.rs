//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate only, never on each other's internals.
//!
//! ## Time Model
//! - Metric and telemetry timestamps are wall-clock `DateTime<Utc>`
//! - A telemetry item always carries its source metric's timestamp unchanged

mod client;
mod config;
mod error;
mod metric;
mod telemetry;
mod transport;

pub use client::*;
pub use config::*;
pub use error::*;
pub use metric::*;
pub use telemetry::*;
pub use transport::*;

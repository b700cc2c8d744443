//! Fest server wiring.
//!
//! Configuration and metrics setup for the `fest-server` binary.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod metrics;

pub use config::Config;

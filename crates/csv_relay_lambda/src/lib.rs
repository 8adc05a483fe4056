//! AWS-oriented adapters and handlers for the CSV relay.
//!
//! This crate owns runtime integration details (the Lambda handler, environment
//! configuration, tracing setup and the object source / message sink seams)
//! and drives the domain primitives from `csv_relay_core`.

pub mod adapters;
pub mod config;
pub mod error;
pub mod handlers;
pub mod telemetry;

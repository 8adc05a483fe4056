//! Shared CSV relay domain primitives.
//!
//! This crate owns the S3 notification contract, the CSV to JSON record
//! transform and the outbound message body rules. It excludes AWS SDK and
//! Lambda runtime concerns, which live in `csv_relay_lambda`.

pub mod message;
pub mod notification;
pub mod transform;

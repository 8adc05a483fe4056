use csv_relay_core::message::MessageError;
use csv_relay_core::notification::EventError;
use csv_relay_core::transform::TransformError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Event(#[from] EventError),
    #[error("failed to read s3://{bucket}/{key}: {reason}")]
    Fetch {
        bucket: String,
        key: String,
        reason: String,
    },
    #[error("failed to convert s3://{bucket}/{key} to JSON: {source}")]
    Transform {
        bucket: String,
        key: String,
        source: TransformError,
    },
    #[error("failed to build message for s3://{bucket}/{key}: {source}")]
    Message {
        bucket: String,
        key: String,
        source: MessageError,
    },
    #[error("failed to enqueue s3://{bucket}/{key} to {queue_url}: {reason}")]
    Enqueue {
        queue_url: String,
        bucket: String,
        key: String,
        reason: String,
    },
}

impl RelayError {
    /// Short machine-readable kind for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Event(_) => "invalid_event",
            Self::Fetch { .. } => "fetch_failed",
            Self::Transform { .. } => "transform_failed",
            Self::Message { .. } => "message_rejected",
            Self::Enqueue { .. } => "enqueue_failed",
        }
    }
}

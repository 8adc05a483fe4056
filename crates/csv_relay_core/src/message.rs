use std::collections::BTreeMap;

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::notification::ObjectRef;
use crate::transform::{records_to_json, Record};

/// SQS rejects messages above 256 KiB, body and attributes together.
pub const MAX_MESSAGE_BYTES: usize = 262_144;
pub const FIFO_QUEUE_SUFFIX: &str = ".fifo";
pub const ATTRIBUTE_DATA_TYPE: &str = "String";

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("message is {size} bytes, over the {limit} byte queue limit")]
    TooLarge { size: usize, limit: usize },
}

/// A JSON array of records that fits in a single queue message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBody {
    text: String,
    record_count: usize,
}

impl MessageBody {
    pub fn render(records: &[Record], indent: Option<usize>) -> Result<Self, MessageError> {
        let body = Self {
            text: records_to_json(records, indent)?,
            record_count: records.len(),
        };
        body.ensure_fits(0)?;
        Ok(body)
    }

    /// Checks the body plus `attribute_bytes` of message attributes against
    /// the queue limit.
    pub fn ensure_fits(&self, attribute_bytes: usize) -> Result<(), MessageError> {
        let size = self.text.len() + attribute_bytes;
        if size > MAX_MESSAGE_BYTES {
            return Err(MessageError::TooLarge {
                size,
                limit: MAX_MESSAGE_BYTES,
            });
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

/// Size SQS charges for string attributes: name, data type and value of each.
pub fn attribute_bytes(attributes: &BTreeMap<String, String>) -> usize {
    attributes
        .iter()
        .map(|(name, value)| name.len() + ATTRIBUTE_DATA_TYPE.len() + value.len())
        .sum()
}

pub fn is_fifo_queue(queue_url: &str) -> bool {
    queue_url.trim_end_matches('/').ends_with(FIFO_QUEUE_SUFFIX)
}

pub fn deduplication_id(object: &ObjectRef, body: &MessageBody) -> String {
    let mut hasher = Sha256::new();
    for part in [
        object.bucket.as_str(),
        object.key.as_str(),
        object.etag.as_deref().unwrap_or_default(),
        body.as_str(),
    ] {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

use std::fmt;

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const OBJECT_CREATED_PREFIX: &str = "ObjectCreated:";
pub const TEST_EVENT_NAME: &str = "s3:TestEvent";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("notification payload must be a JSON object")]
    NotAnObject,
    #[error("malformed S3 notification: {0}")]
    Malformed(String),
    #[error("record {index} has an empty bucket name")]
    EmptyBucket { index: usize },
    #[error("record {index} has an empty object key")]
    EmptyKey { index: usize },
    #[error("record {index} object key `{key}` does not decode to UTF-8")]
    KeyDecode { index: usize, key: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    /// Sent by S3 once when a bucket notification is configured.
    TestEvent { bucket: Option<String> },
    Records(S3Event),
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct S3Event {
    #[serde(rename = "Records")]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct S3EventRecord {
    pub event_name: Option<String>,
    pub event_source: Option<String>,
    pub aws_region: Option<String>,
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct S3Object {
    /// Form-urlencoded, as delivered by S3.
    pub key: String,
    pub size: Option<u64>,
    #[serde(rename = "eTag")]
    pub etag: Option<String>,
    pub sequencer: Option<String>,
}

/// A decoded reference to one object named by a notification record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
    pub size: Option<u64>,
    pub etag: Option<String>,
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

pub fn parse_event(event: Value) -> Result<NotificationEvent, EventError> {
    let Some(object) = event.as_object() else {
        return Err(EventError::NotAnObject);
    };

    if object.get("Event").and_then(Value::as_str) == Some(TEST_EVENT_NAME) {
        let bucket = object
            .get("Bucket")
            .and_then(Value::as_str)
            .map(str::to_string);
        return Ok(NotificationEvent::TestEvent { bucket });
    }

    if !object.get("Records").is_some_and(Value::is_array) {
        return Err(EventError::Malformed(
            "notification must include a Records array".to_string(),
        ));
    }

    serde_json::from_value::<S3Event>(event)
        .map(NotificationEvent::Records)
        .map_err(|error| EventError::Malformed(error.to_string()))
}

impl S3Event {
    /// Object-created records in notification order; other event types are skipped.
    pub fn object_refs(&self) -> Result<Vec<ObjectRef>, EventError> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.is_object_created())
            .map(|(index, record)| record.object_ref(index))
            .collect()
    }
}

impl S3EventRecord {
    pub fn is_object_created(&self) -> bool {
        self.event_name
            .as_deref()
            .is_none_or(|name| name.starts_with(OBJECT_CREATED_PREFIX))
    }

    pub fn object_ref(&self, index: usize) -> Result<ObjectRef, EventError> {
        let bucket = self.s3.bucket.name.trim();
        if bucket.is_empty() {
            return Err(EventError::EmptyBucket { index });
        }

        let raw_key = &self.s3.object.key;
        if raw_key.is_empty() {
            return Err(EventError::EmptyKey { index });
        }

        let key = decode_object_key(raw_key).ok_or_else(|| EventError::KeyDecode {
            index,
            key: raw_key.clone(),
        })?;

        Ok(ObjectRef {
            bucket: bucket.to_string(),
            key,
            size: self.s3.object.size,
            etag: self.s3.object.etag.clone(),
        })
    }
}

/// S3 encodes notification keys as `application/x-www-form-urlencoded`, so a
/// literal `+` in the key arrives as `%2B` and `+` means space.
pub fn decode_object_key(raw_key: &str) -> Option<String> {
    let spaced = raw_key.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .ok()
        .map(|key| key.into_owned())
}

use std::collections::BTreeMap;
use std::time::Instant;

use csv_relay_core::message::{
    attribute_bytes, deduplication_id, is_fifo_queue, MessageBody, MessageError,
};
use csv_relay_core::notification::{parse_event, NotificationEvent, ObjectRef};
use csv_relay_core::transform::csv_to_records;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::adapters::message_sink::{MessageSink, OutboundMessage};
use crate::adapters::object_source::ObjectSource;
use crate::config::RelayConfig;
use crate::error::RelayError;

const COMPONENT: &str = "relay_handler";

pub const STATUS_RELAYED: &str = "relayed";
pub const STATUS_IGNORED: &str = "ignored";

pub const ATTRIBUTE_SOURCE_BUCKET: &str = "source_bucket";
pub const ATTRIBUTE_SOURCE_KEY: &str = "source_key";
pub const ATTRIBUTE_RECORD_COUNT: &str = "record_count";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    pub request_id: String,
    pub received_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelayedObject {
    pub bucket: String,
    pub key: String,
    pub record_count: usize,
    pub body_bytes: usize,
    pub message_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelaySummary {
    pub status: String,
    pub request_id: String,
    pub received_at: String,
    pub objects: Vec<RelayedObject>,
    pub skipped_records: usize,
}

/// Relays every object-created record in `event`, one queue message per
/// object, stopping at the first failure.
pub fn handle_s3_event(
    event: Value,
    config: &RelayConfig,
    context: &InvocationContext,
    source: &impl ObjectSource,
    sink: &impl MessageSink,
) -> Result<RelaySummary, RelayError> {
    let started_at = Instant::now();

    let event = match parse_event(event) {
        Ok(NotificationEvent::Records(event)) => event,
        Ok(NotificationEvent::TestEvent { bucket }) => {
            info!(
                component = COMPONENT,
                request_id = %context.request_id,
                bucket = bucket.as_deref().unwrap_or_default(),
                "s3 test event acknowledged"
            );
            return Ok(summary(context, STATUS_IGNORED, Vec::new(), 0));
        }
        Err(event_error) => {
            error!(
                component = COMPONENT,
                request_id = %context.request_id,
                error = %event_error,
                "invalid notification"
            );
            return Err(event_error.into());
        }
    };

    let objects = event.object_refs()?;
    let skipped_records = event.records.len() - objects.len();
    if skipped_records > 0 {
        info!(
            component = COMPONENT,
            request_id = %context.request_id,
            skipped_records,
            "skipping records that are not object-created events"
        );
    }

    let mut relayed = Vec::with_capacity(objects.len());
    for object in &objects {
        match relay_object(object, config, source, sink) {
            Ok(result) => relayed.push(result),
            Err(relay_error) => {
                error!(
                    component = COMPONENT,
                    request_id = %context.request_id,
                    bucket = %object.bucket,
                    key = %object.key,
                    kind = relay_error.kind(),
                    objects_relayed = relayed.len(),
                    error = %relay_error,
                    "object relay failed"
                );
                return Err(relay_error);
            }
        }
    }

    info!(
        component = COMPONENT,
        request_id = %context.request_id,
        objects_relayed = relayed.len(),
        duration_ms = started_at.elapsed().as_millis() as u64,
        "notification relayed"
    );
    Ok(summary(context, STATUS_RELAYED, relayed, skipped_records))
}

pub fn relay_object(
    object: &ObjectRef,
    config: &RelayConfig,
    source: &impl ObjectSource,
    sink: &impl MessageSink,
) -> Result<RelayedObject, RelayError> {
    info!(
        component = COMPONENT,
        bucket = %object.bucket,
        key = %object.key,
        size = ?object.size,
        "fetching object"
    );

    let bytes = source
        .fetch_object(object)
        .map_err(|reason| RelayError::Fetch {
            bucket: object.bucket.clone(),
            key: object.key.clone(),
            reason,
        })?;

    let records =
        csv_to_records(&bytes, &config.transform).map_err(|source| RelayError::Transform {
            bucket: object.bucket.clone(),
            key: object.key.clone(),
            source,
        })?;

    let body =
        MessageBody::render(&records, config.json_indent).map_err(|source| RelayError::Message {
            bucket: object.bucket.clone(),
            key: object.key.clone(),
            source,
        })?;
    let record_count = body.record_count();
    let body_bytes = body.len();

    let message =
        build_outbound_message(object, body, config).map_err(|source| RelayError::Message {
            bucket: object.bucket.clone(),
            key: object.key.clone(),
            source,
        })?;
    let message_id = sink
        .send_message(&message)
        .map_err(|reason| RelayError::Enqueue {
            queue_url: config.queue_url.clone(),
            bucket: object.bucket.clone(),
            key: object.key.clone(),
            reason,
        })?;

    info!(
        component = COMPONENT,
        bucket = %object.bucket,
        key = %object.key,
        record_count,
        body_bytes,
        message_id = %message_id,
        "object relayed"
    );

    Ok(RelayedObject {
        bucket: object.bucket.clone(),
        key: object.key.clone(),
        record_count,
        body_bytes,
        message_id,
    })
}

pub fn build_outbound_message(
    object: &ObjectRef,
    body: MessageBody,
    config: &RelayConfig,
) -> Result<OutboundMessage, MessageError> {
    let attributes = BTreeMap::from([
        (ATTRIBUTE_SOURCE_BUCKET.to_string(), object.bucket.clone()),
        (ATTRIBUTE_SOURCE_KEY.to_string(), object.key.clone()),
        (
            ATTRIBUTE_RECORD_COUNT.to_string(),
            body.record_count().to_string(),
        ),
    ]);
    body.ensure_fits(attribute_bytes(&attributes))?;

    let (group_id, dedup_id) = if is_fifo_queue(&config.queue_url) {
        (
            Some(config.message_group_id.clone()),
            Some(deduplication_id(object, &body)),
        )
    } else {
        (None, None)
    };

    Ok(OutboundMessage {
        queue_url: config.queue_url.clone(),
        body: body.into_string(),
        attributes,
        group_id,
        deduplication_id: dedup_id,
    })
}

fn summary(
    context: &InvocationContext,
    status: &str,
    objects: Vec<RelayedObject>,
    skipped_records: usize,
) -> RelaySummary {
    RelaySummary {
        status: status.to_string(),
        request_id: context.request_id.clone(),
        received_at: context.received_at.clone(),
        objects,
        skipped_records,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use csv_relay_core::message::MAX_MESSAGE_BYTES;
    use csv_relay_core::transform::TransformOptions;
    use serde_json::json;

    use super::*;

    const QUEUE_URL: &str = "https://sqs.eu-west-1.amazonaws.com/123456789012/rows";

    struct StaticSource {
        body: &'static [u8],
    }

    impl ObjectSource for StaticSource {
        fn fetch_object(&self, _object: &ObjectRef) -> Result<Vec<u8>, String> {
            Ok(self.body.to_vec())
        }
    }

    struct CapturingSink {
        messages: Mutex<Vec<OutboundMessage>>,
    }

    impl CapturingSink {
        fn new() -> Self {
            Self {
                messages: Mutex::new(Vec::new()),
            }
        }

        fn messages(&self) -> Vec<OutboundMessage> {
            self.messages.lock().expect("poisoned mutex").clone()
        }
    }

    impl MessageSink for CapturingSink {
        fn send_message(&self, message: &OutboundMessage) -> Result<String, String> {
            let mut messages = self.messages.lock().expect("poisoned mutex");
            messages.push(message.clone());
            Ok(format!("message-{}", messages.len()))
        }
    }

    fn context() -> InvocationContext {
        InvocationContext {
            request_id: "req-1".to_string(),
            received_at: "2026-10-17T10:00:00+00:00".to_string(),
        }
    }

    fn object() -> ObjectRef {
        ObjectRef {
            bucket: "uploads".to_string(),
            key: "daily/report.csv".to_string(),
            size: Some(24),
            etag: Some("0123abcd".to_string()),
        }
    }

    fn body(csv: &str) -> MessageBody {
        let records =
            csv_to_records(csv.as_bytes(), &TransformOptions::default()).expect("csv converts");
        MessageBody::render(&records, None).expect("body renders")
    }

    #[test]
    fn standard_queue_message_carries_source_attributes_only() {
        let message =
            build_outbound_message(&object(), body("a\n1\n2\n"), &RelayConfig::new(QUEUE_URL))
                .expect("message should fit");

        assert_eq!(message.queue_url, QUEUE_URL);
        assert_eq!(message.body, r#"[{"a":"1"},{"a":"2"}]"#);
        assert_eq!(message.attributes["source_bucket"], "uploads");
        assert_eq!(message.attributes["source_key"], "daily/report.csv");
        assert_eq!(message.attributes["record_count"], "2");
        assert_eq!(message.group_id, None);
        assert_eq!(message.deduplication_id, None);
    }

    #[test]
    fn fifo_queue_message_carries_group_and_deduplication_ids() {
        let config = RelayConfig::new(format!("{QUEUE_URL}.fifo"));
        let message = build_outbound_message(&object(), body("a\n1\n"), &config)
            .expect("message should fit");

        assert_eq!(message.group_id.as_deref(), Some("csv-relay"));
        assert_eq!(
            message.deduplication_id,
            Some(deduplication_id(&object(), &body("a\n1\n")))
        );
    }

    #[test]
    fn attributes_count_toward_the_message_limit() {
        let csv = format!("p\n{}\n", "x".repeat(MAX_MESSAGE_BYTES - 10));
        let full = body(&csv);
        assert_eq!(full.len(), MAX_MESSAGE_BYTES);

        let error = build_outbound_message(&object(), full, &RelayConfig::new(QUEUE_URL))
            .expect_err("body at the limit leaves no room for attributes");
        match error {
            MessageError::TooLarge { size, limit } => {
                assert_eq!(limit, MAX_MESSAGE_BYTES);
                assert!(size > MAX_MESSAGE_BYTES);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn relays_object_as_single_json_array_message() {
        let sink = CapturingSink::new();
        let source = StaticSource {
            body: b"id,name\n1,Ada\n2,Grace\n",
        };

        let summary = handle_s3_event(
            json!({
                "Records": [{
                    "eventName": "ObjectCreated:Put",
                    "s3": {"bucket": {"name": "uploads"}, "object": {"key": "people.csv"}}
                }]
            }),
            &RelayConfig::new(QUEUE_URL),
            &context(),
            &source,
            &sink,
        )
        .expect("relay should succeed");

        assert_eq!(summary.status, STATUS_RELAYED);
        assert_eq!(summary.request_id, "req-1");
        assert_eq!(summary.objects.len(), 1);
        assert_eq!(summary.objects[0].record_count, 2);
        assert_eq!(summary.objects[0].message_id, "message-1");

        let messages = sink.messages();
        assert_eq!(messages.len(), 1);
        let parsed: Value = serde_json::from_str(&messages[0].body).expect("body is JSON");
        assert_eq!(
            parsed,
            json!([{"id": "1", "name": "Ada"}, {"id": "2", "name": "Grace"}])
        );
        assert_eq!(summary.objects[0].body_bytes, messages[0].body.len());
    }

    #[test]
    fn test_event_is_acknowledged_without_sending() {
        let sink = CapturingSink::new();
        let summary = handle_s3_event(
            json!({"Service": "Amazon S3", "Event": "s3:TestEvent", "Bucket": "uploads"}),
            &RelayConfig::new(QUEUE_URL),
            &context(),
            &StaticSource { body: b"" },
            &sink,
        )
        .expect("test event should be acknowledged");

        assert_eq!(summary.status, STATUS_IGNORED);
        assert!(summary.objects.is_empty());
        assert!(sink.messages().is_empty());
    }

    #[test]
    fn malformed_event_fails_without_sending() {
        let sink = CapturingSink::new();
        let error = handle_s3_event(
            json!({"Records": "not-an-array"}),
            &RelayConfig::new(QUEUE_URL),
            &context(),
            &StaticSource { body: b"a\n1\n" },
            &sink,
        )
        .expect_err("malformed event should fail");

        assert_eq!(error.kind(), "invalid_event");
        assert!(sink.messages().is_empty());
    }
}

use serde_json::{json, Value};

pub const QUEUE_URL: &str = "https://sqs.eu-west-1.amazonaws.com/123456789012/csv-rows";
pub const FIFO_QUEUE_URL: &str = "https://sqs.eu-west-1.amazonaws.com/123456789012/csv-rows.fifo";

/// One notification record shaped like the ones S3 delivers.
pub fn s3_record(event_name: &str, bucket: &str, key: &str) -> Value {
    json!({
        "eventVersion": "2.1",
        "eventSource": "aws:s3",
        "awsRegion": "eu-west-1",
        "eventTime": "2026-10-17T09:58:12.345Z",
        "eventName": event_name,
        "userIdentity": {"principalId": "AWS:AIDAEXAMPLE"},
        "requestParameters": {"sourceIPAddress": "203.0.113.10"},
        "responseElements": {
            "x-amz-request-id": "C3D13FE58DE4C810",
            "x-amz-id-2": "FMyUVURIY8/IgAtTv8xRjskZQpcIZ9KG4V5Wp6S7S/JRWeUWerMUE5JgHvANOjpD"
        },
        "s3": {
            "s3SchemaVersion": "1.0",
            "configurationId": "csv-uploads",
            "bucket": {
                "name": bucket,
                "ownerIdentity": {"principalId": "A3NL1KOZZKExample"},
                "arn": format!("arn:aws:s3:::{bucket}")
            },
            "object": {
                "key": key,
                "size": 1024,
                "eTag": "d41d8cd98f00b204e9800998ecf8427e",
                "sequencer": "0055AED6DCD90281E5"
            }
        }
    })
}

pub fn created(bucket: &str, key: &str) -> Value {
    s3_record("ObjectCreated:Put", bucket, key)
}

pub fn notification(records: Vec<Value>) -> Value {
    json!({ "Records": records })
}

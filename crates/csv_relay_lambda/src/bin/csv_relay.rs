use aws_sdk_sqs::types::MessageAttributeValue;
use chrono::Utc;
use csv_relay_core::message::ATTRIBUTE_DATA_TYPE;
use csv_relay_core::notification::ObjectRef;
use csv_relay_lambda::adapters::message_sink::{MessageSink, OutboundMessage};
use csv_relay_lambda::adapters::object_source::ObjectSource;
use csv_relay_lambda::config::RelayConfig;
use csv_relay_lambda::handlers::relay::{handle_s3_event, InvocationContext, RelaySummary};
use csv_relay_lambda::telemetry::init_tracing;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::info;

struct S3ObjectSource {
    s3_client: aws_sdk_s3::Client,
}

impl ObjectSource for S3ObjectSource {
    fn fetch_object(&self, object: &ObjectRef) -> Result<Vec<u8>, String> {
        let bucket = object.bucket.clone();
        let object_key = object.key.clone();
        let client = self.s3_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = match client
                    .get_object()
                    .bucket(bucket)
                    .key(object_key)
                    .send()
                    .await
                {
                    Ok(output) => output,
                    Err(error) => {
                        return Err(format!(
                            "failed to read object from s3: {}",
                            aws_sdk_s3::error::DisplayErrorContext(&error)
                        ));
                    }
                };
                output
                    .body
                    .collect()
                    .await
                    .map(|body| body.into_bytes().to_vec())
                    .map_err(|error| format!("failed to stream object body: {error}"))
            })
        })
    }
}

struct SqsMessageSink {
    sqs_client: aws_sdk_sqs::Client,
}

impl MessageSink for SqsMessageSink {
    fn send_message(&self, message: &OutboundMessage) -> Result<String, String> {
        let message = message.clone();
        let client = self.sqs_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let mut request = client
                    .send_message()
                    .queue_url(message.queue_url)
                    .message_body(message.body)
                    .set_message_group_id(message.group_id)
                    .set_message_deduplication_id(message.deduplication_id);

                for (name, value) in message.attributes {
                    let attribute = match MessageAttributeValue::builder()
                        .data_type(ATTRIBUTE_DATA_TYPE)
                        .string_value(value)
                        .build()
                    {
                        Ok(attribute) => attribute,
                        Err(error) => {
                            return Err(format!("invalid message attribute {name}: {error}"));
                        }
                    };
                    request = request.message_attributes(name, attribute);
                }

                request
                    .send()
                    .await
                    .map(|output| output.message_id().unwrap_or_default().to_string())
                    .map_err(|error| {
                        format!(
                            "failed to enqueue message: {}",
                            aws_sdk_sqs::error::DisplayErrorContext(&error)
                        )
                    })
            })
        })
    }
}

struct RuntimeDependencies {
    config: RelayConfig,
    source: S3ObjectSource,
    sink: SqsMessageSink,
}

fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<RelaySummary, Error> {
    let context = InvocationContext {
        request_id: event.context.request_id.clone(),
        received_at: Utc::now().to_rfc3339(),
    };

    handle_s3_event(
        event.payload,
        &deps.config,
        &context,
        &deps.source,
        &deps.sink,
    )
    .map_err(Error::from)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = RelayConfig::from_env()?;
    info!(
        component = "runtime",
        queue_url = %config.queue_url,
        json_indent = ?config.json_indent,
        "csv relay starting"
    );

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = RuntimeDependencies {
        config,
        source: S3ObjectSource {
            s3_client: aws_sdk_s3::Client::new(&aws_config),
        },
        sink: SqsMessageSink {
            sqs_client: aws_sdk_sqs::Client::new(&aws_config),
        },
    };
    let deps = &deps;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(event, deps)
    }))
    .await
}

use std::collections::HashMap;
use std::sync::Mutex;

use csv_relay_core::notification::ObjectRef;
use csv_relay_lambda::adapters::message_sink::{MessageSink, OutboundMessage};
use csv_relay_lambda::adapters::object_source::ObjectSource;
use csv_relay_lambda::handlers::relay::InvocationContext;

/// In-memory bucket contents keyed by (bucket, key).
#[derive(Default)]
pub struct InMemoryObjects {
    objects: HashMap<(String, String), Vec<u8>>,
    fetched: Mutex<Vec<ObjectRef>>,
}

impl InMemoryObjects {
    pub fn with_object(mut self, bucket: &str, key: &str, body: impl Into<Vec<u8>>) -> Self {
        self.objects
            .insert((bucket.to_string(), key.to_string()), body.into());
        self
    }

    pub fn fetched(&self) -> Vec<ObjectRef> {
        self.fetched.lock().expect("poisoned mutex").clone()
    }
}

impl ObjectSource for InMemoryObjects {
    fn fetch_object(&self, object: &ObjectRef) -> Result<Vec<u8>, String> {
        self.fetched
            .lock()
            .expect("poisoned mutex")
            .push(object.clone());
        self.objects
            .get(&(object.bucket.clone(), object.key.clone()))
            .cloned()
            .ok_or_else(|| "NoSuchKey: The specified key does not exist.".to_string())
    }
}

#[derive(Default)]
pub struct CapturingSink {
    messages: Mutex<Vec<OutboundMessage>>,
    fail_with: Option<String>,
}

impl CapturingSink {
    pub fn failing(reason: &str) -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            fail_with: Some(reason.to_string()),
        }
    }

    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.messages.lock().expect("poisoned mutex").clone()
    }
}

impl MessageSink for CapturingSink {
    fn send_message(&self, message: &OutboundMessage) -> Result<String, String> {
        if let Some(reason) = &self.fail_with {
            return Err(reason.clone());
        }
        let mut messages = self.messages.lock().expect("poisoned mutex");
        messages.push(message.clone());
        Ok(format!("0b5e6a1c-0000-4000-8000-{:012}", messages.len()))
    }
}

pub fn invocation() -> InvocationContext {
    InvocationContext {
        request_id: "8f5c1c3e-2a9b-4d7e-9f1a-6c2b3d4e5f60".to_string(),
        received_at: "2026-10-17T09:58:13+00:00".to_string(),
    }
}

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub queue_url: String,
    pub body: String,
    pub attributes: BTreeMap<String, String>,
    /// Set only for FIFO queues.
    pub group_id: Option<String>,
    pub deduplication_id: Option<String>,
}

pub trait MessageSink {
    /// Enqueues one message and returns the id the queue assigned to it.
    fn send_message(&self, message: &OutboundMessage) -> Result<String, String>;
}

pub mod message_sink;
pub mod object_source;

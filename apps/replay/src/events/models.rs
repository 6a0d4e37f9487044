use serde::{Deserialize, Serialize};

/// One event record as stored in the event store's JSON message body.
/// Only the two fields the pipeline reads are modelled; anything else in the
/// message is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawEvent {
    pub event_type: String,
    pub timestamp: String,
}

impl RawEvent {
    pub fn new(event_type: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp: timestamp.into(),
        }
    }
}

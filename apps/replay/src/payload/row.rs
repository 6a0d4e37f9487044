use chrono::{DateTime, Utc};

use crate::events::{encode_event, RecognizedEvent};

/// A member together with its encoded event tokens, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub member_id: String,
    pub tokens: Vec<String>,
    /// How many tokens carry the encoding time instead of the event time.
    pub timestamp_fallbacks: usize,
}

impl Row {
    /// The `[memberId, tokens]` pair placed in a payload's `rows`.
    pub fn into_wire(self) -> (String, Vec<String>) {
        (self.member_id, self.tokens)
    }
}

/// Encodes each event in order. No sorting or deduplication.
pub fn build_row(member_id: &str, events: &[RecognizedEvent]) -> Row {
    build_row_at(member_id, events, Utc::now())
}

/// Same as [`build_row`] with an explicit fallback instant for bad timestamps.
pub fn build_row_at(member_id: &str, events: &[RecognizedEvent], now: DateTime<Utc>) -> Row {
    let mut timestamp_fallbacks = 0;
    let tokens = events
        .iter()
        .map(|event| {
            let token = encode_event(event.raw(), now);
            if token.used_fallback {
                timestamp_fallbacks += 1;
            }
            token.to_string()
        })
        .collect();

    Row {
        member_id: member_id.to_string(),
        tokens,
        timestamp_fallbacks,
    }
}

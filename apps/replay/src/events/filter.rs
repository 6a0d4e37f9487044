//! Recognized event vocabulary.
//!
//! Membership is an exact, case-sensitive string match. Compound labels such
//! as `open|glance|visit` are single opaque members; they are never split on
//! `|` or treated as patterns.

use crate::events::models::RawEvent;

/// Every event type the scoring service understands.
pub const RECOGNIZED_EVENT_TYPES: [&str; 10] = [
    "pageview",
    "cart_add",
    "conversion",
    "open|glance|visit",
    "open|glance",
    "open|visit",
    "skim",
    "read",
    "click",
    "click|u_click",
];

pub fn is_recognized(event_type: &str) -> bool {
    RECOGNIZED_EVENT_TYPES.contains(&event_type)
}

/// A raw event whose type is in [`RECOGNIZED_EVENT_TYPES`]. Only constructible
/// through the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedEvent(RawEvent);

impl RecognizedEvent {
    pub fn new(event: RawEvent) -> Option<Self> {
        is_recognized(&event.event_type).then_some(Self(event))
    }

    pub fn raw(&self) -> &RawEvent {
        &self.0
    }
}

/// Keeps recognized events in their original order. Unrecognized events are
/// dropped without being reported.
pub fn retain_recognized(events: Vec<RawEvent>) -> Vec<RecognizedEvent> {
    events.into_iter().filter_map(RecognizedEvent::new).collect()
}

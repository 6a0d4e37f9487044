// Event shaping: vocabulary filter, token encoding, raw event model.
// Everything here is pure; retrieval lives in `stores`.

pub mod encoder;
pub mod filter;
pub mod models;

pub use encoder::encode_event;
pub use filter::{retain_recognized, RecognizedEvent};
pub use models::RawEvent;

// Pipeline driver: cohort -> events -> filter -> rows -> payloads -> scoring.
// Strictly sequential; one member (or one batch) in flight at a time.

pub mod driver;
pub mod summary;

pub use driver::{Pipeline, RunOptions};

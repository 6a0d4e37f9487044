// Row and payload construction for the scoring service's transform endpoint.

pub mod row;
pub mod schema;

pub use row::{build_row, Row};
pub use schema::encode_payload;

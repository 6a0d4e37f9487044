//! Wire payload for the transform endpoint.
//!
//! ```json
//! { "schema": { "fields": [ {"name":"user_uuid","type":"string"},
//!                           {"name":"events","type":{"type":"list","base":"string"}} ] },
//!   "rows": [ [ "<memberId>", ["<epoch>;<type>", ...] ] ] }
//! ```

use serde::{Deserialize, Serialize};

use crate::payload::row::Row;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchemaDescriptor {
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldType {
    Scalar(String),
    Complex {
        #[serde(rename = "type")]
        kind: String,
        base: String,
    },
}

impl SchemaDescriptor {
    /// The fixed `user_uuid: string, events: list<string>` shape. Every payload
    /// carries this exact value.
    pub fn member_events() -> Self {
        Self {
            fields: vec![
                Field {
                    name: "user_uuid".to_string(),
                    field_type: FieldType::Scalar("string".to_string()),
                },
                Field {
                    name: "events".to_string(),
                    field_type: FieldType::Complex {
                        kind: "list".to_string(),
                        base: "string".to_string(),
                    },
                },
            ],
        }
    }
}

/// A request body for the scoring service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payload {
    pub schema: SchemaDescriptor,
    pub rows: Vec<(String, Vec<String>)>,
}

impl Payload {
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Wraps rows in the fixed schema, one entry per row, in the given order.
pub fn encode_payload(rows: Vec<Row>) -> Payload {
    Payload {
        schema: SchemaDescriptor::member_events(),
        rows: rows.into_iter().map(Row::into_wire).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(member_id: &str, tokens: &[&str]) -> Row {
        Row {
            member_id: member_id.to_string(),
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            timestamp_fallbacks: 0,
        }
    }

    #[test]
    fn test_wire_shape() {
        let payload = encode_payload(vec![row(
            "u1",
            &["1488914521;pageview", "1483228799;open|glance"],
        )]);
        let value: serde_json::Value =
            serde_json::from_slice(&payload.to_json_bytes().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "schema": {
                    "fields": [
                        {"name": "user_uuid", "type": "string"},
                        {"name": "events", "type": {"type": "list", "base": "string"}}
                    ]
                },
                "rows": [["u1", ["1488914521;pageview", "1483228799;open|glance"]]]
            })
        );
    }

    #[test]
    fn test_decoding_recovers_member_and_tokens() {
        let payload = encode_payload(vec![row("u1", &["1;click", "2;read", "1;click"])]);
        let decoded: Payload = serde_json::from_slice(&payload.to_json_bytes().unwrap()).unwrap();
        assert_eq!(decoded.schema, SchemaDescriptor::member_events());
        assert_eq!(
            decoded.rows,
            vec![(
                "u1".to_string(),
                vec!["1;click".to_string(), "2;read".to_string(), "1;click".to_string()]
            )]
        );
    }

    #[test]
    fn test_empty_row_is_kept() {
        let payload = encode_payload(vec![row("u2", &[])]);
        let value: serde_json::Value =
            serde_json::from_slice(&payload.to_json_bytes().unwrap()).unwrap();
        assert_eq!(value["rows"], json!([["u2", []]]));
    }

    #[test]
    fn test_multiple_rows_keep_order() {
        let payload = encode_payload(vec![
            row("b", &["1;click"]),
            row("a", &[]),
            row("c", &["2;read"]),
        ]);
        let members: Vec<_> = payload.rows.iter().map(|(m, _)| m.as_str()).collect();
        assert_eq!(members, vec!["b", "a", "c"]);
    }
}

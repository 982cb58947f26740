//! Firestore REST wire structs used by the `commit` call.

use std::collections::BTreeMap;

use rand::{distr::Alphanumeric, rng, Rng};
use serde::Serialize;

/// Length of the document ids Firestore generates itself.
pub const AUTO_ID_LEN: usize = 20;

/// Generates a random alphanumeric document id.
pub fn auto_id() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(AUTO_ID_LEN)
        .map(char::from)
        .collect()
}

// ###################################
// ->   STRUCTS
// ###################################
#[derive(Debug, Serialize)]
pub struct CommitRequest {
    pub writes: Vec<Write>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Write {
    pub update: Document,
    pub update_transforms: Vec<FieldTransform>,
    pub current_document: Precondition,
}

#[derive(Debug, Serialize)]
pub struct Document {
    pub name: String,
    pub fields: BTreeMap<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    StringValue(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldTransform {
    pub field_path: String,
    pub set_to_server_value: ServerValue,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerValue {
    RequestTime,
}

#[derive(Debug, Serialize)]
pub struct Precondition {
    pub exists: bool,
}

/// Where a document ended up after a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub collection: String,
    pub id: String,
    /// Full resource name: `projects/{p}/databases/{db}/documents/{collection}/{id}`
    pub name: String,
}

// ###################################
// ->   IMPLs
// ###################################
impl Write {
    /// A write that only succeeds if the document doesn't exist yet, with `timestamp_field`
    /// set to the time the store received the request.
    pub fn create_with_server_timestamp<'a>(
        name: String,
        fields: impl IntoIterator<Item = (&'a str, &'a str)>,
        timestamp_field: &str,
    ) -> Self {
        let fields = fields
            .into_iter()
            .map(|(key, val)| (key.to_string(), Value::StringValue(val.to_string())))
            .collect();

        Write {
            update: Document { name, fields },
            update_transforms: vec![FieldTransform {
                field_path: timestamp_field.to_string(),
                set_to_server_value: ServerValue::RequestTime,
            }],
            current_document: Precondition { exists: false },
        }
    }
}

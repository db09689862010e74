use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Name of the identifier field in persisted and transported records.
pub const ID_FIELD: &str = "id";

/// A user record: a server-assigned identifier plus whatever fields the client sent.
///
/// Serialized flat, `id` first and the remaining fields in insertion order:
/// `{"id":"…","name":"Ann","email":"ann@example.com"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl User {
    /// Build a record from client fields; a client-supplied `id` is discarded.
    pub fn new(id: Uuid, mut fields: Map<String, Value>) -> Self {
        fields.remove(ID_FIELD);
        Self { id, fields }
    }

    /// Shallow merge: patch values overwrite existing keys, `id` is never touched.
    pub fn merge(&mut self, patch: Map<String, Value>) {
        for (key, value) in patch {
            if key == ID_FIELD {
                continue;
            }
            self.fields.insert(key, value);
        }
    }
}

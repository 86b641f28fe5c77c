//! Edit protocol wire types.
//!
//! A caller sends an [`EditPayload`] naming the version its operations were
//! computed against. The timeline answers with [`EditResponse::Ok`] carrying
//! the bumped version, or [`EditResponse::Conflict`] carrying the version the
//! caller must resynchronize to.

use serde::{Deserialize, Serialize};

/// One text edit. Offsets are Unicode code-point counts into the document as
/// it stands after every earlier operation in the same batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextOperation {
    /// Insert `text` at `position`.
    Insert { position: usize, text: String },
    /// Remove the half-open range `start_position..end_position`.
    Delete {
        start_position: usize,
        end_position: usize,
    },
}

impl TextOperation {
    pub fn insert(position: usize, text: impl Into<String>) -> Self {
        Self::Insert {
            position,
            text: text.into(),
        }
    }

    pub fn delete(start_position: usize, end_position: usize) -> Self {
        Self::Delete {
            start_position,
            end_position,
        }
    }
}

/// A batch of operations plus the version they were computed against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditPayload {
    pub base_version: u64,
    pub ops: Vec<TextOperation>,
}

/// Outcome of an edit batch that passed validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EditResponse {
    /// Batch applied; the document is now at `new_version`.
    Ok { new_version: u64 },
    /// `base_version` was stale. Refetch and retry against `server_version`.
    Conflict { server_version: u64 },
}

impl EditResponse {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Full document text paired with the version it was read at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub content: String,
    pub version: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_response_serializes_with_status_tag() {
        let response = EditResponse::Ok { new_version: 42 };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"status":"ok","new_version":42}"#);

        let conflict: EditResponse =
            serde_json::from_str(r#"{"status":"conflict","server_version":7}"#).unwrap();
        assert!(conflict.is_conflict());
    }

    #[test]
    fn test_payload_parses_tagged_operations() {
        let json = r#"{
            "base_version": 3,
            "ops": [
                {"type": "delete", "start_position": 6, "end_position": 11},
                {"type": "insert", "position": 6, "text": "there"}
            ]
        }"#;
        let payload: EditPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.base_version, 3);
        assert_eq!(
            payload.ops,
            vec![TextOperation::delete(6, 11), TextOperation::insert(6, "there")]
        );
    }
}

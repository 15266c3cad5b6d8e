use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Server-minted identifier of a submitted task.
///
/// Treated as an opaque token: it is never parsed or built locally, only
/// echoed back to the server and persisted per channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(String);

impl TaskId {
    /// Wrap a server-provided identifier. Blank identifiers are rejected.
    pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(CoreError::InvalidTaskId("task id must not be empty"));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TaskId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_ids_are_rejected() {
        assert!(TaskId::new("").is_err());
        assert!(TaskId::new("   ").is_err());
    }

    #[test]
    fn ids_are_kept_verbatim() {
        let id = TaskId::new(" abc/42 ").unwrap();
        assert_eq!(id.as_str(), " abc/42 ");
        assert_eq!(id.to_string(), " abc/42 ");
    }

    #[test]
    fn deserializing_an_empty_id_fails() {
        assert!(serde_json::from_str::<TaskId>(r#""""#).is_err());
        let id: TaskId = serde_json::from_str(r#""abc""#).unwrap();
        assert_eq!(id.as_str(), "abc");
    }
}

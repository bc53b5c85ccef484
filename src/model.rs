use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of an election process.
///
/// Stored as the Spanish labels used by the school's administration app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum ProcessStatus {
    #[serde(rename = "borrador")]
    #[sqlx(rename = "borrador")]
    Draft,
    #[serde(rename = "abierto")]
    #[sqlx(rename = "abierto")]
    Open,
    #[serde(rename = "finalizado")]
    #[sqlx(rename = "finalizado")]
    Finalized,
}

impl ProcessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessStatus::Draft => "borrador",
            ProcessStatus::Open => "abierto",
            ProcessStatus::Finalized => "finalizado",
        }
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self, ProcessStatus::Finalized)
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_finalized_is_finalized() {
        assert!(ProcessStatus::Finalized.is_finalized());
        assert!(!ProcessStatus::Open.is_finalized());
        assert!(!ProcessStatus::Draft.is_finalized());
    }

    #[test]
    fn serializes_with_stored_labels() {
        let json = serde_json::to_string(&ProcessStatus::Finalized).unwrap();
        assert_eq!(json, "\"finalizado\"");
        let parsed: ProcessStatus = serde_json::from_str("\"abierto\"").unwrap();
        assert_eq!(parsed, ProcessStatus::Open);
    }
}

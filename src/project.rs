use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::error::{Error, Result};

static PROJECT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{12}$").expect("Invalid regex"));

/// Twelve character project identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectId(String);

impl ProjectId {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if PROJECT_ID_RE.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(Error::InvalidProjectId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProjectId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ProjectId> for String {
    fn from(id: ProjectId) -> Self {
        id.0
    }
}

impl AsRef<str> for ProjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_id_validation() {
        assert!(ProjectId::parse("STEzHcB1rALV").is_ok());
        assert!(ProjectId::parse("abc_def-1234").is_ok());
        assert!(ProjectId::parse("short").is_err());
        assert!(ProjectId::parse("STEzHcB1rALV1").is_err());
        assert!(ProjectId::parse("STEzHcB1rAL!").is_err());
    }

    #[test]
    fn test_project_id_serde() {
        let id: ProjectId = serde_json::from_str("\"STEzHcB1rALV\"").unwrap();
        assert_eq!(id.as_str(), "STEzHcB1rALV");
        assert!(serde_json::from_str::<ProjectId>("\"nope\"").is_err());
    }
}

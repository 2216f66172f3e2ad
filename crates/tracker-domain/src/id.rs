//! Human-facing identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::validate::normalize_identifier;

/// Issue key of the form `<PROJECT IDENTIFIER>-<number>`, e.g. `WEB-123`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IssueKey {
    pub identifier: String,
    pub number: i32,
}

impl IssueKey {
    pub fn new(identifier: impl Into<String>, number: i32) -> Self {
        Self {
            identifier: identifier.into(),
            number,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid issue key")]
pub struct InvalidIssueKey;

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.identifier, self.number)
    }
}

impl FromStr for IssueKey {
    type Err = InvalidIssueKey;

    /// Accepts lower-case input (`web-7`); the identifier is normalized.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (identifier, number) = s.rsplit_once('-').ok_or(InvalidIssueKey)?;
        let identifier = normalize_identifier(identifier).map_err(|_| InvalidIssueKey)?;
        if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
            return Err(InvalidIssueKey);
        }
        let number: i32 = number.parse().map_err(|_| InvalidIssueKey)?;
        if number < 1 {
            return Err(InvalidIssueKey);
        }
        Ok(Self { identifier, number })
    }
}

impl Serialize for IssueKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IssueKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

//! Lifecycle enums for projects and issues.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value: {0}")]
pub struct UnknownVariant(pub String);

macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(UnknownVariant(other.to_owned())),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Archived,
    Completed,
}

string_enum!(ProjectStatus {
    Active => "active",
    Archived => "archived",
    Completed => "completed",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    #[default]
    Backlog,
    Todo,
    InProgress,
    Done,
    Canceled,
    Duplicate,
}

string_enum!(IssueStatus {
    Backlog => "backlog",
    Todo => "todo",
    InProgress => "in_progress",
    Done => "done",
    Canceled => "canceled",
    Duplicate => "duplicate",
});

impl IssueStatus {
    /// Done, canceled and duplicate issues are closed.
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Done | Self::Canceled | Self::Duplicate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssuePriority {
    #[default]
    NoPriority,
    Urgent,
    High,
    Medium,
    Low,
}

string_enum!(IssuePriority {
    NoPriority => "no_priority",
    Urgent => "urgent",
    High => "high",
    Medium => "medium",
    Low => "low",
});

impl IssuePriority {
    /// Urgency rank: urgent is highest, no priority lowest.
    pub fn rank(self) -> u8 {
        match self {
            Self::Urgent => 4,
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
            Self::NoPriority => 0,
        }
    }
}

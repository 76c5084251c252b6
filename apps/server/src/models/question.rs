//! Question, tag and identifier types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(pub i64);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Programming,
    Framework,
    Database,
    Infrastructure,
    Algorithm,
    SystemDesign,
    Network,
    Security,
    Devops,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Programming,
        Category::Framework,
        Category::Database,
        Category::Infrastructure,
        Category::Algorithm,
        Category::SystemDesign,
        Category::Network,
        Category::Security,
        Category::Devops,
    ];

    /// Stored and wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Programming => "PROGRAMMING",
            Category::Framework => "FRAMEWORK",
            Category::Database => "DATABASE",
            Category::Infrastructure => "INFRASTRUCTURE",
            Category::Algorithm => "ALGORITHM",
            Category::SystemDesign => "SYSTEM_DESIGN",
            Category::Network => "NETWORK",
            Category::Security => "SECURITY",
            Category::Devops => "DEVOPS",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| crate::Error::Validation(format!("Unknown category: {s}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub content: String,
    pub category: Category,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

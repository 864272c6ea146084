//! Shared domain types for Folio.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FolioError;

// =============================================================================
// Conversation mode
// =============================================================================

/// Conversation persona, chosen once per session.
///
/// Each mode has its own independent chain graph and system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Casual visitor: background, projects, availability.
    Basic,
    /// Technical visitor: stack, system design, engineering practice.
    Technical,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Basic, Mode::Technical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Basic => "basic",
            Mode::Technical => "technical",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" | "casual" => Ok(Mode::Basic),
            "technical" | "tech" => Ok(Mode::Technical),
            other => Err(FolioError::InvalidValue {
                field: "mode".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

// =============================================================================
// Messages
// =============================================================================

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single exchanged message in a chat session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn is_from_user(&self) -> bool {
        self.role == Role::User
    }
}

// =============================================================================
// UI preferences
// =============================================================================

/// Colour theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(FolioError::InvalidValue {
                field: "theme".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Experience mode: the themed desktop shell or the plain page layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Experience {
    #[default]
    Desktop,
    Classic,
}

impl Experience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Experience::Desktop => "desktop",
            Experience::Classic => "classic",
        }
    }
}

impl fmt::Display for Experience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Experience {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "desktop" | "os" => Ok(Experience::Desktop),
            "classic" | "simple" => Ok(Experience::Classic),
            other => Err(FolioError::InvalidValue {
                field: "experience".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

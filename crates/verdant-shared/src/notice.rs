//! User-facing notices emitted by the engine.
//!
//! The engine only produces notices as data. Rendering and timing belong to
//! the presentation layer.

use serde::{Deserialize, Serialize};

/// Notice class, used by renderers to pick styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageClass {
    Info,
    Success,
    Xp,
    LevelUp,
}

impl MessageClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Xp => "xp",
            Self::LevelUp => "levelup",
        }
    }
}

impl std::fmt::Display for MessageClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A message tagged by class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub class: MessageClass,
    pub text: String,
    /// Suggested delay before showing, relative to the action that earned it
    #[serde(default)]
    pub delay_ms: u64,
}

impl Notice {
    pub fn new(class: MessageClass, text: impl Into<String>) -> Self {
        Self {
            class,
            text: text.into(),
            delay_ms: 0,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(MessageClass::Info, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(MessageClass::Success, text)
    }

    /// Stagger this notice behind the action that triggered it
    pub fn delayed(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

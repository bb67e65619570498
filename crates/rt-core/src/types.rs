//! Core domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Stable handle of a child in the registry (its registration index)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChildId(pub usize);

impl ChildId {
    /// Create a new child ID
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the registration index
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ChildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "child-{}", self.0)
    }
}

/// Name of a child agent.
///
/// Names compare and hash case-insensitively but keep their configured
/// spelling for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ChildName {
    display: Arc<str>,
    key: Arc<str>,
}

impl ChildName {
    /// Create a child name
    pub fn new(name: impl Into<String>) -> Self {
        let display: String = name.into();
        let key = display.to_lowercase();
        Self {
            display: display.into(),
            key: key.into(),
        }
    }

    /// The name as configured
    pub fn as_str(&self) -> &str {
        &self.display
    }

    /// Case-insensitive comparison against a raw string
    pub fn matches(&self, other: &str) -> bool {
        *self.key == other.to_lowercase()
    }
}

impl PartialEq for ChildName {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ChildName {}

impl Hash for ChildName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for ChildName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

impl From<String> for ChildName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ChildName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<ChildName> for String {
    fn from(name: ChildName) -> Self {
        name.display.to_string()
    }
}

/// Author of a logged message
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    /// The human operator (or the scheduler speaking on their behalf)
    Operator,
    /// A child agent
    Child(ChildName),
}

impl Role {
    /// Whether this role is the given child
    pub fn is_child(&self, name: &ChildName) -> bool {
        matches!(self, Role::Child(n) if n == name)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Operator => write!(f, "operator"),
            Role::Child(name) => write!(f, "{}", name),
        }
    }
}

/// One utterance in the conversation log. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Who said it
    pub role: Role,
    /// What was said
    pub text: String,
}

impl Message {
    /// A line from the operator
    pub fn operator(text: impl Into<String>) -> Self {
        Self {
            role: Role::Operator,
            text: text.into(),
        }
    }

    /// A line produced by a child
    pub fn child(name: ChildName, text: impl Into<String>) -> Self {
        Self {
            role: Role::Child(name),
            text: text.into(),
        }
    }
}

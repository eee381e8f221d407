//! Verbs and operations
//!
//! A [`Verb`] is what a classified request wants to do; an [`Operation`] is
//! the verb set a rule grants.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Abstract action derived from HTTP method and path shape
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    List,
    Create,
    Update,
    Patch,
    Delete,
    /// Lower-cased HTTP method of a non-resource request
    Raw(String),
}

impl Verb {
    pub fn as_str(&self) -> &str {
        match self {
            Verb::Get => "get",
            Verb::List => "list",
            Verb::Create => "create",
            Verb::Update => "update",
            Verb::Patch => "patch",
            Verb::Delete => "delete",
            Verb::Raw(method) => method,
        }
    }

    /// Parse a verb name, falling back to [`Verb::Raw`]
    pub fn parse(s: &str) -> Self {
        match s {
            "get" => Verb::Get,
            "list" => Verb::List,
            "create" => Verb::Create,
            "update" => Verb::Update,
            "patch" => Verb::Patch,
            "delete" => Verb::Delete,
            other => Verb::Raw(other.to_ascii_lowercase()),
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Verb {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Verb {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(|s| Verb::parse(&s))
    }
}

/// Verb set granted by a rule
///
/// Serialized as `"*"`, `"edit"`, `"view"`, or the literal verb.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operation {
    /// Every verb
    All,
    /// create, delete, update, patch, get, list
    Edit,
    /// get, list
    View,
    /// Exactly one verb
    Verb(String),
}

impl Operation {
    /// Check whether this operation grants `verb`
    pub fn contains(&self, verb: &Verb) -> bool {
        match self {
            Operation::All => true,
            Operation::Edit => matches!(
                verb,
                Verb::Create | Verb::Delete | Verb::Update | Verb::Patch | Verb::Get | Verb::List
            ),
            Operation::View => matches!(verb, Verb::Get | Verb::List),
            Operation::Verb(literal) => literal == verb.as_str(),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Operation::All => "*",
            Operation::Edit => "edit",
            Operation::View => "view",
            Operation::Verb(literal) => literal,
        }
    }
}

impl From<String> for Operation {
    fn from(s: String) -> Self {
        match s.as_str() {
            "*" => Operation::All,
            "edit" => Operation::Edit,
            "view" => Operation::View,
            _ => Operation::Verb(s),
        }
    }
}

impl From<&str> for Operation {
    fn from(s: &str) -> Self {
        Operation::from(s.to_string())
    }
}

impl From<Operation> for String {
    fn from(op: Operation) -> Self {
        match op {
            Operation::Verb(literal) => literal,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Rules and their persisted encoding

use crate::error::RulesError;
use crate::model::operation::{Operation, Verb};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource name that matches every resource, subresources included
pub const WILDCARD_RESOURCE: &str = "*";

/// Current version of the persisted rules document
pub const RULES_SCHEMA_VERSION: u32 = 1;

/// A single grant: an operation on a resource (or `*`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    pub resource: String,
    pub operation: Operation,
}

impl Rule {
    pub fn new(resource: impl Into<String>, operation: impl Into<Operation>) -> Self {
        Self {
            resource: resource.into(),
            operation: operation.into(),
        }
    }

    /// `*` on `*`
    pub fn all() -> Self {
        Self::new(WILDCARD_RESOURCE, Operation::All)
    }

    /// Check the resource half of the rule.
    ///
    /// A subresource request is only matched by `resource/subresource` or `*`;
    /// a grant on the base resource does not cover its subresources.
    pub fn matches_resource(&self, resource: &str, subresource: &str) -> bool {
        if self.resource == WILDCARD_RESOURCE {
            return true;
        }
        if subresource.is_empty() {
            return self.resource == resource;
        }
        self.resource
            .strip_prefix(resource)
            .and_then(|rest| rest.strip_prefix('/'))
            .is_some_and(|sub| sub == subresource)
    }

    pub fn matches(&self, resource: &str, subresource: &str, verb: &Verb) -> bool {
        self.matches_resource(resource, subresource) && self.operation.contains(verb)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.operation)
    }
}

/// Ordered rule list attached to a role
///
/// Order does not affect matching but is preserved through persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rules(Vec<Rule>);

/// Versioned on-disk shape of [`Rules`]
#[derive(Serialize, Deserialize)]
struct RulesDocument {
    version: u32,
    rules: Vec<Rule>,
}

impl Rules {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self(rules)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, rule: Rule) {
        self.0.push(rule);
    }

    /// Encode as a versioned JSON document for blob storage
    pub fn encode(&self) -> Result<String, RulesError> {
        let doc = RulesDocument {
            version: RULES_SCHEMA_VERSION,
            rules: self.0.clone(),
        };
        Ok(serde_json::to_string(&doc)?)
    }

    /// Decode a blob produced by [`Rules::encode`]. Empty input is an empty list.
    pub fn decode(bytes: &[u8]) -> Result<Self, RulesError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let doc: RulesDocument = serde_json::from_slice(bytes)?;
        if doc.version != RULES_SCHEMA_VERSION {
            return Err(RulesError::UnsupportedVersion {
                found: doc.version,
                expected: RULES_SCHEMA_VERSION,
            });
        }
        Ok(Self(doc.rules))
    }
}

impl From<Vec<Rule>> for Rules {
    fn from(rules: Vec<Rule>) -> Self {
        Self(rules)
    }
}

impl FromIterator<Rule> for Rules {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Rules {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_matches_subresources() {
        let rule = Rule::new("*", Operation::View);
        assert!(rule.matches_resource("containers", ""));
        assert!(rule.matches_resource("containers", "log"));
    }

    #[test]
    fn test_base_rule_does_not_cover_subresource() {
        let rule = Rule::new("containers", Operation::All);
        assert!(rule.matches_resource("containers", ""));
        assert!(!rule.matches_resource("containers", "log"));
    }

    #[test]
    fn test_subresource_rule() {
        let rule = Rule::new("containers/log", Operation::View);
        assert!(rule.matches_resource("containers", "log"));
        assert!(!rule.matches_resource("containers", "exec"));
        assert!(!rule.matches_resource("containers", ""));
        assert!(!rule.matches_resource("containerslog", ""));
    }

    #[test]
    fn test_rule_display() {
        assert_eq!(Rule::new("posts", Operation::Edit).to_string(), "posts:edit");
        assert_eq!(Rule::all().to_string(), "*:*");
    }

    #[test]
    fn test_encode_carries_version() {
        let rules = Rules::new(vec![Rule::new("posts", Operation::View)]);
        let encoded = rules.encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["rules"][0]["resource"], "posts");
        assert_eq!(value["rules"][0]["operation"], "view");
    }

    #[test]
    fn test_encode_preserves_order_and_duplicates() {
        let rules = Rules::new(vec![
            Rule::new("users", Operation::Edit),
            Rule::new("posts", Operation::View),
            Rule::new("users", Operation::Edit),
        ]);
        let decoded = Rules::decode(rules.encode().unwrap().as_bytes()).unwrap();
        assert_eq!(decoded, rules);
        assert_eq!(decoded.len(), 3);
    }

    #[test]
    fn test_decode_empty_blob() {
        assert!(Rules::decode(b"").unwrap().is_empty());
        assert!(Rules::decode(b"  \n").unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_unknown_version() {
        let err = Rules::decode(br#"{"version":2,"rules":[]}"#).unwrap_err();
        assert!(matches!(
            err,
            RulesError::UnsupportedVersion {
                found: 2,
                expected: 1
            }
        ));
    }

    #[test]
    fn test_decode_rejects_unversioned_array() {
        let err = Rules::decode(br#"[{"resource":"posts","operation":"view"}]"#).unwrap_err();
        assert!(matches!(err, RulesError::Malformed(_)));
    }
}

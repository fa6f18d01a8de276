//! Label selectors
//!
//! Equality-based (`k=v`, `k==v`, `k!=v`), set-based (`k in (a,b)`,
//! `k notin (a,b)`) and existence (`k`, `!k`) requirements joined by commas.
//! All requirements must hold for a label set to match.

use crate::errors::{Result, SyncError};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Requirement {
    Equals(String, String),
    NotEquals(String, String),
    In(String, Vec<String>),
    NotIn(String, Vec<String>),
    Exists(String),
    DoesNotExist(String),
}

impl Requirement {
    fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        match self {
            Self::Equals(key, value) => labels.get(key) == Some(value),
            Self::NotEquals(key, value) => labels.get(key) != Some(value),
            Self::In(key, values) => labels.get(key).is_some_and(|v| values.contains(v)),
            Self::NotIn(key, values) => labels.get(key).map_or(true, |v| !values.contains(v)),
            Self::Exists(key) => labels.contains_key(key),
            Self::DoesNotExist(key) => !labels.contains_key(key),
        }
    }
}

/// A parsed label selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSelector {
    source: String,
    requirements: Vec<Requirement>,
}

impl LabelSelector {
    pub fn parse(selector: &str) -> Result<Self> {
        let invalid = |reason: &str| SyncError::invalid_selector(selector, reason);

        let mut requirements = Vec::new();
        for term in split_terms(selector).map_err(|reason| invalid(reason))? {
            let term = term.trim();
            if term.is_empty() {
                return Err(invalid("empty requirement"));
            }
            requirements.push(parse_requirement(term).map_err(|reason| invalid(&reason))?);
        }

        Ok(Self { source: selector.to_string(), requirements })
    }

    /// Whether every requirement holds for `labels`
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements.iter().all(|r| r.matches(labels))
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for LabelSelector {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Split on commas outside parentheses
fn split_terms(selector: &str) -> std::result::Result<Vec<&str>, &'static str> {
    if selector.trim().is_empty() {
        return Err("selector is empty");
    }

    let mut terms = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in selector.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1).ok_or("unbalanced parentheses")?,
            ',' if depth == 0 => {
                terms.push(&selector[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err("unbalanced parentheses");
    }
    terms.push(&selector[start..]);
    Ok(terms)
}

fn parse_requirement(term: &str) -> std::result::Result<Requirement, String> {
    if let Some(key) = term.strip_prefix('!') {
        return Ok(Requirement::DoesNotExist(validate_key(key.trim())?));
    }

    if let Some((key, value)) = term.split_once("!=") {
        return Ok(Requirement::NotEquals(validate_key(key.trim())?, validate_value(value.trim())?));
    }
    if let Some((key, value)) = term.split_once("==") {
        return Ok(Requirement::Equals(validate_key(key.trim())?, validate_value(value.trim())?));
    }
    if let Some((key, value)) = term.split_once('=') {
        return Ok(Requirement::Equals(validate_key(key.trim())?, validate_value(value.trim())?));
    }

    let mut parts = term.splitn(2, char::is_whitespace);
    let key = parts.next().unwrap_or_default();
    let rest = parts.next().map(str::trim_start).unwrap_or_default();
    if rest.is_empty() {
        return Ok(Requirement::Exists(validate_key(key)?));
    }

    let (operator, values) = if let Some(values) = rest.strip_prefix("notin") {
        ("notin", values)
    } else if let Some(values) = rest.strip_prefix("in") {
        ("in", values)
    } else {
        return Err(format!("unknown operator in '{}'", term));
    };

    let values = values
        .trim()
        .strip_prefix('(')
        .and_then(|v| v.strip_suffix(')'))
        .ok_or_else(|| format!("expected parenthesized values after '{}'", operator))?;
    let values = values
        .split(',')
        .map(|v| validate_value(v.trim()))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let key = validate_key(key)?;
    Ok(match operator {
        "in" => Requirement::In(key, values),
        _ => Requirement::NotIn(key, values),
    })
}

fn validate_key(key: &str) -> std::result::Result<String, String> {
    if key.is_empty() {
        return Err("label key is empty".to_string());
    }
    if !key.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/')) {
        return Err(format!("invalid label key '{}'", key));
    }
    Ok(key.to_string())
}

fn validate_value(value: &str) -> std::result::Result<String, String> {
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')) {
        return Err(format!("invalid label value '{}'", value));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_equality_requirements() {
        let selector = LabelSelector::parse("team=a,env!=prod").unwrap();
        assert!(selector.matches(&labels(&[("team", "a"), ("env", "dev")])));
        assert!(selector.matches(&labels(&[("team", "a")])));
        assert!(!selector.matches(&labels(&[("team", "a"), ("env", "prod")])));
        assert!(!selector.matches(&labels(&[("team", "b")])));
    }

    #[test]
    fn test_double_equals() {
        let selector = LabelSelector::parse("team==a").unwrap();
        assert!(selector.matches(&labels(&[("team", "a")])));
    }

    #[test]
    fn test_set_requirements() {
        let selector = LabelSelector::parse("env in (dev, test),tier notin (db)").unwrap();
        assert!(selector.matches(&labels(&[("env", "dev"), ("tier", "web")])));
        assert!(selector.matches(&labels(&[("env", "test")])));
        assert!(!selector.matches(&labels(&[("env", "prod")])));
        assert!(!selector.matches(&labels(&[("env", "dev"), ("tier", "db")])));
    }

    #[test]
    fn test_existence_requirements() {
        let selector = LabelSelector::parse("app.kubernetes.io/part-of,!legacy").unwrap();
        assert!(selector.matches(&labels(&[("app.kubernetes.io/part-of", "shop")])));
        let legacy = labels(&[("app.kubernetes.io/part-of", "shop"), ("legacy", "")]);
        assert!(!selector.matches(&legacy));
        assert!(!selector.matches(&labels(&[])));
    }

    #[test]
    fn test_malformed_selectors() {
        for selector in ["", "team=a,", "env in (dev", "env between (a)", "=a", "te am=a"] {
            let err = LabelSelector::parse(selector).unwrap_err();
            assert!(matches!(err, SyncError::InvalidSelector { .. }), "{}", selector);
        }
    }

    proptest! {
        #[test]
        fn prop_equality_matches_only_its_value(
            key in "[a-z][a-z0-9-]{0,10}",
            value in "[a-z0-9]{1,8}",
            other in "[a-z0-9]{1,8}",
        ) {
            let selector = LabelSelector::parse(&format!("{}={}", key, value)).unwrap();
            prop_assert!(selector.matches(&labels(&[(key.as_str(), value.as_str())])));
            let set = labels(&[(key.as_str(), other.as_str())]);
            prop_assert_eq!(selector.matches(&set), value == other);
        }

        #[test]
        fn prop_not_equals_is_negation(
            key in "[a-z][a-z0-9-]{0,10}",
            value in "[a-z0-9]{1,8}",
            actual in "[a-z0-9]{1,8}",
        ) {
            let eq = LabelSelector::parse(&format!("{}={}", key, value)).unwrap();
            let ne = LabelSelector::parse(&format!("{}!={}", key, value)).unwrap();
            let set = labels(&[(key.as_str(), actual.as_str())]);
            prop_assert_ne!(eq.matches(&set), ne.matches(&set));
        }
    }
}

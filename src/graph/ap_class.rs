use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Compatibility class of an attachment point: a rule name plus a
/// sub-class, written `rule:sub`.
///
/// This is a plain value; two classes are the same class when their rule and
/// sub-class are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ApClass {
    pub rule: String,
    pub sub_class: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid attachment point class '{0}': expected 'rule:subclass'")]
pub struct ApClassParseError(pub String);

impl ApClass {
    pub fn new(rule: impl Into<String>, sub_class: u32) -> Self {
        Self {
            rule: rule.into(),
            sub_class,
        }
    }
}

impl FromStr for ApClass {
    type Err = ApClassParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (rule, sub) = s
            .split_once(':')
            .ok_or_else(|| ApClassParseError(s.to_string()))?;
        if rule.is_empty() || rule.contains(char::is_whitespace) {
            return Err(ApClassParseError(s.to_string()));
        }
        let sub_class = sub.parse().map_err(|_| ApClassParseError(s.to_string()))?;
        Ok(Self::new(rule, sub_class))
    }
}

impl fmt::Display for ApClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.rule, self.sub_class)
    }
}

/// Maps each attachment point class to the classes it may bond with.
///
/// The matrix used for ring-closing chords is usually distinct from the one
/// used to grow the graph, and is not required to be symmetric; callers that
/// need a symmetric test use [`either_compatible`](Self::either_compatible).
#[derive(Debug, Clone, Default)]
pub struct CompatibilityMatrix {
    entries: HashMap<ApClass, HashSet<ApClass>>,
}

impl CompatibilityMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (ApClass, ApClass)>,
    {
        let mut matrix = Self::new();
        for (a, b) in pairs {
            matrix.insert(a, b);
        }
        matrix
    }

    pub fn insert(&mut self, from: ApClass, to: ApClass) {
        self.entries.entry(from).or_default().insert(to);
    }

    pub fn contains(&self, class: &ApClass) -> bool {
        self.entries.contains_key(class)
    }

    pub fn compatible_classes(&self, class: &ApClass) -> Option<&HashSet<ApClass>> {
        self.entries.get(class)
    }

    pub fn is_compatible(&self, from: &ApClass, to: &ApClass) -> bool {
        self.entries.get(from).is_some_and(|set| set.contains(to))
    }

    pub fn either_compatible(&self, a: &ApClass, b: &ApClass) -> bool {
        self.is_compatible(a, b) || self.is_compatible(b, a)
    }
}

//! Ring pattern queries and the matcher that executes them.

mod error;
mod matcher;
mod parser;
mod query;

pub use error::PatternError;
pub use matcher::{get_first_match, get_matches, AtomMapping, SubstructMatcher};
pub use parser::parse_pattern;
pub use query::{AtomExpr, BondExpr};

use crate::mol::Mol;

/// A parsed pattern, kept together with the text it came from.
#[derive(Debug, Clone)]
pub struct PatternQuery {
    source: String,
    mol: Mol<AtomExpr, BondExpr>,
}

impl PatternQuery {
    pub fn parse(source: &str) -> Result<Self, PatternError> {
        Ok(Self {
            source: source.trim().to_string(),
            mol: parse_pattern(source)?,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn mol(&self) -> &Mol<AtomExpr, BondExpr> {
        &self.mol
    }
}

/// Executes pattern queries against a structure.
pub trait PatternMatcher<A, B> {
    fn count_matches(&self, target: &Mol<A, B>, query: &PatternQuery) -> usize;

    fn has_match(&self, target: &Mol<A, B>, query: &PatternQuery) -> bool {
        self.count_matches(target, query) > 0
    }
}

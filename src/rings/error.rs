use std::path::PathBuf;

use thiserror::Error;

use crate::graph::{GraphError, VertexId};
use crate::pattern::PatternError;

#[derive(Debug, Error)]
pub enum RingClosureError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("ring closures are disabled; enable them before searching for rings")]
    Disabled,

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidParameter {
        key: String,
        value: String,
        reason: String,
    },

    #[error("unknown ring-closure keyword '{0}'")]
    UnknownKeyword(String),

    #[error("minimum {what} ({min}) is larger than the maximum ({max})")]
    InvertedRange {
        what: &'static str,
        min: usize,
        max: usize,
    },

    #[error("vertex {0} is not in the graph")]
    UnknownVertex(VertexId),

    #[error("ring-closing vertex {vertex} does not hold a ring-closing attractor")]
    NotAnAttractor { vertex: VertexId },

    #[error("ring-closing vertex {vertex} has {atoms} atoms; only single-atom ring-closing vertices are supported")]
    MultiAtomRcv { vertex: VertexId, atoms: usize },

    #[error("atom {atom} has no 3D coordinates")]
    MissingCoordinates { atom: usize },

    #[error("inconsistent path: {0}")]
    InconsistentPath(String),

    #[error("pattern '{pattern}' is invalid: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: PatternError,
    },

    #[error("malformed archive index {path} at line {line}: {msg}")]
    ArchiveFormat {
        path: PathBuf,
        line: usize,
        msg: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RingClosureError>;

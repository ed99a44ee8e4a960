pub mod atom;
pub mod bond;
pub mod element;
pub mod graph;
pub mod graph_ops;
pub mod mol;
pub mod pattern;
pub mod rings;
pub mod traits;

pub use atom::{Atom, AtomKind, AttractorKind};
pub use bond::{Bond, BondType};
pub use element::Element;
pub use graph::{
    same_ring_set, ApClass, ApRef, AttachmentPoint, CompatibilityMatrix, Edge, Graph, GraphError,
    Ring, Vertex, VertexId, VertexKind,
};
pub use mol::{Mol, Structure};
pub use pattern::{PatternError, PatternMatcher, PatternQuery, SubstructMatcher};
pub use rings::{
    ClosabilityMode, Closability, CombinationEnumerator, CyclicGraphHandler, FileStore,
    MemoryStore, PathClosabilityEvaluator, PathSubGraph, RandomCombinationSelector,
    RingClosureError, RingClosureFinder, RingClosureParams, RingClosuresArchive, RingSizeManager,
};
pub use traits::{HasBondType, HasElement};

#[cfg(test)]
mod tests;

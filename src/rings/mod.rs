//! Ring closure over building-block graphs.
//!
//! [`RingSizeManager`] decides which free ring-closing vertices may pair and
//! how strongly each ring size is favoured. [`PathClosabilityEvaluator`]
//! accepts or rejects one pair, by constitution and/or by a torsion search
//! ([`RingClosureFinder`]) whose results are cached in a
//! [`RingClosuresArchive`]. [`CombinationEnumerator`] and
//! [`RandomCombinationSelector`] turn accepted pairs into sets of rings;
//! [`CyclicGraphHandler`] ties them together for one graph.

mod archive;
mod attractor;
mod closability;
mod conformation;
mod enumerator;
mod error;
mod finder;
pub mod geometry;
mod handler;
mod params;
mod path;
mod random;
mod size_manager;

#[cfg(test)]
pub(crate) mod test_support;

pub use archive::{ArchiveEntry, ArchiveStore, FileStore, MemoryStore, RingClosuresArchive};
pub use attractor::RingClosingAttractor;
pub use closability::{Closability, PathClosabilityEvaluator};
pub use conformation::{bond_key, BondKey, ClosableConformation};
pub use enumerator::{closable_together, CombinationEnumerator};
pub use error::{Result, RingClosureError};
pub use finder::{FinderOutcome, RingClosureFinder};
pub use handler::CyclicGraphHandler;
pub use params::{ClosabilityMode, RingClosureParams};
pub use path::{ChainId, PathGeometry, PathSubGraph};
pub use random::RandomCombinationSelector;
pub use size_manager::RingSizeManager;

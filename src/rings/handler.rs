use std::collections::BTreeMap;

use rand::Rng;
use tracing::{debug, info};

use crate::graph::{CompatibilityMatrix, Graph, Ring, VertexKind};
use crate::mol::Structure;

use super::archive::RingClosuresArchive;
use super::closability::PathClosabilityEvaluator;
use super::enumerator::CombinationEnumerator;
use super::error::{RingClosureError, Result};
use super::params::RingClosureParams;
use super::random::RandomCombinationSelector;
use super::size_manager::RingSizeManager;

/// Entry point for ring closure on one graph at a time.
///
/// Holds a validated copy of the configuration, the ring-closure
/// compatibility matrix and the shared archive; every call builds its own
/// size manager and evaluator.
#[derive(Debug)]
pub struct CyclicGraphHandler<'a> {
    params: RingClosureParams,
    rc_compat: &'a CompatibilityMatrix,
    archive: &'a RingClosuresArchive,
}

impl<'a> CyclicGraphHandler<'a> {
    pub fn new(
        params: &RingClosureParams,
        rc_compat: &'a CompatibilityMatrix,
        archive: &'a RingClosuresArchive,
    ) -> Result<Self> {
        let mut params = params.clone();
        params.check()?;
        Ok(Self {
            params,
            rc_compat,
            archive,
        })
    }

    pub fn params(&self) -> &RingClosureParams {
        &self.params
    }

    /// Whether the number of free ring-closing vertices of each attractor
    /// type lies within the configured per-graph range. Empty ring-closing
    /// vertices are counted as a type of their own.
    pub fn rcv_counts_within_limits(&self, graph: &Graph, structure: &Structure) -> Result<bool> {
        let by_vertex = structure.atoms_by_vertex();
        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for v in graph.free_rc_vertices() {
            let vertex = graph.vertex(v).ok_or(RingClosureError::UnknownVertex(v))?;
            let label = match vertex.kind {
                VertexKind::Empty => "empty",
                VertexKind::Molecular => {
                    let atoms = by_vertex.get(&v).map(Vec::as_slice).unwrap_or(&[]);
                    let &[atom] = atoms else {
                        return Err(RingClosureError::MultiAtomRcv {
                            vertex: v,
                            atoms: atoms.len(),
                        });
                    };
                    structure
                        .atom(atom)
                        .attractor_kind()
                        .ok_or(RingClosureError::NotAnAttractor { vertex: v })?
                        .label()
                }
            };
            *counts.entry(label).or_default() += 1;
        }
        let (min, max) = (self.params.min_rcv_per_type, self.params.max_rcv_per_type);
        let ok = counts.values().all(|&c| (min..=max).contains(&c));
        debug!(?counts, ok, "ring-closing vertices per type");
        Ok(ok)
    }

    pub fn ring_count_within_limits(&self, graph: &Graph) -> bool {
        let n = graph.rings().len();
        (self.params.min_ring_closures..=self.params.max_ring_closures).contains(&n)
    }

    pub fn size_manager<'g>(
        &'g self,
        graph: &'g Graph,
        structure: &Structure,
    ) -> Result<RingSizeManager<'g>> {
        RingSizeManager::initialize(structure, graph, self.rc_compat, &self.params)
    }

    /// One weighted-random set of rings for `graph`.
    pub fn random_combination<R: Rng + ?Sized>(
        &self,
        graph: &Graph,
        structure: &Structure,
        rng: &mut R,
    ) -> Result<Vec<Ring>> {
        let evaluator = PathClosabilityEvaluator::new(&self.params, self.archive)?;
        let mut rsm = self.size_manager(graph, structure)?;
        RandomCombinationSelector::new(&evaluator).select(graph, structure, &mut rsm, rng)
    }

    /// Every maximal set of rings for `graph` whose size is within the
    /// configured range of ring closures.
    pub fn all_combinations(
        &self,
        graph: &Graph,
        structure: &Structure,
    ) -> Result<Vec<Vec<Ring>>> {
        let evaluator = PathClosabilityEvaluator::new(&self.params, self.archive)?;
        let rsm = self.size_manager(graph, structure)?;
        let (min, max) = (self.params.min_ring_closures, self.params.max_ring_closures);
        let combinations: Vec<Vec<Ring>> = CombinationEnumerator::new(&evaluator)
            .enumerate(graph, structure, &rsm)?
            .into_iter()
            .filter(|c| (min..=max).contains(&c.len()))
            .collect();
        info!(combinations = combinations.len(), "ring combinations found");
        Ok(combinations)
    }

    /// Records `rings` in `graph`.
    pub fn close_rings(&self, graph: &mut Graph, rings: Vec<Ring>) {
        for ring in rings {
            graph.add_ring(ring);
        }
    }
}

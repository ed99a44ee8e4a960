use rand::Rng;
use tracing::{debug, trace};

use crate::atom::Atom;
use crate::bond::Bond;
use crate::graph::{Graph, Ring};
use crate::mol::Structure;
use crate::pattern::{PatternMatcher, SubstructMatcher};

use super::closability::PathClosabilityEvaluator;
use super::error::Result;
use super::path::PathSubGraph;
use super::size_manager::RingSizeManager;

/// Greedy, weighted-random choice of one set of ring closures.
///
/// Vertices and partners are drawn from the ring-size-biased lists of the
/// size manager, so favoured ring sizes are drawn more often. Every ring
/// accepted adds its virtual bond to the manager before the next draw.
pub struct RandomCombinationSelector<'e, 'a, M = SubstructMatcher> {
    evaluator: &'e PathClosabilityEvaluator<'a, M>,
    max_rings: usize,
}

impl<'e, 'a, M: PatternMatcher<Atom, Bond>> RandomCombinationSelector<'e, 'a, M> {
    pub fn new(evaluator: &'e PathClosabilityEvaluator<'a, M>) -> Self {
        Self {
            max_rings: evaluator.params().max_ring_closures,
            evaluator,
        }
    }

    pub fn with_max_rings(mut self, max_rings: usize) -> Self {
        self.max_rings = max_rings;
        self
    }

    pub fn select<R: Rng + ?Sized>(
        &self,
        graph: &Graph,
        structure: &Structure,
        rsm: &mut RingSizeManager<'_>,
        rng: &mut R,
    ) -> Result<Vec<Ring>> {
        let mut rings = Vec::new();
        while rings.len() < self.max_rings {
            let pool = rsm.biased_candidates();
            if pool.is_empty() {
                break;
            }
            let vi = pool[rng.gen_range(0..pool.len())];
            let mut partners = rsm.biased_candidates_for(vi)?;
            while !partners.is_empty() {
                let vj = partners[rng.gen_range(0..partners.len())];
                partners.retain(|&v| v != vj);
                let path = PathSubGraph::new(graph, vi, vj)?;
                if !self.evaluator.evaluate(graph, structure, &path)?.closable {
                    trace!(vi, vj, "drawn pair not closable");
                    continue;
                }
                rings.push(Ring::closing(
                    path.vertices().to_vec(),
                    path.head_bond(),
                    path.tail_bond(),
                )?);
                if rsm.attractor(vi)?.is_some() && rsm.attractor(vj)?.is_some() {
                    rsm.add_ring_closing_bond(vi, vj)?;
                }
                rsm.set_vertex_as_done(vj)?;
                debug!(vi, vj, rings = rings.len(), "ring closure selected");
                break;
            }
            rsm.set_vertex_as_done(vi)?;
        }
        Ok(rings)
    }
}

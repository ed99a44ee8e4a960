//! Exhaustive search for sets of rings that can be closed together.

use tracing::{debug, trace};

use crate::atom::Atom;
use crate::bond::Bond;
use crate::graph::{same_ring_set, Graph, Ring};
use crate::mol::Structure;
use crate::pattern::{PatternMatcher, SubstructMatcher};

use super::closability::{Closability, PathClosabilityEvaluator};
use super::conformation::ClosableConformation;
use super::error::Result;
use super::path::PathSubGraph;
use super::size_manager::RingSizeManager;

/// A pair of ring-closing vertices accepted for ring closure.
#[derive(Debug, Clone)]
struct AcceptedPair {
    ends: (usize, usize),
    path: PathSubGraph,
    closability: Closability,
}

struct Frame {
    vertex: usize,
    next_option: usize,
    applied: Option<usize>,
}

/// Lists every maximal set of compatible, closable and non-overlapping
/// ring closures of a graph.
pub struct CombinationEnumerator<'e, 'a, M = SubstructMatcher> {
    evaluator: &'e PathClosabilityEvaluator<'a, M>,
    check_interdependent: bool,
    tolerance: f64,
}

impl<'e, 'a, M: PatternMatcher<Atom, Bond>> CombinationEnumerator<'e, 'a, M> {
    pub fn new(evaluator: &'e PathClosabilityEvaluator<'a, M>) -> Self {
        let params = evaluator.params();
        Self {
            evaluator,
            check_interdependent: params.check_interdependent_chains,
            tolerance: params.conf_search_step / 2.0,
        }
    }

    /// Every candidate pair is tested once with the size manager and the
    /// closability evaluator; the accepted pairs are then combined by a
    /// depth-first search in which each vertex is either left open or
    /// paired with a later compatible vertex.
    pub fn enumerate(
        &self,
        graph: &Graph,
        structure: &Structure,
        rsm: &RingSizeManager<'_>,
    ) -> Result<Vec<Vec<Ring>>> {
        let candidates = rsm.candidates();
        let n = candidates.len();
        let mut pairs = Vec::new();
        let mut partners: Vec<Vec<usize>> = vec![Vec::new(); n];
        for i in 0..n {
            for j in (i + 1)..n {
                let (vi, vj) = (candidates[i], candidates[j]);
                if !rsm.compatibility_of_pair(vi, vj)? {
                    continue;
                }
                let path = PathSubGraph::new(graph, vi, vj)?;
                let closability = self.evaluator.evaluate(graph, structure, &path)?;
                if !closability.closable {
                    trace!(vi, vj, "pair not closable");
                    continue;
                }
                partners[i].push(pairs.len());
                pairs.push(AcceptedPair {
                    ends: (i, j),
                    path,
                    closability,
                });
            }
        }
        debug!(candidates = n, accepted_pairs = pairs.len(), "closable pairs collected");

        let mut combinations: Vec<Vec<Ring>> = Vec::new();
        let mut used = vec![false; n];
        let mut chosen: Vec<usize> = Vec::new();
        let mut stack = vec![Frame {
            vertex: 0,
            next_option: 0,
            applied: None,
        }];

        while let Some(top) = stack.last_mut() {
            if let Some(p) = top.applied.take() {
                let (a, b) = pairs[p].ends;
                used[a] = false;
                used[b] = false;
                chosen.pop();
            }
            let i = top.vertex;
            if i == n {
                stack.pop();
                if let Some(rings) = self.complete(&pairs, &used, &chosen)? {
                    if !combinations.iter().any(|c| same_ring_set(c, &rings)) {
                        combinations.push(rings);
                    }
                }
                continue;
            }

            // option 0 leaves the vertex open, option k pairs it through
            // its k-th accepted pair
            let mut advance = false;
            if used[i] {
                advance = top.next_option == 0;
                top.next_option = 1;
            } else {
                while top.next_option <= partners[i].len() {
                    let k = top.next_option;
                    top.next_option += 1;
                    if k == 0 {
                        advance = true;
                        break;
                    }
                    let p = partners[i][k - 1];
                    let j = pairs[p].ends.1;
                    if used[j] {
                        continue;
                    }
                    used[i] = true;
                    used[j] = true;
                    chosen.push(p);
                    top.applied = Some(p);
                    advance = true;
                    break;
                }
            }
            if advance {
                stack.push(Frame {
                    vertex: i + 1,
                    next_option: 0,
                    applied: None,
                });
            } else {
                stack.pop();
            }
        }

        debug!(combinations = combinations.len(), "ring combinations enumerated");
        Ok(combinations)
    }

    /// Rings of a finished assignment, or `None` when it is not maximal,
    /// empty, or fails the interdependency check.
    fn complete(
        &self,
        pairs: &[AcceptedPair],
        used: &[bool],
        chosen: &[usize],
    ) -> Result<Option<Vec<Ring>>> {
        if chosen.is_empty() {
            return Ok(None);
        }
        if pairs.iter().any(|p| !used[p.ends.0] && !used[p.ends.1]) {
            return Ok(None);
        }
        if self.check_interdependent {
            let sets: Vec<&[ClosableConformation]> = chosen
                .iter()
                .map(|&p| pairs[p].closability.conformations.as_slice())
                .collect();
            if !closable_together(&sets, self.tolerance) {
                trace!(rings = chosen.len(), "interdependent chains cannot close together");
                return Ok(None);
            }
        }
        let rings = chosen
            .iter()
            .map(|&p| {
                let path = &pairs[p].path;
                Ring::closing(path.vertices().to_vec(), path.head_bond(), path.tail_bond())
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Some(rings))
    }
}

/// Whether chains that share rotatable bonds have conformations that agree
/// on every shared bond within `tolerance` degrees.
///
/// `sets[k]` lists the closing conformations of chain `k`. Chains without
/// conformations were not searched and are left out. Chains are grouped by
/// shared bonds; within a group, each conformation of the first chain is
/// tried as a seed and every other chain must then supply a conformation
/// that agrees with all conformations picked so far.
pub fn closable_together(sets: &[&[ClosableConformation]], tolerance: f64) -> bool {
    let searched: Vec<usize> = (0..sets.len()).filter(|&k| !sets[k].is_empty()).collect();
    let m = searched.len();
    let mut group_of = vec![usize::MAX; m];
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for start in 0..m {
        if group_of[start] != usize::MAX {
            continue;
        }
        let g = groups.len();
        group_of[start] = g;
        let mut members = vec![start];
        let mut cursor = 0;
        while cursor < members.len() {
            let a = members[cursor];
            cursor += 1;
            for b in 0..m {
                if group_of[b] == usize::MAX
                    && sets[searched[a]][0].shares_bond(&sets[searched[b]][0])
                {
                    group_of[b] = g;
                    members.push(b);
                }
            }
        }
        groups.push(members.into_iter().map(|k| searched[k]).collect());
    }

    groups
        .iter()
        .filter(|g| g.len() > 1)
        .all(|group| group_closable(sets, group, tolerance))
}

fn group_closable(sets: &[&[ClosableConformation]], group: &[usize], tolerance: f64) -> bool {
    sets[group[0]].iter().any(|seed| {
        let mut picked: Vec<&ClosableConformation> = vec![seed];
        for &member in &group[1..] {
            let fit = sets[member]
                .iter()
                .find(|c| picked.iter().all(|p| p.can_coexist(c, tolerance)));
            match fit {
                Some(c) => picked.push(c),
                None => return false,
            }
        }
        true
    })
}

use std::collections::BTreeSet;

use petgraph::graph::NodeIndex;

use crate::mol::Mol;
use crate::traits::{HasBondType, HasElement};

use super::query::{AtomExpr, BondExpr};
use super::{PatternMatcher, PatternQuery};

pub type AtomMapping = Vec<(NodeIndex, NodeIndex)>;

/// Backtracking subgraph-isomorphism matcher for [`PatternQuery`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstructMatcher;

impl<A: HasElement, B: HasBondType> PatternMatcher<A, B> for SubstructMatcher {
    /// Number of matches covering distinct sets of target atoms.
    fn count_matches(&self, target: &Mol<A, B>, query: &PatternQuery) -> usize {
        let mut seen = BTreeSet::new();
        for mapping in get_matches(target, query.mol()) {
            let atoms: BTreeSet<usize> = mapping.iter().map(|&(_, t)| t.index()).collect();
            seen.insert(atoms.into_iter().collect::<Vec<_>>());
        }
        seen.len()
    }

    fn has_match(&self, target: &Mol<A, B>, query: &PatternQuery) -> bool {
        get_first_match(target, query.mol()).is_some()
    }
}

pub fn get_first_match<A: HasElement, B: HasBondType>(
    target: &Mol<A, B>,
    query: &Mol<AtomExpr, BondExpr>,
) -> Option<AtomMapping> {
    let mut results = Vec::new();
    Vf2::new(target, query).recurse(0, &mut results, true);
    results.into_iter().next()
}

pub fn get_matches<A: HasElement, B: HasBondType>(
    target: &Mol<A, B>,
    query: &Mol<AtomExpr, BondExpr>,
) -> Vec<AtomMapping> {
    let mut results = Vec::new();
    Vf2::new(target, query).recurse(0, &mut results, false);
    results
}

struct Vf2<'a, A, B> {
    target: &'a Mol<A, B>,
    query: &'a Mol<AtomExpr, BondExpr>,
    query_order: Vec<NodeIndex>,
    query_map: Vec<Option<NodeIndex>>,
    target_used: Vec<bool>,
}

impl<'a, A: HasElement, B: HasBondType> Vf2<'a, A, B> {
    fn new(target: &'a Mol<A, B>, query: &'a Mol<AtomExpr, BondExpr>) -> Self {
        Self {
            target,
            query,
            query_order: connected_order(query),
            query_map: vec![None; query.atom_count()],
            target_used: vec![false; target.atom_count()],
        }
    }

    fn recurse(&mut self, depth: usize, results: &mut Vec<AtomMapping>, first_only: bool) {
        if depth == self.query_order.len() {
            let mapping = self
                .query_order
                .iter()
                .filter_map(|&qn| self.query_map[qn.index()].map(|t| (qn, t)))
                .collect();
            results.push(mapping);
            return;
        }

        let query_node = self.query_order[depth];
        for t_idx in 0..self.target_used.len() {
            if first_only && !results.is_empty() {
                return;
            }
            if self.target_used[t_idx] {
                continue;
            }
            let target_node = NodeIndex::new(t_idx);
            if !self.is_feasible(query_node, target_node) {
                continue;
            }

            self.query_map[query_node.index()] = Some(target_node);
            self.target_used[t_idx] = true;
            self.recurse(depth + 1, results, first_only);
            self.query_map[query_node.index()] = None;
            self.target_used[t_idx] = false;
        }
    }

    fn is_feasible(&self, query_node: NodeIndex, target_node: NodeIndex) -> bool {
        let element = self.target.atom(target_node).element();
        let degree = self.target.degree(target_node);
        if !self.query.atom(query_node).matches(element, degree) {
            return false;
        }

        for q_neighbor in self.query.neighbors(query_node) {
            let Some(t_mapped) = self.query_map[q_neighbor.index()] else {
                continue;
            };
            let Some(q_bond) = self.query.bond_between(query_node, q_neighbor) else {
                return false;
            };
            match self.target.bond_between(target_node, t_mapped) {
                Some(t_bond) => {
                    if !self.query.bond(q_bond).matches(self.target.bond(t_bond).bond_type()) {
                        return false;
                    }
                }
                None => return false,
            }
        }
        true
    }
}

/// Depth-first order over each query component, so every atom after the
/// first of its component has an already-mapped neighbour.
fn connected_order(query: &Mol<AtomExpr, BondExpr>) -> Vec<NodeIndex> {
    let mut order = Vec::with_capacity(query.atom_count());
    let mut visited = vec![false; query.atom_count()];
    let mut starts: Vec<NodeIndex> = query.atoms().collect();
    starts.sort_by_key(|&a| std::cmp::Reverse(query.degree(a)));
    for start in starts {
        if visited[start.index()] {
            continue;
        }
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if visited[current.index()] {
                continue;
            }
            visited[current.index()] = true;
            order.push(current);
            for n in query.neighbors(current) {
                if !visited[n.index()] {
                    stack.push(n);
                }
            }
        }
    }
    order
}

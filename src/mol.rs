use std::collections::HashMap;

use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};

use crate::atom::Atom;
use crate::bond::Bond;
use crate::graph::VertexId;

pub struct Mol<A, B> {
    graph: UnGraph<A, B>,
}

/// The concrete 3D atomic structure that ring closures are evaluated on.
pub type Structure = Mol<Atom, Bond>;

impl<A, B> Mol<A, B> {
    pub fn new() -> Self {
        Self {
            graph: UnGraph::default(),
        }
    }

    pub fn atom(&self, idx: NodeIndex) -> &A {
        &self.graph[idx]
    }

    pub fn atom_mut(&mut self, idx: NodeIndex) -> &mut A {
        &mut self.graph[idx]
    }

    pub fn bond(&self, idx: EdgeIndex) -> &B {
        &self.graph[idx]
    }

    pub fn add_atom(&mut self, atom: A) -> NodeIndex {
        self.graph.add_node(atom)
    }

    pub fn add_bond(&mut self, a: NodeIndex, b: NodeIndex, bond: B) -> EdgeIndex {
        self.graph.add_edge(a, b, bond)
    }

    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn neighbors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors(idx)
    }

    pub fn degree(&self, idx: NodeIndex) -> usize {
        self.graph.neighbors(idx).count()
    }

    pub fn atoms(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn bonds(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edge_indices()
    }

    pub fn bond_between(&self, a: NodeIndex, b: NodeIndex) -> Option<EdgeIndex> {
        self.graph.find_edge(a, b)
    }

    pub fn bond_endpoints(&self, idx: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(idx)
    }
}

impl<A: Clone, B: Clone> Mol<A, B> {
    /// Copy of the atoms accepted by `keep` and the bonds among them.
    ///
    /// Atoms keep their relative order. The returned map sends each old atom
    /// index to its new index, or `None` if the atom was dropped.
    pub fn induced_subgraph(
        &self,
        keep: impl Fn(NodeIndex) -> bool,
    ) -> (Mol<A, B>, Vec<Option<NodeIndex>>) {
        let mut sub = Mol::new();
        let mut index_map = vec![None; self.atom_count()];
        for idx in self.atoms() {
            if keep(idx) {
                index_map[idx.index()] = Some(sub.add_atom(self.atom(idx).clone()));
            }
        }
        for edge in self.bonds() {
            if let Some((a, b)) = self.bond_endpoints(edge) {
                if let (Some(na), Some(nb)) = (index_map[a.index()], index_map[b.index()]) {
                    sub.add_bond(na, nb, self.bond(edge).clone());
                }
            }
        }
        (sub, index_map)
    }
}

impl Mol<Atom, Bond> {
    /// Atoms grouped by the graph vertex that owns them, in index order.
    pub fn atoms_by_vertex(&self) -> HashMap<VertexId, Vec<NodeIndex>> {
        let mut map: HashMap<VertexId, Vec<NodeIndex>> = HashMap::new();
        for idx in self.atoms() {
            if let Some(v) = self.atom(idx).vertex {
                map.entry(v).or_default().push(idx);
            }
        }
        map
    }
}

impl<A: Clone, B: Clone> Clone for Mol<A, B> {
    fn clone(&self) -> Self {
        Self {
            graph: self.graph.clone(),
        }
    }
}

impl<A, B> Default for Mol<A, B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: std::fmt::Debug, B: std::fmt::Debug> std::fmt::Debug for Mol<A, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mol")
            .field("atom_count", &self.atom_count())
            .field("bond_count", &self.bond_count())
            .finish()
    }
}

#[cfg(test)]
impl<A: PartialEq, B: PartialEq> PartialEq for Mol<A, B> {
    fn eq(&self, other: &Self) -> bool {
        self.graph.node_weights().eq(other.graph.node_weights())
            && self
                .graph
                .raw_edges()
                .iter()
                .map(|e| (e.source(), e.target(), &e.weight))
                .eq(other.graph.raw_edges().iter().map(|e| (e.source(), e.target(), &e.weight)))
    }
}

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use crate::bond::Bond;
use crate::graph::{CompatibilityMatrix, Graph, VertexId, VertexKind};
use crate::graph_ops::distance_matrix;
use crate::mol::Structure;

use super::attractor::RingClosingAttractor;
use super::error::{RingClosureError, Result};
use super::params::RingClosureParams;

/// Pairwise compatibility and ring-size weights over the free ring-closing
/// vertices of one graph.
///
/// The manager works on a private copy of the structure. Virtual
/// ring-closing bonds added with
/// [`add_ring_closing_bond`](Self::add_ring_closing_bond) change topological
/// distances, so every addition recomputes compatibility and weights.
pub struct RingSizeManager<'a> {
    graph: &'a Graph,
    rc_compat: &'a CompatibilityMatrix,
    params: &'a RingClosureParams,
    structure: Structure,
    candidates: Vec<VertexId>,
    position: HashMap<VertexId, usize>,
    attractors: Vec<Option<RingClosingAttractor>>,
    topo: Vec<Vec<usize>>,
    compatible: Vec<Vec<bool>>,
    weights: Vec<u32>,
    done: Vec<bool>,
}

impl<'a> RingSizeManager<'a> {
    pub fn initialize(
        structure: &Structure,
        graph: &'a Graph,
        rc_compat: &'a CompatibilityMatrix,
        params: &'a RingClosureParams,
    ) -> Result<Self> {
        let candidates = graph.free_rc_vertices();
        let atoms_by_vertex = structure.atoms_by_vertex();
        let mut attractors = Vec::with_capacity(candidates.len());
        for &v in &candidates {
            let vertex = graph.vertex(v).ok_or(RingClosureError::UnknownVertex(v))?;
            let rca = match vertex.kind {
                VertexKind::Empty => None,
                VertexKind::Molecular => {
                    let atoms = atoms_by_vertex.get(&v).map(Vec::as_slice).unwrap_or(&[]);
                    RingClosingAttractor::of_vertex(structure, v, atoms)?
                }
            };
            attractors.push(rca);
        }
        let n = candidates.len();
        let position = candidates.iter().enumerate().map(|(i, &v)| (v, i)).collect();
        let mut rsm = Self {
            graph,
            rc_compat,
            params,
            structure: structure.clone(),
            candidates,
            position,
            attractors,
            topo: Vec::new(),
            compatible: vec![vec![false; n]; n],
            weights: vec![0; n],
            done: vec![false; n],
        };
        rsm.recompute();
        debug!(
            candidates = rsm.candidates.len(),
            total_weight = rsm.weights.iter().sum::<u32>(),
            "ring size manager initialized"
        );
        Ok(rsm)
    }

    fn recompute(&mut self) {
        self.topo = distance_matrix(&self.structure);
        let n = self.candidates.len();
        self.compatible = vec![vec![false; n]; n];
        self.weights = vec![0; n];
        for i in 0..n {
            for j in (i + 1)..n {
                if let Some(w) = self.pair_weight(i, j) {
                    self.compatible[i][j] = true;
                    self.compatible[j][i] = true;
                    self.weights[i] += w;
                    self.weights[j] += w;
                }
            }
        }
    }

    /// Weight of the pair, or `None` if the two cannot close a ring.
    fn pair_weight(&self, i: usize, j: usize) -> Option<u32> {
        let (vi, vj) = (self.candidates[i], self.candidates[j]);
        let empty_i = self.is_empty(vi);
        let empty_j = self.is_empty(vj);
        if empty_i != empty_j {
            return None;
        }
        if !self.attachment_classes_compatible(vi, vj) {
            return None;
        }
        if empty_i {
            return Some(1);
        }
        let (rca_i, rca_j) = (self.attractors[i]?, self.attractors[j]?);
        if !rca_i.is_compatible(&rca_j) {
            trace!(vi, vj, "incompatible attractor types");
            return None;
        }
        let size = self.ring_size_by_index(i, j)?;
        let weight = self.params.ring_size_weight(size);
        trace!(vi, vj, ring_size = size, weight, "ring size evaluated");
        (weight > 0).then_some(weight)
    }

    fn is_empty(&self, v: VertexId) -> bool {
        self.graph
            .vertex(v)
            .is_some_and(|vertex| vertex.kind == VertexKind::Empty)
    }

    /// The classes of the attachment points the two vertices hang from must
    /// be listed as compatible for ring closure, in either direction. Pairs
    /// hanging from the same atom of the same parent are excluded.
    fn attachment_classes_compatible(&self, vi: VertexId, vj: VertexId) -> bool {
        if vi == vj {
            return false;
        }
        let (Some(edge_i), Some(edge_j)) = (self.graph.parent_edge(vi), self.graph.parent_edge(vj))
        else {
            return false;
        };
        let (Some(ap_i), Some(ap_j)) = (self.graph.parent_ap(vi), self.graph.parent_ap(vj)) else {
            return false;
        };
        if !self.rc_compat.contains(&ap_i.class) || !self.rc_compat.contains(&ap_j.class) {
            trace!(vi, vj, "class without ring-closure compatibility entry");
            return false;
        }
        if edge_i.src.vertex == edge_j.src.vertex && ap_i.atom.is_some() && ap_i.atom == ap_j.atom {
            trace!(vi, vj, "same source atom");
            return false;
        }
        self.rc_compat.either_compatible(&ap_i.class, &ap_j.class)
    }

    fn ring_size_by_index(&self, i: usize, j: usize) -> Option<usize> {
        let (a, b) = (self.attractors[i]?, self.attractors[j]?);
        let d = self.topo[a.atom.index()][b.atom.index()];
        (d != usize::MAX && d > 0).then(|| d - 1)
    }

    fn index_of(&self, v: VertexId) -> Result<usize> {
        self.position
            .get(&v)
            .copied()
            .ok_or(RingClosureError::UnknownVertex(v))
    }

    /// Free ring-closing vertices in graph order.
    pub fn candidates(&self) -> &[VertexId] {
        &self.candidates
    }

    /// Number of atoms in the ring that closing `vi` with `vj` would form,
    /// for two molecular vertices joined through the structure.
    pub fn ring_size(&self, vi: VertexId, vj: VertexId) -> Result<Option<usize>> {
        Ok(self.ring_size_by_index(self.index_of(vi)?, self.index_of(vj)?))
    }

    pub fn weight(&self, v: VertexId) -> Result<u32> {
        Ok(self.weights[self.index_of(v)?])
    }

    pub fn compatibility_of_pair(&self, vi: VertexId, vj: VertexId) -> Result<bool> {
        Ok(self.compatible[self.index_of(vi)?][self.index_of(vj)?])
    }

    /// Every vertex not yet done, repeated as many times as its weight.
    pub fn biased_candidates(&self) -> Vec<VertexId> {
        let mut list = Vec::new();
        for (i, &v) in self.candidates.iter().enumerate() {
            if !self.done[i] {
                list.extend(std::iter::repeat(v).take(self.weights[i] as usize));
            }
        }
        list
    }

    /// Partners of `v` not yet done, each repeated by the weight of the ring
    /// size it would close.
    pub fn biased_candidates_for(&self, v: VertexId) -> Result<Vec<VertexId>> {
        let i = self.index_of(v)?;
        let mut list = Vec::new();
        for (j, &w) in self.candidates.iter().enumerate() {
            if i == j || self.done[j] || !self.compatible[i][j] {
                continue;
            }
            let copies = if self.attractors[i].is_none() || self.attractors[j].is_none() {
                1
            } else {
                self.ring_size_by_index(i, j)
                    .map_or(0, |size| self.params.ring_size_weight(size))
            };
            list.extend(std::iter::repeat(w).take(copies as usize));
        }
        Ok(list)
    }

    pub fn set_vertex_as_done(&mut self, v: VertexId) -> Result<()> {
        let i = self.index_of(v)?;
        self.done[i] = true;
        Ok(())
    }

    pub fn is_done(&self, v: VertexId) -> Result<bool> {
        Ok(self.done[self.index_of(v)?])
    }

    /// Bonds the source atoms of the two attractors in the private structure
    /// copy, then recomputes distances, compatibility and weights.
    pub fn add_ring_closing_bond(&mut self, vi: VertexId, vj: VertexId) -> Result<()> {
        let (i, j) = (self.index_of(vi)?, self.index_of(vj)?);
        let rca_i = self.attractors[i].ok_or(RingClosureError::NotAnAttractor { vertex: vi })?;
        let rca_j = self.attractors[j].ok_or(RingClosureError::NotAnAttractor { vertex: vj })?;
        let bond_type = self
            .graph
            .parent_edge(vi)
            .map(|e| e.bond_type)
            .ok_or_else(|| {
                RingClosureError::InconsistentPath(format!("vertex {vi} has no parent edge"))
            })?;
        if bond_type.has_chemical_analogue() {
            self.structure
                .add_bond(rca_i.src_atom, rca_j.src_atom, Bond::new(bond_type));
            debug!(vi, vj, %bond_type, "virtual ring-closing bond added");
        } else {
            warn!(vi, vj, %bond_type, "bond type has no chemical analogue; no virtual bond added");
        }
        self.recompute();
        Ok(())
    }

    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    pub fn attractor(&self, v: VertexId) -> Result<Option<RingClosingAttractor>> {
        Ok(self.attractors[self.index_of(v)?])
    }
}

//! Building-block graph: vertices, attachment points, edges and rings.
//!
//! Vertices and edges live in owned vectors and refer to each other by id.
//! The spanning structure is a tree rooted at the vertex without a parent
//! edge; rings are recorded separately as vertex sequences.

mod ap_class;
mod ring;

use std::collections::HashMap;

use thiserror::Error;

use crate::bond::BondType;

pub use ap_class::{ApClass, ApClassParseError, CompatibilityMatrix};
pub use ring::{same_ring_set, Ring};

pub type VertexId = usize;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("vertex {0} already exists")]
    DuplicateVertex(VertexId),
    #[error("unknown vertex {0}")]
    UnknownVertex(VertexId),
    #[error("vertex {vertex} has no attachment point {ap}")]
    UnknownAttachmentPoint { vertex: VertexId, ap: usize },
    #[error("attachment point {ap} of vertex {vertex} is already in use")]
    AttachmentPointInUse { vertex: VertexId, ap: usize },
    #[error("vertex {0} already has a parent edge")]
    AlreadyHasParent(VertexId),
    #[error(
        "bond type mismatch between ring ends {head:?} ({head_bond}) and {tail:?} ({tail_bond})"
    )]
    BondTypeMismatch {
        head: Option<VertexId>,
        tail: Option<VertexId>,
        head_bond: BondType,
        tail_bond: BondType,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexKind {
    /// A fragment that contributes atoms to the structure.
    Molecular,
    /// A placeholder with attachment points but no atoms.
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentPoint {
    pub class: ApClass,
    /// Position, within the owning vertex's atoms, of the atom holding this
    /// attachment point.
    pub atom: Option<usize>,
    /// Index of the edge using this attachment point.
    pub edge: Option<usize>,
}

impl AttachmentPoint {
    pub fn new(class: ApClass, atom: Option<usize>) -> Self {
        Self {
            class,
            atom,
            edge: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.edge.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub id: VertexId,
    /// Index of the building block this vertex was taken from.
    pub building_block: usize,
    pub kind: VertexKind,
    pub is_rcv: bool,
    pub aps: Vec<AttachmentPoint>,
}

impl Vertex {
    pub fn new(id: VertexId, building_block: usize, kind: VertexKind) -> Self {
        Self {
            id,
            building_block,
            kind,
            is_rcv: false,
            aps: Vec::new(),
        }
    }

    /// A ring-closing vertex with a single attachment point of `class`.
    pub fn ring_closing(id: VertexId, building_block: usize, kind: VertexKind, class: ApClass) -> Self {
        let atom = (kind == VertexKind::Molecular).then_some(0);
        Self {
            id,
            building_block,
            kind,
            is_rcv: true,
            aps: vec![AttachmentPoint::new(class, atom)],
        }
    }

    pub fn with_ap(mut self, class: ApClass, atom: Option<usize>) -> Self {
        self.aps.push(AttachmentPoint::new(class, atom));
        self
    }
}

/// Reference to attachment point `ap` of vertex `vertex`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ApRef {
    pub vertex: VertexId,
    pub ap: usize,
}

impl ApRef {
    pub fn new(vertex: VertexId, ap: usize) -> Self {
        Self { vertex, ap }
    }
}

/// Directed from the parent side (`src`) to the child side (`trg`).
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub src: ApRef,
    pub trg: ApRef,
    pub bond_type: BondType,
}

impl Edge {
    /// The attachment point this edge uses on `vertex`, if it touches it.
    pub fn ap_on(&self, vertex: VertexId) -> Option<usize> {
        if self.src.vertex == vertex {
            Some(self.src.ap)
        } else if self.trg.vertex == vertex {
            Some(self.trg.ap)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Graph {
    vertices: Vec<Vertex>,
    index: HashMap<VertexId, usize>,
    edges: Vec<Edge>,
    parent_edge: HashMap<VertexId, usize>,
    rings: Vec<Ring>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, vertex: Vertex) -> Result<VertexId, GraphError> {
        let id = vertex.id;
        if self.index.contains_key(&id) {
            return Err(GraphError::DuplicateVertex(id));
        }
        self.index.insert(id, self.vertices.len());
        self.vertices.push(vertex);
        Ok(id)
    }

    /// Connects a free attachment point of the parent to a free attachment
    /// point of a vertex that has no parent yet.
    pub fn add_edge(&mut self, src: ApRef, trg: ApRef, bond_type: BondType) -> Result<usize, GraphError> {
        self.check_free_ap(src)?;
        self.check_free_ap(trg)?;
        if self.parent_edge.contains_key(&trg.vertex) {
            return Err(GraphError::AlreadyHasParent(trg.vertex));
        }
        let edge_idx = self.edges.len();
        self.edges.push(Edge {
            src,
            trg,
            bond_type,
        });
        self.parent_edge.insert(trg.vertex, edge_idx);
        for r in [src, trg] {
            let pos = self.index[&r.vertex];
            self.vertices[pos].aps[r.ap].edge = Some(edge_idx);
        }
        Ok(edge_idx)
    }

    fn check_free_ap(&self, r: ApRef) -> Result<(), GraphError> {
        let v = self.vertex(r.vertex).ok_or(GraphError::UnknownVertex(r.vertex))?;
        let ap = v.aps.get(r.ap).ok_or(GraphError::UnknownAttachmentPoint {
            vertex: r.vertex,
            ap: r.ap,
        })?;
        if !ap.is_available() {
            return Err(GraphError::AttachmentPointInUse {
                vertex: r.vertex,
                ap: r.ap,
            });
        }
        Ok(())
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.index.get(&id).map(|&i| &self.vertices[i])
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, idx: usize) -> Option<&Edge> {
        self.edges.get(idx)
    }

    pub fn parent_edge(&self, id: VertexId) -> Option<&Edge> {
        self.parent_edge.get(&id).map(|&e| &self.edges[e])
    }

    pub fn parent_edge_index(&self, id: VertexId) -> Option<usize> {
        self.parent_edge.get(&id).copied()
    }

    pub fn parent(&self, id: VertexId) -> Option<VertexId> {
        self.parent_edge(id).map(|e| e.src.vertex)
    }

    /// The parent-side attachment point of the edge leading to `id`.
    pub fn parent_ap(&self, id: VertexId) -> Option<&AttachmentPoint> {
        let edge = self.parent_edge(id)?;
        self.vertex(edge.src.vertex)?.aps.get(edge.src.ap)
    }

    /// `id`, its parent, grandparent and so on up to the root.
    pub fn path_to_root(&self, id: VertexId) -> Vec<VertexId> {
        let mut path = vec![id];
        let mut current = id;
        while let Some(p) = self.parent(current) {
            path.push(p);
            current = p;
        }
        path
    }

    /// The tree edge joining `a` and `b`, in either direction.
    pub fn edge_between(&self, a: VertexId, b: VertexId) -> Option<&Edge> {
        self.parent_edge(a)
            .filter(|e| e.src.vertex == b)
            .or_else(|| self.parent_edge(b).filter(|e| e.src.vertex == a))
    }

    pub fn rc_vertices(&self) -> impl Iterator<Item = &Vertex> + '_ {
        self.vertices.iter().filter(|v| v.is_rcv)
    }

    /// Ring-closing vertices not yet used by any ring, in insertion order.
    pub fn free_rc_vertices(&self) -> Vec<VertexId> {
        self.rc_vertices()
            .filter(|v| !self.is_in_ring(v.id))
            .map(|v| v.id)
            .collect()
    }

    pub fn is_in_ring(&self, id: VertexId) -> bool {
        self.rings.iter().any(|r| r.contains(id))
    }

    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    pub fn add_ring(&mut self, ring: Ring) {
        self.rings.push(ring);
    }
}

//! Small graph/structure fixtures shared by the unit tests.

use nalgebra::Point3;
use petgraph::graph::NodeIndex;

use crate::atom::{Atom, AtomKind, AttractorKind};
use crate::bond::{Bond, BondType};
use crate::element::Element;
use crate::graph::{ApClass, ApRef, CompatibilityMatrix, Graph, Vertex, VertexId, VertexKind};
use crate::mol::Structure;

use super::error::Result;
use super::params::RingClosureParams;
use super::size_manager::RingSizeManager;

pub(crate) fn class(s: &str) -> ApClass {
    s.parse().unwrap()
}

/// A linear chain of one-carbon vertices (ids `0..n`, rooted at 0) with
/// ring-closing vertices hung from chosen carbons. Carbon `k` has two side
/// attachment points of class `rc:0`.
///
/// Carbons form a planar zigzag with 1.5 bond lengths and 120 degree angles,
/// so two attractors five carbons apart can close a six-membered ring.
pub(crate) struct ChainFixture {
    pub graph: Graph,
    pub structure: Structure,
    pub rc_compat: CompatibilityMatrix,
    pub carbons: Vec<NodeIndex>,
    rcvs: Vec<VertexId>,
    rcv_atoms: Vec<Option<NodeIndex>>,
    side_used: Vec<usize>,
}

impl ChainFixture {
    pub fn new(n: usize) -> Self {
        let mut graph = Graph::new();
        let mut structure = Structure::new();
        let mut carbons = Vec::new();
        for k in 0..n {
            graph
                .add_vertex(
                    Vertex::new(k, 0, VertexKind::Molecular)
                        .with_ap(class("c:0"), Some(0))
                        .with_ap(class("c:0"), Some(0))
                        .with_ap(class("rc:0"), Some(0))
                        .with_ap(class("rc:0"), Some(0)),
                )
                .unwrap();
            let p = Self::zigzag(k as isize);
            let c = structure.add_atom(Atom::from_element(Element::C).at(p.x, p.y, p.z).in_vertex(k));
            if k > 0 {
                graph
                    .add_edge(ApRef::new(k - 1, 1), ApRef::new(k, 0), BondType::Single)
                    .unwrap();
                structure.add_bond(carbons[k - 1], c, Bond::rotatable(BondType::Single));
            }
            carbons.push(c);
        }
        Self {
            graph,
            structure,
            rc_compat: CompatibilityMatrix::from_pairs([(class("rc:0"), class("rc:0"))]),
            carbons,
            rcvs: Vec::new(),
            rcv_atoms: Vec::new(),
            side_used: vec![0; n],
        }
    }

    fn hang(&mut self, pos: usize, kind: VertexKind, bond_type: BondType) -> VertexId {
        let id = 100 + self.rcvs.len();
        let side = 2 + self.side_used[pos];
        self.side_used[pos] += 1;
        self.graph
            .add_vertex(Vertex::ring_closing(id, 9, kind, class("rc:0")))
            .unwrap();
        self.graph
            .add_edge(ApRef::new(pos, side), ApRef::new(id, 0), bond_type)
            .unwrap();
        self.rcvs.push(id);
        id
    }

    fn zigzag(k: isize) -> Point3<f64> {
        Point3::new(1.3 * k as f64, if k % 2 == 0 { 0.0 } else { 0.75 }, 0.0)
    }

    /// Where a third substituent of carbon `pos` sits: in the chain plane at
    /// 120 degrees from the chain bonds, or above the plane for a second
    /// ring-closing vertex on the same carbon.
    fn attractor_position(&self, pos: usize) -> Point3<f64> {
        let c = self.structure.atom(self.carbons[pos]).position.unwrap();
        if self.side_used[pos] > 1 {
            return Point3::new(c.x, c.y, 1.5);
        }
        let n = self.carbons.len() as isize;
        let k = pos as isize;
        match (k > 0, k + 1 < n) {
            (true, true) => {
                let a = (Self::zigzag(k - 1) - c).normalize();
                let b = (Self::zigzag(k + 1) - c).normalize();
                c - (a + b).normalize() * 1.5
            }
            (false, _) => Self::zigzag(k - 1),
            (true, false) => Self::zigzag(k + 1),
        }
    }

    pub fn rcv(self, pos: usize, kind: AttractorKind) -> Self {
        self.rcv_bonded(pos, kind, BondType::Single)
    }

    pub fn rcv_bonded(mut self, pos: usize, kind: AttractorKind, bond_type: BondType) -> Self {
        let id = self.hang(pos, VertexKind::Molecular, bond_type);
        let c = self.carbons[pos];
        let p = self.attractor_position(pos);
        let a = self
            .structure
            .add_atom(Atom::attractor(kind).at(p.x, p.y, p.z).in_vertex(id));
        self.structure.add_bond(c, a, Bond::new(bond_type));
        self.rcv_atoms.push(Some(a));
        self
    }

    pub fn empty_rcv(mut self, pos: usize) -> Self {
        self.hang(pos, VertexKind::Empty, BondType::Single);
        self.rcv_atoms.push(None);
        self
    }

    /// Turns the attractor of the `k`-th ring-closing vertex into a carbon.
    pub fn corrupt_rcv(mut self, k: usize) -> Self {
        if let Some(a) = self.rcv_atoms[k] {
            self.structure.atom_mut(a).kind = AtomKind::Element(Element::C);
        }
        self
    }

    pub fn rcv_id(&self, k: usize) -> VertexId {
        self.rcvs[k]
    }

    pub fn size_manager<'a>(&'a self, params: &'a RingClosureParams) -> Result<RingSizeManager<'a>> {
        RingSizeManager::initialize(&self.structure, &self.graph, &self.rc_compat, params)
    }
}

use std::collections::HashSet;
use std::fmt;

use nalgebra::Point3;
use petgraph::graph::NodeIndex;

use crate::bond::BondType;
use crate::graph::{Graph, VertexId, VertexKind};
use crate::graph_ops::shortest_path_within;
use crate::mol::Structure;

use super::attractor::RingClosingAttractor;
use super::conformation::{bond_key, BondKey, ClosableConformation};
use super::error::{RingClosureError, Result};

/// Identity of a chain of building blocks, independent of the direction in
/// which it is read.
///
/// The identifier lists the inner vertices of the chain (the two
/// ring-closing vertices are left out) as `building-block/ap-in/ap-out`
/// tokens joined by the bond types between them. Of the two reading
/// directions the lexicographically smaller string is kept; `reversed`
/// records whether this path reads the chain in the opposite direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainId {
    canonical: String,
    reversed: bool,
}

impl ChainId {
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

/// The chain of graph vertices joining two ring-closing vertices.
#[derive(Debug, Clone)]
pub struct PathSubGraph {
    vertices: Vec<VertexId>,
    /// `edges[k]` joins `vertices[k]` and `vertices[k + 1]`.
    edges: Vec<usize>,
    turning_point: usize,
    head_bond: BondType,
    tail_bond: BondType,
    chain_id: ChainId,
}

/// Atoms, coordinates and bonds of a path in a 3D structure. The first and
/// last atoms are the attractors of the two ring-closing vertices.
#[derive(Debug, Clone)]
pub struct PathGeometry {
    pub atoms: Vec<NodeIndex>,
    pub points: Vec<Point3<f64>>,
    pub bonds: Vec<BondKey>,
    pub rotatable: Vec<bool>,
    /// Reference points for the torsion of every bond except the first and
    /// the last.
    pub dihedral_refs: Vec<[Point3<f64>; 4]>,
}

impl PathSubGraph {
    pub fn new(graph: &Graph, head: VertexId, tail: VertexId) -> Result<Self> {
        if head == tail {
            return Err(RingClosureError::InconsistentPath(format!(
                "path from vertex {head} to itself"
            )));
        }
        for v in [head, tail] {
            graph.vertex(v).ok_or(RingClosureError::UnknownVertex(v))?;
        }
        let up_from_head = graph.path_to_root(head);
        let up_from_tail = graph.path_to_root(tail);
        let (pos_head, pos_tail) = up_from_head
            .iter()
            .enumerate()
            .find_map(|(i, v)| up_from_tail.iter().position(|w| w == v).map(|j| (i, j)))
            .ok_or_else(|| {
                RingClosureError::InconsistentPath(format!(
                    "vertices {head} and {tail} have no common ancestor"
                ))
            })?;

        let mut vertices: Vec<VertexId> = up_from_head[..=pos_head].to_vec();
        vertices.extend(up_from_tail[..pos_tail].iter().rev());

        let mut edges = Vec::with_capacity(vertices.len() - 1);
        for w in vertices.windows(2) {
            let edge = graph
                .parent_edge_index(w[0])
                .filter(|&e| graph.edges()[e].src.vertex == w[1])
                .or_else(|| {
                    graph
                        .parent_edge_index(w[1])
                        .filter(|&e| graph.edges()[e].src.vertex == w[0])
                })
                .ok_or_else(|| {
                    RingClosureError::InconsistentPath(format!(
                        "no edge between vertices {} and {}",
                        w[0], w[1]
                    ))
                })?;
            edges.push(edge);
        }

        let head_bond = graph.edges()[edges[0]].bond_type;
        let tail_bond = graph.edges()[edges[edges.len() - 1]].bond_type;
        let chain_id = chain_id(graph, &vertices, &edges)?;
        Ok(Self {
            vertices,
            edges,
            turning_point: pos_head,
            head_bond,
            tail_bond,
            chain_id,
        })
    }

    pub fn head(&self) -> VertexId {
        self.vertices[0]
    }

    pub fn tail(&self) -> VertexId {
        self.vertices[self.vertices.len() - 1]
    }

    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    pub fn edges(&self) -> &[usize] {
        &self.edges
    }

    /// The vertex closest to the root, where the path turns from going up
    /// the tree to going down.
    pub fn turning_point(&self) -> VertexId {
        self.vertices[self.turning_point]
    }

    pub fn head_bond(&self) -> BondType {
        self.head_bond
    }

    pub fn tail_bond(&self) -> BondType {
        self.tail_bond
    }

    pub fn chain_id(&self) -> &ChainId {
        &self.chain_id
    }

    /// Locates the path in `structure` and reads its 3D data.
    pub fn geometry(&self, graph: &Graph, structure: &Structure) -> Result<PathGeometry> {
        let by_vertex = structure.atoms_by_vertex();
        let mut ends = [NodeIndex::end(); 2];
        for (slot, v) in ends.iter_mut().zip([self.head(), self.tail()]) {
            let vertex = graph.vertex(v).ok_or(RingClosureError::UnknownVertex(v))?;
            if vertex.kind == VertexKind::Empty {
                return Err(RingClosureError::InconsistentPath(format!(
                    "ring-closing vertex {v} has no atoms"
                )));
            }
            let atoms = by_vertex.get(&v).map(Vec::as_slice).unwrap_or(&[]);
            let rca = RingClosingAttractor::of_vertex(structure, v, atoms)?.ok_or_else(|| {
                RingClosureError::InconsistentPath(format!("attractor of vertex {v} is not bonded"))
            })?;
            *slot = rca.atom;
        }

        let allowed: HashSet<NodeIndex> = self
            .vertices
            .iter()
            .filter_map(|v| by_vertex.get(v))
            .flatten()
            .copied()
            .collect();
        let atoms = shortest_path_within(structure, ends[0], ends[1], |a| allowed.contains(&a))
            .ok_or_else(|| {
                RingClosureError::InconsistentPath(format!(
                    "no atom path between vertices {} and {}",
                    self.head(),
                    self.tail()
                ))
            })?;

        let points = atoms
            .iter()
            .map(|&a| position_of(structure, a))
            .collect::<Result<Vec<_>>>()?;

        let mut bonds = Vec::with_capacity(atoms.len() - 1);
        let mut rotatable = Vec::with_capacity(atoms.len() - 1);
        for w in atoms.windows(2) {
            let e = structure.bond_between(w[0], w[1]).ok_or_else(|| {
                RingClosureError::InconsistentPath(format!(
                    "atoms {} and {} are not bonded",
                    w[0].index(),
                    w[1].index()
                ))
            })?;
            bonds.push(bond_key(w[0].index(), w[1].index()));
            rotatable.push(structure.bond(e).is_rotatable());
        }

        let mut dihedral_refs = Vec::new();
        for i in 1..bonds.len().saturating_sub(1) {
            let (a1, a2) = (atoms[i], atoms[i + 1]);
            let p0 = lowest_other_neighbor(structure, a1, a2)?;
            let p3 = lowest_other_neighbor(structure, a2, a1)?;
            dihedral_refs.push([
                position_of(structure, p0)?,
                points[i],
                points[i + 1],
                position_of(structure, p3)?,
            ]);
        }

        Ok(PathGeometry {
            atoms,
            points,
            bonds,
            rotatable,
            dihedral_refs,
        })
    }
}

fn position_of(structure: &Structure, atom: NodeIndex) -> Result<Point3<f64>> {
    structure
        .atom(atom)
        .position
        .ok_or(RingClosureError::MissingCoordinates { atom: atom.index() })
}

fn lowest_other_neighbor(
    structure: &Structure,
    atom: NodeIndex,
    other: NodeIndex,
) -> Result<NodeIndex> {
    structure
        .neighbors(atom)
        .filter(|&n| n != other)
        .min()
        .ok_or_else(|| {
            RingClosureError::InconsistentPath(format!(
                "atom {} has no neighbour to define a torsion",
                atom.index()
            ))
        })
}

fn bond_code(bt: BondType) -> char {
    match bt.order() {
        Some(1) => '1',
        Some(2) => '2',
        Some(3) => '3',
        Some(_) => '4',
        None => match bt {
            BondType::Any => 'a',
            BondType::None => 'n',
            _ => 'u',
        },
    }
}

fn chain_id(graph: &Graph, vertices: &[VertexId], edges: &[usize]) -> Result<ChainId> {
    let mut forward = Vec::new();
    for k in 1..vertices.len() - 1 {
        let v = vertices[k];
        let vertex = graph.vertex(v).ok_or(RingClosureError::UnknownVertex(v))?;
        let ap_in = graph.edges()[edges[k - 1]].ap_on(v);
        let ap_out = graph.edges()[edges[k]].ap_on(v);
        let (Some(ap_in), Some(ap_out)) = (ap_in, ap_out) else {
            return Err(RingClosureError::InconsistentPath(format!(
                "vertex {v} is not an end of its path edges"
            )));
        };
        let tag = match vertex.kind {
            VertexKind::Molecular => 'm',
            VertexKind::Empty => 'e',
        };
        forward.push((format!("{tag}{}", vertex.building_block), ap_in, ap_out));
    }

    let link = |k: usize| bond_code(graph.edges()[edges[k]].bond_type);
    let mut fwd = String::new();
    for (i, (bb, ap_in, ap_out)) in forward.iter().enumerate() {
        if i > 0 {
            fwd.push('_');
            fwd.push(link(i));
            fwd.push('_');
        }
        fwd.push_str(&format!("{bb}/{ap_in}/{ap_out}"));
    }
    let mut rev = String::new();
    for (i, (bb, ap_in, ap_out)) in forward.iter().enumerate().rev() {
        if i + 1 < forward.len() {
            rev.push('_');
            rev.push(link(i + 1));
            rev.push('_');
        }
        rev.push_str(&format!("{bb}/{ap_out}/{ap_in}"));
    }

    Ok(if rev < fwd {
        ChainId {
            canonical: rev,
            reversed: true,
        }
    } else {
        ChainId {
            canonical: fwd,
            reversed: false,
        }
    })
}

impl PathGeometry {
    pub fn rotatable_bonds(&self) -> impl Iterator<Item = BondKey> + '_ {
        self.bonds
            .iter()
            .zip(&self.rotatable)
            .filter(|(_, &r)| r)
            .map(|(&b, _)| b)
    }

    /// Keeps the torsions of the rotatable bonds of a full per-bond vector.
    pub fn conformation_from(&self, torsions: &[f64]) -> Result<ClosableConformation> {
        if torsions.len() != self.bonds.len() {
            return Err(RingClosureError::InconsistentPath(format!(
                "{} torsions for a chain of {} bonds",
                torsions.len(),
                self.bonds.len()
            )));
        }
        let (bonds, angles) = self
            .bonds
            .iter()
            .zip(&self.rotatable)
            .zip(torsions)
            .filter(|((_, &r), _)| r)
            .map(|((&b, _), &a)| (b, a))
            .unzip();
        Ok(ClosableConformation::new(bonds, angles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::AttractorKind::{Minus, Plus};
    use crate::rings::test_support::ChainFixture;

    #[test]
    fn path_turns_at_the_common_ancestor() {
        let fx = ChainFixture::new(8).rcv(0, Plus).rcv(5, Minus);
        let (h, t) = (fx.rcv_id(0), fx.rcv_id(1));
        let path = PathSubGraph::new(&fx.graph, h, t).unwrap();
        assert_eq!(path.vertices(), &[h, 0, 1, 2, 3, 4, 5, t]);
        assert_eq!(path.turning_point(), 0);
        assert_eq!(path.edges().len(), 7);
        assert_eq!(path.head_bond(), BondType::Single);
        assert_eq!(path.tail_bond(), BondType::Single);
    }

    #[test]
    fn chain_id_does_not_depend_on_direction() {
        let fx = ChainFixture::new(8).rcv(2, Plus).rcv(6, Minus);
        let (h, t) = (fx.rcv_id(0), fx.rcv_id(1));
        let forward = PathSubGraph::new(&fx.graph, h, t).unwrap();
        let backward = PathSubGraph::new(&fx.graph, t, h).unwrap();
        assert_eq!(forward.chain_id().as_str(), backward.chain_id().as_str());
        assert_ne!(forward.chain_id().is_reversed(), backward.chain_id().is_reversed());
    }

    #[test]
    fn equivalent_chains_in_different_graphs_share_an_id() {
        let a = ChainFixture::new(8).rcv(0, Plus).rcv(4, Minus);
        let b = ChainFixture::new(12).rcv(3, Plus).rcv(7, Minus);
        let pa = PathSubGraph::new(&a.graph, a.rcv_id(0), a.rcv_id(1)).unwrap();
        let pb = PathSubGraph::new(&b.graph, b.rcv_id(0), b.rcv_id(1)).unwrap();
        // b turns at vertex 3, a at the root
        assert_eq!(pa.vertices().len(), pb.vertices().len());
        assert_eq!(pa.chain_id(), pb.chain_id());
    }

    #[test]
    fn geometry_follows_the_atom_chain() {
        let fx = ChainFixture::new(8).rcv(0, Plus).rcv(5, Minus);
        let path = PathSubGraph::new(&fx.graph, fx.rcv_id(0), fx.rcv_id(1)).unwrap();
        let geo = path.geometry(&fx.graph, &fx.structure).unwrap();
        assert_eq!(geo.atoms.len(), 8);
        assert_eq!(geo.points.len(), 8);
        assert_eq!(geo.bonds.len(), 7);
        assert_eq!(geo.dihedral_refs.len(), 5);
        assert_eq!(geo.rotatable, vec![false, true, true, true, true, true, false]);
        assert_eq!(geo.rotatable_bonds().count(), 5);
        let conf = geo.conformation_from(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 0.0]).unwrap();
        assert_eq!(conf.angles(), &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(geo.conformation_from(&[0.0; 3]).is_err());
    }

    #[test]
    fn missing_coordinates_are_reported() {
        let mut fx = ChainFixture::new(6).rcv(0, Plus).rcv(4, Minus);
        let c2 = fx.carbons[2];
        fx.structure.atom_mut(c2).position = None;
        let path = PathSubGraph::new(&fx.graph, fx.rcv_id(0), fx.rcv_id(1)).unwrap();
        let err = path.geometry(&fx.graph, &fx.structure).unwrap_err();
        assert!(matches!(err, RingClosureError::MissingCoordinates { atom } if atom == c2.index()));
    }

    #[test]
    fn self_paths_are_rejected() {
        let fx = ChainFixture::new(3).rcv(0, Plus);
        assert!(PathSubGraph::new(&fx.graph, fx.rcv_id(0), fx.rcv_id(0)).is_err());
    }
}

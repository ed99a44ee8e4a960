use petgraph::graph::NodeIndex;

use crate::atom::AttractorKind;
use crate::graph::VertexId;
use crate::mol::Structure;

use super::error::{RingClosureError, Result};

/// The attractor pseudo-atom of a molecular ring-closing vertex, with the
/// atom it is bonded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingClosingAttractor {
    pub vertex: VertexId,
    pub atom: NodeIndex,
    pub kind: AttractorKind,
    /// The single neighbour of the attractor, where the ring-closing bond
    /// will start.
    pub src_atom: NodeIndex,
}

impl RingClosingAttractor {
    /// Reads the attractor held by `vertex`, whose atoms are `atoms`.
    ///
    /// Returns `Ok(None)` for an attractor without neighbours, which happens
    /// when the ring-closing vertex is the root of the graph.
    pub fn of_vertex(
        structure: &Structure,
        vertex: VertexId,
        atoms: &[NodeIndex],
    ) -> Result<Option<Self>> {
        let &[atom] = atoms else {
            return Err(RingClosureError::MultiAtomRcv {
                vertex,
                atoms: atoms.len(),
            });
        };
        let kind = structure
            .atom(atom)
            .attractor_kind()
            .ok_or(RingClosureError::NotAnAttractor { vertex })?;
        let neighbors: Vec<NodeIndex> = structure.neighbors(atom).collect();
        match neighbors[..] {
            [] => Ok(None),
            [src_atom] => Ok(Some(Self {
                vertex,
                atom,
                kind,
                src_atom,
            })),
            _ => Err(RingClosureError::NotAnAttractor { vertex }),
        }
    }

    pub fn is_compatible(&self, other: &Self) -> bool {
        self.kind.is_compatible(other.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Atom;
    use crate::bond::Bond;
    use crate::element::Element;

    #[test]
    fn reads_attractor_and_source_atom() {
        let mut s = Structure::new();
        let c = s.add_atom(Atom::from_element(Element::C).in_vertex(0));
        let a = s.add_atom(Atom::attractor(AttractorKind::Minus).in_vertex(1));
        s.add_bond(c, a, Bond::default());
        let rca = RingClosingAttractor::of_vertex(&s, 1, &[a]).unwrap().unwrap();
        assert_eq!(rca.src_atom, c);
        assert_eq!(rca.kind, AttractorKind::Minus);
    }

    #[test]
    fn lone_attractor_is_skipped() {
        let mut s = Structure::new();
        let a = s.add_atom(Atom::attractor(AttractorKind::Plus));
        assert!(RingClosingAttractor::of_vertex(&s, 0, &[a]).unwrap().is_none());
    }

    #[test]
    fn malformed_ring_closing_vertices_are_errors() {
        let mut s = Structure::new();
        let c = s.add_atom(Atom::from_element(Element::C));
        let a = s.add_atom(Atom::attractor(AttractorKind::Plus));
        assert!(matches!(
            RingClosingAttractor::of_vertex(&s, 4, &[c]),
            Err(RingClosureError::NotAnAttractor { vertex: 4 })
        ));
        assert!(matches!(
            RingClosingAttractor::of_vertex(&s, 4, &[c, a]),
            Err(RingClosureError::MultiAtomRcv { vertex: 4, atoms: 2 })
        ));
        assert!(matches!(
            RingClosingAttractor::of_vertex(&s, 4, &[]),
            Err(RingClosureError::MultiAtomRcv { atoms: 0, .. })
        ));
    }
}

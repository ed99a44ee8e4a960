use serde::{Deserialize, Serialize};

use super::{GraphError, VertexId};
use crate::bond::BondType;

/// A cycle through the graph: an ordered vertex sequence whose first and
/// last vertices are the two ring-closing vertices joined by the chord.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ring {
    vertices: Vec<VertexId>,
    #[serde(rename = "bndTyp")]
    bond_type: BondType,
}

impl Ring {
    pub fn new(vertices: Vec<VertexId>, bond_type: BondType) -> Self {
        Self {
            vertices,
            bond_type,
        }
    }

    /// Builds the ring closed by joining the head and tail vertices.
    ///
    /// The two ends must have been reached through bonds of the same type;
    /// that type becomes the type of the closing chord.
    pub fn closing(
        vertices: Vec<VertexId>,
        head_bond: BondType,
        tail_bond: BondType,
    ) -> Result<Self, GraphError> {
        if head_bond != tail_bond {
            return Err(GraphError::BondTypeMismatch {
                head: vertices.first().copied(),
                tail: vertices.last().copied(),
                head_bond,
                tail_bond,
            });
        }
        Ok(Self::new(vertices, head_bond))
    }

    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    pub fn head(&self) -> Option<VertexId> {
        self.vertices.first().copied()
    }

    pub fn tail(&self) -> Option<VertexId> {
        self.vertices.last().copied()
    }

    pub fn bond_type(&self) -> BondType {
        self.bond_type
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn contains(&self, v: VertexId) -> bool {
        self.vertices.contains(&v)
    }

    /// Same cycle, read in either direction.
    pub fn same_ring(&self, other: &Ring) -> bool {
        if self.vertices.len() != other.vertices.len() {
            return false;
        }
        self.vertices == other.vertices
            || self.vertices.iter().eq(other.vertices.iter().rev())
    }
}

/// Two ring combinations are the same set when every ring of one matches a
/// distinct ring of the other, regardless of order and direction.
pub fn same_ring_set(a: &[Ring], b: &[Ring]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut used = vec![false; b.len()];
    'outer: for ring in a {
        for (j, other) in b.iter().enumerate() {
            if !used[j] && ring.same_ring(other) {
                used[j] = true;
                continue 'outer;
            }
        }
        return false;
    }
    true
}

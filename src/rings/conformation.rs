use super::geometry::angular_difference;

/// Bond of a structure, as the sorted pair of its atom indices.
pub type BondKey = (usize, usize);

pub fn bond_key(a: usize, b: usize) -> BondKey {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Torsion angles, one per rotatable bond of a chain, that bring the chain
/// into ring-closing alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosableConformation {
    bonds: Vec<BondKey>,
    angles: Vec<f64>,
}

impl ClosableConformation {
    /// `bonds` and `angles` are parallel lists.
    pub fn new(bonds: Vec<BondKey>, angles: Vec<f64>) -> Self {
        debug_assert_eq!(bonds.len(), angles.len());
        Self { bonds, angles }
    }

    pub fn bonds(&self) -> &[BondKey] {
        &self.bonds
    }

    pub fn angles(&self) -> &[f64] {
        &self.angles
    }

    pub fn angle_of(&self, bond: BondKey) -> Option<f64> {
        self.bonds
            .iter()
            .position(|&b| b == bond)
            .map(|i| self.angles[i])
    }

    pub fn shares_bond(&self, other: &Self) -> bool {
        self.bonds.iter().any(|b| other.bonds.contains(b))
    }

    /// True when every bond the two conformations share has torsions no
    /// further apart than `tolerance` degrees.
    pub fn can_coexist(&self, other: &Self, tolerance: f64) -> bool {
        self.bonds.iter().zip(&self.angles).all(|(&bond, &angle)| {
            other
                .angle_of(bond)
                .is_none_or(|a| angular_difference(a, angle) <= tolerance)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bond_keys_are_order_independent() {
        assert_eq!(bond_key(4, 2), bond_key(2, 4));
    }

    #[test]
    fn coexistence_only_looks_at_shared_bonds() {
        let a = ClosableConformation::new(vec![(1, 2), (2, 3)], vec![60.0, 180.0]);
        let b = ClosableConformation::new(vec![(2, 3), (3, 4)], vec![174.0, -60.0]);
        let c = ClosableConformation::new(vec![(2, 3)], vec![150.0]);
        let d = ClosableConformation::new(vec![(7, 8)], vec![0.0]);
        assert!(a.shares_bond(&b));
        assert!(a.can_coexist(&b, 6.0));
        assert!(!a.can_coexist(&c, 6.0));
        assert!(!a.shares_bond(&d));
        assert!(a.can_coexist(&d, 6.0));
    }

    #[test]
    fn coexistence_wraps_around_the_circle() {
        let a = ClosableConformation::new(vec![(1, 2)], vec![178.0]);
        let b = ClosableConformation::new(vec![(1, 2)], vec![-178.0]);
        assert!(a.can_coexist(&b, 6.0));
        assert!(b.can_coexist(&a, 6.0));
    }
}

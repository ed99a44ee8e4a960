use std::fmt;

use serde::{Deserialize, Serialize};

/// Bond type carried by graph edges and structure bonds.
///
/// Edges of the building-block graph use the full range; bonds of a 3D
/// structure normally use the variants with a chemical analogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BondType {
    None,
    #[default]
    Single,
    Double,
    Triple,
    Quadruple,
    Any,
    Undefined,
}

impl BondType {
    /// Bond order, for types that correspond to a real bond.
    pub fn order(self) -> Option<u8> {
        match self {
            Self::Single => Some(1),
            Self::Double => Some(2),
            Self::Triple => Some(3),
            Self::Quadruple => Some(4),
            Self::None | Self::Any | Self::Undefined => None,
        }
    }

    pub fn has_chemical_analogue(self) -> bool {
        self.order().is_some()
    }
}

impl fmt::Display for BondType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "NONE",
            Self::Single => "SINGLE",
            Self::Double => "DOUBLE",
            Self::Triple => "TRIPLE",
            Self::Quadruple => "QUADRUPLE",
            Self::Any => "ANY",
            Self::Undefined => "UNDEFINED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bond {
    pub bond_type: BondType,
    /// `None` when no rotatability information was supplied; treated as
    /// non-rotatable.
    pub rotatable: Option<bool>,
}

impl Bond {
    pub fn new(bond_type: BondType) -> Self {
        Self {
            bond_type,
            rotatable: None,
        }
    }

    pub fn rotatable(bond_type: BondType) -> Self {
        Self {
            bond_type,
            rotatable: Some(true),
        }
    }

    pub fn is_rotatable(&self) -> bool {
        self.rotatable.unwrap_or(false)
    }
}

impl Default for Bond {
    fn default() -> Self {
        Self::new(BondType::Single)
    }
}

impl crate::traits::HasBondType for Bond {
    fn bond_type(&self) -> BondType {
        self.bond_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_real_bonds_have_an_order() {
        assert_eq!(BondType::Double.order(), Some(2));
        assert!(BondType::Quadruple.has_chemical_analogue());
        for bt in [BondType::None, BondType::Any, BondType::Undefined] {
            assert!(!bt.has_chemical_analogue(), "{bt}");
        }
    }

    #[test]
    fn missing_rotatability_means_not_rotatable() {
        assert!(!Bond::new(BondType::Single).is_rotatable());
        assert!(Bond::rotatable(BondType::Single).is_rotatable());
    }
}

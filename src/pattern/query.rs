use crate::bond::BondType;
use crate::element::Element;

/// Atom primitive of a pattern query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtomExpr {
    /// `*`
    Any,
    /// `C`, `[Cl]`, `[#8]`
    Element(Element),
    /// `D<n>`: number of explicit neighbours.
    Degree(u8),
    Not(Box<AtomExpr>),
    And(Vec<AtomExpr>),
    Or(Vec<AtomExpr>),
}

impl AtomExpr {
    pub fn matches(&self, element: Option<Element>, degree: usize) -> bool {
        match self {
            Self::Any => true,
            Self::Element(e) => element == Some(*e),
            Self::Degree(d) => degree == *d as usize,
            Self::Not(inner) => !inner.matches(element, degree),
            Self::And(parts) => parts.iter().all(|p| p.matches(element, degree)),
            Self::Or(parts) => parts.iter().any(|p| p.matches(element, degree)),
        }
    }
}

/// Bond primitive of a pattern query. An unwritten bond means single.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondExpr {
    Single,
    Double,
    Triple,
    /// `$`
    Quadruple,
    /// `~`
    Any,
}

impl BondExpr {
    pub fn matches(self, bond_type: BondType) -> bool {
        match self {
            Self::Any => true,
            Self::Single => bond_type == BondType::Single,
            Self::Double => bond_type == BondType::Double,
            Self::Triple => bond_type == BondType::Triple,
            Self::Quadruple => bond_type == BondType::Quadruple,
        }
    }
}

pub(crate) fn flatten_and(mut parts: Vec<AtomExpr>) -> AtomExpr {
    if parts.len() == 1 {
        parts.remove(0)
    } else {
        AtomExpr::And(parts)
    }
}

pub(crate) fn flatten_or(mut parts: Vec<AtomExpr>) -> AtomExpr {
    if parts.len() == 1 {
        parts.remove(0)
    } else {
        AtomExpr::Or(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_combinations() {
        let c_or_n = AtomExpr::Or(vec![
            AtomExpr::Element(Element::C),
            AtomExpr::Element(Element::N),
        ]);
        assert!(c_or_n.matches(Some(Element::N), 2));
        assert!(!c_or_n.matches(Some(Element::O), 2));
        assert!(!c_or_n.matches(None, 2));

        let not_two = AtomExpr::Not(Box::new(AtomExpr::Degree(2)));
        assert!(not_two.matches(None, 3));
        assert!(!not_two.matches(None, 2));
    }

    #[test]
    fn any_bond_matches_everything() {
        for bt in [BondType::Single, BondType::Double, BondType::None, BondType::Undefined] {
            assert!(BondExpr::Any.matches(bt));
        }
        assert!(!BondExpr::Single.matches(BondType::Double));
    }
}

use std::fmt;

/// A chemical element identified by its atomic number (1–118).
///
/// Only the identity of the element matters to ring-closure evaluation: it is
/// used by the required-element criterion and by pattern queries written with
/// `#n` or element symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Element(u8);

impl Element {
    pub const H: Element = Element(1);
    pub const C: Element = Element(6);
    pub const N: Element = Element(7);
    pub const O: Element = Element(8);
    pub const S: Element = Element(16);

    pub fn from_atomic_num(n: u8) -> Option<Element> {
        if (1..=118).contains(&n) {
            Some(Element(n))
        } else {
            None
        }
    }

    /// Case-sensitive lookup, `"Cl"` but not `"CL"`.
    pub fn from_symbol(s: &str) -> Option<Element> {
        SYMBOLS
            .iter()
            .position(|sym| *sym == s)
            .map(|i| Element(i as u8 + 1))
    }

    pub fn atomic_num(self) -> u8 {
        self.0
    }

    pub fn symbol(self) -> &'static str {
        SYMBOLS[self.0 as usize - 1]
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

static SYMBOLS: [&str; 118] = [
    "H", "He", //
    "Li", "Be", "B", "C", "N", "O", "F", "Ne", //
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar", //
    "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As", "Se",
    "Br", "Kr", //
    "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn", "Sb", "Te",
    "I", "Xe", //
    "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb",
    "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl", "Pb", "Bi", "Po", "At", "Rn",
    "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm", "Md", "No",
    "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_round_trip_for_common_elements() {
        for sym in ["H", "C", "N", "O", "Cl", "Br", "Fe", "Og"] {
            let e = Element::from_symbol(sym).unwrap();
            assert_eq!(e.symbol(), sym);
        }
    }

    #[test]
    fn atomic_numbers_match_table_positions() {
        assert_eq!(Element::from_symbol("C").unwrap().atomic_num(), 6);
        assert_eq!(Element::from_symbol("Cl").unwrap().atomic_num(), 17);
        assert_eq!(Element::from_symbol("U").unwrap().atomic_num(), 92);
        assert_eq!(Element::from_atomic_num(118).unwrap().symbol(), "Og");
    }

    #[test]
    fn out_of_range_and_unknown_are_rejected() {
        assert!(Element::from_atomic_num(0).is_none());
        assert!(Element::from_atomic_num(119).is_none());
        assert!(Element::from_symbol("Xx").is_none());
        assert!(Element::from_symbol("CL").is_none());
    }
}

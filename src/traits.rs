use crate::bond::BondType;
use crate::element::Element;

pub trait HasElement {
    fn element(&self) -> Option<Element>;
}

pub trait HasBondType {
    fn bond_type(&self) -> BondType;
}

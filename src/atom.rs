use nalgebra::Point3;

use crate::element::Element;
use crate::graph::VertexId;
use crate::traits::HasElement;

/// Kind of ring-closing attractor pseudo-atom.
///
/// An attractor marks where a ring-closing bond may form. Attractors pair
/// `Plus` with `Minus`, and `Neutral` with `Neutral`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttractorKind {
    /// `ATP`
    Plus,
    /// `ATM`
    Minus,
    /// `ATN`
    Neutral,
}

impl AttractorKind {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "ATP" => Some(Self::Plus),
            "ATM" => Some(Self::Minus),
            "ATN" => Some(Self::Neutral),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Plus => "ATP",
            Self::Minus => "ATM",
            Self::Neutral => "ATN",
        }
    }

    /// The attractor kind that can close a ring with this one.
    pub fn partner(self) -> Self {
        match self {
            Self::Plus => Self::Minus,
            Self::Minus => Self::Plus,
            Self::Neutral => Self::Neutral,
        }
    }

    pub fn is_compatible(self, other: Self) -> bool {
        self.partner() == other
    }
}

/// What occupies a node of a [`Structure`](crate::Structure).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtomKind {
    Element(Element),
    Attractor(AttractorKind),
    /// Placeholder without chemical identity.
    Dummy,
}

/// Atom of the caller-supplied 3D structure.
///
/// Each atom remembers the graph vertex that contributed it, so paths in the
/// building-block graph can be mapped onto chains of atoms. Coordinates are
/// optional; only 3D closability evaluation needs them.
///
/// # Examples
///
/// ```
/// use cyclocrab::{Atom, Element, HasElement};
///
/// let carbon = Atom::from_element(Element::C).at(0.0, 0.0, 1.5).in_vertex(3);
/// assert_eq!(carbon.element(), Some(Element::C));
/// assert_eq!(carbon.vertex, Some(3));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub kind: AtomKind,
    pub position: Option<Point3<f64>>,
    /// Id of the owning graph vertex, if any.
    pub vertex: Option<VertexId>,
}

impl Atom {
    pub fn new(kind: AtomKind) -> Self {
        Self {
            kind,
            position: None,
            vertex: None,
        }
    }

    pub fn from_element(element: Element) -> Self {
        Self::new(AtomKind::Element(element))
    }

    pub fn attractor(kind: AttractorKind) -> Self {
        Self::new(AtomKind::Attractor(kind))
    }

    pub fn at(mut self, x: f64, y: f64, z: f64) -> Self {
        self.position = Some(Point3::new(x, y, z));
        self
    }

    pub fn in_vertex(mut self, vertex: VertexId) -> Self {
        self.vertex = Some(vertex);
        self
    }

    pub fn attractor_kind(&self) -> Option<AttractorKind> {
        match self.kind {
            AtomKind::Attractor(k) => Some(k),
            _ => None,
        }
    }

    pub fn is_attractor(&self) -> bool {
        matches!(self.kind, AtomKind::Attractor(_))
    }
}

impl HasElement for Atom {
    fn element(&self) -> Option<Element> {
        match self.kind {
            AtomKind::Element(e) => Some(e),
            _ => None,
        }
    }
}

#![allow(dead_code)]

use cyclocrab::{
    ApClass, ApRef, Atom, AttractorKind, Bond, BondType, CompatibilityMatrix, Element, Graph,
    Structure, Vertex, VertexId, VertexKind,
};

/// Routes `tracing` output through the test harness; `RUST_LOG` selects the
/// level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn class(s: &str) -> ApClass {
    s.parse().unwrap()
}

/// Planar zigzag of `n` single-carbon vertices with 1.5 bonds and 120 degree
/// angles. Vertex `k` is carbon `k`; ring-closing vertices get ids from 100
/// in the order given and sit in the chain plane.
pub struct Chain {
    pub graph: Graph,
    pub structure: Structure,
    pub rc_compat: CompatibilityMatrix,
    pub rcvs: Vec<VertexId>,
}

fn zigzag(k: isize) -> [f64; 3] {
    [1.3 * k as f64, if k % 2 == 0 { 0.0 } else { 0.75 }, 0.0]
}

pub fn chain(n: usize, rcvs: &[(usize, AttractorKind)]) -> Chain {
    let mut graph = Graph::new();
    let mut structure = Structure::new();
    let mut carbons = Vec::new();
    for k in 0..n {
        graph
            .add_vertex(
                Vertex::new(k, 0, VertexKind::Molecular)
                    .with_ap(class("c:0"), Some(0))
                    .with_ap(class("c:0"), Some(0))
                    .with_ap(class("rc:0"), Some(0)),
            )
            .unwrap();
        let [x, y, z] = zigzag(k as isize);
        let c = structure.add_atom(Atom::from_element(Element::C).at(x, y, z).in_vertex(k));
        if k > 0 {
            graph
                .add_edge(ApRef::new(k - 1, 1), ApRef::new(k, 0), BondType::Single)
                .unwrap();
            structure.add_bond(carbons[k - 1], c, Bond::rotatable(BondType::Single));
        }
        carbons.push(c);
    }

    let mut ids = Vec::new();
    for (i, &(pos, kind)) in rcvs.iter().enumerate() {
        let id = 100 + i;
        graph
            .add_vertex(Vertex::ring_closing(id, 1, VertexKind::Molecular, class("rc:0")))
            .unwrap();
        graph
            .add_edge(ApRef::new(pos, 2), ApRef::new(id, 0), BondType::Single)
            .unwrap();
        let k = pos as isize;
        let [x, y, z] = if k == 0 {
            zigzag(-1)
        } else if pos + 1 == n {
            zigzag(k + 1)
        } else {
            let [cx, cy, _] = zigzag(k);
            let dy = if k % 2 == 0 { -1.5 } else { 1.5 };
            [cx, cy + dy, 0.0]
        };
        let a = structure.add_atom(Atom::attractor(kind).at(x, y, z).in_vertex(id));
        structure.add_bond(carbons[pos], a, Bond::new(BondType::Single));
        ids.push(id);
    }

    Chain {
        graph,
        structure,
        rc_compat: CompatibilityMatrix::from_pairs([(class("rc:0"), class("rc:0"))]),
        rcvs: ids,
    }
}

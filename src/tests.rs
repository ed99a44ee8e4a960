use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::rings::test_support::ChainFixture;
use crate::*;

#[test]
fn structure_add_atoms_and_bonds() {
    let mut s = Structure::new();
    let c = s.add_atom(Atom::from_element(Element::C).at(0.0, 0.0, 0.0).in_vertex(0));
    let o = s.add_atom(Atom::from_element(Element::O).at(1.4, 0.0, 0.0).in_vertex(0));
    let a = s.add_atom(Atom::attractor(AttractorKind::Plus).in_vertex(1));
    let b = s.add_bond(c, o, Bond::rotatable(BondType::Single));
    s.add_bond(o, a, Bond::new(BondType::Single));

    assert_eq!(s.atom_count(), 3);
    assert_eq!(s.bond_count(), 2);
    assert!(s.bond(b).is_rotatable());
    assert_eq!(s.bond_between(o, c), Some(b));
    assert_eq!(s.atom(a).attractor_kind(), Some(AttractorKind::Plus));
    assert!(s.atom(a).position.is_none());
    let by_vertex = s.atoms_by_vertex();
    assert_eq!(by_vertex[&0], vec![c, o]);
    assert_eq!(by_vertex[&1], vec![a]);
}

#[test]
fn structure_traits() {
    let c = Atom::from_element(Element::C);
    let rca = Atom::attractor(AttractorKind::Neutral);
    assert_eq!(c.element(), Some(Element::C));
    assert_eq!(rca.element(), None);
    assert_eq!(Bond::new(BondType::Double).bond_type(), BondType::Double);
    assert!(!Bond::default().is_rotatable());
}

#[test]
fn keyword_configured_enumeration_closes_rings_in_the_graph() {
    let params = RingClosureParams::from_keywords(
        "# ring closure settings\n\
         RC-CLOSERINGS\n\
         RC-EVALUATIONCLOSABILITYMODE=RING_SIZE\n\
         RC-MAXNUMBERRINGCLOSURES=2\n",
    )
    .unwrap();
    let mut fx = ChainFixture::new(8)
        .rcv(0, AttractorKind::Plus)
        .rcv(1, AttractorKind::Plus)
        .rcv(5, AttractorKind::Minus)
        .rcv(6, AttractorKind::Minus);
    let archive = RingClosuresArchive::in_memory();
    let combos = {
        let handler = CyclicGraphHandler::new(&params, &fx.rc_compat, &archive).unwrap();
        assert!(handler.rcv_counts_within_limits(&fx.graph, &fx.structure).unwrap());
        handler.all_combinations(&fx.graph, &fx.structure).unwrap()
    };
    assert_eq!(combos.len(), 2);

    let chosen = combos.into_iter().next().unwrap();
    for ring in chosen {
        assert_eq!(ring.bond_type(), BondType::Single);
        fx.graph.add_ring(ring);
    }
    assert!(fx.graph.free_rc_vertices().is_empty());
    let json = serde_json::to_string(fx.graph.rings()).unwrap();
    let back: Vec<Ring> = serde_json::from_str(&json).unwrap();
    assert!(same_ring_set(&back, fx.graph.rings()));
}

#[test]
fn empty_ring_closing_vertices_pair_with_each_other() {
    let fx = ChainFixture::new(8)
        .empty_rcv(0)
        .empty_rcv(5)
        .rcv(3, AttractorKind::Neutral);
    let params = RingClosureParams::enabled();
    let archive = RingClosuresArchive::in_memory();
    let handler = CyclicGraphHandler::new(&params, &fx.rc_compat, &archive).unwrap();
    let rsm = handler.size_manager(&fx.graph, &fx.structure).unwrap();
    assert!(rsm.compatibility_of_pair(100, 101).unwrap());
    assert!(!rsm.compatibility_of_pair(100, 102).unwrap());
    assert_eq!(rsm.ring_size(100, 101).unwrap(), None);

    let rings = handler
        .random_combination(&fx.graph, &fx.structure, &mut StdRng::seed_from_u64(3))
        .unwrap();
    assert_eq!(rings.len(), 1);
    let expected = Ring::new(vec![100, 0, 1, 2, 3, 4, 5, 101], BondType::Single);
    assert!(rings[0].same_ring(&expected));
}

#[test]
fn three_d_results_persist_in_a_file_archive() {
    let dir = tempfile::tempdir().unwrap();
    let params = RingClosureParams {
        mode: ClosabilityMode::Conformation3D,
        conf_search_step: 30.0,
        archive_index: Some(dir.path().join("rcc.index")),
        archive_folder: Some(dir.path().join("rcc")),
        ..RingClosureParams::enabled()
    };
    let fx = ChainFixture::new(8)
        .rcv(0, AttractorKind::Plus)
        .rcv(5, AttractorKind::Minus);

    let first = {
        let archive = RingClosuresArchive::from_params(&params).unwrap();
        let handler = CyclicGraphHandler::new(&params, &fx.rc_compat, &archive).unwrap();
        let combos = handler.all_combinations(&fx.graph, &fx.structure).unwrap();
        assert_eq!(archive.len(), 1);
        combos
    };
    assert_eq!(first.len(), 1);

    let archive = RingClosuresArchive::from_params(&params).unwrap();
    assert_eq!(archive.len(), 1);
    let handler = CyclicGraphHandler::new(&params, &fx.rc_compat, &archive).unwrap();
    let second = handler.all_combinations(&fx.graph, &fx.structure).unwrap();
    assert_eq!(archive.len(), 1);
    assert_eq!(second.len(), 1);
    assert!(same_ring_set(&first[0], &second[0]));
}

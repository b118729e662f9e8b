//! End-to-end scenarios for the bridge.
//!
//! Tests cover the manager lifecycle, reference balance, the variable domain,
//! pairing tables, the operator algebra and satisfying-assignment extraction.

use bdd_bridge::{Backend, Bdd, BddOp, Error, Manager, ManagerConfig, ReorderMethod};
use num_bigint::BigUint;
use test_log::test;

fn setup(n: u32) -> (Manager, Vec<Bdd>) {
    setup_with(ManagerConfig::default(), n)
}

fn setup_with(config: ManagerConfig, n: u32) -> (Manager, Vec<Bdd>) {
    let mgr = Manager::with_config(&config).unwrap();
    mgr.ensure_variable_count(n).unwrap();
    let vars = (0..n).map(|i| mgr.ith_variable(i).unwrap().unwrap()).collect();
    (mgr, vars)
}

/// `(x0 ↔ x4) ∧ (x1 ↔ x5) ∧ ...` over `2 * pairs` variables, the classic
/// function whose size depends heavily on the order.
fn interleaved(mgr: &Manager, vars: &[Bdd], pairs: usize) -> Bdd {
    let terms: Vec<_> = (0..pairs)
        .map(|i| mgr.biimp(&vars[i], &vars[i + pairs]).unwrap())
        .collect();
    mgr.and_many(&terms).unwrap()
}

// ─── Lifecycle ─────────────────────────────────────────────────────────────────

#[test]
fn initialize_and_shutdown() {
    let mgr = Manager::new();
    let (one, zero) = mgr.initialize(&ManagerConfig::default()).unwrap();
    assert!(one.is_one().unwrap());
    assert!(zero.is_zero().unwrap());
    assert!(matches!(
        mgr.initialize(&ManagerConfig::default()),
        Err(Error::Configuration(_))
    ));

    mgr.shutdown().unwrap();
    assert!(!mgr.is_initialized());
    assert_eq!(mgr.shutdown(), Err(Error::UseAfterShutdown));
    assert!(matches!(mgr.one(), Err(Error::UseAfterShutdown)));
    assert!(matches!(one.not(), Err(Error::UseAfterShutdown)));
}

#[test]
fn handles_survive_shutdown_as_inert() {
    let (mgr, v) = setup(3);
    let f = mgr.and(&v[0], &v[1]).unwrap();
    let table = mgr.allocate_pairing().unwrap();
    let raw = f.clone().into_raw();

    mgr.shutdown().unwrap();
    mgr.del_ref(raw);
    drop(f);
    drop(table);
    drop(v);

    mgr.initialize(&ManagerConfig::default()).unwrap();
    assert_eq!(mgr.node_count().unwrap(), 0);
    assert_eq!(mgr.pairing_count().unwrap(), 0);
}

#[test]
fn managers_are_independent() {
    let (a, va) = setup(2);
    let (b, vb) = setup(4);
    assert_eq!(a.variable_count().unwrap(), 2);
    assert_eq!(b.variable_count().unwrap(), 4);
    assert!(matches!(a.and(&va[0], &vb[0]), Err(Error::Argument(_))));
    b.shutdown().unwrap();
    assert!(a.and(&va[0], &va[1]).is_ok());
}

// ─── Reference Balance ─────────────────────────────────────────────────────────

#[test]
fn operations_leave_no_references_behind() {
    let (mgr, v) = setup(4);
    let base = mgr.node_count().unwrap();
    {
        let f = interleaved(&mgr, &v, 2);
        for op in BddOp::ALL {
            let g = mgr.apply(&f, &v[3], op).unwrap();
            let _ = mgr.sat_one(&g).unwrap();
        }
        let cube = mgr.cube([0, 1]).unwrap();
        let _ = mgr.exist_abstract(&f, &cube).unwrap();
        let _ = mgr.and_abstract(&f, &v[2], &cube).unwrap();
        let _ = mgr.support(&f).unwrap();
    }
    // Released intermediates may still hold their children until collected.
    mgr.collect_garbage().unwrap();
    assert_eq!(mgr.node_count().unwrap(), base);
}

#[test]
fn raw_handles_transfer_ownership() {
    let (mgr, v) = setup(2);
    let base = mgr.node_count().unwrap();
    let raw = mgr.xor(&v[0], &v[1]).unwrap().into_raw();
    assert_eq!(mgr.node_count().unwrap(), base + 1);

    let f = mgr.from_raw(raw).unwrap();
    assert_eq!(f.sat_count().unwrap(), BigUint::from(2u32));
    drop(f);
    assert_eq!(mgr.node_count().unwrap(), base);
}

// ─── Variable Domain ───────────────────────────────────────────────────────────

#[test]
fn growth_and_shrink() {
    let (mgr, _) = setup(0);
    assert_eq!(mgr.ensure_variable_count(5).unwrap(), 0);
    assert_eq!(mgr.variable_count().unwrap(), 5);
    assert_eq!(mgr.ensure_variable_count(7).unwrap(), 5);
    assert!(matches!(mgr.ensure_variable_count(3), Err(Error::Argument(_))));
    assert_eq!(mgr.variable_count().unwrap(), 7);
}

#[test]
fn failed_growth_leaves_count_unchanged() {
    let config = ManagerConfig::builder().max_nodes(4).build();
    let (mgr, _) = setup_with(config, 2);
    assert!(matches!(
        mgr.ensure_variable_count(10),
        Err(Error::ResourceExhaustion(_))
    ));
    assert_eq!(mgr.variable_count().unwrap(), 2);

    // Levels only cover the visible variables.
    mgr.set_variable_order(&[1, 0]).unwrap();
    assert_eq!(mgr.level_to_variable(0).unwrap(), 1);
    assert_eq!(mgr.variable_to_level(1).unwrap(), 0);
    assert!(matches!(mgr.level_to_variable(2), Err(Error::Argument(_))));
}

#[test]
fn reorder_codes() {
    for code in 0..8 {
        let method = ReorderMethod::from_code(code).unwrap();
        assert_eq!(method.code(), code);
    }
    assert!(matches!(ReorderMethod::from_code(8), Err(Error::Configuration(_))));
}

#[test]
fn every_reorder_method_preserves_functions() {
    let (mgr, v) = setup(8);
    let f = interleaved(&mgr, &v, 4);
    let g = mgr.or(&mgr.and(&v[0], &v[7]).unwrap(), &v[3].not().unwrap()).unwrap();
    let (f_count, g_count) = (f.sat_count().unwrap(), g.sat_count().unwrap());

    for method in ReorderMethod::ALL {
        mgr.reorder(method).unwrap();
        assert_eq!(f, interleaved(&mgr, &v, 4), "{}", method);
        assert_eq!(f.sat_count().unwrap(), f_count);
        assert_eq!(g.sat_count().unwrap(), g_count);

        let mut levels: Vec<_> = (0..8).map(|i| mgr.variable_to_level(i).unwrap()).collect();
        levels.sort_unstable();
        assert_eq!(levels, (0..8).collect::<Vec<_>>());
    }
}

#[test]
fn sifting_shrinks_interleaved_pairs() {
    let (mgr, v) = setup(8);
    let f = interleaved(&mgr, &v, 4);
    let before = f.node_count().unwrap();
    mgr.reorder(ReorderMethod::Sift).unwrap();
    assert!(f.node_count().unwrap() < before);
    assert!(mgr.reorderings().unwrap() >= 1);
}

#[test]
fn automatic_reordering_keeps_results_canonical() {
    let config = ManagerConfig::builder()
        .auto_reorder(ReorderMethod::Sift)
        .reorder_threshold(16)
        .build();
    let (mgr, v) = setup_with(config, 12);
    assert_eq!(mgr.auto_reorder_method().unwrap(), ReorderMethod::Sift);
    let f = interleaved(&mgr, &v, 6);
    assert_eq!(f.sat_count().unwrap(), BigUint::from(64u32));
    let s = mgr.sat_one(&f).unwrap();
    assert!(mgr.imp(&s, &f).unwrap().is_one().unwrap());
}

#[test]
fn variable_blocks_hold_under_automatic_reordering() {
    let config = ManagerConfig::builder()
        .auto_reorder(ReorderMethod::Sift)
        .reorder_threshold(16)
        .build();
    let (mgr, v) = setup_with(config, 12);
    mgr.add_variable_block(0, 2, true).unwrap();
    mgr.add_variable_block(6, 8, false).unwrap();

    let f = interleaved(&mgr, &v, 6);
    assert!(mgr.reorderings().unwrap() >= 1);
    assert_eq!(f.sat_count().unwrap(), BigUint::from(64u32));
    for i in 0..3 {
        assert_eq!(mgr.variable_to_level(i).unwrap(), i);
    }
    let mut block: Vec<_> = (6..9).map(|i| mgr.variable_to_level(i).unwrap()).collect();
    block.sort_unstable();
    assert_eq!(block[2] - block[0], 2);

    mgr.clear_variable_blocks().unwrap();
    assert!(matches!(mgr.add_variable_block(0, 12, false), Err(Error::Argument(_))));
}

#[test]
fn set_variable_order_validation() {
    let (mgr, v) = setup(4);
    let f = mgr.and(&v[0], &v[3]).unwrap();
    mgr.set_variable_order(&[3, 2, 1, 0]).unwrap();
    assert_eq!(mgr.level_to_variable(0).unwrap(), 3);
    assert_eq!(f, mgr.and(&v[3], &v[0]).unwrap());
    assert_eq!(f.var().unwrap(), Some(3));

    assert!(matches!(mgr.set_variable_order(&[0, 1, 2]), Err(Error::Argument(_))));
    assert!(matches!(mgr.set_variable_order(&[0, 1, 1, 2]), Err(Error::Argument(_))));
}

// ─── Pairing Tables ────────────────────────────────────────────────────────────

#[test]
fn allocate_and_reset_equals_fresh() {
    let (mgr, v) = setup(4);
    let table = mgr.allocate_pairing().unwrap();
    table.set_variables(&[0, 1], &[3, 2]).unwrap();
    table.set_node(2, &mgr.and(&v[0], &v[1]).unwrap()).unwrap();
    table.reset().unwrap();

    let fresh = mgr.allocate_pairing().unwrap();
    for var in 0..4 {
        assert_eq!(table.slot(var).unwrap(), fresh.slot(var).unwrap());
        assert_eq!(table.slot(var).unwrap(), v[var as usize]);
    }
}

#[test]
fn registry_growth_adds_identity_slots() {
    let (mgr, _) = setup(2);
    let a = mgr.allocate_pairing().unwrap();
    let b = mgr.allocate_pairing().unwrap();
    mgr.ensure_variable_count(5).unwrap();
    for table in [&a, &b] {
        assert_eq!(table.len().unwrap(), 5);
        for var in 2..5 {
            assert_eq!(table.slot(var).unwrap(), mgr.ith_variable(var).unwrap().unwrap());
        }
    }
}

#[test]
fn vector_compose_maps_variables() {
    let (mgr, v) = setup(4);
    let table = mgr.allocate_pairing().unwrap();
    table.set_variable(2, 0).unwrap();

    assert_eq!(mgr.vector_compose(&v[2], &table).unwrap(), v[0]);
    let f = mgr.xor(&v[2], &v[3]).unwrap();
    assert_eq!(mgr.vector_compose(&f, &table).unwrap(), mgr.xor(&v[0], &v[3]).unwrap());
}

#[test]
fn replace_swaps_variables() {
    let (mgr, v) = setup(3);
    let table = mgr.allocate_pairing().unwrap();
    table.set_variables(&[0, 2], &[2, 0]).unwrap();
    let f = mgr.and(&v[0], &v[1].not().unwrap()).unwrap();
    let expected = mgr.and(&v[2], &v[1].not().unwrap()).unwrap();
    assert_eq!(mgr.replace(&f, &table).unwrap(), expected);
}

// ─── Operators ─────────────────────────────────────────────────────────────────

#[test]
fn de_morgan() {
    let (mgr, v) = setup(3);
    let f = mgr.xor(&v[0], &v[1]).unwrap();
    let g = mgr.or(&v[1], &v[2]).unwrap();
    assert_eq!(
        mgr.and(&f, &g).unwrap().not().unwrap(),
        mgr.or(&f.not().unwrap(), &g.not().unwrap()).unwrap()
    );
    assert_eq!(
        mgr.or(&f, &g).unwrap().not().unwrap(),
        mgr.and(&f.not().unwrap(), &g.not().unwrap()).unwrap()
    );
}

#[test]
fn operator_codes_dispatch() {
    let (mgr, v) = setup(2);
    for op in BddOp::ALL {
        assert_eq!(
            mgr.apply_code(&v[0], &v[1], op.code()).unwrap(),
            mgr.apply(&v[0], &v[1], op).unwrap()
        );
    }
    assert!(matches!(mgr.apply_code(&v[0], &v[1], 10), Err(Error::Configuration(_))));
}

#[test]
fn lite_backend_reports_missing_primitives() {
    let config = ManagerConfig::builder().backend(Backend::Lite).build();
    let (mgr, v) = setup_with(config, 3);
    let f = mgr.and(&v[0], &v[1]).unwrap();
    let cube = mgr.cube([0]).unwrap();

    assert!(matches!(mgr.exist_abstract(&f, &cube), Err(Error::NotImplemented(_))));
    assert!(matches!(mgr.for_all_abstract(&f, &cube), Err(Error::NotImplemented(_))));
    assert!(matches!(mgr.and_abstract(&f, &f, &cube), Err(Error::NotImplemented(_))));
    assert!(matches!(mgr.set_variable_order(&[2, 1, 0]), Err(Error::NotImplemented(_))));
    assert!(matches!(f.path_count(), Err(Error::NotImplemented(_))));

    // Everything else still works.
    assert_eq!(mgr.sat_one(&f).unwrap(), f);
    mgr.reorder(ReorderMethod::Sift).unwrap();
}

// ─── Satisfying Assignments ────────────────────────────────────────────────────

#[test]
fn sat_one_of_conjunction_ignores_free_variables() {
    let (mgr, v) = setup(4);
    let f = mgr.and(&v[0], &v[1]).unwrap();
    let s = mgr.sat_one(&f).unwrap();
    assert_eq!(s, f);
    let support = mgr.support(&s).unwrap();
    assert_eq!(support, mgr.cube([0, 1]).unwrap());
}

#[test]
fn sat_one_is_a_single_path_implicant() {
    let (mgr, v) = setup(6);
    let f = interleaved(&mgr, &v, 3);
    let g = mgr.or(&f, &mgr.and(&v[0], &v[5].not().unwrap()).unwrap()).unwrap();
    for h in [&f, &g, &g.not().unwrap()] {
        let s = mgr.sat_one(h).unwrap();
        assert!(!s.is_zero().unwrap());
        assert!(mgr.imp(&s, h).unwrap().is_one().unwrap());
        assert_eq!(s.path_count().unwrap(), BigUint::from(1u32));
    }
}

#[test]
fn sat_one_of_false_is_false() {
    let (mgr, _) = setup(1);
    let zero = mgr.zero().unwrap();
    assert!(mgr.sat_one(&zero).unwrap().is_zero().unwrap());
}

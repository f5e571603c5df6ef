//! Integration tests: scene reconciler against the headless raster surface.

use board_core::{Epsilon, Geometry, Node, NodeDraft, NodeId, NodePatch};
use board_render::{
    DrawableContent, DrawingSurface, LoadError, LoadOutcome, NodeState, Pixels, RasterSurface,
    SceneReconciler,
};
use pretty_assertions::assert_eq;

fn image(name: &str, url: &str, x: f64, y: f64) -> Node {
    NodeDraft::image(url, Geometry::new(x, y, 100.0, 80.0)).into_node(NodeId::intern(name), 0)
}

fn text(name: &str, content: &str) -> Node {
    NodeDraft::text(content, Geometry::new(0.0, 0.0, 200.0, 40.0)).into_node(NodeId::intern(name), 0)
}

fn red() -> Pixels {
    Pixels::solid(2, 2, [255, 0, 0, 255])
}

fn setup() -> (SceneReconciler<u64>, RasterSurface) {
    (SceneReconciler::new(Epsilon::default()), RasterSurface::new(800, 600))
}

// ─── Materialization ────────────────────────────────────────────────────

#[test]
fn image_materializes_after_load_completes() {
    let (mut rec, mut surface) = setup();
    let nodes = vec![image("rc_img", "https://cdn.test/a.png", 10.0, 10.0)];

    let report = rec.reconcile(&nodes, &mut surface);
    assert_eq!(report.loads.len(), 1);
    assert!(report.created.is_empty());
    assert_eq!(rec.state(NodeId::intern("rc_img")), NodeState::Materializing);
    assert!(surface.is_empty());

    let outcome = rec.finish_load(&report.loads[0], Ok(red()), &nodes, &mut surface);
    assert_eq!(outcome, LoadOutcome::Materialized);
    assert_eq!(rec.state(NodeId::intern("rc_img")), NodeState::Materialized);
    assert_eq!(surface.len(), 1);
    let handle = rec.handle(NodeId::intern("rc_img")).unwrap();
    assert_eq!(surface.realized(handle).unwrap().geometry.x, 10.0);
}

#[test]
fn text_materializes_synchronously() {
    let (mut rec, mut surface) = setup();
    let nodes = vec![text("rc_txt", "hello")];
    let report = rec.reconcile(&nodes, &mut surface);
    assert_eq!(report.created, vec![NodeId::intern("rc_txt")]);
    assert!(report.loads.is_empty());
    assert_eq!(surface.stats().redraws, 1);
}

#[test]
fn second_pass_without_changes_is_a_noop() {
    let (mut rec, mut surface) = setup();
    let nodes = vec![
        image("rc_idem_a", "https://cdn.test/a.png", 0.0, 0.0),
        text("rc_idem_t", "caption"),
        image("rc_idem_b", "https://cdn.test/b.png", 300.0, 0.0),
    ];
    let first = rec.reconcile(&nodes, &mut surface);
    rec.finish_load(&first.loads[0], Ok(red()), &nodes, &mut surface);

    surface.reset_stats();
    let second = rec.reconcile(&nodes, &mut surface);
    assert!(second.is_noop(), "{second:?}");
    assert_eq!(surface.stats().writes(), 0);
    assert_eq!(surface.stats().redraws, 0);
}

// ─── Updates in place ───────────────────────────────────────────────────

#[test]
fn moves_beyond_epsilon_update_in_place() {
    let (mut rec, mut surface) = setup();
    let mut nodes = vec![text("rc_move", "t")];
    rec.reconcile(&nodes, &mut surface);

    nodes[0].apply_patch(&NodePatch::position(0.05, 0.0));
    assert!(rec.reconcile(&nodes, &mut surface).updated.is_empty());

    nodes[0].apply_patch(&NodePatch::position(25.0, 0.0));
    let report = rec.reconcile(&nodes, &mut surface);
    assert_eq!(report.updated, vec![NodeId::intern("rc_move")]);
    assert!(report.created.is_empty());
    let handle = rec.handle(NodeId::intern("rc_move")).unwrap();
    assert_eq!(surface.realized(handle).unwrap().geometry.x, 25.0);
}

#[test]
fn url_change_swaps_content_after_reload() {
    let (mut rec, mut surface) = setup();
    let mut nodes = vec![image("rc_swap", "https://cdn.test/old.png", 0.0, 0.0)];
    let first = rec.reconcile(&nodes, &mut surface);
    rec.finish_load(&first.loads[0], Ok(red()), &nodes, &mut surface);

    nodes[0].apply_patch(&NodePatch {
        url: Some("https://cdn.test/new.png".into()),
        x: Some(50.0),
        ..NodePatch::default()
    });
    let report = rec.reconcile(&nodes, &mut surface);
    assert_eq!(report.updated, vec![NodeId::intern("rc_swap")]);
    assert_eq!(report.loads.len(), 1);
    // Old content stays up until the new one arrives.
    assert_eq!(rec.state(NodeId::intern("rc_swap")), NodeState::Materialized);

    let blue = Pixels::solid(1, 1, [0, 0, 255, 255]);
    let outcome = rec.finish_load(&report.loads[0], Ok(blue.clone()), &nodes, &mut surface);
    assert_eq!(outcome, LoadOutcome::Swapped);
    assert_eq!(
        surface.content_of(NodeId::intern("rc_swap")),
        Some(&DrawableContent::Pixels(blue))
    );
    assert_eq!(surface.len(), 1);
}

#[test]
fn text_edit_swaps_content_without_load() {
    let (mut rec, mut surface) = setup();
    let mut nodes = vec![text("rc_edit", "before")];
    rec.reconcile(&nodes, &mut surface);
    nodes[0].apply_patch(&NodePatch {
        text: Some("after".into()),
        ..NodePatch::default()
    });
    let report = rec.reconcile(&nodes, &mut surface);
    assert_eq!(report.content_swapped, vec![NodeId::intern("rc_edit")]);
    assert!(report.loads.is_empty());
}

// ─── Removal & stale loads ──────────────────────────────────────────────

#[test]
fn removal_releases_drawable() {
    let (mut rec, mut surface) = setup();
    let nodes = vec![text("rc_rm_a", "a"), text("rc_rm_b", "b")];
    rec.reconcile(&nodes, &mut surface);

    let report = rec.reconcile(&nodes[1..], &mut surface);
    assert_eq!(report.removed, vec![NodeId::intern("rc_rm_a")]);
    assert_eq!(surface.paint_order(), vec![NodeId::intern("rc_rm_b")]);
    assert_eq!(rec.state(NodeId::intern("rc_rm_a")), NodeState::Absent);
}

#[test]
fn load_finishing_after_delete_is_ignored() {
    let (mut rec, mut surface) = setup();
    let nodes = vec![image("rc_gone", "https://cdn.test/a.png", 0.0, 0.0)];
    let report = rec.reconcile(&nodes, &mut surface);

    rec.reconcile(&[], &mut surface);
    let outcome = rec.finish_load(&report.loads[0], Ok(red()), &[], &mut surface);
    assert_eq!(outcome, LoadOutcome::Stale);
    assert!(surface.is_empty());
}

#[test]
fn load_overtaken_by_url_change_is_ignored() {
    let (mut rec, mut surface) = setup();
    let mut nodes = vec![image("rc_race", "https://cdn.test/first.png", 0.0, 0.0)];
    let first = rec.reconcile(&nodes, &mut surface);

    nodes[0].apply_patch(&NodePatch {
        url: Some("https://cdn.test/second.png".into()),
        ..NodePatch::default()
    });
    let second = rec.reconcile(&nodes, &mut surface);
    assert_eq!(second.loads.len(), 1);
    assert!(second.loads[0].version > first.loads[0].version);

    assert_eq!(
        rec.finish_load(&first.loads[0], Ok(red()), &nodes, &mut surface),
        LoadOutcome::Stale
    );
    assert!(surface.is_empty());
    assert_eq!(
        rec.finish_load(&second.loads[0], Ok(red()), &nodes, &mut surface),
        LoadOutcome::Materialized
    );
}

#[test]
fn load_for_deleted_then_restored_node_is_ignored() {
    let (mut rec, mut surface) = setup();
    let nodes = vec![image("rc_undo", "https://cdn.test/a.png", 0.0, 0.0)];
    let first = rec.reconcile(&nodes, &mut surface);
    rec.reconcile(&[], &mut surface);
    let again = rec.reconcile(&nodes, &mut surface);

    assert_eq!(
        rec.finish_load(&first.loads[0], Ok(red()), &nodes, &mut surface),
        LoadOutcome::Stale
    );
    assert_eq!(
        rec.finish_load(&again.loads[0], Ok(red()), &nodes, &mut surface),
        LoadOutcome::Materialized
    );
}

// ─── Failures ───────────────────────────────────────────────────────────

#[test]
fn failed_load_is_local_and_not_retried() {
    let (mut rec, mut surface) = setup();
    let mut nodes = vec![
        image("rc_fail", "https://cdn.test/broken.png", 0.0, 0.0),
        image("rc_ok", "https://cdn.test/fine.png", 200.0, 0.0),
    ];
    let report = rec.reconcile(&nodes, &mut surface);
    let err = LoadError::CrossOrigin {
        url: "https://cdn.test/broken.png".into(),
    };
    let failed = rec.finish_load(&report.loads[0], Err(err.clone()), &nodes, &mut surface);
    assert_eq!(failed, LoadOutcome::Failed(err));
    let ok = rec.finish_load(&report.loads[1], Ok(red()), &nodes, &mut surface);
    assert_eq!(ok, LoadOutcome::Materialized);

    assert_eq!(rec.state(NodeId::intern("rc_fail")), NodeState::Failed);
    assert!(rec.reconcile(&nodes, &mut surface).loads.is_empty());

    // A new content reference gets a fresh attempt.
    nodes[0].apply_patch(&NodePatch {
        url: Some("https://cdn.test/fixed.png".into()),
        ..NodePatch::default()
    });
    assert_eq!(rec.reconcile(&nodes, &mut surface).loads.len(), 1);
}

// ─── Ordering & rebuild ─────────────────────────────────────────────────

#[test]
fn reorder_restacks_surface() {
    let (mut rec, mut surface) = setup();
    let mut nodes = vec![text("rc_z_a", "a"), text("rc_z_b", "b")];
    rec.reconcile(&nodes, &mut surface);

    nodes.swap(0, 1);
    let report = rec.reconcile(&nodes, &mut surface);
    assert!(report.restacked);
    assert_eq!(
        surface.paint_order(),
        vec![NodeId::intern("rc_z_b"), NodeId::intern("rc_z_a")]
    );
}

#[test]
fn z_index_decides_stacking_over_collection_position() {
    let (mut rec, mut surface) = setup();
    let mut raised = text("rc_zi_a", "a");
    raised.z_index = 5;
    let mut lowered = text("rc_zi_b", "b");
    lowered.z_index = 1;
    let mut nodes = vec![raised, lowered];
    rec.reconcile(&nodes, &mut surface);
    assert_eq!(
        surface.paint_order(),
        vec![NodeId::intern("rc_zi_b"), NodeId::intern("rc_zi_a")]
    );

    // A z_index edit alone restacks.
    nodes[1].apply_patch(&NodePatch {
        z_index: Some(9),
        ..NodePatch::default()
    });
    let report = rec.reconcile(&nodes, &mut surface);
    assert!(report.restacked);
    assert_eq!(
        surface.paint_order(),
        vec![NodeId::intern("rc_zi_a"), NodeId::intern("rc_zi_b")]
    );
}

#[test]
fn reset_then_pass_rebuilds_from_nodes() {
    let (mut rec, mut surface) = setup();
    let nodes = vec![text("rc_rb_a", "a"), text("rc_rb_b", "b")];
    rec.reconcile(&nodes, &mut surface);

    rec.reset(&mut surface);
    assert!(surface.is_empty());
    let report = rec.reconcile(&nodes, &mut surface);
    assert_eq!(report.created.len(), 2);
    assert_eq!(
        surface.paint_order(),
        vec![NodeId::intern("rc_rb_a"), NodeId::intern("rc_rb_b")]
    );
}

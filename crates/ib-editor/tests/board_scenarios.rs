//! Integration tests: end-to-end board interactions (ib-editor).
//!
//! Drives a `CanvasEngine` the way a host does: pointer events, ticks, and
//! service results fed back by hand. The view is never panned or zoomed, so
//! screen and world coordinates coincide.

use ib_core::{CanvasConfig, NodeId, NodeKind, Point};
use ib_editor::{
    CanvasEngine, CombineResponse, EngineError, ExpandResponse, ExpandStatus, InputEvent, OpId, Outcome,
    ServiceError, ServiceRequest, TopicsResponse,
};
use pretty_assertions::assert_eq;

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn topic(engine: &CanvasEngine, text: &str) -> NodeId {
    engine
        .graph()
        .nodes()
        .into_iter()
        .find(|n| n.text == text)
        .map(|n| n.id)
        .unwrap_or_else(|| panic!("no node with text {text:?}"))
}

fn position(engine: &CanvasEngine, id: NodeId) -> Point {
    engine.graph().get(id).unwrap().position
}

/// Use case set, three generated topics, one layout pass.
fn generated_board() -> CanvasEngine {
    init_logs();
    let mut engine = CanvasEngine::default();
    engine.set_use_case("Opening a climbing gym").unwrap();
    let op = engine.request_generation(0.0).unwrap();
    assert_eq!(
        engine.take_requests(),
        vec![ServiceRequest::Generate {
            op,
            context: "Opening a climbing gym".into(),
        }]
    );
    let outcome = engine.resolve_generation(
        op,
        Ok(TopicsResponse {
            topics: vec!["A".into(), "B".into(), "C".into()],
        }),
        10.0,
    );
    assert_eq!(outcome, Outcome::Applied);
    assert!(engine.tick(20.0).layout_ran);
    engine
}

fn begin_expand(engine: &mut CanvasEngine, id: NodeId, now: f64) -> OpId {
    match engine.request_expand(id, now).unwrap() {
        ExpandStatus::Requested { op } => op,
        other => panic!("expected a request, got {other:?}"),
    }
}

// ─── Generation & layout ────────────────────────────────────────────────

#[test]
fn generated_topics_sit_in_one_rank_below_the_root() {
    let engine = generated_board();
    let root = position(&engine, NodeId::root());
    let ys: Vec<f32> = ["A", "B", "C"]
        .iter()
        .map(|t| position(&engine, topic(&engine, t)).y)
        .collect();
    assert!(ys.iter().all(|y| *y > root.y));
    assert!(ys.windows(2).all(|w| (w[0] - w[1]).abs() < 1e-3));

    let xs: Vec<f32> = ["A", "B", "C"]
        .iter()
        .map(|t| position(&engine, topic(&engine, t)).x)
        .collect();
    assert!(xs[0] < xs[1] && xs[1] < xs[2], "creation order preserved left to right: {xs:?}");
}

// ─── Drag & combine ─────────────────────────────────────────────────────

#[test]
fn dragging_onto_a_neighbour_combines_at_the_midpoint() {
    let mut engine = generated_board();
    let a = topic(&engine, "A");
    let b = topic(&engine, "B");
    let pa = position(&engine, a);
    let pb = position(&engine, b);

    // Drop A just left of B.
    let drop = Point::new(pb.x - 30.0, pb.y);
    engine.handle_input(&InputEvent::pointer_down(pa.x, pa.y), 100.0);
    engine.handle_input(&InputEvent::pointer_move((pa.x + drop.x) / 2.0, pa.y), 110.0);
    engine.handle_input(&InputEvent::pointer_move(drop.x, drop.y), 120.0);
    assert_eq!(engine.candidate(), Some((a, b)));
    assert_eq!(position(&engine, a), drop);
    engine.handle_input(&InputEvent::pointer_up(drop.x, drop.y), 130.0);
    assert_eq!(engine.candidate(), None);

    let requests = engine.take_requests();
    let [ServiceRequest::Combine { op, text1, text2, context }] = requests.as_slice() else {
        panic!("expected one combine request, got {requests:?}");
    };
    assert_eq!((text1.as_str(), text2.as_str()), ("A", "B"));
    assert_eq!(context.as_deref(), Some("Opening a climbing gym"));
    assert!(engine.is_busy(a) && engine.is_busy(b));

    let outcome = engine.resolve_combine(
        *op,
        Ok(CombineResponse {
            combined_topic: "AB".into(),
        }),
        200.0,
    );
    assert_eq!(outcome, Outcome::Applied);
    assert!(!engine.graph().contains(a) && !engine.graph().contains(b));
    let ab = topic(&engine, "AB");
    assert_eq!(position(&engine, ab), drop.midpoint(pb));
    assert_eq!(engine.graph().get(ab).unwrap().kind, NodeKind::Topic);
    assert_eq!(engine.graph().len(), 3);

    // Layout is held back until the post-drag cooldown has passed.
    assert!(!engine.tick(600.0).layout_ran);
    assert!(engine.tick(1200.0).layout_ran);
}

#[test]
fn failed_combine_leaves_the_board_untouched() {
    let mut engine = generated_board();
    let a = topic(&engine, "A");
    let b = topic(&engine, "B");
    let before = engine.snapshot();

    let op = engine.request_combine(a, b, 0.0).unwrap();
    let outcome = engine.resolve_combine(op, Err(ServiceError::Unavailable("timeout".into())), 50.0);

    assert_eq!(outcome, Outcome::Failed);
    assert_eq!(engine.snapshot(), before);
    assert_eq!(engine.notices().len(), 1);
    assert!(!engine.is_busy(a) && !engine.is_busy(b));
}

#[test]
fn root_cannot_be_combined() {
    let mut engine = generated_board();
    let a = topic(&engine, "A");
    assert_eq!(
        engine.request_combine(a, NodeId::root(), 0.0),
        Err(EngineError::RootCombine)
    );
    assert!(engine.take_requests().is_empty());
}

// ─── Expand ─────────────────────────────────────────────────────────────

#[test]
fn expand_with_no_ideas_is_a_quiet_no_op() {
    let mut engine = generated_board();
    let c = topic(&engine, "C");
    let before = engine.snapshot();
    let op = begin_expand(&mut engine, c, 0.0);
    assert!(engine.is_busy(c));

    let outcome = engine.resolve_expand(op, Ok(ExpandResponse { expansions: vec![] }), 10.0);

    assert_eq!(outcome, Outcome::Empty);
    assert_eq!(engine.snapshot(), before);
    assert!(engine.notices().is_empty());
    assert!(!engine.is_busy(c));
}

#[test]
fn expand_toggles_between_requesting_and_collapsing() {
    let mut engine = generated_board();
    let c = topic(&engine, "C");
    let op = begin_expand(&mut engine, c, 0.0);
    engine.resolve_expand(
        op,
        Ok(ExpandResponse {
            expansions: vec!["Bouldering".into(), "Top rope".into()],
        }),
        10.0,
    );
    let children = engine.graph().expansions_of(c);
    assert_eq!(children.len(), 2);
    for id in &children {
        assert_eq!(engine.graph().get(*id).unwrap().kind, NodeKind::Expansion);
    }

    assert_eq!(
        engine.request_expand(c, 20.0),
        Ok(ExpandStatus::Collapsed { removed: 2 })
    );
    assert!(engine.graph().expansions_of(c).is_empty());
    assert!(engine.take_requests().is_empty());

    let again = begin_expand(&mut engine, c, 30.0);
    assert_ne!(again, op);
    let requests = engine.take_requests();
    assert_eq!(requests.len(), 1);
    match &requests[0] {
        ServiceRequest::Expand { op, text, .. } => {
            assert_eq!(*op, again);
            assert_eq!(text, "C");
        }
        other => panic!("expected an expand request, got {other:?}"),
    }
    assert!(engine.is_busy(c));
}

#[test]
fn clicking_a_node_expands_it() {
    let mut engine = generated_board();
    let b = topic(&engine, "B");
    let p = position(&engine, b);
    engine.handle_input(&InputEvent::pointer_down(p.x, p.y), 100.0);
    engine.handle_input(&InputEvent::pointer_move(p.x + 1.0, p.y + 1.0), 110.0);
    engine.handle_input(&InputEvent::pointer_up(p.x + 1.0, p.y + 1.0), 120.0);

    assert_eq!(engine.selected(), Some(b));
    let requests = engine.take_requests();
    assert!(matches!(requests.as_slice(), [ServiceRequest::Expand { text, .. }] if text == "B"));
    // A click is not a drag: no cooldown.
    assert_eq!(position(&engine, b), Point::new(p.x + 1.0, p.y + 1.0));
}

#[test]
fn dragging_a_node_with_a_pending_expand_keeps_its_children_attached() {
    let mut engine = generated_board();
    let a = topic(&engine, "A");
    let op = begin_expand(&mut engine, a, 0.0);

    let p = position(&engine, a);
    engine.handle_input(&InputEvent::pointer_down(p.x, p.y), 100.0);
    engine.handle_input(&InputEvent::pointer_move(p.x, p.y + 300.0), 110.0);
    assert_eq!(position(&engine, a), Point::new(p.x, p.y + 300.0));

    engine.resolve_expand(
        op,
        Ok(ExpandResponse {
            expansions: vec!["x".into(), "y".into()],
        }),
        120.0,
    );
    assert!(!engine.tick(130.0).layout_ran, "no layout while dragging");
    engine.handle_input(&InputEvent::pointer_up(p.x, p.y + 300.0), 140.0);

    let children = engine.graph().expansions_of(a);
    assert_eq!(children.len(), 2);
    for id in children {
        assert_eq!(engine.graph().parent_of(id), Some(a));
        assert!(position(&engine, id).y > p.y + 300.0);
    }
}

// ─── Delete ─────────────────────────────────────────────────────────────

#[test]
fn deleting_a_topic_removes_its_expansions() {
    let mut engine = generated_board();
    let a = topic(&engine, "A");
    let op = begin_expand(&mut engine, a, 0.0);
    engine.resolve_expand(
        op,
        Ok(ExpandResponse {
            expansions: vec!["x".into(), "y".into()],
        }),
        10.0,
    );
    let children = engine.graph().expansions_of(a);

    let removed = engine.delete_node(a).unwrap();
    assert_eq!(removed.len(), 3);
    assert!(!engine.graph().contains(a));
    for id in children {
        assert!(!engine.graph().contains(id));
    }
    assert_eq!(engine.graph().len(), 3);
}

#[test]
fn deleting_an_ancestor_of_a_busy_node_is_rejected() {
    let mut engine = generated_board();
    let a = topic(&engine, "A");
    let b = topic(&engine, "B");
    let op = begin_expand(&mut engine, a, 0.0);
    engine.resolve_expand(op, Ok(ExpandResponse { expansions: vec!["x".into()] }), 10.0);
    let x = engine.graph().expansions_of(a)[0];

    engine.request_combine(x, b, 20.0).unwrap();
    assert_eq!(engine.delete_node(a), Err(EngineError::Busy(x)));
    assert!(engine.graph().contains(a));
}

#[test]
fn delete_key_removes_the_selected_node() {
    init_logs();
    let config = CanvasConfig {
        expand_on_click: false,
        ..CanvasConfig::default()
    };
    let mut engine = CanvasEngine::new(config);
    engine.set_use_case("Garden").unwrap();
    let ids = engine.seed_topics(&["Herbs"]).unwrap();
    engine.tick(0.0);
    let p = position(&engine, ids[0]);

    engine.handle_input(&InputEvent::pointer_down(p.x, p.y), 10.0);
    engine.handle_input(&InputEvent::pointer_up(p.x, p.y), 20.0);
    assert_eq!(engine.selected(), Some(ids[0]));
    assert!(engine.take_requests().is_empty());

    engine.handle_input(&InputEvent::key("Delete"), 30.0);
    assert!(!engine.graph().contains(ids[0]));
    assert_eq!(engine.selected(), None);
}

// ─── Timeouts ───────────────────────────────────────────────────────────

#[test]
fn late_results_after_timeout_are_discarded() {
    let mut engine = generated_board();
    let a = topic(&engine, "A");
    let b = topic(&engine, "B");
    let op = engine.request_combine(a, b, 0.0).unwrap();

    let report = engine.tick(30_000.0);
    assert_eq!(report.abandoned, 1);
    assert!(!engine.is_busy(a));
    assert!(engine.take_requests().is_empty());

    let before = engine.snapshot();
    let outcome = engine.resolve_combine(
        op,
        Ok(CombineResponse {
            combined_topic: "AB".into(),
        }),
        31_000.0,
    );
    assert_eq!(outcome, Outcome::Stale);
    assert_eq!(engine.snapshot(), before);
}

// ─── Viewport ───────────────────────────────────────────────────────────

#[test]
fn wheel_zoom_keeps_the_anchor_fixed() {
    let mut engine = generated_board();
    let anchor = engine.screen_to_world(300.0, 200.0);
    engine.handle_input(
        &InputEvent::Wheel {
            x: 300.0,
            y: 200.0,
            delta_y: -120.0,
            modifiers: Default::default(),
        },
        1000.0,
    );
    engine.tick(1100.0);
    assert!(engine.view().scale > 1.0);
    let after = engine.view().screen_to_world(300.0, 200.0);
    assert!((after.x - anchor.x).abs() < 1e-3 && (after.y - anchor.y).abs() < 1e-3);
}

#[test]
fn horizontal_only_scroll_does_not_zoom() {
    let mut engine = generated_board();
    let before = engine.view();
    let consumed = engine.handle_input(
        &InputEvent::Wheel {
            x: 300.0,
            y: 200.0,
            delta_y: 0.0,
            modifiers: Default::default(),
        },
        1000.0,
    );
    engine.tick(1100.0);
    assert!(consumed);
    assert_eq!(engine.view(), before);
}

#[test]
fn dragging_the_background_pans() {
    let mut engine = generated_board();
    let (x, y) = (5.0, 5.0);
    assert!(ib_render::hit_test(engine.graph(), x, y).is_none());
    engine.handle_input(&InputEvent::pointer_down(x, y), 0.0);
    engine.handle_input(&InputEvent::pointer_move(x + 40.0, y + 10.0), 100.0);
    engine.handle_input(&InputEvent::pointer_up(x + 40.0, y + 10.0), 110.0);
    let view = engine.view();
    assert_eq!((view.pan_x, view.pan_y), (40.0, 10.0));
}

//! Integration tests for nudging rows and columns.

mod common;

use float_cmp::approx_eq;

use trellis::{
    GraphBuilder, GraphError,
    adapter::{GeometryAdapter, NotationSurface},
    geometry::{Bounds, Point},
    identifier::Id,
    notation::{ConnectorEnd, NotationError, ViewRef},
    semantic::{MessageEnd, MessageSort},
};

use common::*;

fn call_and_reply() -> Fixture {
    Fixture::new()
        .lifeline(
            "A",
            100.0,
            vec![
                send("call_send", "call"),
                receive("reply_receive", "reply"),
            ],
        )
        .lifeline(
            "B",
            300.0,
            vec![
                exec_start("exec_start", "exec"),
                receive("call_receive", "call"),
                send("reply_send", "reply"),
                exec_finish("exec_finish", "exec"),
            ],
        )
        .shape("exec", Some("B"), rect(295.0, 40.0, 10.0, 60.0))
        .drawn_message(
            "call",
            MessageSort::SynchCall,
            (occurrence("call_send"), at("A", 100.0, 40.0)),
            (occurrence("call_receive"), at("exec", 295.0, 40.0)),
        )
        .drawn_message(
            "reply",
            MessageSort::Reply,
            (occurrence("reply_send"), at("exec", 295.0, 100.0)),
            (occurrence("reply_receive"), at("A", 100.0, 100.0)),
        )
}

#[test]
fn test_nudge_straddling_execution_is_stretched() {
    let (mut graph, mut surface) = call_and_reply().build().unwrap();

    graph.nudge(3, 20.0, &mut surface).expect("nudge applies");

    assert!(approx_eq!(f32, graph.rows().get(2).unwrap().position(), 40.0));
    assert!(approx_eq!(f32, graph.rows().get(3).unwrap().position(), 120.0));

    let exec = surface.bounds_of(view("exec")).unwrap();
    assert!(approx_eq!(f32, exec.min_y(), 40.0));
    assert!(approx_eq!(f32, exec.height(), 80.0));
    assert!(approx_eq!(
        f32,
        surface.bounds_of(view("A")).unwrap().height(),
        LIFELINE_HEIGHT + 20.0
    ));

    assert!(approx_eq!(f32, anchor_y(&surface, "reply", ConnectorEnd::Source), 120.0));
    assert!(approx_eq!(f32, anchor_y(&surface, "reply", ConnectorEnd::Target), 120.0));
    assert!(approx_eq!(f32, anchor_y(&surface, "call", ConnectorEnd::Target), 40.0));
}

#[test]
fn test_nudge_moves_contained_execution() {
    let (mut graph, mut surface) = call_and_reply().build().unwrap();

    graph.nudge(2, 10.0, &mut surface).expect("nudge applies");

    let exec = surface.bounds_of(view("exec")).unwrap();
    assert!(approx_eq!(f32, exec.min_y(), 50.0));
    assert!(approx_eq!(f32, exec.height(), 60.0));

    // Anchors on the execution travel with it, anchors on A are moved.
    assert!(approx_eq!(f32, anchor_y(&surface, "call", ConnectorEnd::Target), 50.0));
    assert!(approx_eq!(f32, anchor_y(&surface, "reply", ConnectorEnd::Source), 110.0));
    assert!(approx_eq!(f32, anchor_y(&surface, "call", ConnectorEnd::Source), 50.0));
    assert!(approx_eq!(f32, anchor_y(&surface, "reply", ConnectorEnd::Target), 110.0));

    assert!(approx_eq!(f32, graph.rows().get(1).unwrap().position(), 0.0));
    assert!(approx_eq!(f32, graph.rows().get(2).unwrap().position(), 50.0));
    assert!(approx_eq!(f32, graph.rows().get(3).unwrap().position(), 110.0));
}

#[test]
fn test_nudge_rejected_without_side_effects() {
    let (mut graph, mut surface) = call_and_reply().build().unwrap();
    let before = surface.diagram().clone();

    for (row, delta) in [(3, -60.0), (3, -75.0), (1, 5.0), (4, 5.0), (0, 5.0)] {
        let result = graph.nudge(row, delta, &mut surface);
        assert!(
            matches!(result, Err(GraphError::MutationRejected(_))),
            "nudge({row}, {delta}) should be rejected"
        );
    }

    assert_eq!(surface.diagram(), &before);
    assert!(approx_eq!(f32, graph.rows().get(3).unwrap().position(), 100.0));
}

/// Surface whose resizes start failing after a number of successful ones.
struct FlakySurface {
    inner: NotationSurface,
    resizes_left: usize,
}

impl GeometryAdapter for FlakySurface {
    fn to_relative(&self, container: Id, point: Point) -> Option<Point> {
        self.inner.to_relative(container, point)
    }

    fn bounds_of(&self, view: Id) -> Option<Bounds> {
        self.inner.bounds_of(view)
    }

    fn anchor_of(&self, connector: Id, end: ConnectorEnd) -> Option<Point> {
        self.inner.anchor_of(connector, end)
    }

    fn parent_of(&self, view: Id) -> Option<Id> {
        self.inner.parent_of(view)
    }

    fn attached_to(&self, connector: Id, end: ConnectorEnd) -> Option<Id> {
        self.inner.attached_to(connector, end)
    }

    fn translate(&mut self, view: ViewRef, dx: f32, dy: f32) -> Result<(), NotationError> {
        self.inner.translate(view, dx, dy)
    }

    fn resize(&mut self, view: Id, dw: f32, dh: f32) -> Result<(), NotationError> {
        if self.resizes_left == 0 {
            return Err(NotationError::UnknownView(view));
        }
        self.resizes_left -= 1;
        self.inner.resize(view, dw, dh)
    }
}

#[test]
fn test_failed_adapter_edit_is_undone() {
    let (mut graph, surface) = call_and_reply().build().unwrap();
    let before = surface.diagram().clone();
    let mut flaky = FlakySurface {
        inner: surface,
        resizes_left: 1,
    };

    let result = graph.nudge(3, 20.0, &mut flaky);

    assert!(matches!(result, Err(GraphError::MutationRejected(_))));
    assert_eq!(flaky.inner.diagram(), &before);
    assert!(approx_eq!(
        f32,
        flaky.inner.bounds_of(view("A")).unwrap().height(),
        LIFELINE_HEIGHT
    ));
    assert!(approx_eq!(f32, graph.rows().get(3).unwrap().position(), 100.0));
}

#[test]
fn test_nudge_within_row_tolerance_rejected() {
    let fixture = call_and_reply();
    let (mut graph, mut surface) = fixture.build().unwrap();
    let tolerance = graph.config().row_tolerance();
    assert!(approx_eq!(f32, tolerance, 3.0));

    for delta in [-58.0, -57.0] {
        let result = graph.nudge(3, delta, &mut surface);
        assert!(
            matches!(result, Err(GraphError::MutationRejected(_))),
            "nudge(3, {delta}) leaves rows 2 and 3 within the tolerance"
        );
    }

    graph.nudge(3, -56.0, &mut surface).expect("gap of 4px is kept");
    assert!(approx_eq!(f32, graph.rows().get(3).unwrap().position(), 44.0));

    // Rebuilding from the nudged notation keeps both rows apart.
    let rebuilt = GraphBuilder::default()
        .build(fixture.interaction(), surface.diagram(), &surface)
        .expect("nudged notation builds");
    assert_eq!(rebuilt.rows().len(), graph.rows().len());
    let reply_send = rebuilt.node_for(id("reply_send")).unwrap();
    assert_eq!(rebuilt.row_index(reply_send), Some(3));
}

#[test]
fn test_nudge_up_within_gap() {
    let (mut graph, mut surface) = call_and_reply().build().unwrap();

    graph.nudge(3, -30.0, &mut surface).expect("row 3 stays below row 2");

    assert!(approx_eq!(f32, graph.rows().get(3).unwrap().position(), 70.0));
    let exec = surface.bounds_of(view("exec")).unwrap();
    assert!(approx_eq!(f32, exec.height(), 30.0));
}

#[test]
fn test_nudge_column_moves_lifeline() {
    let (mut graph, mut surface) = Fixture::new()
        .lifeline("A", 100.0, vec![send("m_send", "m")])
        .lifeline("B", 300.0, vec![receive("m_receive", "m")])
        .signal("m", ("A", 100.0, 50.0), ("B", 300.0, 50.0))
        .build()
        .unwrap();

    graph.nudge_column(2, 50.0, &mut surface).expect("nudge applies");

    let b = surface.bounds_of(view("B")).unwrap();
    assert!(approx_eq!(f32, b.center().x(), 350.0));
    let receive = surface.anchor_of(view("m"), ConnectorEnd::Target).unwrap();
    assert!(approx_eq!(f32, receive.x(), 350.0));
    assert!(approx_eq!(f32, graph.columns().get(2).unwrap().position(), 350.0));

    let result = graph.nudge_column(2, -260.0, &mut surface);
    assert!(matches!(result, Err(GraphError::MutationRejected(_))));
    let result = graph.nudge_column(3, 10.0, &mut surface);
    assert!(matches!(result, Err(GraphError::MutationRejected(_))));
}

#[test]
fn test_nudge_column_widens_fragment() {
    let (mut graph, mut surface) = Fixture::new()
        .lifeline("A", 100.0, vec![fragment_start("ref"), fragment_end("ref")])
        .lifeline("B", 300.0, vec![fragment_start("ref"), fragment_end("ref")])
        .lifeline("C", 500.0, vec![receive("out_receive", "out")])
        .shape("ref", None, rect(60.0, 80.0, 300.0, 100.0))
        .interaction_use("ref", &["A", "B"], &["g1"])
        .drawn_message(
            "out",
            MessageSort::AsynchSignal,
            (MessageEnd::Gate { gate: id("g1") }, at("ref", 360.0, 130.0)),
            (occurrence("out_receive"), at("C", 500.0, 130.0)),
        )
        .build()
        .unwrap();

    graph.nudge_column(2, 20.0, &mut surface).expect("nudge applies");

    let fragment = surface.bounds_of(view("ref")).unwrap();
    assert!(approx_eq!(f32, fragment.min_x(), 60.0));
    assert!(approx_eq!(f32, fragment.width(), 320.0));
    let gate = surface.anchor_of(view("out"), ConnectorEnd::Source).unwrap();
    assert!(approx_eq!(f32, gate.x(), 380.0));
    let c = surface.bounds_of(view("C")).unwrap();
    assert!(approx_eq!(f32, c.center().x(), 520.0));
}

#[test]
fn test_insert_and_remove_rows() {
    let (mut graph, _) = call_and_reply().build().unwrap();
    assert_eq!(graph.rows().len(), 3);

    let inserted = graph.insert_row_after(2).expect("row 2 exists");
    assert_eq!(graph.rows().len(), 4);
    assert_eq!(graph.rows().index_of(inserted), Some(3));
    assert!(approx_eq!(f32, graph.rows().get(3).unwrap().position(), 70.0));

    let reply_send = graph.node_for(id("reply_send")).unwrap();
    assert_eq!(graph.row_index(reply_send), Some(4));

    assert!(!graph.remove_row_if_empty(2));
    assert!(graph.remove_row_if_empty(3));
    assert_eq!(graph.rows().len(), 3);
    assert_eq!(graph.row_index(reply_send), Some(3));

    assert!(matches!(
        graph.insert_row_after(9),
        Err(GraphError::MutationRejected(_))
    ));
}

#[test]
fn test_insert_and_remove_columns() {
    let (mut graph, _) = call_and_reply().build().unwrap();

    let inserted = graph.insert_column_after(1).expect("column 1 exists");
    assert_eq!(graph.columns().index_of(inserted), Some(2));
    assert!(approx_eq!(f32, graph.columns().get(2).unwrap().position(), 200.0));
    assert_eq!(graph.column_index(graph.lifeline_clusters()[1]), Some(3));

    assert!(graph.remove_column_if_empty(2));
    assert_eq!(graph.column_index(graph.lifeline_clusters()[1]), Some(2));
}

fn relay() -> Fixture {
    Fixture::new()
        .lifeline("A", 100.0, vec![send("m1_send", "m1")])
        .lifeline(
            "B",
            300.0,
            vec![receive("m1_receive", "m1"), send("m2_send", "m2")],
        )
        .lifeline("C", 500.0, vec![receive("m2_receive", "m2")])
        .signal("m1", ("A", 100.0, 40.0), ("B", 300.0, 40.0))
        .signal("m2", ("B", 300.0, 80.0), ("C", 500.0, 80.0))
}

fn lifeline_order(graph: &trellis::InteractionGraph) -> Vec<String> {
    graph
        .lifeline_clusters()
        .iter()
        .map(|&cluster| graph.node(cluster).unwrap().element().to_string())
        .collect()
}

#[test]
fn test_move_lifeline_to_front() {
    let fixture = relay();
    let (mut graph, mut surface) = fixture.build().unwrap();

    graph
        .move_lifeline(id("C"), Some(id("A")), &mut surface)
        .expect("move applies");

    assert_eq!(lifeline_order(&graph), vec!["C", "A", "B"]);
    for (idx, &cluster) in graph.lifeline_clusters().iter().enumerate() {
        assert_eq!(graph.column_index(cluster), Some(idx + 1));
    }
    for (idx, x) in [100.0, 300.0, 500.0].into_iter().enumerate() {
        assert!(approx_eq!(f32, graph.columns().get(idx + 1).unwrap().position(), x));
    }

    assert!(approx_eq!(f32, surface.bounds_of(view("C")).unwrap().center().x(), 100.0));
    assert!(approx_eq!(f32, surface.bounds_of(view("A")).unwrap().center().x(), 300.0));
    assert!(approx_eq!(f32, surface.bounds_of(view("B")).unwrap().center().x(), 500.0));
    let target = surface.anchor_of(view("m2"), ConnectorEnd::Target).unwrap();
    assert!(approx_eq!(f32, target.x(), 100.0));
    assert!(approx_eq!(f32, target.y(), 80.0));

    let rebuilt = GraphBuilder::default()
        .build(fixture.interaction(), surface.diagram(), &surface)
        .expect("moved notation builds");
    assert_eq!(lifeline_order(&rebuilt), lifeline_order(&graph));
}

#[test]
fn test_move_lifeline_to_end() {
    let (mut graph, mut surface) = relay().build().unwrap();

    graph.move_lifeline(id("A"), None, &mut surface).expect("move applies");

    assert_eq!(lifeline_order(&graph), vec!["B", "C", "A"]);
    assert!(approx_eq!(f32, surface.bounds_of(view("A")).unwrap().center().x(), 500.0));
    assert!(approx_eq!(f32, surface.bounds_of(view("B")).unwrap().center().x(), 100.0));
    let source = surface.anchor_of(view("m1"), ConnectorEnd::Source).unwrap();
    assert!(approx_eq!(f32, source.x(), 500.0));

    let m1_send = graph.node_for(id("m1_send")).unwrap();
    assert_eq!(graph.column_index(m1_send), Some(3));
}

#[test]
fn test_move_lifeline_in_place_is_noop() {
    let (mut graph, mut surface) = relay().build().unwrap();
    let before = surface.diagram().clone();

    graph
        .move_lifeline(id("A"), Some(id("B")), &mut surface)
        .expect("A already precedes B");
    graph
        .move_lifeline(id("B"), Some(id("B")), &mut surface)
        .expect("B before itself");

    assert_eq!(lifeline_order(&graph), vec!["A", "B", "C"]);
    assert_eq!(surface.diagram(), &before);
}

#[test]
fn test_move_lifeline_rejected() {
    let (mut graph, mut surface) = Fixture::new()
        .lifeline("A", 100.0, vec![fragment_start("ref"), fragment_end("ref")])
        .lifeline("B", 300.0, vec![fragment_start("ref"), fragment_end("ref")])
        .lifeline("C", 500.0, vec![receive("out_receive", "out")])
        .shape("ref", None, rect(60.0, 80.0, 300.0, 100.0))
        .interaction_use("ref", &["A", "B"], &["g1"])
        .drawn_message(
            "out",
            MessageSort::AsynchSignal,
            (MessageEnd::Gate { gate: id("g1") }, at("ref", 360.0, 130.0)),
            (occurrence("out_receive"), at("C", 500.0, 130.0)),
        )
        .build()
        .unwrap();
    let before = surface.diagram().clone();

    for (lifeline, target) in [
        ("C", Some("A")),
        ("A", None),
        ("C", Some("B")),
        ("ref", None),
        ("C", Some("nowhere")),
    ] {
        let result = graph.move_lifeline(id(lifeline), target.map(id), &mut surface);
        assert!(
            matches!(result, Err(GraphError::MutationRejected(_))),
            "moving {lifeline} before {target:?} should be rejected"
        );
    }

    assert_eq!(surface.diagram(), &before);
    assert_eq!(lifeline_order(&graph), vec!["A", "B", "C"]);
}

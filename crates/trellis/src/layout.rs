//! Row and column assignment.
//!
//! Rows come from geometry first: every leaf node gets a vertical position,
//! positions are bucketed with the row tolerance and each bucket starts at a
//! base level far enough from the next one that ordering constraints can
//! only reorder nodes inside or right after a bucket. Constraints are then
//! propagated over a DAG:
//!
//! - consecutive leaves of a lifeline's covering order (weight 0)
//! - message source before target (weight 1 for self messages)
//! - all start marks of a fragment share a level, all end marks too
//! - outer gates sit between their fragment's start and end
//!
//! Distinct levels are renumbered densely from row 2; row 1 is the header row
//! of the lifeline clusters.

use indexmap::IndexMap;
use log::{debug, trace};

use trellis_core::{
    geometry::Bounds,
    identifier::Id,
    notation::{ConnectorEnd, Notation, ViewRef},
    semantic::Lifeline,
};

use crate::{
    GraphError,
    adapter::GeometryAdapter,
    config::GraphConfig,
    constraint::{ConstraintGraph, Groups},
    graph::{ClusterKind, InteractionGraph, MarkKind, Node, NodeId, NodeKind},
    grid::{ColumnId, bucketize},
};

/// Orders lifelines by horizontal position.
///
/// Lifelines closer than `tolerance` keep their semantic order, as do
/// lifelines without a view, which go last.
pub(crate) fn order_lifelines<'a>(
    lifelines: &'a [Lifeline],
    notation: &dyn Notation,
    adapter: &dyn GeometryAdapter,
    tolerance: f32,
) -> Vec<&'a Lifeline> {
    let positions: Vec<Option<f32>> = lifelines
        .iter()
        .map(|lifeline| {
            notation
                .view_for(lifeline.id())
                .and_then(|view| adapter.bounds_of(view))
                .map(|bounds| bounds.center().x())
        })
        .collect();

    let known: Vec<f32> = positions.iter().flatten().copied().collect();
    let mut buckets = bucketize(&known, tolerance).into_iter();

    let mut keyed: Vec<(usize, usize)> = positions
        .iter()
        .enumerate()
        .map(|(idx, position)| {
            let bucket = match position {
                Some(_) => buckets.next().unwrap_or(usize::MAX),
                None => usize::MAX,
            };
            (bucket, idx)
        })
        .collect();
    keyed.sort();

    keyed.into_iter().map(|(_, idx)| &lifelines[idx]).collect()
}

/// Returns the absolute bounds of a node's shape view.
fn shape_bounds(node: &Node, adapter: &dyn GeometryAdapter) -> Option<Bounds> {
    match node.view()? {
        ViewRef::Shape(view) => adapter.bounds_of(view),
        ViewRef::Anchor(..) => None,
    }
}

/// Returns the connector end of a message passing through `node`.
fn message_end(graph: &InteractionGraph, node: &Node) -> Option<(Id, ConnectorEnd)> {
    let link = graph.link(node.link()?)?;
    let end = if link.source() == node.id() {
        ConnectorEnd::Source
    } else {
        ConnectorEnd::Target
    };
    Some((link.view()?, end))
}

/// Position of a leaf node on one axis, read from the notation.
fn leaf_point(
    graph: &InteractionGraph,
    adapter: &dyn GeometryAdapter,
    node: &Node,
) -> Option<(f32, f32)> {
    match node.kind() {
        NodeKind::Mark(kind) => {
            let bounds = shape_bounds(node, adapter)?;
            let point = match kind {
                MarkKind::Start => bounds.top(),
                MarkKind::End => bounds.bottom(),
            };
            Some((point.x(), point.y()))
        }
        NodeKind::Occurrence(_) => match node.view()? {
            ViewRef::Anchor(connector, end) => adapter
                .anchor_of(connector, end)
                .map(|point| (point.x(), point.y())),
            ViewRef::Shape(_) => None,
        },
        NodeKind::Gate(_) => message_end(graph, node)
            .and_then(|(connector, end)| adapter.anchor_of(connector, end))
            .or_else(|| match node.view()? {
                ViewRef::Shape(view) => adapter.bounds_of(view).map(Bounds::center),
                ViewRef::Anchor(connector, end) => adapter.anchor_of(connector, end),
            })
            .map(|point| (point.x(), point.y())),
        NodeKind::Cluster(_) => None,
    }
}

pub(crate) fn assign_rows(
    graph: &mut InteractionGraph,
    adapter: &dyn GeometryAdapter,
    config: &GraphConfig,
) -> Result<(), GraphError> {
    let leaves: Vec<NodeId> = graph
        .nodes()
        .filter(|node| node.is_leaf())
        .map(Node::id)
        .collect();
    let vertex: IndexMap<NodeId, usize> = leaves
        .iter()
        .enumerate()
        .map(|(idx, &node)| (node, idx))
        .collect();

    let mut positions: Vec<Option<f32>> = leaves
        .iter()
        .map(|&id| {
            graph
                .node(id)
                .and_then(|node| leaf_point(graph, adapter, node))
                .map(|(_, y)| y)
        })
        .collect();

    let lifelines = graph.lifeline_clusters().to_vec();
    let lifeline_orders: Vec<Vec<usize>> = lifelines
        .iter()
        .map(|&cluster| {
            graph
                .leaves(cluster)
                .iter()
                .filter_map(|node| vertex.get(node).copied())
                .collect()
        })
        .collect();

    let tops: Vec<Option<f32>> = lifelines
        .iter()
        .map(|&cluster| {
            graph
                .node(cluster)
                .and_then(|node| shape_bounds(node, adapter))
                .map(Bounds::min_y)
        })
        .collect();

    // A leaf without geometry takes its predecessor's position.
    for (order, top) in lifeline_orders.iter().zip(&tops) {
        let mut previous = *top;
        for &v in order {
            match positions[v] {
                Some(y) => previous = Some(y),
                None => positions[v] = previous,
            }
        }
    }
    for (idx, &id) in leaves.iter().enumerate() {
        if positions[idx].is_none() {
            let opposite = graph
                .node(id)
                .and_then(|node| node.connected_node().or(node.connected_by_node()))
                .and_then(|other| vertex.get(&other).copied())
                .and_then(|other| positions[other]);
            positions[idx] = opposite;
        }
    }
    let ys: Vec<f32> = positions.iter().map(|y| y.unwrap_or(0.0)).collect();

    let mut groups = Groups::new(leaves.len());
    let mut gate_spans: Vec<(usize, usize, Vec<usize>)> = Vec::new();
    for fragment in graph
        .nodes()
        .filter(|node| matches!(node.cluster_kind(), Some(ClusterKind::Fragment(_))))
    {
        let boundary = |last: bool| -> Vec<usize> {
            fragment
                .children()
                .iter()
                .filter_map(|&slice| {
                    let children = graph.node(slice)?.children();
                    if last {
                        children.last()
                    } else {
                        children.first()
                    }
                })
                .filter_map(|mark| vertex.get(mark).copied())
                .collect()
        };
        let starts = boundary(false);
        let ends = boundary(true);
        for pair in starts.windows(2) {
            groups.union(pair[0], pair[1]);
        }
        for pair in ends.windows(2) {
            groups.union(pair[0], pair[1]);
        }
        if let (Some(&start), Some(&end)) = (starts.first(), ends.first()) {
            let gates = fragment
                .outer_gates()
                .iter()
                .filter_map(|gate| vertex.get(gate).copied())
                .collect();
            gate_spans.push((start, end, gates));
        }
    }

    let buckets = bucketize(&ys, config.row_tolerance());
    let stride = leaves.len() as u64 + 1;
    let mut base = vec![0u64; leaves.len()];
    for (v, &bucket) in buckets.iter().enumerate() {
        let rep = groups.find(v);
        base[rep] = base[rep].max(bucket as u64 * stride);
    }

    let mut constraints = ConstraintGraph::new(leaves.len());
    for order in &lifeline_orders {
        for pair in order.windows(2) {
            constraints.add_edge(groups.find(pair[0]), groups.find(pair[1]), 0);
        }
    }
    for link in graph.links() {
        let (Some(&source), Some(&target)) = (vertex.get(&link.source()), vertex.get(&link.target()))
        else {
            continue;
        };
        let source_lifeline = graph.lifeline_of(link.source());
        let weight = if source_lifeline.is_some() && source_lifeline == graph.lifeline_of(link.target()) {
            1
        } else {
            0
        };
        constraints.add_edge(groups.find(source), groups.find(target), weight);
    }
    for (start, end, gates) in &gate_spans {
        let (start, end) = (groups.find(*start), groups.find(*end));
        for &gate in gates {
            let gate = groups.find(gate);
            constraints.add_edge(start, gate, 0);
            constraints.add_edge(gate, end, 0);
        }
    }

    let levels = constraints.levels(&base).map_err(|cycle| {
        let elements: Vec<String> = cycle
            .vertices
            .iter()
            .filter_map(|&v| graph.node(leaves[v]))
            .map(|node| node.element().to_string())
            .collect();
        GraphError::structural(format!(
            "ordering constraints form a cycle through {}",
            elements.join(", ")
        ))
    })?;
    let leaf_levels: Vec<u64> = (0..leaves.len()).map(|v| levels[groups.find(v)]).collect();

    let mut distinct = leaf_levels.clone();
    distinct.sort_unstable();
    distinct.dedup();

    let header_y = tops
        .iter()
        .flatten()
        .copied()
        .reduce(f32::min)
        .unwrap_or(0.0);
    let header = graph.rows.push(header_y);
    for &cluster in &lifelines {
        graph.set_row(cluster, header);
    }

    let mut row_positions = vec![f32::INFINITY; distinct.len()];
    let mut row_of_leaf = Vec::with_capacity(leaves.len());
    for (v, level) in leaf_levels.iter().enumerate() {
        let row = distinct.binary_search(level).unwrap_or_default();
        row_positions[row] = row_positions[row].min(ys[v]);
        row_of_leaf.push(row);
    }
    let rows: Vec<_> = row_positions
        .into_iter()
        .map(|position| graph.rows.push(position))
        .collect();
    for (v, &row) in row_of_leaf.iter().enumerate() {
        graph.set_row(leaves[v], rows[row]);
    }

    debug!(leaves = leaves.len(), rows = graph.rows.len(); "Rows assigned");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// Horizontal position of a gate: its message anchor or its own shape.
fn gate_x(graph: &InteractionGraph, adapter: &dyn GeometryAdapter, gate: NodeId) -> Option<f32> {
    graph
        .node(gate)
        .and_then(|node| leaf_point(graph, adapter, node))
        .map(|(x, _)| x)
}

fn column_of(graph: &InteractionGraph, node: NodeId) -> Option<ColumnId> {
    graph.node(node).and_then(Node::column)
}

pub(crate) fn assign_columns(
    graph: &mut InteractionGraph,
    adapter: &dyn GeometryAdapter,
) -> Result<(), GraphError> {
    let lifelines = graph.lifeline_clusters().to_vec();

    let mut previous_x = 0.0;
    for &cluster in &lifelines {
        let x = graph
            .node(cluster)
            .and_then(|node| shape_bounds(node, adapter))
            .map(|bounds| bounds.center().x())
            .unwrap_or(previous_x);
        previous_x = x;
        let column = graph.columns.push(x);
        for node in graph.descendants(cluster) {
            graph.set_column(node, column);
        }
    }

    let fragments: Vec<NodeId> = graph
        .nodes()
        .filter(|node| matches!(node.cluster_kind(), Some(ClusterKind::Fragment(_))))
        .map(Node::id)
        .collect();
    for fragment in fragments {
        place_fragment_gates(graph, adapter, fragment)?;
    }

    place_formal_gates(graph, adapter, lifelines.first().copied());

    debug!(columns = graph.columns.len(); "Columns assigned");
    Ok(())
}

fn place_fragment_gates(
    graph: &mut InteractionGraph,
    adapter: &dyn GeometryAdapter,
    fragment: NodeId,
) -> Result<(), GraphError> {
    let Some(node) = graph.node(fragment) else {
        return Ok(());
    };
    let gates = node.outer_gates().to_vec();
    if gates.is_empty() {
        return Ok(());
    }
    let bounds = shape_bounds(node, adapter);

    let mut covered: Vec<(usize, ColumnId)> = node
        .children()
        .iter()
        .filter_map(|&slice| column_of(graph, slice))
        .filter_map(|column| graph.columns.index_of(column).map(|idx| (idx, column)))
        .collect();
    covered.sort();
    let (Some(&(leftmost_idx, leftmost)), Some(&(_, rightmost))) = (covered.first(), covered.last())
    else {
        return Err(GraphError::structural(format!(
            "fragment `{}` has no covered column",
            node.element()
        )));
    };

    let mut left = Vec::new();
    let mut right = Vec::new();
    for gate in gates {
        let x = gate_x(graph, adapter, gate);
        let side = match (x, bounds) {
            (Some(x), Some(bounds)) if x < bounds.center().x() => Side::Left,
            (Some(_), Some(_)) => Side::Right,
            _ => {
                let opposite = graph
                    .node(gate)
                    .and_then(|node| node.connected_node().or(node.connected_by_node()))
                    .and_then(|other| column_of(graph, other))
                    .and_then(|column| graph.columns.index_of(column));
                match opposite {
                    Some(idx) if idx < leftmost_idx => Side::Left,
                    _ => Side::Right,
                }
            }
        };
        trace!(gate:?, x:?, side:?; "Fragment gate side");
        match side {
            Side::Left => left.push((gate, x)),
            Side::Right => right.push((gate, x)),
        }
    }

    left.sort_by(|a, b| a.1.unwrap_or(f32::MIN).total_cmp(&b.1.unwrap_or(f32::MIN)));
    right.sort_by(|a, b| b.1.unwrap_or(f32::MIN).total_cmp(&a.1.unwrap_or(f32::MIN)));

    for (gate, x) in left {
        let (Some(at), Some(anchor)) = (
            graph.columns.index_of(leftmost),
            graph.columns.slot(leftmost).map(|slot| slot.position()),
        ) else {
            continue;
        };
        if let Some(column) = graph.columns.insert_after(at - 1, x.unwrap_or(anchor)) {
            graph.set_column(gate, column);
        }
    }
    for (gate, x) in right {
        let (Some(at), Some(anchor)) = (
            graph.columns.index_of(rightmost),
            graph.columns.slot(rightmost).map(|slot| slot.position()),
        ) else {
            continue;
        };
        if let Some(column) = graph.columns.insert_after(at, x.unwrap_or(anchor)) {
            graph.set_column(gate, column);
        }
    }
    Ok(())
}

/// Formal gates take dedicated columns at the far left or far right.
fn place_formal_gates(
    graph: &mut InteractionGraph,
    adapter: &dyn GeometryAdapter,
    first_lifeline: Option<NodeId>,
) {
    let first_x = first_lifeline
        .and_then(|cluster| column_of(graph, cluster))
        .and_then(|column| graph.columns.slot(column))
        .map(|slot| slot.position());

    let mut left = Vec::new();
    let mut right = Vec::new();
    for &gate in graph.formal_gates() {
        let x = gate_x(graph, adapter, gate);
        match (x, first_x) {
            (Some(x), Some(first)) if x < first => left.push((gate, x)),
            _ => right.push((gate, x.unwrap_or(f32::MAX))),
        }
    }

    left.sort_by(|a, b| b.1.total_cmp(&a.1));
    right.sort_by(|a, b| a.1.total_cmp(&b.1));

    for (gate, x) in left {
        if let Some(column) = graph.columns.insert_after(0, x) {
            graph.set_column(gate, column);
        }
    }
    for (gate, x) in right {
        let x = if x == f32::MAX {
            graph
                .columns
                .iter()
                .last()
                .map(|slot| slot.position())
                .unwrap_or(0.0)
        } else {
            x
        };
        let column = graph.columns.push(x);
        graph.set_column(gate, column);
    }
}

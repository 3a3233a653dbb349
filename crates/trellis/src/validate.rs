//! Structural checks run on every freshly built graph.

use log::debug;

use crate::{
    GraphError,
    graph::{ClusterKind, InteractionGraph, MarkKind, Node, NodeId, NodeKind},
};

pub(crate) fn check(graph: &InteractionGraph) -> Result<(), GraphError> {
    check_ownership(graph)?;
    check_lifeline_rows(graph)?;
    check_links(graph)?;
    check_executions(graph)?;
    check_fragments(graph)?;
    check_columns(graph)?;
    debug!(nodes = graph.nodes().count(); "Graph validated");
    Ok(())
}

fn row(graph: &InteractionGraph, node: NodeId) -> Result<usize, GraphError> {
    graph.row_index(node).ok_or_else(|| {
        GraphError::structural(format!("node {} has no row", node.index()))
    })
}

fn element(graph: &InteractionGraph, node: NodeId) -> String {
    graph
        .node(node)
        .map(|node| node.element().to_string())
        .unwrap_or_default()
}

/// Every node except the roots has exactly one owner, and owners agree with `parent`.
fn check_ownership(graph: &InteractionGraph) -> Result<(), GraphError> {
    let mut owners: Vec<Option<NodeId>> = vec![None; graph.nodes().count()];
    let mut claim = |owner: NodeId, child: NodeId| -> Result<(), GraphError> {
        let slot = owners.get_mut(child.index()).ok_or_else(|| {
            GraphError::structural(format!("node {} does not exist", child.index()))
        })?;
        if slot.replace(owner).is_some() {
            return Err(GraphError::structural(format!(
                "node for `{}` is owned twice",
                element(graph, child)
            )));
        }
        Ok(())
    };

    for node in graph.nodes() {
        match node.cluster_kind() {
            Some(ClusterKind::Fragment(_)) => {
                for &gate in node.outer_gates() {
                    claim(node.id(), gate)?;
                }
                for &owned in node.owned_fragments() {
                    claim(node.id(), owned)?;
                }
            }
            Some(_) => {
                for &child in node.children() {
                    claim(node.id(), child)?;
                }
            }
            None => {}
        }
    }

    for node in graph.nodes() {
        let owner = owners[node.id().index()];
        if owner != node.parent() {
            return Err(GraphError::structural(format!(
                "node for `{}` disagrees with its owner",
                node.element()
            )));
        }
        if owner.is_none() && !is_root(graph, node) {
            return Err(GraphError::structural(format!(
                "node for `{}` has no owner",
                node.element()
            )));
        }
    }
    Ok(())
}

fn is_root(graph: &InteractionGraph, node: &Node) -> bool {
    match node.kind() {
        NodeKind::Cluster(ClusterKind::Lifeline) => graph.lifeline_clusters().contains(&node.id()),
        NodeKind::Cluster(ClusterKind::Fragment(_)) => {
            graph.fragment_clusters().contains(&node.id())
        }
        _ => graph.formal_gates().contains(&node.id()),
    }
}

/// Rows never decrease along a lifeline's covering order.
fn check_lifeline_rows(graph: &InteractionGraph) -> Result<(), GraphError> {
    for &lifeline in graph.lifeline_clusters() {
        let mut previous = 0;
        for leaf in graph.leaves(lifeline) {
            let current = row(graph, leaf)?;
            if current < previous {
                return Err(GraphError::structural(format!(
                    "`{}` on lifeline `{}` is placed above its predecessor",
                    element(graph, leaf),
                    element(graph, lifeline)
                )));
            }
            previous = current;
        }
    }
    Ok(())
}

/// A message never goes up; on one lifeline it must go down.
fn check_links(graph: &InteractionGraph) -> Result<(), GraphError> {
    for link in graph.links() {
        let source = row(graph, link.source())?;
        let target = row(graph, link.target())?;
        let lifeline = graph.lifeline_of(link.source());
        let same_lifeline = lifeline.is_some() && lifeline == graph.lifeline_of(link.target());
        if target < source || (same_lifeline && target == source) {
            return Err(GraphError::structural(format!(
                "message `{}` goes from row {source} to row {target}",
                link.element()
            )));
        }
    }
    Ok(())
}

/// Execution start and end marks bound every leaf of the execution.
fn check_executions(graph: &InteractionGraph) -> Result<(), GraphError> {
    for node in graph
        .nodes()
        .filter(|node| node.cluster_kind() == Some(ClusterKind::Execution))
    {
        let leaves = graph.leaves(node.id());
        let (Some(&first), Some(&last)) = (node.children().first(), node.children().last()) else {
            continue;
        };
        let start = row(graph, first)?;
        let end = row(graph, last)?;
        for leaf in leaves {
            let current = row(graph, leaf)?;
            if current < start || current > end {
                return Err(GraphError::structural(format!(
                    "`{}` lies outside execution `{}`",
                    element(graph, leaf),
                    node.element()
                )));
            }
        }
    }
    Ok(())
}

/// Fragment start marks share the top row, end marks the bottom row, and
/// outer gates lie in between.
fn check_fragments(graph: &InteractionGraph) -> Result<(), GraphError> {
    for fragment in graph
        .nodes()
        .filter(|node| matches!(node.cluster_kind(), Some(ClusterKind::Fragment(_))))
    {
        let mut starts = Vec::new();
        let mut ends = Vec::new();
        let mut inner = Vec::new();
        for &slice in fragment.children() {
            for leaf in graph.leaves(slice) {
                let current = row(graph, leaf)?;
                inner.push(current);
                match graph.node(leaf).map(Node::kind) {
                    Some(NodeKind::Mark(MarkKind::Start))
                        if graph.node(leaf).and_then(Node::parent) == Some(slice) =>
                    {
                        starts.push(current)
                    }
                    Some(NodeKind::Mark(MarkKind::End))
                        if graph.node(leaf).and_then(Node::parent) == Some(slice) =>
                    {
                        ends.push(current)
                    }
                    _ => {}
                }
            }
        }
        let (Some(top), Some(bottom)) = (inner.iter().min(), inner.iter().max()) else {
            continue;
        };
        let misplaced = starts.iter().any(|row| row != top) || ends.iter().any(|row| row != bottom);
        if misplaced {
            return Err(GraphError::structural(format!(
                "fragment `{}` does not open and close on a single row",
                fragment.element()
            )));
        }
        for &gate in fragment.outer_gates() {
            let current = row(graph, gate)?;
            if current < *top || current > *bottom {
                return Err(GraphError::structural(format!(
                    "gate `{}` lies outside fragment `{}`",
                    element(graph, gate),
                    fragment.element()
                )));
            }
        }
    }
    Ok(())
}

/// Lifelines and gates each own a distinct column.
fn check_columns(graph: &InteractionGraph) -> Result<(), GraphError> {
    let mut owners: Vec<Option<NodeId>> = vec![None; graph.columns().len() + 1];
    let column_owners = graph.nodes().filter(|node| {
        matches!(
            node.kind(),
            NodeKind::Cluster(ClusterKind::Lifeline) | NodeKind::Gate(_)
        )
    });
    for node in column_owners {
        let column = graph.column_index(node.id()).ok_or_else(|| {
            GraphError::structural(format!("`{}` has no column", node.element()))
        })?;
        if let Some(other) = owners[column].replace(node.id()) {
            return Err(GraphError::structural(format!(
                "`{}` and `{}` share column {column}",
                element(graph, other),
                node.element()
            )));
        }
    }
    Ok(())
}

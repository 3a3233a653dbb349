//! Plain-text report of a built interaction graph.

use std::fmt;

use trellis::{
    ClusterKind, GateKind, InteractionGraph, MarkKind, NodeId, NodeKind, path::Resolved,
    semantic::{FragmentKind, MessageRole},
};

/// Renders the grid, the nodes on each row and the links of a graph.
pub struct Report<'a> {
    graph: &'a InteractionGraph,
    queries: Vec<(&'a str, Resolved)>,
}

impl<'a> Report<'a> {
    pub fn new(graph: &'a InteractionGraph) -> Self {
        Self {
            graph,
            queries: Vec::new(),
        }
    }

    /// Adds a resolved path query to the end of the report.
    pub fn with_query(mut self, path: &'a str, resolved: Resolved) -> Self {
        self.queries.push((path, resolved));
        self
    }

    fn write_node(&self, f: &mut fmt::Formatter<'_>, node: NodeId) -> fmt::Result {
        let Some(node) = self.graph.node(node) else {
            return write!(f, "<missing node>");
        };
        write!(f, "{} [{}]", node.element(), kind_label(node.kind()))?;
        match self.graph.column_index(node.id()) {
            Some(column) => write!(f, " column {column}"),
            None => write!(f, " no column"),
        }
    }

    fn write_resolved(&self, f: &mut fmt::Formatter<'_>, resolved: Resolved) -> fmt::Result {
        match resolved {
            Resolved::Node(node) => {
                self.write_node(f, node)?;
                if let Some(row) = self.graph.row_index(node) {
                    write!(f, " row {row}")?;
                }
                Ok(())
            }
            Resolved::Link(link) => match self.graph.link(link) {
                Some(link) => write!(f, "link {} ({:?})", link.element(), link.sort()),
                None => write!(f, "<missing link>"),
            },
            Resolved::Row(row) => {
                let rows = self.graph.rows();
                match rows.slot(row) {
                    Some(slot) => write!(
                        f,
                        "row {} at y={} with {} node(s)",
                        slot.index(),
                        slot.position(),
                        slot.nodes().len()
                    ),
                    None => write!(f, "<missing row>"),
                }
            }
            Resolved::Column(column) => {
                let columns = self.graph.columns();
                match columns.slot(column) {
                    Some(slot) => write!(
                        f,
                        "column {} at x={} with {} node(s)",
                        slot.index(),
                        slot.position(),
                        slot.nodes().len()
                    ),
                    None => write!(f, "<missing column>"),
                }
            }
        }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let graph = self.graph;
        writeln!(f, "interaction {}", graph.interaction())?;
        writeln!(
            f,
            "{} row(s), {} column(s), {} node(s), {} link(s)",
            graph.rows().len(),
            graph.columns().len(),
            graph.nodes().count(),
            graph.links().count()
        )?;

        writeln!(f)?;
        writeln!(f, "columns")?;
        for slot in graph.columns().iter() {
            write!(f, "  {:>3} x={:<8}", slot.index(), slot.position())?;
            for (idx, node) in slot.nodes().iter().enumerate() {
                if let Some(node) = graph.node(*node) {
                    let separator = if idx == 0 { "" } else { ", " };
                    write!(f, "{separator}{}", node.element())?;
                }
            }
            writeln!(f)?;
        }

        writeln!(f)?;
        writeln!(f, "rows")?;
        for slot in graph.rows().iter() {
            writeln!(f, "  {:>3} y={}", slot.index(), slot.position())?;
            for node in slot.nodes() {
                write!(f, "      ")?;
                self.write_node(f, *node)?;
                writeln!(f)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "links")?;
        for link in graph.links() {
            let row = |node| {
                graph
                    .row_index(node)
                    .map_or_else(|| "-".to_string(), |row| row.to_string())
            };
            writeln!(
                f,
                "  {} {:?}: row {} -> row {}",
                link.element(),
                link.sort(),
                row(link.source()),
                row(link.target())
            )?;
        }

        if !self.queries.is_empty() {
            writeln!(f)?;
            writeln!(f, "queries")?;
            for (path, resolved) in &self.queries {
                write!(f, "  {path} = ")?;
                self.write_resolved(f, *resolved)?;
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

fn kind_label(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Occurrence(MessageRole::Send) => "send",
        NodeKind::Occurrence(MessageRole::Receive) => "receive",
        NodeKind::Mark(MarkKind::Start) => "start",
        NodeKind::Mark(MarkKind::End) => "end",
        NodeKind::Gate(GateKind::Formal) => "formal gate",
        NodeKind::Gate(GateKind::Actual) => "actual gate",
        NodeKind::Gate(GateKind::Boundary) => "boundary gate",
        NodeKind::Cluster(ClusterKind::Lifeline) => "lifeline",
        NodeKind::Cluster(ClusterKind::Execution) => "execution",
        NodeKind::Cluster(ClusterKind::FragmentSlice) => "fragment slice",
        NodeKind::Cluster(ClusterKind::Fragment(FragmentKind::InteractionUse)) => {
            "interaction use"
        }
        NodeKind::Cluster(ClusterKind::Fragment(FragmentKind::CombinedFragment)) => {
            "combined fragment"
        }
    }
}

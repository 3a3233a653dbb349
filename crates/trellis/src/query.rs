//! Read-only queries over an [`InteractionGraph`].
//!
//! Rows and columns are reported by their 1-based index, which is what
//! editing commands and path queries work with.

use trellis_core::identifier::Id;

use crate::graph::{ClusterKind, InteractionGraph, LinkId, Node, NodeId, NodeKind};

impl InteractionGraph {
    /// Returns the node representing a semantic element.
    ///
    /// Lifelines, executions and fragments map to their cluster; message and
    /// execution occurrences to their node; gates to their gate node.
    pub fn node_for(&self, element: Id) -> Option<NodeId> {
        self.element_index().get(&element).copied()
    }

    /// Returns the first node of the given kind created for `element`.
    ///
    /// Unlike [`node_for`](Self::node_for) this also finds nodes that do not
    /// represent their element, such as fragment slices and fragment marks.
    pub fn node_for_kind(&self, element: Id, kind: NodeKind) -> Option<NodeId> {
        self.nodes()
            .find(|node| node.element() == element && node.kind() == kind)
            .map(Node::id)
    }

    /// Returns the slice of `fragment` on `lifeline`.
    pub fn slice_for(&self, fragment: Id, lifeline: Id) -> Option<NodeId> {
        let fragment = self.node(self.node_for(fragment)?)?;
        if !matches!(fragment.cluster_kind(), Some(ClusterKind::Fragment(_))) {
            return None;
        }
        let lifeline = self.node_for(lifeline)?;
        fragment
            .children()
            .iter()
            .copied()
            .find(|&slice| self.lifeline_of(slice) == Some(lifeline))
    }

    /// Returns the cluster representing `element`, or the cluster enclosing
    /// the node that represents it.
    pub fn cluster_for(&self, element: Id) -> Option<NodeId> {
        let node = self.node(self.node_for(element)?)?;
        if node.is_cluster() {
            Some(node.id())
        } else {
            node.parent()
        }
    }

    /// Returns the link drawn for a message.
    pub fn link_for(&self, message: Id) -> Option<LinkId> {
        self.message_index().get(&message).copied()
    }

    /// Returns the ordered children of a cluster; empty for leaves.
    pub fn children(&self, cluster: NodeId) -> &[NodeId] {
        self.node(cluster).map(Node::children).unwrap_or(&[])
    }

    /// Returns the 1-based row index of a node.
    pub fn row_index(&self, node: NodeId) -> Option<usize> {
        self.rows.index_of(self.node(node)?.row()?)
    }

    /// Returns the 1-based column index of a node.
    pub fn column_index(&self, node: NodeId) -> Option<usize> {
        self.columns.index_of(self.node(node)?.column()?)
    }

    /// Returns the nodes occupying the row with 1-based `index`.
    pub fn nodes_in_row(&self, index: usize) -> &[NodeId] {
        self.rows.get(index).map(|row| row.nodes()).unwrap_or(&[])
    }

    /// Returns the nodes occupying the column with 1-based `index`.
    pub fn nodes_in_column(&self, index: usize) -> &[NodeId] {
        self.columns
            .get(index)
            .map(|column| column.nodes())
            .unwrap_or(&[])
    }

    pub fn connected_node(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.connected_node()
    }

    pub fn connected_by_node(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.connected_by_node()
    }

    /// Returns the lifeline cluster a node sits on, if any.
    ///
    /// Gates and fragment clusters sit on no lifeline.
    pub fn lifeline_of(&self, node: NodeId) -> Option<NodeId> {
        let mut current = self.node(node)?;
        loop {
            match current.kind() {
                NodeKind::Cluster(ClusterKind::Lifeline) => return Some(current.id()),
                NodeKind::Cluster(ClusterKind::Fragment(_)) | NodeKind::Gate(_) => return None,
                _ => current = self.node(current.parent()?)?,
            }
        }
    }

    /// Returns the leaf nodes below a cluster in covering order.
    ///
    /// For a fragment cluster these are the leaves of its slices, slice by
    /// slice. A leaf yields itself.
    pub fn leaves(&self, node: NodeId) -> Vec<NodeId> {
        let mut leaves = Vec::new();
        self.collect_leaves(node, &mut leaves);
        leaves
    }

    fn collect_leaves(&self, node: NodeId, out: &mut Vec<NodeId>) {
        let Some(current) = self.node(node) else {
            return;
        };
        if current.is_leaf() {
            out.push(node);
            return;
        }
        for &child in current.children() {
            self.collect_leaves(child, out);
        }
    }

    /// Returns `node` and every node it owns, in pre-order.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut stack = vec![node];
        let mut out = Vec::new();
        while let Some(id) = stack.pop() {
            let Some(current) = self.node(id) else {
                continue;
            };
            out.push(id);
            let owned: Vec<NodeId> = match current.cluster_kind() {
                Some(ClusterKind::Fragment(_)) => current
                    .outer_gates()
                    .iter()
                    .chain(current.owned_fragments())
                    .copied()
                    .collect(),
                _ => current.children().to_vec(),
            };
            stack.extend(owned.into_iter().rev());
        }
        out
    }

    /// Returns the first and last row index covered by a node.
    ///
    /// Clusters span their leaves; a lifeline cluster also covers the header
    /// row. Returns `None` for a cluster without any leaf.
    pub fn row_span(&self, node: NodeId) -> Option<(usize, usize)> {
        let own = self.row_index(node);
        let rows = self
            .leaves(node)
            .into_iter()
            .filter_map(|leaf| self.row_index(leaf))
            .chain(own);
        rows.fold(None, |span, row| match span {
            None => Some((row, row)),
            Some((min, max)) => Some((min.min(row), max.max(row))),
        })
    }

    /// Returns every leaf node ordered by row, then column, then creation.
    pub fn ordered_nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<(usize, usize, NodeId)> = self
            .nodes()
            .filter(|node| node.is_leaf())
            .map(|node| {
                (
                    self.row_index(node.id()).unwrap_or(usize::MAX),
                    self.column_index(node.id()).unwrap_or(usize::MAX),
                    node.id(),
                )
            })
            .collect();
        nodes.sort();
        nodes.into_iter().map(|(_, _, node)| node).collect()
    }
}

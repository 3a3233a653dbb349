//! Node, cluster and link model of the interaction graph.
//!
//! # Architecture
//!
//! All entities live in arenas owned by [`InteractionGraph`] and are
//! addressed by copyable handles:
//!
//! - [`NodeId`]: any node, clusters included
//! - [`LinkId`]: a message edge
//! - [`RowId`] / [`ColumnId`]: slots of the row and column index
//!
//! Containment is a forest. Lifeline clusters are roots, execution clusters
//! and fragment slices nest inside them, leaf nodes (occurrences, marks) sit
//! at the bottom. Fragment clusters and formal gates are registered on the
//! graph itself; actual and boundary gates belong to their fragment cluster.
//!
//! ```text
//! lifeline cluster (row 1)
//! ├── occurrence
//! ├── execution cluster
//! │   ├── mark (start)
//! │   ├── occurrence
//! │   └── mark (end)
//! └── fragment slice ──── fragment cluster ── outer gates
//!     ├── mark (start)
//!     └── mark (end)
//! ```

use indexmap::IndexMap;

use trellis_core::{
    identifier::Id,
    notation::ViewRef,
    semantic::{FragmentKind, MessageRole, MessageSort},
};

use crate::{
    config::GraphConfig,
    grid::{ColumnId, RowId, SlotIndex},
};

/// Handle of a node in the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    #[cfg(test)]
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the arena position, which is the creation order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle of a link in the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(usize);

impl LinkId {
    /// Returns the position of the link, which follows semantic message order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Boundary tag of a mark node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkKind {
    Start,
    End,
}

/// How a gate node came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateKind {
    /// A formal gate of the interaction.
    Formal,
    /// An actual gate declared by a fragment.
    Actual,
    /// A gate synthesized where a message ends on or crosses a fragment
    /// boundary without a gate element.
    Boundary,
}

/// The kind of a cluster node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClusterKind {
    Lifeline,
    Execution,
    /// One lifeline's slice of a multi-lifeline fragment.
    FragmentSlice,
    /// The multi-lifeline fragment itself.
    Fragment(FragmentKind),
}

/// The kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A message occurrence on a lifeline.
    Occurrence(MessageRole),
    Mark(MarkKind),
    Gate(GateKind),
    Cluster(ClusterKind),
}

/// A node of the interaction graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    element: Id,
    view: Option<ViewRef>,
    parent: Option<NodeId>,
    row: Option<RowId>,
    column: Option<ColumnId>,
    connected_node: Option<NodeId>,
    connected_by_node: Option<NodeId>,
    link: Option<LinkId>,
    /// Children of a lifeline, execution or slice cluster; slices of a fragment cluster.
    children: Vec<NodeId>,
    outer_gates: Vec<NodeId>,
    owned_fragments: Vec<NodeId>,
}

impl Node {
    fn new(id: NodeId, kind: NodeKind, element: Id, view: Option<ViewRef>) -> Self {
        Self {
            id,
            kind,
            element,
            view,
            parent: None,
            row: None,
            column: None,
            connected_node: None,
            connected_by_node: None,
            link: None,
            children: Vec::new(),
            outer_gates: Vec::new(),
            owned_fragments: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Returns the semantic element the node represents.
    pub fn element(&self) -> Id {
        self.element
    }

    /// Returns the graphical representation, if any.
    pub fn view(&self) -> Option<ViewRef> {
        self.view
    }

    /// Returns the owning cluster.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the row handle; `None` for execution, slice and fragment clusters.
    pub fn row(&self) -> Option<RowId> {
        self.row
    }

    pub fn column(&self) -> Option<ColumnId> {
        self.column
    }

    /// Returns the far end of the message this node sends.
    pub fn connected_node(&self) -> Option<NodeId> {
        self.connected_node
    }

    /// Returns the far end of the message this node receives.
    pub fn connected_by_node(&self) -> Option<NodeId> {
        self.connected_by_node
    }

    /// Returns the link passing through this node.
    pub fn link(&self) -> Option<LinkId> {
        self.link
    }

    /// Returns the ordered children of a cluster.
    ///
    /// For a fragment cluster these are its per-lifeline slices in column order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Returns the outer gates of a fragment cluster.
    pub fn outer_gates(&self) -> &[NodeId] {
        &self.outer_gates
    }

    /// Returns the fragment clusters nested directly in this fragment cluster.
    pub fn owned_fragments(&self) -> &[NodeId] {
        &self.owned_fragments
    }

    pub fn is_cluster(&self) -> bool {
        matches!(self.kind, NodeKind::Cluster(_))
    }

    /// Returns true for nodes that occupy a row on their own.
    pub fn is_leaf(&self) -> bool {
        !self.is_cluster()
    }

    pub fn cluster_kind(&self) -> Option<ClusterKind> {
        match self.kind {
            NodeKind::Cluster(kind) => Some(kind),
            _ => None,
        }
    }
}

/// A directed message edge between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    id: LinkId,
    element: Id,
    view: Option<Id>,
    sort: MessageSort,
    source: NodeId,
    target: NodeId,
}

impl Link {
    pub fn id(&self) -> LinkId {
        self.id
    }

    /// Returns the message the link represents.
    pub fn element(&self) -> Id {
        self.element
    }

    /// Returns the connector view drawn for the message.
    pub fn view(&self) -> Option<Id> {
        self.view
    }

    pub fn sort(&self) -> MessageSort {
        self.sort
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn target(&self) -> NodeId {
        self.target
    }
}

/// The interaction graph of one interaction snapshot.
///
/// Built by [`GraphBuilder`](crate::GraphBuilder); read through the query
/// surface and re-laid-out through the mutation surface.
#[derive(Debug, Clone)]
pub struct InteractionGraph {
    interaction: Id,
    nodes: Vec<Node>,
    links: Vec<Link>,
    pub(crate) rows: SlotIndex<RowId>,
    pub(crate) columns: SlotIndex<ColumnId>,
    lifeline_clusters: Vec<NodeId>,
    fragment_clusters: Vec<NodeId>,
    formal_gates: Vec<NodeId>,
    elements: IndexMap<Id, NodeId>,
    messages: IndexMap<Id, LinkId>,
    config: GraphConfig,
}

impl InteractionGraph {
    pub(crate) fn new(interaction: Id) -> Self {
        Self {
            interaction,
            nodes: Vec::new(),
            links: Vec::new(),
            rows: SlotIndex::new(),
            columns: SlotIndex::new(),
            lifeline_clusters: Vec::new(),
            fragment_clusters: Vec::new(),
            formal_gates: Vec::new(),
            elements: IndexMap::new(),
            messages: IndexMap::new(),
            config: GraphConfig::default(),
        }
    }

    /// Returns the id of the interaction the graph was built for.
    pub fn interaction(&self) -> Id {
        self.interaction
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id.0)
    }

    /// Returns every node in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Returns every link in semantic message order.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.iter()
    }

    /// Returns the lifeline clusters in column order.
    pub fn lifeline_clusters(&self) -> &[NodeId] {
        &self.lifeline_clusters
    }

    /// Returns the top-level fragment clusters in creation order.
    ///
    /// Nested fragment clusters are reachable through
    /// [`Node::owned_fragments`].
    pub fn fragment_clusters(&self) -> &[NodeId] {
        &self.fragment_clusters
    }

    /// Returns the tolerances the rows and columns were bucketed with.
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn formal_gates(&self) -> &[NodeId] {
        &self.formal_gates
    }

    pub fn rows(&self) -> &SlotIndex<RowId> {
        &self.rows
    }

    pub fn columns(&self) -> &SlotIndex<ColumnId> {
        &self.columns
    }

    pub(crate) fn element_index(&self) -> &IndexMap<Id, NodeId> {
        &self.elements
    }

    pub(crate) fn message_index(&self) -> &IndexMap<Id, LinkId> {
        &self.messages
    }

    // Construction helpers used by the builder.

    /// Creates a node; `register` makes it the representative of its element.
    pub(crate) fn add_node(
        &mut self,
        kind: NodeKind,
        element: Id,
        view: Option<ViewRef>,
        register: bool,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(id, kind, element, view));
        if register {
            self.elements.entry(element).or_insert(id);
        }
        id
    }

    pub(crate) fn set_config(&mut self, config: &GraphConfig) {
        self.config = config.clone();
    }

    pub(crate) fn add_lifeline_cluster(&mut self, node: NodeId) {
        self.lifeline_clusters.push(node);
    }

    /// Moves the lifeline cluster at position `from` to position `to`.
    pub(crate) fn reorder_lifeline_cluster(&mut self, from: usize, to: usize) {
        if from < self.lifeline_clusters.len() && to < self.lifeline_clusters.len() {
            let cluster = self.lifeline_clusters.remove(from);
            self.lifeline_clusters.insert(to, cluster);
        }
    }

    pub(crate) fn add_formal_gate(&mut self, node: NodeId) {
        self.formal_gates.push(node);
    }

    /// Registers a fragment cluster under `owner`, or on the graph if none.
    pub(crate) fn add_fragment_cluster(&mut self, node: NodeId, owner: Option<NodeId>) {
        match owner {
            Some(owner) => {
                self.nodes[owner.0].owned_fragments.push(node);
                self.nodes[node.0].parent = Some(owner);
            }
            None => self.fragment_clusters.push(node),
        }
    }

    pub(crate) fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Adds a slice to a fragment cluster without taking ownership of it.
    pub(crate) fn add_slice(&mut self, fragment: NodeId, slice: NodeId) {
        self.nodes[fragment.0].children.push(slice);
    }

    pub(crate) fn add_outer_gate(&mut self, fragment: NodeId, gate: NodeId) {
        self.nodes[fragment.0].outer_gates.push(gate);
        self.nodes[gate.0].parent = Some(fragment);
    }

    /// Creates a link and connects both ends to each other.
    pub(crate) fn add_link(
        &mut self,
        element: Id,
        view: Option<Id>,
        sort: MessageSort,
        source: NodeId,
        target: NodeId,
    ) -> LinkId {
        let id = LinkId(self.links.len());
        self.links.push(Link {
            id,
            element,
            view,
            sort,
            source,
            target,
        });
        self.messages.insert(element, id);

        let source_node = &mut self.nodes[source.0];
        source_node.connected_node = Some(target);
        source_node.link = Some(id);
        let target_node = &mut self.nodes[target.0];
        target_node.connected_by_node = Some(source);
        target_node.link = Some(id);
        id
    }

    pub(crate) fn set_row(&mut self, node: NodeId, row: RowId) {
        self.nodes[node.0].row = Some(row);
        self.rows.attach(row, node);
    }

    pub(crate) fn set_column(&mut self, node: NodeId, column: ColumnId) {
        self.nodes[node.0].column = Some(column);
        self.columns.attach(column, node);
    }
}

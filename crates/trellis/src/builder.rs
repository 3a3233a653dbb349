//! Graph builder: walks the semantic model and creates the node forest.
//!
//! The builder reads each lifeline's covering list in column order and keeps a
//! context stack of the clusters currently open on that lifeline. Message ends
//! are registered as they are met; a message becomes a link once both of its
//! ends exist. Rows and columns are assigned afterwards by [`crate::layout`]
//! and the result is checked by [`crate::validate`].

use indexmap::IndexMap;
use log::{debug, info, trace};

use trellis_core::{
    identifier::Id,
    notation::{ConnectorEnd, Notation, ViewRef},
    semantic::{
        CoveringFragment, FragmentDef, GateOwner, Lifeline, Message, MessageEnd, MessageRole,
        SemanticModel,
    },
};

use crate::{
    GraphError,
    adapter::GeometryAdapter,
    config::GraphConfig,
    graph::{ClusterKind, GateKind, InteractionGraph, MarkKind, Node, NodeId, NodeKind},
    layout, validate,
};

/// A cluster open on the lifeline being walked.
#[derive(Debug, Clone, Copy)]
enum Context {
    Lifeline(NodeId),
    Execution { cluster: NodeId, execution: Id },
    Slice { cluster: NodeId, fragment: Id },
}

impl Context {
    fn cluster(self) -> NodeId {
        match self {
            Self::Lifeline(cluster)
            | Self::Execution { cluster, .. }
            | Self::Slice { cluster, .. } => cluster,
        }
    }
}

/// Nodes created so far for the two ends of a message.
#[derive(Debug, Default, Clone, Copy)]
struct MessageEnds {
    send: Option<NodeId>,
    receive: Option<NodeId>,
}

impl MessageEnds {
    fn slot(&mut self, role: MessageRole) -> &mut Option<NodeId> {
        match role {
            MessageRole::Send => &mut self.send,
            MessageRole::Receive => &mut self.receive,
        }
    }
}

/// Fragment cluster created on first encounter, with the number of slices opened so far.
#[derive(Debug, Clone, Copy)]
struct FragmentState {
    cluster: NodeId,
    slices: usize,
}

fn connector_end(role: MessageRole) -> ConnectorEnd {
    match role {
        MessageRole::Send => ConnectorEnd::Source,
        MessageRole::Receive => ConnectorEnd::Target,
    }
}

pub(crate) struct Builder<'a> {
    semantic: &'a dyn SemanticModel,
    notation: &'a dyn Notation,
    graph: InteractionGraph,
    messages: IndexMap<Id, &'a Message>,
    gate_ends: IndexMap<Id, Vec<(Id, MessageRole)>>,
    boundary_ends: IndexMap<Id, Vec<(Id, MessageRole)>>,
    ends: IndexMap<Id, MessageEnds>,
    fragments: IndexMap<Id, FragmentState>,
}

impl<'a> Builder<'a> {
    pub(crate) fn new(semantic: &'a dyn SemanticModel, notation: &'a dyn Notation) -> Self {
        Self {
            semantic,
            notation,
            graph: InteractionGraph::new(semantic.interaction()),
            messages: IndexMap::new(),
            gate_ends: IndexMap::new(),
            boundary_ends: IndexMap::new(),
            ends: IndexMap::new(),
            fragments: IndexMap::new(),
        }
    }

    pub(crate) fn build(
        mut self,
        adapter: &dyn GeometryAdapter,
        config: &GraphConfig,
    ) -> Result<InteractionGraph, GraphError> {
        info!(interaction:% = self.semantic.interaction(); "Building interaction graph");

        self.index_messages()?;

        let semantic = self.semantic;
        let lifelines = layout::order_lifelines(
            semantic.lifelines(),
            self.notation,
            adapter,
            config.column_tolerance(),
        );
        debug!(lifelines = lifelines.len(); "Lifelines ordered");

        let clusters: Vec<NodeId> = lifelines
            .iter()
            .map(|lifeline| self.add_lifeline_cluster(lifeline))
            .collect();

        self.add_formal_gates()?;

        for (lifeline, cluster) in lifelines.iter().zip(clusters) {
            self.walk_lifeline(lifeline, cluster)?;
        }

        self.check_fragments()?;
        self.resolve_links()?;

        let mut graph = self.graph;
        graph.set_config(config);
        layout::assign_rows(&mut graph, adapter, config)?;
        layout::assign_columns(&mut graph, adapter)?;
        validate::check(&graph)?;

        info!(
            nodes = graph.nodes().count(),
            links = graph.links().count(),
            rows = graph.rows().len(),
            columns = graph.columns().len();
            "Interaction graph built"
        );
        Ok(graph)
    }

    /// Indexes messages and the gate or boundary ends they reference.
    fn index_messages(&mut self) -> Result<(), GraphError> {
        let semantic = self.semantic;
        for message in semantic.messages() {
            if self.messages.insert(message.id(), message).is_some() {
                return Err(GraphError::structural(format!(
                    "message `{}` is declared twice",
                    message.id()
                )));
            }

            for role in [MessageRole::Send, MessageRole::Receive] {
                match message.end(role) {
                    MessageEnd::Occurrence { .. } => {}
                    MessageEnd::Gate { gate } => {
                        if semantic.gate(gate).is_none() {
                            return Err(GraphError::unsupported(format!(
                                "message `{}` ends on unknown gate `{gate}`",
                                message.id()
                            )));
                        }
                        self.gate_ends
                            .entry(gate)
                            .or_default()
                            .push((message.id(), role));
                    }
                    MessageEnd::Boundary { fragment } => {
                        if semantic.fragment(fragment).is_none() {
                            return Err(GraphError::unsupported(format!(
                                "message `{}` ends on unknown fragment `{fragment}`",
                                message.id()
                            )));
                        }
                        self.boundary_ends
                            .entry(fragment)
                            .or_default()
                            .push((message.id(), role));
                    }
                    MessageEnd::Lost | MessageEnd::Found => {
                        return Err(GraphError::unsupported(format!(
                            "lost and found messages have no end resolution (`{}`)",
                            message.id()
                        )));
                    }
                }
            }
            self.ends.insert(message.id(), MessageEnds::default());
        }
        Ok(())
    }

    fn add_lifeline_cluster(&mut self, lifeline: &Lifeline) -> NodeId {
        let view = self.notation.view_for(lifeline.id()).map(ViewRef::Shape);
        let cluster = self.graph.add_node(
            NodeKind::Cluster(ClusterKind::Lifeline),
            lifeline.id(),
            view,
            true,
        );
        self.graph.add_lifeline_cluster(cluster);
        cluster
    }

    fn add_formal_gates(&mut self) -> Result<(), GraphError> {
        let semantic = self.semantic;
        for gate in semantic.formal_gates() {
            let node = self.add_gate_node(gate.id(), gate.id(), GateKind::Formal)?;
            self.graph.add_formal_gate(node);
            self.register_gate_ends(gate.id(), node)?;
        }
        Ok(())
    }

    /// Creates a gate node; its view is the gate shape or the first message anchor.
    fn add_gate_node(&mut self, gate: Id, element: Id, kind: GateKind) -> Result<NodeId, GraphError> {
        if self.graph.element_index().contains_key(&element) {
            return Err(GraphError::structural(format!(
                "gate `{element}` is represented twice"
            )));
        }
        let view = self
            .notation
            .shape_for(gate)
            .map(|shape| ViewRef::Shape(shape.id()))
            .or_else(|| {
                let (message, role) = self.gate_ends.get(&gate)?.first().copied()?;
                self.anchor_view(message, role)
            });
        Ok(self.graph.add_node(NodeKind::Gate(kind), element, view, true))
    }

    fn register_gate_ends(&mut self, gate: Id, node: NodeId) -> Result<(), GraphError> {
        let ends = self.gate_ends.get(&gate).cloned().unwrap_or_default();
        for (message, role) in ends {
            self.register_end(message, role, node)?;
        }
        Ok(())
    }

    fn anchor_view(&self, message: Id, role: MessageRole) -> Option<ViewRef> {
        self.notation
            .connector_for(message)
            .map(|connector| ViewRef::Anchor(connector.id(), connector_end(role)))
    }

    /// Records `node` as the `role` end of `message`.
    fn register_end(&mut self, message: Id, role: MessageRole, node: NodeId) -> Result<(), GraphError> {
        let ends = self.ends.get_mut(&message).ok_or_else(|| {
            GraphError::unsupported(format!("unknown message `{message}`"))
        })?;
        let slot = ends.slot(role);
        if slot.is_some() {
            return Err(GraphError::structural(format!(
                "message `{message}` has more than one {role:?} end"
            )));
        }
        *slot = Some(node);
        trace!(message:%, role:?, node:?; "Message end registered");
        Ok(())
    }

    fn walk_lifeline(&mut self, lifeline: &Lifeline, cluster: NodeId) -> Result<(), GraphError> {
        debug!(lifeline:% = lifeline.id(), entries = lifeline.covered_by().len(); "Walking covering list");

        let mut stack = vec![Context::Lifeline(cluster)];
        for entry in lifeline.covered_by() {
            trace!(lifeline:% = lifeline.id(), element:% = entry.element(); "Covering entry");
            let parent = stack
                .last()
                .map(|context| context.cluster())
                .unwrap_or(cluster);
            match *entry {
                CoveringFragment::ExecutionStart {
                    occurrence,
                    execution,
                } => {
                    if self.graph.element_index().contains_key(&execution) {
                        return Err(GraphError::structural(format!(
                            "execution `{execution}` is started twice"
                        )));
                    }
                    let view = self.notation.view_for(execution).map(ViewRef::Shape);
                    let execution_cluster = self.graph.add_node(
                        NodeKind::Cluster(ClusterKind::Execution),
                        execution,
                        view,
                        true,
                    );
                    self.graph.add_child(parent, execution_cluster);
                    let mark = self.graph.add_node(
                        NodeKind::Mark(MarkKind::Start),
                        occurrence,
                        view,
                        true,
                    );
                    self.graph.add_child(execution_cluster, mark);
                    stack.push(Context::Execution {
                        cluster: execution_cluster,
                        execution,
                    });
                }
                CoveringFragment::ExecutionFinish {
                    occurrence,
                    execution,
                } => {
                    let Some(Context::Execution {
                        cluster: execution_cluster,
                        execution: open,
                    }) = stack.last().copied()
                    else {
                        return Err(GraphError::structural(format!(
                            "execution `{execution}` finishes on `{}` outside of any execution",
                            lifeline.id()
                        )));
                    };
                    if open != execution {
                        return Err(GraphError::structural(format!(
                            "execution `{execution}` finishes while `{open}` is still open"
                        )));
                    }
                    let view = self.notation.view_for(execution).map(ViewRef::Shape);
                    let mark =
                        self.graph
                            .add_node(NodeKind::Mark(MarkKind::End), occurrence, view, true);
                    self.graph.add_child(execution_cluster, mark);
                    stack.pop();
                }
                CoveringFragment::MessageSend {
                    occurrence,
                    message,
                } => {
                    self.add_occurrence(parent, occurrence, message, MessageRole::Send)?;
                }
                CoveringFragment::MessageReceive {
                    occurrence,
                    message,
                } => {
                    self.add_occurrence(parent, occurrence, message, MessageRole::Receive)?;
                }
                CoveringFragment::FragmentStart { fragment } => {
                    let slice = self.open_slice(lifeline.id(), fragment, parent, &stack)?;
                    stack.push(Context::Slice {
                        cluster: slice,
                        fragment,
                    });
                }
                CoveringFragment::FragmentEnd { fragment } => {
                    let Some(Context::Slice {
                        cluster: slice,
                        fragment: open,
                    }) = stack.last().copied()
                    else {
                        return Err(GraphError::structural(format!(
                            "fragment `{fragment}` ends on `{}` outside of any fragment",
                            lifeline.id()
                        )));
                    };
                    if open != fragment {
                        return Err(GraphError::structural(format!(
                            "fragment `{fragment}` ends while `{open}` is still open"
                        )));
                    }
                    let view = self.notation.view_for(fragment).map(ViewRef::Shape);
                    let mark = self
                        .graph
                        .add_node(NodeKind::Mark(MarkKind::End), fragment, view, false);
                    self.graph.add_child(slice, mark);
                    stack.pop();
                }
            }
        }

        if stack.len() > 1 {
            return Err(GraphError::structural(format!(
                "lifeline `{}` ends with {} unclosed cluster(s)",
                lifeline.id(),
                stack.len() - 1
            )));
        }
        Ok(())
    }

    fn add_occurrence(
        &mut self,
        parent: NodeId,
        occurrence: Id,
        message: Id,
        role: MessageRole,
    ) -> Result<(), GraphError> {
        let declared = self
            .messages
            .get(&message)
            .ok_or_else(|| GraphError::unsupported(format!("unknown message `{message}`")))?
            .end(role);
        if declared != (MessageEnd::Occurrence { occurrence }) {
            return Err(GraphError::structural(format!(
                "occurrence `{occurrence}` is not the {role:?} end of message `{message}`"
            )));
        }
        if self.graph.element_index().contains_key(&occurrence) {
            return Err(GraphError::structural(format!(
                "occurrence `{occurrence}` covers more than one position"
            )));
        }

        let view = self.anchor_view(message, role);
        let node = self
            .graph
            .add_node(NodeKind::Occurrence(role), occurrence, view, true);
        self.graph.add_child(parent, node);
        self.register_end(message, role, node)
    }

    /// Opens the slice of `fragment` on `lifeline`, creating the fragment cluster on first encounter.
    fn open_slice(
        &mut self,
        lifeline: Id,
        fragment: Id,
        parent: NodeId,
        stack: &[Context],
    ) -> Result<NodeId, GraphError> {
        let semantic = self.semantic;
        let def = semantic
            .fragment(fragment)
            .ok_or_else(|| GraphError::unsupported(format!("unknown fragment `{fragment}`")))?;
        if !def.covered().contains(&lifeline) {
            return Err(GraphError::structural(format!(
                "fragment `{fragment}` starts on `{lifeline}` which it does not cover"
            )));
        }

        let fragment_cluster = match self.fragments.get(&fragment).copied() {
            Some(state) => state.cluster,
            None => {
                let enclosing = stack.iter().rev().find_map(|context| match context {
                    Context::Slice { fragment, .. } => {
                        self.fragments.get(fragment).map(|state| state.cluster)
                    }
                    _ => None,
                });
                self.add_fragment_cluster(def, enclosing)?
            }
        };

        let view = self.notation.view_for(fragment).map(ViewRef::Shape);
        let slice = self.graph.add_node(
            NodeKind::Cluster(ClusterKind::FragmentSlice),
            fragment,
            None,
            false,
        );
        self.graph.add_child(parent, slice);
        self.graph.add_slice(fragment_cluster, slice);
        let mark = self
            .graph
            .add_node(NodeKind::Mark(MarkKind::Start), fragment, view, false);
        self.graph.add_child(slice, mark);

        if let Some(state) = self.fragments.get_mut(&fragment) {
            state.slices += 1;
        }
        Ok(slice)
    }

    fn add_fragment_cluster(
        &mut self,
        def: &FragmentDef,
        enclosing: Option<NodeId>,
    ) -> Result<NodeId, GraphError> {
        let fragment = def.id();
        debug!(fragment:%, kind:? = def.kind(), covered = def.covered().len(); "Creating fragment cluster");

        let view = self.notation.view_for(fragment).map(ViewRef::Shape);
        let cluster = self.graph.add_node(
            NodeKind::Cluster(ClusterKind::Fragment(def.kind())),
            fragment,
            view,
            true,
        );
        self.graph.add_fragment_cluster(cluster, enclosing);
        self.fragments.insert(
            fragment,
            FragmentState {
                cluster,
                slices: 0,
            },
        );

        for &gate in def.gates() {
            let owner = self.semantic.gate(gate).map(|gate| gate.owner());
            if owner != Some(GateOwner::Fragment(fragment)) {
                return Err(GraphError::structural(format!(
                    "gate `{gate}` is listed by fragment `{fragment}` but not owned by it"
                )));
            }
            let node = self.add_gate_node(gate, gate, GateKind::Actual)?;
            self.graph.add_outer_gate(cluster, node);
            self.register_gate_ends(gate, node)?;
        }

        let boundary = self.boundary_ends.get(&fragment).cloned().unwrap_or_default();
        for (message, role) in boundary {
            let element = fragment.create_nested(message);
            let view = self.anchor_view(message, role);
            let node = self
                .graph
                .add_node(NodeKind::Gate(GateKind::Boundary), element, view, true);
            self.graph.add_outer_gate(cluster, node);
            self.register_end(message, role, node)?;
        }
        Ok(cluster)
    }

    /// Every encountered fragment must have one slice per covered lifeline.
    fn check_fragments(&self) -> Result<(), GraphError> {
        for def in self.semantic.fragments() {
            let slices = self
                .fragments
                .get(&def.id())
                .map(|state| state.slices)
                .unwrap_or(0);
            if slices != def.covered().len() {
                return Err(GraphError::structural(format!(
                    "fragment `{}` covers {} lifeline(s) but starts on {slices}",
                    def.id(),
                    def.covered().len()
                )));
            }
        }
        Ok(())
    }

    /// Creates links in semantic message order once every end is known.
    fn resolve_links(&mut self) -> Result<(), GraphError> {
        let ends: Vec<(Id, MessageEnds)> = self.ends.iter().map(|(&id, &ends)| (id, ends)).collect();
        for (message, ends) in ends {
            let (Some(source), Some(target)) = (ends.send, ends.receive) else {
                return Err(GraphError::structural(format!(
                    "message `{message}` has an unresolved end"
                )));
            };
            for node in [source, target] {
                if self.graph.node(node).and_then(|node| node.link()).is_some() {
                    return Err(GraphError::structural(format!(
                        "message `{message}` ends on a node already used by another message"
                    )));
                }
            }

            let declared = self.messages[&message];
            let view = self.notation.connector_for(message).map(|connector| connector.id());
            self.graph
                .add_link(message, view, declared.sort(), source, target);
            self.add_crossing_gates(message, source, target);
        }
        Ok(())
    }

    /// Gives every fragment that exactly one end of `message` lies in an
    /// outer gate where the message crosses its boundary.
    ///
    /// The gate takes the anchor of the end outside the fragment. Gates of a
    /// fragment never cross that fragment.
    fn add_crossing_gates(&mut self, message: Id, source: NodeId, target: NodeId) {
        let ends = [(source, MessageRole::Send), (target, MessageRole::Receive)];
        let enclosing = ends.map(|(node, _)| enclosing_fragments(&self.graph, node));
        let own: Vec<Id> = ends
            .iter()
            .filter_map(|&(node, _)| gate_fragment(&self.graph, node))
            .collect();

        for (inside, outside) in [(0, 1), (1, 0)] {
            let outside_role = ends[inside].1.opposite();
            for &fragment in &enclosing[inside] {
                if enclosing[outside].contains(&fragment) || own.contains(&fragment) {
                    continue;
                }
                let Some(cluster) = self.fragments.get(&fragment).map(|state| state.cluster) else {
                    continue;
                };
                let element = fragment.create_nested(message);
                let view = self.anchor_view(message, outside_role);
                let gate = self
                    .graph
                    .add_node(NodeKind::Gate(GateKind::Boundary), element, view, true);
                self.graph.add_outer_gate(cluster, gate);
                debug!(message:%, fragment:%; "Message crosses fragment boundary");
            }
        }
    }
}

/// Fragments enclosing `node`, innermost first.
///
/// A node in a slice lies in the slice's fragment; a gate lies in the
/// fragment owning it.
fn enclosing_fragments(graph: &InteractionGraph, node: NodeId) -> Vec<Id> {
    let mut fragments = Vec::new();
    let mut current = graph.node(node).and_then(Node::parent);
    while let Some(ancestor) = current.and_then(|id| graph.node(id)) {
        if matches!(
            ancestor.cluster_kind(),
            Some(ClusterKind::FragmentSlice | ClusterKind::Fragment(_))
        ) {
            fragments.push(ancestor.element());
        }
        current = ancestor.parent();
    }
    fragments
}

/// The fragment owning a gate node.
fn gate_fragment(graph: &InteractionGraph, node: NodeId) -> Option<Id> {
    let node = graph.node(node)?;
    if !matches!(node.kind(), NodeKind::Gate(_)) {
        return None;
    }
    let owner = graph.node(node.parent()?)?;
    matches!(owner.cluster_kind(), Some(ClusterKind::Fragment(_))).then(|| owner.element())
}

//! Snapshot fixtures shared by the integration tests.
//!
//! Lifelines are 40px wide and 500px tall, centered on the x they are
//! declared with and starting at y = 0. Message anchors are given in absolute
//! coordinates and converted to offsets from the attached shape.

#![allow(dead_code)]

use trellis::{
    GraphBuilder, GraphError, InteractionGraph,
    adapter::{GeometryAdapter, NotationSurface},
    geometry::{Anchor, Bounds, Point, Size},
    identifier::Id,
    notation::{Connector, Diagram, Shape},
    semantic::{
        CoveringFragment, FragmentDef, FragmentKind, Gate, Interaction, Lifeline, Message,
        MessageEnd, MessageSort,
    },
};

pub const LIFELINE_WIDTH: f32 = 40.0;
pub const LIFELINE_HEIGHT: f32 = 500.0;

pub fn id(name: &str) -> Id {
    Id::new(name)
}

pub fn view(element: &str) -> Id {
    Id::new(&format!("v_{element}"))
}

pub fn rect(x: f32, y: f32, width: f32, height: f32) -> Bounds {
    Bounds::new_from_top_left(Point::new(x, y), Size::new(width, height))
}

pub fn send(occurrence: &str, message: &str) -> CoveringFragment {
    CoveringFragment::MessageSend {
        occurrence: id(occurrence),
        message: id(message),
    }
}

pub fn receive(occurrence: &str, message: &str) -> CoveringFragment {
    CoveringFragment::MessageReceive {
        occurrence: id(occurrence),
        message: id(message),
    }
}

pub fn exec_start(occurrence: &str, execution: &str) -> CoveringFragment {
    CoveringFragment::ExecutionStart {
        occurrence: id(occurrence),
        execution: id(execution),
    }
}

pub fn exec_finish(occurrence: &str, execution: &str) -> CoveringFragment {
    CoveringFragment::ExecutionFinish {
        occurrence: id(occurrence),
        execution: id(execution),
    }
}

pub fn fragment_start(fragment: &str) -> CoveringFragment {
    CoveringFragment::FragmentStart {
        fragment: id(fragment),
    }
}

pub fn fragment_end(fragment: &str) -> CoveringFragment {
    CoveringFragment::FragmentEnd {
        fragment: id(fragment),
    }
}

pub fn occurrence(name: &str) -> MessageEnd {
    MessageEnd::Occurrence {
        occurrence: id(name),
    }
}

/// One end of a drawn message: the element it attaches to and an absolute point.
#[derive(Debug, Clone, Copy)]
pub struct At<'a> {
    pub element: &'a str,
    pub x: f32,
    pub y: f32,
}

pub fn at(element: &str, x: f32, y: f32) -> At<'_> {
    At { element, x, y }
}

/// Builds a semantic model together with its notation.
#[derive(Debug, Clone)]
pub struct Fixture {
    interaction: Interaction,
    shapes: Vec<Shape>,
    connectors: Vec<Connector>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            interaction: Interaction::new(id("interaction")),
            shapes: Vec::new(),
            connectors: Vec::new(),
        }
    }

    /// Adds a lifeline drawn centered on `x`.
    pub fn lifeline(mut self, name: &str, x: f32, covering: Vec<CoveringFragment>) -> Self {
        let lifeline = covering
            .into_iter()
            .fold(Lifeline::new(id(name)), Lifeline::with_covering);
        self.interaction = self.interaction.with_lifeline(lifeline);
        self.shapes.push(
            Shape::new(
                view(name),
                rect(x - LIFELINE_WIDTH / 2.0, 0.0, LIFELINE_WIDTH, LIFELINE_HEIGHT),
            )
            .with_element(id(name)),
        );
        self
    }

    /// Adds a lifeline without any view.
    pub fn hidden_lifeline(mut self, name: &str, covering: Vec<CoveringFragment>) -> Self {
        let lifeline = covering
            .into_iter()
            .fold(Lifeline::new(id(name)), Lifeline::with_covering);
        self.interaction = self.interaction.with_lifeline(lifeline);
        self
    }

    /// Adds a shape for `element`; `bounds` are absolute and converted to
    /// be relative to `parent`.
    pub fn shape(mut self, element: &str, parent: Option<&str>, bounds: Bounds) -> Self {
        let mut shape = Shape::new(view(element), bounds).with_element(id(element));
        if let Some(parent) = parent {
            let origin = self.absolute(view(parent)).min_point();
            shape = Shape::new(view(element), bounds.inverse_translate(origin))
                .with_element(id(element))
                .with_parent(view(parent));
        }
        self.shapes.push(shape);
        self
    }

    /// Adds a message without any connector.
    pub fn message(mut self, name: &str, sort: MessageSort, send: MessageEnd, receive: MessageEnd) -> Self {
        self.interaction = self
            .interaction
            .with_message(Message::new(id(name), sort, send, receive));
        self
    }

    /// Adds a message drawn as a connector between two anchored points.
    pub fn drawn_message(
        self,
        name: &str,
        sort: MessageSort,
        (send, source): (MessageEnd, At<'_>),
        (receive, target): (MessageEnd, At<'_>),
    ) -> Self {
        let mut fixture = self.message(name, sort, send, receive);
        let source_view = view(source.element);
        let target_view = view(target.element);
        let source_anchor = fixture.anchor(source_view, source.x, source.y);
        let target_anchor = fixture.anchor(target_view, target.x, target.y);
        fixture.connectors.push(
            Connector::new(view(name), id(name), source_view, target_view)
                .with_anchors(source_anchor, target_anchor),
        );
        fixture
    }

    /// Shorthand for an asynchronous message between two lifeline occurrences.
    pub fn signal(
        self,
        name: &str,
        (from, from_x, from_y): (&str, f32, f32),
        (to, to_x, to_y): (&str, f32, f32),
    ) -> Self {
        let send_occurrence = format!("{name}_send");
        let receive_occurrence = format!("{name}_receive");
        self.drawn_message(
            name,
            MessageSort::AsynchSignal,
            (occurrence(&send_occurrence), at(from, from_x, from_y)),
            (occurrence(&receive_occurrence), at(to, to_x, to_y)),
        )
    }

    pub fn gate(mut self, gate: Gate) -> Self {
        self.interaction = self.interaction.with_gate(gate);
        self
    }

    pub fn fragment(mut self, fragment: FragmentDef) -> Self {
        self.interaction = self.interaction.with_fragment(fragment);
        self
    }

    pub fn interaction_use(self, name: &str, covered: &[&str], gates: &[&str]) -> Self {
        let fragment = gates.iter().fold(
            FragmentDef::new(
                id(name),
                FragmentKind::InteractionUse,
                covered.iter().map(|lifeline| id(lifeline)).collect(),
            ),
            |fragment, gate| fragment.with_gate(id(gate)),
        );
        let fixture = gates.iter().fold(self, |fixture, gate| {
            fixture.gate(Gate::actual(id(gate), id(name)))
        });
        fixture.fragment(fragment)
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn surface(&self) -> NotationSurface {
        let diagram = Diagram::new(self.shapes.clone(), self.connectors.clone())
            .expect("fixture notation is consistent");
        NotationSurface::new(diagram)
    }

    pub fn build(&self) -> Result<(InteractionGraph, NotationSurface), GraphError> {
        let surface = self.surface();
        let graph = GraphBuilder::default().build(&self.interaction, surface.diagram(), &surface)?;
        Ok((graph, surface))
    }

    fn absolute(&self, view: Id) -> Bounds {
        let mut bounds: Option<Bounds> = None;
        let mut current = Some(view);
        while let Some(view) = current {
            let shape = self
                .shapes
                .iter()
                .find(|shape| shape.id() == view)
                .expect("parent shape declared first");
            bounds = Some(match bounds {
                None => shape.bounds(),
                Some(inner) => inner.translate(shape.bounds().min_point()),
            });
            current = shape.parent();
        }
        bounds.expect("shape exists")
    }

    fn anchor(&self, attached: Id, x: f32, y: f32) -> Anchor {
        let origin = self.absolute(attached).min_point();
        Anchor::new(Point::new(x, y).sub_point(origin))
    }
}

/// Returns the 1-based rows of every leaf below `cluster`, in covering order.
pub fn leaf_rows(graph: &InteractionGraph, cluster: trellis::NodeId) -> Vec<usize> {
    graph
        .leaves(cluster)
        .into_iter()
        .map(|leaf| graph.row_index(leaf).expect("leaf has a row"))
        .collect()
}

/// Absolute y of one end of a message connector.
pub fn anchor_y(surface: &NotationSurface, message: &str, end: trellis::notation::ConnectorEnd) -> f32 {
    surface
        .anchor_of(view(message), end)
        .expect("anchor resolves")
        .y()
}

//! Graphical notation laid over an interaction.
//!
//! A notation is a tree of [`Shape`] views plus a set of [`Connector`] views
//! for messages. Shape bounds are stored relative to the parent shape.
//! Connector ends attach to a shape and carry an [`Anchor`] relative to that
//! shape's top-left corner.
//!
//! [`Diagram`] is the in-memory snapshot; read access goes through the
//! [`Notation`] trait.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    geometry::{Anchor, Bounds},
    identifier::Id,
};

/// Errors raised while assembling or editing a notation snapshot.
#[derive(Debug, Error, PartialEq)]
pub enum NotationError {
    #[error("Duplicate view id `{0}`")]
    DuplicateView(Id),

    #[error("Element `{0}` is represented by more than one view")]
    DuplicateElement(Id),

    #[error("View `{view}` refers to unknown parent `{parent}`")]
    UnknownParent { view: Id, parent: Id },

    #[error("View `{0}` is its own ancestor")]
    ParentCycle(Id),

    #[error("Connector `{connector}` is attached to unknown view `{view}`")]
    UnknownAttachment { connector: Id, view: Id },

    #[error("Unknown view `{0}`")]
    UnknownView(Id),
}

/// Which end of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorEnd {
    Source,
    Target,
}

/// Reference to something that can be moved in the notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewRef {
    /// A shape view.
    Shape(Id),
    /// One end anchor of a connector view.
    Anchor(Id, ConnectorEnd),
}

impl ViewRef {
    /// Returns the id of the referenced view (the connector for anchors).
    pub fn view(self) -> Id {
        match self {
            Self::Shape(id) | Self::Anchor(id, _) => id,
        }
    }
}

/// A node view: lifeline, execution, fragment, gate or the interaction frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    element: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<Id>,
    bounds: Bounds,
}

impl Shape {
    pub fn new(id: Id, bounds: Bounds) -> Self {
        Self {
            id,
            element: None,
            parent: None,
            bounds,
        }
    }

    /// Sets the semantic element this view represents.
    pub fn with_element(mut self, element: Id) -> Self {
        self.element = Some(element);
        self
    }

    /// Sets the containing view. Bounds are relative to it.
    pub fn with_parent(mut self, parent: Id) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn element(&self) -> Option<Id> {
        self.element
    }

    pub fn parent(&self) -> Option<Id> {
        self.parent
    }

    /// Returns the bounds relative to the parent view.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }
}

/// An edge view drawn for a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    id: Id,
    element: Id,
    source: Id,
    target: Id,
    #[serde(default)]
    source_anchor: Anchor,
    #[serde(default)]
    target_anchor: Anchor,
}

impl Connector {
    /// Creates a connector for `element` from the `source` shape to the `target` shape.
    pub fn new(id: Id, element: Id, source: Id, target: Id) -> Self {
        Self {
            id,
            element,
            source,
            target,
            source_anchor: Anchor::default(),
            target_anchor: Anchor::default(),
        }
    }

    pub fn with_anchors(mut self, source_anchor: Anchor, target_anchor: Anchor) -> Self {
        self.source_anchor = source_anchor;
        self.target_anchor = target_anchor;
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn element(&self) -> Id {
        self.element
    }

    /// Returns the shape the given end is attached to.
    pub fn attached(&self, end: ConnectorEnd) -> Id {
        match end {
            ConnectorEnd::Source => self.source,
            ConnectorEnd::Target => self.target,
        }
    }

    pub fn anchor(&self, end: ConnectorEnd) -> Anchor {
        match end {
            ConnectorEnd::Source => self.source_anchor,
            ConnectorEnd::Target => self.target_anchor,
        }
    }

    pub fn set_anchor(&mut self, end: ConnectorEnd, anchor: Anchor) {
        match end {
            ConnectorEnd::Source => self.source_anchor = anchor,
            ConnectorEnd::Target => self.target_anchor = anchor,
        }
    }
}

/// Read access to a notation snapshot.
pub trait Notation {
    /// Returns the view (shape or connector) representing `element`.
    fn view_for(&self, element: Id) -> Option<Id>;

    fn shape(&self, view: Id) -> Option<&Shape>;

    fn connector(&self, view: Id) -> Option<&Connector>;

    /// Returns the direct children of a shape in insertion order.
    fn children(&self, view: Id) -> Vec<Id>;

    fn shape_for(&self, element: Id) -> Option<&Shape> {
        self.view_for(element).and_then(|view| self.shape(view))
    }

    fn connector_for(&self, element: Id) -> Option<&Connector> {
        self.view_for(element).and_then(|view| self.connector(view))
    }

    fn parent(&self, view: Id) -> Option<Id> {
        self.shape(view).and_then(Shape::parent)
    }

    /// Returns true if `ancestor` is `view` or contains it transitively.
    fn is_ancestor_or_self(&self, ancestor: Id, view: Id) -> bool {
        let mut current = Some(view);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DiagramDef {
    #[serde(default)]
    shapes: Vec<Shape>,
    #[serde(default)]
    connectors: Vec<Connector>,
}

/// An owned, validated notation snapshot.
///
/// # Examples
///
/// ```
/// use trellis_core::{
///     geometry::{Bounds, Point, Size},
///     identifier::Id,
///     notation::{Diagram, Notation, Shape},
/// };
///
/// let frame = Shape::new(
///     Id::new("frame"),
///     Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(400.0, 300.0)),
/// );
/// let lifeline = Shape::new(
///     Id::new("lifeline_view"),
///     Bounds::new_from_top_left(Point::new(20.0, 10.0), Size::new(80.0, 250.0)),
/// )
/// .with_element(Id::new("client"))
/// .with_parent(Id::new("frame"));
///
/// let diagram = Diagram::new(vec![frame, lifeline], vec![]).unwrap();
/// assert_eq!(diagram.view_for(Id::new("client")), Some(Id::new("lifeline_view")));
/// assert_eq!(diagram.children(Id::new("frame")), vec![Id::new("lifeline_view")]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DiagramDef", into = "DiagramDef")]
pub struct Diagram {
    shapes: IndexMap<Id, Shape>,
    connectors: IndexMap<Id, Connector>,
    elements: IndexMap<Id, Id>,
}

impl Diagram {
    /// Assembles a diagram, checking ids, containment and connector attachments.
    pub fn new(shapes: Vec<Shape>, connectors: Vec<Connector>) -> Result<Self, NotationError> {
        let mut diagram = Self::default();

        for shape in shapes {
            diagram.register_element(shape.element, shape.id)?;
            if diagram.shapes.insert(shape.id, shape.clone()).is_some() {
                return Err(NotationError::DuplicateView(shape.id));
            }
        }

        for connector in connectors {
            if diagram.shapes.contains_key(&connector.id) {
                return Err(NotationError::DuplicateView(connector.id));
            }
            for end in [ConnectorEnd::Source, ConnectorEnd::Target] {
                let view = connector.attached(end);
                if !diagram.shapes.contains_key(&view) {
                    return Err(NotationError::UnknownAttachment {
                        connector: connector.id,
                        view,
                    });
                }
            }
            diagram.register_element(Some(connector.element), connector.id)?;
            if diagram
                .connectors
                .insert(connector.id, connector.clone())
                .is_some()
            {
                return Err(NotationError::DuplicateView(connector.id));
            }
        }

        diagram.check_containment()?;
        Ok(diagram)
    }

    fn register_element(&mut self, element: Option<Id>, view: Id) -> Result<(), NotationError> {
        let Some(element) = element else {
            return Ok(());
        };
        if self.elements.insert(element, view).is_some() {
            return Err(NotationError::DuplicateElement(element));
        }
        Ok(())
    }

    fn check_containment(&self) -> Result<(), NotationError> {
        for shape in self.shapes.values() {
            if let Some(parent) = shape.parent {
                if !self.shapes.contains_key(&parent) {
                    return Err(NotationError::UnknownParent {
                        view: shape.id,
                        parent,
                    });
                }
            }

            let mut steps = 0;
            let mut current = shape.parent;
            while let Some(id) = current {
                steps += 1;
                if id == shape.id || steps > self.shapes.len() {
                    return Err(NotationError::ParentCycle(shape.id));
                }
                current = self.shapes.get(&id).and_then(Shape::parent);
            }
        }
        Ok(())
    }

    /// Returns every shape in insertion order.
    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.values()
    }

    /// Returns every connector in insertion order.
    pub fn connectors(&self) -> impl Iterator<Item = &Connector> {
        self.connectors.values()
    }

    pub fn shape_mut(&mut self, view: Id) -> Result<&mut Shape, NotationError> {
        self.shapes
            .get_mut(&view)
            .ok_or(NotationError::UnknownView(view))
    }

    pub fn connector_mut(&mut self, view: Id) -> Result<&mut Connector, NotationError> {
        self.connectors
            .get_mut(&view)
            .ok_or(NotationError::UnknownView(view))
    }
}

impl TryFrom<DiagramDef> for Diagram {
    type Error = NotationError;

    fn try_from(def: DiagramDef) -> Result<Self, Self::Error> {
        Diagram::new(def.shapes, def.connectors)
    }
}

impl From<Diagram> for DiagramDef {
    fn from(diagram: Diagram) -> Self {
        DiagramDef {
            shapes: diagram.shapes.into_values().collect(),
            connectors: diagram.connectors.into_values().collect(),
        }
    }
}

impl Notation for Diagram {
    fn view_for(&self, element: Id) -> Option<Id> {
        self.elements.get(&element).copied()
    }

    fn shape(&self, view: Id) -> Option<&Shape> {
        self.shapes.get(&view)
    }

    fn connector(&self, view: Id) -> Option<&Connector> {
        self.connectors.get(&view)
    }

    fn children(&self, view: Id) -> Vec<Id> {
        self.shapes
            .values()
            .filter(|shape| shape.parent == Some(view))
            .map(Shape::id)
            .collect()
    }
}

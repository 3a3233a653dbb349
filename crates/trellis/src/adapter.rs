//! Geometry adapter between the interaction graph and the notation.
//!
//! The graph reasons in absolute diagram coordinates while the notation
//! stores shape bounds relative to their parent and connector anchors
//! relative to the shape they attach to. [`GeometryAdapter`] is the seam
//! between both: it answers absolute positions and applies the moves a
//! mutation asks for.
//!
//! [`NotationSurface`] is the default adapter over an owned [`Diagram`].

use log::trace;

use trellis_core::{
    geometry::{Bounds, Point},
    identifier::Id,
    notation::{ConnectorEnd, Diagram, Notation, NotationError, ViewRef},
};

/// Absolute geometry of a notation and the edits applied to it.
pub trait GeometryAdapter {
    /// Converts an absolute point into coordinates relative to `container`.
    fn to_relative(&self, container: Id, point: Point) -> Option<Point>;

    /// Returns the absolute bounds of a shape view.
    fn bounds_of(&self, view: Id) -> Option<Bounds>;

    /// Returns the absolute attachment point of one end of a connector.
    fn anchor_of(&self, connector: Id, end: ConnectorEnd) -> Option<Point>;

    /// Returns the containing shape of a shape view.
    fn parent_of(&self, view: Id) -> Option<Id>;

    /// Returns the shape one end of a connector is attached to.
    fn attached_to(&self, connector: Id, end: ConnectorEnd) -> Option<Id>;

    /// Moves a shape or a connector anchor by the given offset.
    fn translate(&mut self, view: ViewRef, dx: f32, dy: f32) -> Result<(), NotationError>;

    /// Grows or shrinks a shape from its top-left corner.
    fn resize(&mut self, view: Id, dw: f32, dh: f32) -> Result<(), NotationError>;

    /// Returns true if `ancestor` is `view` or one of its containers.
    fn is_ancestor_or_self(&self, ancestor: Id, view: Id) -> bool {
        let mut current = Some(view);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent_of(id);
        }
        false
    }
}

/// [`GeometryAdapter`] over an owned notation snapshot.
///
/// # Examples
///
/// ```
/// use trellis::adapter::{GeometryAdapter, NotationSurface};
/// use trellis::geometry::{Bounds, Point, Size};
/// use trellis::identifier::Id;
/// use trellis::notation::{Diagram, Shape};
///
/// let frame = Shape::new(
///     Id::new("frame"),
///     Bounds::new_from_top_left(Point::new(100.0, 50.0), Size::new(400.0, 300.0)),
/// );
/// let lifeline = Shape::new(
///     Id::new("ll"),
///     Bounds::new_from_top_left(Point::new(20.0, 10.0), Size::new(80.0, 250.0)),
/// )
/// .with_parent(Id::new("frame"));
///
/// let surface = NotationSurface::new(Diagram::new(vec![frame, lifeline], vec![]).unwrap());
/// let bounds = surface.bounds_of(Id::new("ll")).unwrap();
/// assert_eq!(bounds.min_point(), Point::new(120.0, 60.0));
/// assert_eq!(
///     surface.to_relative(Id::new("frame"), Point::new(130.0, 70.0)),
///     Some(Point::new(30.0, 20.0))
/// );
/// ```
#[derive(Debug, Clone)]
pub struct NotationSurface {
    diagram: Diagram,
}

impl NotationSurface {
    pub fn new(diagram: Diagram) -> Self {
        Self { diagram }
    }

    /// Returns the wrapped notation.
    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn into_diagram(self) -> Diagram {
        self.diagram
    }

    /// Offset of a shape's coordinate space: the absolute top-left of its parent.
    fn origin_of_children(&self, view: Id) -> Option<Point> {
        self.bounds_of(view).map(Bounds::min_point)
    }
}

impl GeometryAdapter for NotationSurface {
    fn to_relative(&self, container: Id, point: Point) -> Option<Point> {
        self.origin_of_children(container)
            .map(|origin| point.sub_point(origin))
    }

    fn bounds_of(&self, view: Id) -> Option<Bounds> {
        let shape = self.diagram.shape(view)?;
        let mut bounds = shape.bounds();
        let mut parent = shape.parent();
        while let Some(id) = parent {
            let container = self.diagram.shape(id)?;
            bounds = bounds.translate(container.bounds().min_point());
            parent = container.parent();
        }
        Some(bounds)
    }

    fn anchor_of(&self, connector: Id, end: ConnectorEnd) -> Option<Point> {
        let connector = self.diagram.connector(connector)?;
        let attached = self.bounds_of(connector.attached(end))?;
        Some(connector.anchor(end).resolve(attached))
    }

    fn parent_of(&self, view: Id) -> Option<Id> {
        self.diagram.parent(view)
    }

    fn attached_to(&self, connector: Id, end: ConnectorEnd) -> Option<Id> {
        self.diagram
            .connector(connector)
            .map(|connector| connector.attached(end))
    }

    fn translate(&mut self, view: ViewRef, dx: f32, dy: f32) -> Result<(), NotationError> {
        trace!(view:?, dx, dy; "Translating view");
        let offset = Point::new(dx, dy);
        match view {
            ViewRef::Shape(id) => {
                let shape = self.diagram.shape_mut(id)?;
                let bounds = shape.bounds().translate(offset);
                shape.set_bounds(bounds);
            }
            ViewRef::Anchor(id, end) => {
                let connector = self.diagram.connector_mut(id)?;
                let anchor = connector.anchor(end).translate(offset);
                connector.set_anchor(end, anchor);
            }
        }
        Ok(())
    }

    fn resize(&mut self, view: Id, dw: f32, dh: f32) -> Result<(), NotationError> {
        trace!(view:%, dw, dh; "Resizing view");
        let shape = self.diagram.shape_mut(view)?;
        let bounds = shape.bounds().resize(dw, dh);
        shape.set_bounds(bounds);
        Ok(())
    }
}

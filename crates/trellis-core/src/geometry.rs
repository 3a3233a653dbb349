//! Geometric primitives for graphical positions and bounds.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate in diagram space
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - A rectangular bounding box defined by minimum and maximum coordinates
//! - [`Anchor`] - An attachment point relative to the top-left corner of a view
//!
//! # Coordinate System
//!
//! Positions follow the usual screen convention:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! Notation views store bounds relative to their parent view. Absolute values
//! are obtained by accumulating the parent chain, see the geometry adapter in
//! the `trellis` crate.

use serde::{Deserialize, Serialize};

/// A 2D point in diagram coordinate space.
///
/// # Examples
///
/// ```
/// # use trellis_core::geometry::Point;
/// let p1 = Point::new(10.0, 20.0);
/// let p2 = Point::new(5.0, 5.0);
///
/// let sum = p1.add_point(p2);
/// assert_eq!(sum.x(), 15.0);
/// assert_eq!(sum.y(), 25.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Adds another point to this point, returning a new point.
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

/// Represents the dimensions of an element with width and height
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> f32 {
        self.height
    }
}

/// Serialized form of [`Bounds`]: top-left corner plus size.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct Rect {
    x: f32,
    y: f32,
    #[serde(default)]
    width: f32,
    #[serde(default)]
    height: f32,
}

impl From<Rect> for Bounds {
    fn from(rect: Rect) -> Self {
        Bounds::new_from_top_left(Point::new(rect.x, rect.y), Size::new(rect.width, rect.height))
    }
}

impl From<Bounds> for Rect {
    fn from(bounds: Bounds) -> Self {
        Rect {
            x: bounds.min_x,
            y: bounds.min_y,
            width: bounds.width(),
            height: bounds.height(),
        }
    }
}

/// Represents a rectangular bounding box with minimum and maximum coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Rect", into = "Rect")]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Creates a new bounds from a top-left point and a size
    pub fn new_from_top_left(top_left: Point, size: Size) -> Self {
        Self {
            min_x: top_left.x,
            min_y: top_left.y,
            max_x: top_left.x + size.width,
            max_y: top_left.y + size.height,
        }
    }

    /// Returns the minimum x-coordinate of the bounds
    pub fn min_x(self) -> f32 {
        self.min_x
    }

    /// Returns the minimum y-coordinate of the bounds
    pub fn min_y(self) -> f32 {
        self.min_y
    }

    /// Returns the maximum x-coordinate of the bounds
    pub fn max_x(self) -> f32 {
        self.max_x
    }

    /// Returns the maximum y-coordinate of the bounds
    pub fn max_y(self) -> f32 {
        self.max_y
    }

    /// Returns the width of the bounds
    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    /// Returns the height of the bounds
    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    /// Returns the center point of the bounds
    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Returns the top-left corner as a Point
    pub fn min_point(self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    /// Returns the middle of the top edge
    pub fn top(self) -> Point {
        Point::new(self.center().x(), self.min_y)
    }

    /// Returns the middle of the bottom edge
    pub fn bottom(self) -> Point {
        Point::new(self.center().x(), self.max_y)
    }

    /// Moves the bounds by the specified offset, keeping its size.
    pub fn translate(&self, offset: Point) -> Self {
        Self {
            min_x: self.min_x + offset.x,
            min_y: self.min_y + offset.y,
            max_x: self.max_x + offset.x,
            max_y: self.max_y + offset.y,
        }
    }

    /// Moves the bounds in the opposite direction of the specified offset
    pub fn inverse_translate(&self, offset: Point) -> Self {
        Self {
            min_x: self.min_x - offset.x,
            min_y: self.min_y - offset.y,
            max_x: self.max_x - offset.x,
            max_y: self.max_y - offset.y,
        }
    }

    /// Grows (or shrinks, for negative deltas) the bounds from its top-left corner.
    ///
    /// The size never becomes negative.
    pub fn resize(&self, dw: f32, dh: f32) -> Self {
        Self {
            min_x: self.min_x,
            min_y: self.min_y,
            max_x: (self.max_x + dw).max(self.min_x),
            max_y: (self.max_y + dh).max(self.min_y),
        }
    }
}

/// An attachment point of a connector end.
///
/// Stored as an offset from the top-left corner of the view the connector
/// end is attached to, so resizing that view leaves the anchor in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Anchor {
    offset: Point,
}

impl Anchor {
    /// Creates an anchor at `offset` from the attached view's top-left corner
    pub fn new(offset: Point) -> Self {
        Self { offset }
    }

    /// Returns the offset relative to the attached view
    pub fn offset(self) -> Point {
        self.offset
    }

    /// Resolves this anchor to an absolute point inside `bounds`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use trellis_core::geometry::{Anchor, Bounds, Point, Size};
    /// let lifeline = Bounds::new_from_top_left(Point::new(40.0, 10.0), Size::new(100.0, 300.0));
    /// let anchor = Anchor::new(Point::new(50.0, 80.0));
    ///
    /// assert_eq!(anchor.resolve(lifeline), Point::new(90.0, 90.0));
    /// ```
    pub fn resolve(self, bounds: Bounds) -> Point {
        bounds.min_point().add_point(self.offset)
    }

    /// Returns the anchor moved by the given offset.
    pub fn translate(self, offset: Point) -> Self {
        Self {
            offset: self.offset.add_point(offset),
        }
    }
}

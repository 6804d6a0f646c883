use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

/// Stable identifier of a draggable item. Cheap to clone.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(Arc<str>);

impl ItemId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

impl From<&String> for ItemId {
    fn from(id: &String) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0., y: 0. };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0. && self.y == 0.
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// A bounding box in layout pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.left, self.top)
    }

    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2., self.top + self.height / 2.)
    }

    pub fn translate(&self, by: Point) -> Rect {
        Rect::new(self.left + by.x, self.top + by.y, self.width, self.height)
    }
}

/// The axis along which a list is ordered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

impl Orientation {
    /// The coordinate of `point` along this axis.
    pub fn axis(self, point: Point) -> f32 {
        match self {
            Orientation::Horizontal => point.x,
            Orientation::Vertical => point.y,
        }
    }

    /// A point that is `delta` along this axis and zero across it.
    pub fn along(self, delta: f32) -> Point {
        match self {
            Orientation::Horizontal => Point::new(delta, 0.),
            Orientation::Vertical => Point::new(0., delta),
        }
    }
}

/// A tracked item of a [`crate::DragContext`].
///
/// The on-screen element is owned by the rendering layer and is referred to
/// by `id` only.
#[derive(Clone, Debug, PartialEq)]
pub struct DraggableItem {
    pub id: ItemId,
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
    /// Translation currently applied for visual repositioning.
    pub offset_left: f32,
    pub offset_top: f32,
    pub(crate) order_index: usize,
}

impl DraggableItem {
    pub(crate) fn new(id: ItemId, rect: Rect, order_index: usize) -> Self {
        Self {
            id,
            top: rect.top,
            left: rect.left,
            width: rect.width,
            height: rect.height,
            offset_left: 0.,
            offset_top: 0.,
            order_index,
        }
    }

    pub fn order_index(&self) -> usize {
        self.order_index
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.width, self.height)
    }

    pub fn offset(&self) -> Point {
        Point::new(self.offset_left, self.offset_top)
    }

    pub(crate) fn set_rect(&mut self, rect: Rect) {
        self.top = rect.top;
        self.left = rect.left;
        self.width = rect.width;
        self.height = rect.height;
    }

    pub(crate) fn add_offset(&mut self, by: Point) {
        self.offset_left += by.x;
        self.offset_top += by.y;
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.offset_left == 0. && self.offset_top == 0.
    }
}

/// Box center plus the current offset.
pub fn center(item: &DraggableItem) -> Point {
    item.rect().center() + item.offset()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_includes_offset() {
        let mut item = DraggableItem::new("a".into(), Rect::new(10., 20., 100., 40.), 0);
        assert_eq!(center(&item), Point::new(60., 40.));

        item.add_offset(Point::new(-15., 5.));
        assert_eq!(center(&item), Point::new(45., 45.));

        item.set_rect(Rect::new(0., 0., 10., 10.));
        assert_eq!(center(&item), Point::new(-10., 10.));
    }

    #[test]
    fn orientation_picks_axis() {
        let p = Point::new(3., 7.);
        assert_eq!(Orientation::Horizontal.axis(p), 3.);
        assert_eq!(Orientation::Vertical.axis(p), 7.);
        assert_eq!(Orientation::Vertical.along(2.), Point::new(0., 2.));
    }
}

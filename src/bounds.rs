//! Axis-aligned containment region that keeps every body on screen.

use crate::float::Float;
use crate::vec::Vec2;

/// Axis-aligned rectangle, `min` is the top-left corner in screen space.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect<F: Float> {
    pub min: Vec2<F>,
    pub max: Vec2<F>,
}

/// Which wall of a [`Rect`] a body was pushed back from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Edge {
    Min,
    Max,
}

/// Result of clamping a shape into a [`Rect`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Containment<F: Float> {
    pub position: Vec2<F>,
    pub x: Option<Edge>,
    pub y: Option<Edge>,
}

impl<F: Float> Containment<F> {
    pub fn touched(&self) -> bool {
        self.x.is_some() || self.y.is_some()
    }
}

impl<F: Float> Rect<F> {
    pub fn new(min: Vec2<F>, max: Vec2<F>) -> Self {
        Rect { min, max }
    }

    /// Rectangle anchored at the origin, the usual canvas size.
    pub fn from_size(width: F, height: F) -> Self {
        Rect { min: Vec2::zero(), max: Vec2::new(width, height) }
    }

    pub fn width(&self) -> F { self.max.x - self.min.x }
    pub fn height(&self) -> F { self.max.y - self.min.y }

    pub fn center(&self) -> Vec2<F> {
        self.min.lerp(self.max, F::half())
    }

    pub fn contains(&self, p: Vec2<F>) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// True when both extents are positive and finite.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.width() > F::zero()
            && self.height() > F::zero()
    }

    /// Clamp a shape with the given half extents so it lies fully inside.
    ///
    /// A shape resting exactly on an edge counts as touching it. A shape
    /// wider than the region on some axis is centred on that axis.
    pub fn contain(&self, position: Vec2<F>, half_extents: Vec2<F>) -> Containment<F> {
        let (x, hit_x) = clamp_axis(position.x, half_extents.x, self.min.x, self.max.x);
        let (y, hit_y) = clamp_axis(position.y, half_extents.y, self.min.y, self.max.y);
        Containment { position: Vec2::new(x, y), x: hit_x, y: hit_y }
    }
}

fn clamp_axis<F: Float>(value: F, half: F, min: F, max: F) -> (F, Option<Edge>) {
    let lo = min + half;
    let hi = max - half;
    if lo > hi {
        let mid = (min + max) * F::half();
        let edge = if value < mid {
            Some(Edge::Min)
        } else if value > mid {
            Some(Edge::Max)
        } else {
            None
        };
        return (mid, edge);
    }
    if value <= lo {
        (lo, Some(Edge::Min))
    } else if value >= hi {
        (hi, Some(Edge::Max))
    } else {
        (value, None)
    }
}

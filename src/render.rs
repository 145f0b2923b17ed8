//! Read-only frame snapshot for render adapters.

use crate::body::{BodyId, GroupId, Shape};
use crate::chain::Role;
use crate::color::Color;
use crate::constraint::LinkKind;
use crate::float::Float;
use crate::vec::Vec2;

/// One body to draw this frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderItem<F: Float> {
    pub body: BodyId,
    pub shape: Shape<F>,
    pub position: Vec2<F>,
    /// Bodies do not rotate; always zero.
    pub rotation: F,
    pub highlighted: bool,
    pub group: Option<GroupId>,
    pub role: Option<Role>,
    /// Logical index, for adapters that number the beads.
    pub label: Option<usize>,
    pub color: Color,
}

/// One link to draw as a cord segment.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderLink<F: Float> {
    pub from: Vec2<F>,
    pub to: Vec2<F>,
    pub kind: LinkKind,
}

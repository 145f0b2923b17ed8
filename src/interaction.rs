//! Picking, highlighting and drag-to-move.
//!
//! A drag adds one weak [`LinkKind::Pointer`] constraint from the grabbed
//! point on the body to the pointer position. It is much softer than the
//! chain links and pulls no faster than `max_pull_speed`, so a fast drag or a
//! pointer that jumps tows the chain instead of stretching it, and nothing is
//! flung when it is released.

use tracing::debug;

use crate::body::BodyId;
use crate::constraint::{Anchor, ConstraintId, DistanceConstraint, LinkKind};
use crate::error::WorldError;
use crate::float::Float;
use crate::vec::Vec2;
use crate::world::World;

/// Tuning of the drag link.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointerConfig<F: Float> {
    /// Default 0.2, well below the chain's own link stiffness.
    pub stiffness: F,
    /// Default 0.3.
    pub damping: F,
    /// Fastest the grabbed point is pulled toward the pointer, in units per
    /// second. Default 1200.
    pub max_pull_speed: F,
}

impl<F: Float> Default for PointerConfig<F> {
    fn default() -> Self {
        PointerConfig {
            stiffness: F::from_f32(0.2),
            damping: F::from_f32(0.3),
            max_pull_speed: F::from_f32(1200.0),
        }
    }
}

/// The active drag.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Drag {
    pub body: BodyId,
    pub constraint: ConstraintId,
}

/// Pointer state. Holds only ids into the [`World`], never body data.
#[derive(Clone, Debug)]
pub struct PointerController<F: Float> {
    config: PointerConfig<F>,
    drag: Option<Drag>,
    highlight: Option<usize>,
}

/// Topmost body containing `point`. Later bodies draw on top, so the search
/// runs in reverse insertion order.
pub fn pick<F: Float>(world: &World<F>, point: Vec2<F>) -> Option<BodyId> {
    world
        .bodies()
        .iter()
        .rev()
        .find(|body| body.contains_point(point))
        .map(|body| body.id())
}

impl<F: Float> PointerController<F> {
    pub fn new(config: PointerConfig<F>) -> Self {
        PointerController { config, drag: None, highlight: None }
    }

    pub fn config(&self) -> &PointerConfig<F> { &self.config }

    /// Applies to the next drag.
    pub fn set_config(&mut self, config: PointerConfig<F>) {
        self.config = config;
    }

    pub fn pick(&self, world: &World<F>, point: Vec2<F>) -> Option<BodyId> {
        pick(world, point)
    }

    /// Start dragging `body` from `point`, ending any drag in progress.
    pub fn begin_drag(&mut self, world: &mut World<F>, body: BodyId, point: Vec2<F>) -> Result<(), WorldError> {
        self.end_drag(world);

        let grabbed = world.body(body)?;
        if grabbed.is_pinned() {
            return Err(WorldError::BodyPinned(body));
        }
        let offset = point - grabbed.position;
        let link = DistanceConstraint::new(Anchor::Body { body, offset }, Anchor::Point(point), F::zero())
            .with_stiffness(self.config.stiffness)
            .with_damping(self.config.damping)
            .with_max_pull_speed(self.config.max_pull_speed)
            .with_kind(LinkKind::Pointer);
        let constraint = world.add_constraint(link)?;
        self.drag = Some(Drag { body, constraint });
        debug!(%body, "drag started");
        Ok(())
    }

    /// Move the pointer target. Returns false when nothing is being dragged.
    pub fn update_drag(&mut self, world: &mut World<F>, point: Vec2<F>) -> Result<bool, WorldError> {
        let Some(drag) = self.drag else {
            return Ok(false);
        };
        match world.set_point_anchor(drag.constraint, point) {
            Ok(()) => Ok(true),
            Err(err @ WorldError::ConstraintNotFound(_)) => {
                self.drag = None;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Release the drag, returning the body that was held.
    pub fn end_drag(&mut self, world: &mut World<F>) -> Option<BodyId> {
        let drag = self.drag.take()?;
        // Already gone if the world was cleared mid-drag.
        let _ = world.remove_constraint(drag.constraint);
        debug!(body = %drag.body, "drag ended");
        Some(drag.body)
    }

    /// Drop drag state without touching a world that has been replaced.
    pub fn forget_drag(&mut self) {
        self.drag = None;
    }

    pub fn drag(&self) -> Option<Drag> {
        self.drag
    }

    pub fn dragging(&self) -> Option<BodyId> {
        self.drag.map(|d| d.body)
    }

    /// Visual selection only; no physical effect.
    pub fn highlight(&mut self, index: usize) {
        self.highlight = Some(index);
    }

    pub fn clear_highlight(&mut self) {
        self.highlight = None;
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlight
    }
}

impl<F: Float> Default for PointerController<F> {
    fn default() -> Self {
        Self::new(PointerConfig::default())
    }
}

//! Distance constraints between body anchor points, solved by iterative relaxation.

use core::fmt;

use crate::body::{Body, BodyId};
use crate::error::WorldError;
use crate::float::Float;
use crate::vec::Vec2;

/// Stable constraint handle, scoped to a world epoch like [`BodyId`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintId {
    epoch: u32,
    serial: u32,
}

impl ConstraintId {
    pub(crate) fn new(epoch: u32, serial: u32) -> Self {
        ConstraintId { epoch, serial }
    }

    pub fn epoch(self) -> u32 { self.epoch }
}

impl fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "constraint {}:{}", self.epoch, self.serial)
    }
}

/// One end of a constraint.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Anchor<F: Float> {
    /// A point fixed to a body, `offset` from its centre. Bodies do not
    /// rotate, so the offset stays in world axes.
    Body { body: BodyId, offset: Vec2<F> },
    /// A fixed world point with zero inverse mass (the pointer target).
    Point(Vec2<F>),
}

impl<F: Float> Anchor<F> {
    pub fn center(body: BodyId) -> Self {
        Anchor::Body { body, offset: Vec2::zero() }
    }

    pub fn body(&self) -> Option<BodyId> {
        match *self {
            Anchor::Body { body, .. } => Some(body),
            Anchor::Point(_) => None,
        }
    }
}

/// What a link represents, for rendering and diagnostics.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LinkKind {
    /// The visible cord between beads.
    Chain,
    /// Short stiff links holding a composite (the cross) together.
    Composite,
    /// Transient drag link to the pointer.
    Pointer,
}

/// Spring-like distance link between two anchors.
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceConstraint<F: Float> {
    pub a: Anchor<F>,
    pub b: Anchor<F>,
    pub rest_length: F,
    /// Fraction of the length error corrected per iteration, in (0, 1].
    pub stiffness: F,
    /// Fraction of relative axial velocity removed per step, in [0, 1].
    pub damping: F,
    /// Fastest this link may pull its ends, in units per second. `None`
    /// leaves only the world's `max_correction`.
    pub max_pull_speed: Option<F>,
    pub kind: LinkKind,
}

impl<F: Float> DistanceConstraint<F> {
    pub fn new(a: Anchor<F>, b: Anchor<F>, rest_length: F) -> Self {
        DistanceConstraint {
            a,
            b,
            rest_length,
            stiffness: F::one(),
            damping: F::zero(),
            max_pull_speed: None,
            kind: LinkKind::Chain,
        }
    }

    /// Centre-to-centre link.
    pub fn between(a: BodyId, b: BodyId, rest_length: F) -> Self {
        Self::new(Anchor::center(a), Anchor::center(b), rest_length)
    }

    pub fn with_stiffness(mut self, stiffness: F) -> Self {
        self.stiffness = stiffness;
        self
    }

    pub fn with_damping(mut self, damping: F) -> Self {
        self.damping = damping;
        self
    }

    pub fn with_max_pull_speed(mut self, speed: F) -> Self {
        self.max_pull_speed = Some(speed);
        self
    }

    pub fn with_kind(mut self, kind: LinkKind) -> Self {
        self.kind = kind;
        self
    }

    /// Parameter and topology checks that do not need the world.
    pub(crate) fn validate(&self) -> Result<(), WorldError> {
        if let (Some(a), Some(b)) = (self.a.body(), self.b.body()) {
            if a == b {
                return Err(WorldError::SelfConstraint(a));
            }
        }
        if !self.rest_length.is_finite() || self.rest_length < F::zero() {
            return Err(WorldError::InvalidConstraint { reason: "rest length must be finite and >= 0" });
        }
        if !(self.stiffness > F::zero() && self.stiffness <= F::one()) {
            return Err(WorldError::InvalidConstraint { reason: "stiffness must be in (0, 1]" });
        }
        if !(self.damping >= F::zero() && self.damping <= F::one()) {
            return Err(WorldError::InvalidConstraint { reason: "damping must be in [0, 1]" });
        }
        if let Some(speed) = self.max_pull_speed {
            if !(speed.is_finite() && speed > F::zero()) {
                return Err(WorldError::InvalidConstraint { reason: "max pull speed must be finite and > 0" });
            }
        }
        for anchor in [&self.a, &self.b] {
            let p = match *anchor {
                Anchor::Body { offset, .. } => offset,
                Anchor::Point(p) => p,
            };
            if !p.is_finite() {
                return Err(WorldError::InvalidConstraint { reason: "anchor must be finite" });
            }
        }
        Ok(())
    }

    /// Move both ends toward `rest_length`, split by inverse mass.
    ///
    /// `pull_dt` is the time one iteration stands for (sub-step length over
    /// iterations), so `max_pull_speed` bounds the pull per sub-step. The
    /// correction is also capped at `max_correction` per call as a guard
    /// against blow-ups; returns the requested magnitude when that cap hits.
    /// Links whose anchors do not resolve in `bodies` are skipped.
    pub(crate) fn solve(&self, bodies: &mut [Body<F>], max_correction: F, pull_dt: F) -> Option<F> {
        let (pa, wa, sa) = resolve(&self.a, bodies)?;
        let (pb, wb, sb) = resolve(&self.b, bodies)?;

        let w_total = wa + wb;
        if w_total.is_near_zero(F::from_f32(1e-10)) {
            return None; // both pinned
        }

        let delta = pb - pa;
        let dist = delta.length();
        if dist.is_near_zero(F::from_f32(1e-10)) {
            return None; // degenerate
        }

        let mut magnitude = (dist - self.rest_length) * self.stiffness;
        if let Some(speed) = self.max_pull_speed {
            let reach = speed * pull_dt;
            magnitude = magnitude.clamp(-reach, reach);
        }
        let mut clamped = None;
        if magnitude.abs() > max_correction {
            clamped = Some(magnitude.abs());
            magnitude = if magnitude > F::zero() { max_correction } else { -max_correction };
        }
        let correction = delta.scale(magnitude / dist);

        if let Some(slot) = sa {
            if wa > F::zero() {
                bodies[slot].position += correction.scale(wa / w_total);
            }
        }
        if let Some(slot) = sb {
            if wb > F::zero() {
                bodies[slot].position -= correction.scale(wb / w_total);
            }
        }
        clamped
    }

    /// Remove `damping` of the relative velocity along the link axis.
    pub(crate) fn damp(&self, bodies: &mut [Body<F>]) {
        if self.damping <= F::zero() {
            return;
        }
        let (Some((pa, wa, sa)), Some((pb, wb, sb))) = (resolve(&self.a, bodies), resolve(&self.b, bodies)) else {
            return;
        };
        let w_total = wa + wb;
        if w_total.is_near_zero(F::from_f32(1e-10)) {
            return;
        }
        let axis = (pb - pa).normalize();
        if axis == Vec2::zero() {
            return;
        }

        let va = sa.map_or(Vec2::zero(), |s| bodies[s].velocity);
        let vb = sb.map_or(Vec2::zero(), |s| bodies[s].velocity);
        let impulse = (vb - va).dot(axis) * self.damping;

        if let Some(slot) = sa {
            if wa > F::zero() {
                bodies[slot].velocity += axis.scale(impulse * wa / w_total);
            }
        }
        if let Some(slot) = sb {
            if wb > F::zero() {
                bodies[slot].velocity -= axis.scale(impulse * wb / w_total);
            }
        }
    }
}

/// Body in `bodies` that `id` names. The slot must hold that exact id, so an
/// id from another world or epoch never lands on a different body.
fn lookup<F: Float>(id: BodyId, bodies: &[Body<F>]) -> Option<(usize, &Body<F>)> {
    let slot = id.slot();
    bodies.get(slot).filter(|b| b.id() == id).map(|b| (slot, b))
}

/// World position, inverse mass and body slot of an anchor.
fn resolve<F: Float>(anchor: &Anchor<F>, bodies: &[Body<F>]) -> Option<(Vec2<F>, F, Option<usize>)> {
    match *anchor {
        Anchor::Body { body, offset } => {
            let (slot, b) = lookup(body, bodies)?;
            Some((b.position + offset, b.inverse_mass(), Some(slot)))
        }
        Anchor::Point(p) => Some((p, F::zero(), None)),
    }
}

/// World position of an anchor, `None` if its body is not in `bodies`.
pub(crate) fn anchor_position<F: Float>(anchor: &Anchor<F>, bodies: &[Body<F>]) -> Option<Vec2<F>> {
    match *anchor {
        Anchor::Body { body, offset } => lookup(body, bodies).map(|(_, b)| b.position + offset),
        Anchor::Point(p) => Some(p),
    }
}

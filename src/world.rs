//! The simulation world: owns bodies and constraints and steps them.

use alloc::vec::Vec;

use tracing::{trace, warn};

use crate::body::{Body, BodyDesc, BodyId};
use crate::bounds::{Edge, Rect};
use crate::config::SolverConfig;
use crate::constraint::{anchor_position, Anchor, ConstraintId, DistanceConstraint};
use crate::error::WorldError;
use crate::float::Float;
use crate::observer::{NoOpStepObserver, StepObserver};
use crate::vec::Vec2;

/// Clamp events in one step above which the solver is considered stressed.
const CLAMP_WARN_THRESHOLD: usize = 16;

/// Owns all bodies and constraints, in insertion order.
///
/// Bodies are only ever appended, so a [`BodyId`]'s serial is its slot.
/// [`World::remove_all`] starts a new epoch, which invalidates every id
/// handed out before it.
pub struct World<F: Float = f64> {
    epoch: u32,
    bodies: Vec<Body<F>>,
    constraints: Vec<(ConstraintId, DistanceConstraint<F>)>,
    next_constraint: u32,
    bounds: Rect<F>,
    config: SolverConfig<F>,
}

impl<F: Float> World<F> {
    pub fn new(bounds: Rect<F>, config: SolverConfig<F>) -> Self {
        World {
            epoch: 0,
            bodies: Vec::new(),
            constraints: Vec::new(),
            next_constraint: 0,
            bounds,
            config,
        }
    }

    pub fn epoch(&self) -> u32 { self.epoch }
    pub fn bounds(&self) -> Rect<F> { self.bounds }
    pub fn config(&self) -> &SolverConfig<F> { &self.config }

    /// Takes effect from the next step.
    pub fn set_config(&mut self, config: SolverConfig<F>) {
        self.config = config;
    }

    /// Only meant for an empty world; existing bodies are not re-contained.
    pub fn set_bounds(&mut self, bounds: Rect<F>) {
        self.bounds = bounds;
    }

    /// Add a body, clamped into the bounds. Its id is never reused.
    pub fn add_body(&mut self, desc: BodyDesc<F>) -> Result<BodyId, WorldError> {
        if !desc.is_valid() {
            return Err(WorldError::InvalidBody {
                reason: "position, shape and mass must be finite and positive",
            });
        }
        let serial = u32::try_from(self.bodies.len())
            .map_err(|_| WorldError::InvalidBody { reason: "too many bodies" })?;
        let id = BodyId::new(self.epoch, serial);
        let mut body = Body::from_desc(id, desc);
        body.position = self.bounds.contain(body.position, body.shape.half_extents()).position;
        self.bodies.push(body);
        Ok(id)
    }

    /// Add a constraint. Both body anchors must belong to this world.
    pub fn add_constraint(&mut self, constraint: DistanceConstraint<F>) -> Result<ConstraintId, WorldError> {
        constraint.validate()?;
        for anchor in [&constraint.a, &constraint.b] {
            if let Some(body) = anchor.body() {
                self.body(body)?;
            }
        }
        let id = ConstraintId::new(self.epoch, self.next_constraint);
        self.next_constraint += 1;
        self.constraints.push((id, constraint));
        Ok(id)
    }

    /// Remove a constraint, keeping the order of the rest.
    pub fn remove_constraint(&mut self, id: ConstraintId) -> Result<DistanceConstraint<F>, WorldError> {
        let index = self.constraint_index(id)?;
        Ok(self.constraints.remove(index).1)
    }

    /// Drop every body and constraint and start a new id epoch.
    pub fn remove_all(&mut self) {
        self.bodies.clear();
        self.constraints.clear();
        self.next_constraint = 0;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// An empty world in the next epoch with the same bounds and config.
    /// Building into it and then swapping leaves `self` intact on failure.
    pub fn successor(&self) -> Self {
        World {
            epoch: self.epoch.wrapping_add(1),
            ..World::new(self.bounds, self.config.clone())
        }
    }

    pub fn body(&self, id: BodyId) -> Result<&Body<F>, WorldError> {
        if id.epoch() != self.epoch {
            return Err(WorldError::BodyNotFound(id));
        }
        self.bodies.get(id.slot()).ok_or(WorldError::BodyNotFound(id))
    }

    pub fn body_mut(&mut self, id: BodyId) -> Result<&mut Body<F>, WorldError> {
        if id.epoch() != self.epoch {
            return Err(WorldError::BodyNotFound(id));
        }
        self.bodies.get_mut(id.slot()).ok_or(WorldError::BodyNotFound(id))
    }

    pub fn constraint(&self, id: ConstraintId) -> Result<&DistanceConstraint<F>, WorldError> {
        let index = self.constraint_index(id)?;
        Ok(&self.constraints[index].1)
    }

    /// Move the fixed-point end of a constraint, such as a drag target.
    /// Body anchors cannot be changed once added.
    pub fn set_point_anchor(&mut self, id: ConstraintId, point: Vec2<F>) -> Result<(), WorldError> {
        if !point.is_finite() {
            return Err(WorldError::InvalidConstraint { reason: "anchor must be finite" });
        }
        let index = self.constraint_index(id)?;
        let constraint = &mut self.constraints[index].1;
        for anchor in [&mut constraint.b, &mut constraint.a] {
            if let Anchor::Point(p) = anchor {
                *p = point;
                return Ok(());
            }
        }
        Err(WorldError::InvalidConstraint { reason: "constraint has no point anchor" })
    }

    fn constraint_index(&self, id: ConstraintId) -> Result<usize, WorldError> {
        self.constraints
            .iter()
            .position(|(cid, _)| *cid == id)
            .ok_or(WorldError::ConstraintNotFound(id))
    }

    /// Bodies in insertion order.
    pub fn bodies(&self) -> &[Body<F>] {
        &self.bodies
    }

    /// Constraints in insertion order, which is also solve order.
    pub fn constraints(&self) -> impl Iterator<Item = (ConstraintId, &DistanceConstraint<F>)> + '_ {
        self.constraints.iter().map(|(id, c)| (*id, c))
    }

    pub fn body_count(&self) -> usize { self.bodies.len() }
    pub fn constraint_count(&self) -> usize { self.constraints.len() }

    /// Current world position of a constraint anchor.
    pub fn anchor_position(&self, anchor: &Anchor<F>) -> Result<Vec2<F>, WorldError> {
        if let Some(body) = anchor.body() {
            self.body(body)?;
        }
        anchor_position(anchor, &self.bodies).ok_or(WorldError::InvalidConstraint { reason: "dangling anchor" })
    }

    /// Advance the simulation by `dt` (capped to `max_dt`).
    pub fn step(&mut self, dt: F) {
        self.step_with(dt, &mut NoOpStepObserver);
    }

    pub fn step_with<O: StepObserver>(&mut self, dt: F, observer: &mut O) {
        if !dt.is_finite() || dt <= F::zero() {
            return;
        }
        let dt = dt.min(self.config.max_dt);
        let sub_steps = self.config.sub_steps.max(1);
        let iterations = self.config.iterations.max(1);
        let h = dt / F::from_usize(sub_steps);
        let pull_dt = h / F::from_usize(iterations);
        let mut clamped = 0usize;

        for _sub in 0..sub_steps {
            for body in self.bodies.iter_mut() {
                body.integrate(h, self.config.gravity);
            }
            self.contain(false);
            observer.on_integrate();

            for i in 0..iterations {
                for (id, constraint) in self.constraints.iter() {
                    if let Some(requested) = constraint.solve(&mut self.bodies, self.config.max_correction, pull_dt) {
                        clamped += 1;
                        observer.on_correction_clamped(*id, requested.to_f64());
                    }
                }
                observer.on_constraint_iteration(i);
            }

            for body in self.bodies.iter_mut() {
                body.derive_velocity(h);
            }
            for (_, constraint) in self.constraints.iter() {
                constraint.damp(&mut self.bodies);
            }
            self.contain(true);

            let max_speed = self.config.max_speed;
            for body in self.bodies.iter_mut() {
                body.velocity = body.velocity.clamp_length(max_speed);
            }
        }

        if clamped > CLAMP_WARN_THRESHOLD {
            warn!(clamped = clamped, "constraint corrections hit the displacement cap");
        } else if clamped > 0 {
            trace!(clamped = clamped, "constraint corrections clamped");
        }
        observer.on_step_complete();
    }

    /// Keep every free body inside the bounds. With `respond`, the normal
    /// velocity bounces by restitution and the tangential part loses friction.
    fn contain(&mut self, respond: bool) {
        let bounds = self.bounds;
        for body in self.bodies.iter_mut() {
            if body.is_pinned() {
                continue;
            }
            let hit = bounds.contain(body.position, body.shape.half_extents());
            if !hit.touched() {
                continue;
            }
            body.position = hit.position;
            if !respond {
                continue;
            }
            let material = body.material;
            if let Some(edge) = hit.x {
                body.velocity.x = bounce(body.velocity.x, edge, material.restitution);
                body.velocity.y = body.velocity.y * (F::one() - material.friction);
            }
            if let Some(edge) = hit.y {
                body.velocity.y = bounce(body.velocity.y, edge, material.restitution);
                body.velocity.x = body.velocity.x * (F::one() - material.friction);
            }
        }
    }
}

/// Reflect a velocity component heading out through `edge`.
fn bounce<F: Float>(v: F, edge: Edge, restitution: F) -> F {
    let outward = match edge {
        Edge::Min => v < F::zero(),
        Edge::Max => v > F::zero(),
    };
    if outward { -v * restitution } else { v }
}

//! Step observer trait for monitoring the solver.

use crate::constraint::ConstraintId;

/// Hooks into [`World::step_with`](crate::World::step_with).
///
/// All methods default to no-ops.
pub trait StepObserver {
    /// Called after all bodies have been integrated and contained.
    fn on_integrate(&mut self) {}

    /// Called after each constraint relaxation pass.
    fn on_constraint_iteration(&mut self, _iteration: usize) {}

    /// Called when a constraint asked for more than `max_correction`.
    fn on_correction_clamped(&mut self, _constraint: ConstraintId, _requested: f64) {}

    /// Called when a step (all sub-steps) is complete.
    fn on_step_complete(&mut self) {}
}

/// Observer that ignores everything.
pub struct NoOpStepObserver;

impl StepObserver for NoOpStepObserver {}

//! Configuration types for the world solver.

use crate::float::Float;
use crate::vec::Vec2;

/// Configuration for the constraint solver and simulation.
///
/// # Builder Pattern
/// ```
/// use beadchain::config::SolverConfig;
/// use beadchain::vec::Vec2;
///
/// let config: SolverConfig<f32> = SolverConfig::new()
///     .with_iterations(8)
///     .with_gravity(Vec2::new(0.0, 98.0))
///     .with_sub_steps(2);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverConfig<F: Float> {
    /// Constraint relaxation passes per sub-step. At least 1. Default: 6.
    pub iterations: usize,
    /// Sub-steps per `step` call. Default: 1.
    pub sub_steps: usize,
    /// Gravity acceleration. Default: zero, the chain floats.
    pub gravity: Vec2<F>,
    /// Largest position correction one constraint may apply per iteration.
    /// A blow-up guard only. Default: 64.
    pub max_correction: F,
    /// Speed cap applied at the end of each sub-step. Default: 4000.
    pub max_speed: F,
    /// Largest `dt` a single `step` accepts; longer steps are shortened. Default: 1/30 s.
    pub max_dt: F,
}

impl<F: Float> SolverConfig<F> {
    /// Create a new config with default values.
    pub fn new() -> Self {
        SolverConfig {
            iterations: 6,
            sub_steps: 1,
            gravity: Vec2::zero(),
            max_correction: F::from_f32(64.0),
            max_speed: F::from_f32(4000.0),
            max_dt: F::one() / F::from_f32(30.0),
        }
    }

    /// Set the number of constraint iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations.max(1);
        self
    }

    /// Set the number of sub-steps.
    pub fn with_sub_steps(mut self, sub_steps: usize) -> Self {
        self.sub_steps = sub_steps.max(1);
        self
    }

    /// Set the gravity vector.
    pub fn with_gravity(mut self, gravity: Vec2<F>) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the per-iteration correction cap.
    pub fn with_max_correction(mut self, max_correction: F) -> Self {
        self.max_correction = max_correction;
        self
    }

    /// Set the speed cap.
    pub fn with_max_speed(mut self, max_speed: F) -> Self {
        self.max_speed = max_speed;
        self
    }

    /// Set the longest accepted step.
    pub fn with_max_dt(mut self, max_dt: F) -> Self {
        self.max_dt = max_dt;
        self
    }
}

impl<F: Float> Default for SolverConfig<F> {
    fn default() -> Self {
        Self::new()
    }
}

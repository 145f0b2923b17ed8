//! Fixed-timestep accumulator that turns frame time into solver steps.

use tracing::trace;

use crate::float::Float;

/// Splits real elapsed time into fixed-size steps.
///
/// Long frames (a backgrounded tab, a debugger pause) produce at most
/// `max_steps_per_frame` steps; the rest of the time is dropped rather than
/// simulated as one oversized step.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameClock<F: Float> {
    pub fixed_dt: F,
    pub max_steps_per_frame: usize,
    accumulator: F,
}

impl<F: Float> FrameClock<F> {
    pub fn new(fixed_dt: F, max_steps_per_frame: usize) -> Self {
        FrameClock {
            fixed_dt,
            max_steps_per_frame: max_steps_per_frame.max(1),
            accumulator: F::zero(),
        }
    }

    /// Add `elapsed` seconds and return how many fixed steps are due.
    pub fn advance(&mut self, elapsed: F) -> usize {
        if !elapsed.is_finite() || elapsed <= F::zero() || self.fixed_dt <= F::zero() {
            return 0;
        }
        self.accumulator = self.accumulator + elapsed;
        let mut steps = 0;
        while self.accumulator >= self.fixed_dt && steps < self.max_steps_per_frame {
            self.accumulator = self.accumulator - self.fixed_dt;
            steps += 1;
        }
        if self.accumulator >= self.fixed_dt {
            trace!(dropped = self.accumulator.to_f64(), "frame time exceeded step budget");
            self.accumulator = F::zero();
        }
        steps
    }

    /// Time carried over to the next frame.
    pub fn pending(&self) -> F {
        self.accumulator
    }

    pub fn reset(&mut self) {
        self.accumulator = F::zero();
    }
}

impl<F: Float> Default for FrameClock<F> {
    fn default() -> Self {
        Self::new(F::one() / F::from_f32(60.0), 5)
    }
}

// src/time.rs
//! Fixed timestep accumulator for the native simulation.
//!
//! Variable frame deltas go in, whole `fixed_dt` slices come out, with a catch-up limit so a
//! long frame cannot spiral into an unbounded number of steps.

/// Accumulates frame time and hands it out in fixed slices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepClock {
    accumulator: f32,
    fixed_dt: f32,
    max_steps: u32,
}

impl StepClock {
    #[inline]
    pub fn new(fixed_dt: f32, max_steps: u32) -> Self {
        Self { accumulator: 0.0, fixed_dt, max_steps: max_steps.max(1) }
    }

    #[inline(always)]
    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    #[inline(always)]
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Adds frame time. Anything beyond `max_steps` slices is dropped.
    #[inline]
    pub fn accumulate(&mut self, delta: f32) {
        if delta > 0.0 {
            let cap = self.fixed_dt * self.max_steps as f32;
            self.accumulator = (self.accumulator + delta).min(cap);
        }
    }

    /// Iterator over the slices ready to simulate.
    /// Usage: `for dt in clock.steps() { world.step(dt); }`
    #[inline]
    pub fn steps(&mut self) -> FixedTimestepIter<'_> {
        FixedTimestepIter {
            accumulator: &mut self.accumulator,
            fixed_dt: self.fixed_dt,
            max_steps: self.max_steps,
        }
    }

    #[inline]
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

/// Fixed timestep iterator (zero-allocation, safe catch-up).
pub struct FixedTimestepIter<'a> {
    accumulator: &'a mut f32,
    fixed_dt: f32,
    max_steps: u32,
}

impl Iterator for FixedTimestepIter<'_> {
    type Item = f32;

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        if self.fixed_dt > 0.0 && *self.accumulator >= self.fixed_dt && self.max_steps > 0 {
            *self.accumulator -= self.fixed_dt;
            self.max_steps -= 1;
            Some(self.fixed_dt)
        } else {
            None
        }
    }
}

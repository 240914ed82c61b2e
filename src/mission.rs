// src/mission.rs

//! # Operator Commands and Target Presets
//!
//! Commands an operator sends to a running controller: arm switch changes,
//! explicit targets and a few preset maneuvers. A circular trajectory
//! generator produces a moving target for continuous tracking tests.

use crate::controller::flight_controller::{cast, Number};
use crate::geometry::Axes;
use num_traits::Float;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Preset targets, relative to the session origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Maneuver {
    /// One meter along +x at hover height.
    StepPositiveX,
    /// One meter along -x at hover height.
    StepNegativeX,
    /// Half a meter above the origin.
    ReturnToStart,
}

impl Maneuver {
    /// Target of the maneuver as x, y, z and yaw.
    pub fn target<T: Number>(self) -> Axes<T> {
        let (x, y, z) = match self {
            Maneuver::StepPositiveX => (1.0, 0.0, 1.0),
            Maneuver::StepNegativeX => (-1.0, 0.0, 1.0),
            Maneuver::ReturnToStart => (0.0, 0.0, 0.5),
        };
        Axes::new(cast(x), cast(y), cast(z), T::zero())
    }
}

/// A command for a running controller.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OperatorCommand<T> {
    /// Flip the arm switch.
    ToggleArm,
    /// Arm.
    Arm,
    /// Disarm.
    Disarm,
    /// Hold an explicit target.
    SetTarget(Axes<T>),
    /// Fly a preset maneuver.
    Maneuver(Maneuver),
    /// Follow the [`CircleTrajectory`] until another target is set.
    StartCircle,
    /// Stop circling and hold the current target.
    StopCircle,
}

/// Circle of one meter radius through the origin at one meter height.
///
/// At time `t` the target is `(cos(at) - 1, sin(at), 1, 0)` with
/// `a = 2π / period`, so it starts right above the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CircleTrajectory<T> {
    period_ms: T,
    elapsed_ms: T,
}

impl<T: Number> CircleTrajectory<T> {
    /// Default lap time in milliseconds.
    pub const DEFAULT_PERIOD_MS: f64 = 30_000.0;

    /// Creates a trajectory with the given lap time in milliseconds.
    pub fn new(period_ms: T) -> Self {
        Self {
            period_ms,
            elapsed_ms: T::zero(),
        }
    }

    /// Target at `t_ms` milliseconds into the lap.
    pub fn target_at(&self, t_ms: T) -> Axes<T> {
        let angle = T::TAU() / self.period_ms * t_ms;
        let one = T::one();
        Axes::new(Float::cos(angle) - one, Float::sin(angle), one, T::zero())
    }

    /// Moves along the circle by `dt_ms` and returns the new target.
    pub fn advance(&mut self, dt_ms: T) -> Axes<T> {
        self.elapsed_ms = self.elapsed_ms + dt_ms;
        self.target_at(self.elapsed_ms)
    }

    /// Time travelled so far in milliseconds.
    pub fn elapsed_ms(&self) -> T {
        self.elapsed_ms
    }

    /// Lap time in milliseconds.
    pub fn period_ms(&self) -> T {
        self.period_ms
    }
}

impl<T: Number> Default for CircleTrajectory<T> {
    fn default() -> Self {
        Self::new(cast(Self::DEFAULT_PERIOD_MS))
    }
}

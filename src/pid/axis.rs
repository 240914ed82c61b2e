// src/pid/axis.rs

//! # Axis PID Control Module
//!
//! This module provides a compute function and control data structure
//! to perform error-driven PID (Proportional-Integral-Derivative) control
//! of a single position or heading axis. The caller supplies the error
//! directly, which lets the heading axis use a wrapped angular error.
//!
//! The integral uses the rectangle rule and the derivative a two point
//! backward difference. The integral is not limited; there is no anti-windup.

use crate::controller::flight_controller::Number;
use num_traits::Float;
use piddiy::PidController;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Proportional, integral and derivative gains.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PidGains<T> {
    /// Proportional gain.
    pub kp: T,
    /// Integral gain.
    pub ki: T,
    /// Derivative gain.
    pub kd: T,
}

impl<T: Number> PidGains<T> {
    /// Creates a gain set.
    pub fn new(kp: T, ki: T, kd: T) -> Self {
        Self { kp, ki, kd }
    }

    /// `true` when every gain is a finite number.
    pub fn is_finite(&self) -> bool {
        Float::is_finite(self.kp) && Float::is_finite(self.ki) && Float::is_finite(self.kd)
    }
}

impl<T: Number> Default for PidGains<T> {
    fn default() -> Self {
        Self::new(T::one(), T::zero(), T::zero())
    }
}

/// Terms and output of the most recent evaluation, kept for telemetry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidTerms<T> {
    /// Proportional term, the error itself.
    pub p: T,
    /// Accumulated integral of the error.
    pub i: T,
    /// Backward difference of the error.
    pub d: T,
    /// Negated weighted sum of the terms.
    pub output: T,
}

impl<T: Number> PidTerms<T> {
    fn zero() -> Self {
        Self {
            p: T::zero(),
            i: T::zero(),
            d: T::zero(),
            output: T::zero(),
        }
    }
}

/// Handling of a zero, negative or non-finite time step.
///
/// Duplicate or out-of-order timestamps produce such a step, which would
/// otherwise turn the derivative infinite and poison the integral.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DegenerateDt<T> {
    /// Hold the integral and drop the derivative for this step. The
    /// proportional term still applies and the previous error advances.
    #[default]
    Hold,
    /// Never integrate or differentiate over less than this step.
    ClampTo(T),
}

/// Control data for the error-driven PID compute callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorControlData<T> {
    /// Signed error, measurement minus target.
    pub error: T,
    /// The time delta since the last computation.
    pub dt: T,
    /// Skip integral and derivative updates for this step.
    pub hold: bool,
}

/// Error-driven PID compute callback.
pub fn compute_error<T: Number>(
    pid: &mut PidController<T, ErrorControlData<T>>,
    data: ErrorControlData<T>,
) -> (T, T, T) {
    if data.hold {
        return (data.error, pid.integral, T::zero());
    }
    let integral = pid.integral + data.dt * data.error;
    let derivative = (data.error - pid.error) / data.dt;

    (data.error, integral, derivative)
}

/// PID controller for one axis.
///
/// The output is negated: a measurement ahead of its target yields a
/// command in the negative direction.
pub struct AxisPid<T: Number> {
    pid: PidController<T, ErrorControlData<T>>,
    terms: PidTerms<T>,
    degenerate_dt: DegenerateDt<T>,
}

impl<T: Number> AxisPid<T> {
    /// Creates a controller with the given gains and zeroed history.
    pub fn new(gains: PidGains<T>) -> Self {
        Self {
            pid: Self::controller(gains),
            terms: PidTerms::zero(),
            degenerate_dt: DegenerateDt::Hold,
        }
    }

    /// Sets the degenerate time step policy.
    pub fn with_degenerate_dt(mut self, policy: DegenerateDt<T>) -> Self {
        self.degenerate_dt = policy;
        self
    }

    fn controller(gains: PidGains<T>) -> PidController<T, ErrorControlData<T>> {
        let mut pid = PidController::new();
        pid.compute_fn(compute_error)
            .kp(gains.kp)
            .ki(gains.ki)
            .kd(gains.kd);
        pid
    }

    /// Replaces the gains and clears the integral, previous error and terms.
    pub fn initialize(&mut self, gains: PidGains<T>) {
        self.pid = Self::controller(gains);
        self.terms = PidTerms::zero();
    }

    /// Sets the previous error without touching the integral, so the next
    /// derivative is taken against `error`.
    pub fn seed(&mut self, error: T) {
        self.pid.error = error;
    }

    /// Runs one step and returns `-(kp * P + ki * I + kd * D)`.
    pub fn evaluate(&mut self, error: T, dt: T) -> T {
        let data = self.control_data(error, dt);
        let (p, i, d) = compute_error(&mut self.pid, data);
        let output = -self.pid.compute(data);
        self.terms = PidTerms { p, i, d, output };
        output
    }

    fn control_data(&self, error: T, dt: T) -> ErrorControlData<T> {
        let usable = Float::is_finite(dt) && T::zero() < dt;
        match self.degenerate_dt {
            DegenerateDt::Hold if !usable => {
                log::warn!("dt {} is not usable, holding integral and derivative", dt);
                ErrorControlData {
                    error,
                    dt,
                    hold: true,
                }
            }
            DegenerateDt::Hold => ErrorControlData {
                error,
                dt,
                hold: false,
            },
            DegenerateDt::ClampTo(min_dt) => {
                let dt = if usable {
                    Float::max(dt, min_dt)
                } else {
                    log::warn!("dt {} is not usable, clamping to {}", dt, min_dt);
                    min_dt
                };
                ErrorControlData {
                    error,
                    dt,
                    hold: false,
                }
            }
        }
    }

    /// Current gains.
    pub fn gains(&self) -> PidGains<T> {
        PidGains::new(self.pid.kp, self.pid.ki, self.pid.kd)
    }

    /// Terms of the most recent evaluation.
    pub fn terms(&self) -> PidTerms<T> {
        self.terms
    }

    /// Accumulated integral.
    pub fn integral(&self) -> T {
        self.pid.integral
    }

    /// Error seen by the most recent evaluation or seed.
    pub fn previous_error(&self) -> T {
        self.pid.error
    }
}

// src/controller/flight_controller.rs

//! A module specifying the shared interface for motion-capture position
//! controllers. It includes the numeric trait the control math is generic
//! over, a configuration structure for targets, limits and PID gains, and a
//! trait defining the per-sample control step.

use crate::channels::{AttitudeCommand, Bounds, CommandAxis, Direction, PulseFrame, CHANNEL_COUNT};
use crate::error::{ControlError, ControlResult};
use crate::geometry::{Axes, Axis, Position, RigidBodyPose};
use crate::pid::{DegenerateDt, PidGains};
use core::fmt::{Debug, Display};
use num_traits::{Float, FloatConst, NumCast, ToPrimitive};
use piddiy::Number as PiddiyNumber;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Custom trait to encapsulate base number requirements.
///
/// Trigonometry is needed for heading, so only floating point types qualify.
pub trait Number: PiddiyNumber + Float + FloatConst + Debug + Display {}

impl<T: PiddiyNumber + Float + FloatConst + Debug + Display> Number for T {}

/// Converts between numeric types, yielding NaN when `value` does not fit.
pub(crate) fn cast<T: Number, V: ToPrimitive>(value: V) -> T {
    <T as NumCast>::from(value).unwrap_or_else(T::nan)
}

/// Configuration for targets, limits, PID gains and other settings.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FlightControllerConfig<T: Number> {
    /// Initial position and heading target, relative to the session origin.
    pub target: Axes<T>,
    /// Fixed world frame origin. `None` captures the first sample position.
    pub origin: Option<Position<T>>,
    /// Command limits applied after rounding, per vehicle frame axis.
    pub limits: AttitudeCommand<Bounds>,
    /// Polarity of every transmitter channel.
    pub directions: [Direction; CHANNEL_COUNT],
    /// Offset from the neutral throttle that approximately hovers.
    pub throttle_trim: i32,
    /// PID gains for x, y, z and yaw.
    pub gains: Axes<PidGains<T>>,
    /// Policy for zero or negative frame intervals.
    pub degenerate_dt: DegenerateDt<T>,
}

impl<T: Number> FlightControllerConfig<T> {
    /// Creates a new configuration with default values for all parameters.
    /// Gains default to a unit proportional term, limits to ±100 and every
    /// channel to normal direction.
    /// These should be replaced with meaningful values that are tuned for the
    /// aircraft.
    ///
    /// Example Usage
    /// ```
    /// use mocap_flight_control::controller::flight_controller::FlightControllerConfig;
    /// use mocap_flight_control::geometry::Axes;
    /// use mocap_flight_control::pid::PidGains;
    ///
    /// let mut config = FlightControllerConfig::<f64>::new();
    ///
    /// // Hold one meter above the starting point.
    /// config.target = Axes::new(0.0, 0.0, 1.0, 0.0);
    ///
    /// // Add an extra 10 to the throttle so zero command roughly hovers.
    /// config.throttle_trim = 10;
    ///
    /// // Gains are in command units per meter (or radian) and milliseconds.
    /// config.gains = Axes::new(
    ///     PidGains::new(18.0, 0.001, 21000.0),
    ///     PidGains::new(18.0, 0.001, 21000.0),
    ///     PidGains::new(200.0, 0.001, 80000.0),
    ///     PidGains::new(100.0, 0.0, 10000.0),
    /// );
    ///
    /// // The configuration is ready to use.
    /// use mocap_flight_control::controller::position::PositionController;
    ///
    /// let controller = PositionController::new(2, config).unwrap();
    /// assert!(!controller.is_armed());
    /// ```
    pub fn new() -> Self {
        Self {
            target: Axes::new(T::zero(), T::zero(), T::zero(), T::zero()),
            origin: None,
            limits: AttitudeCommand::new(
                Bounds::default(),
                Bounds::default(),
                Bounds::default(),
                Bounds::default(),
            ),
            directions: [Direction::Normal; CHANNEL_COUNT],
            throttle_trim: 0,
            gains: Axes::new(
                PidGains::default(),
                PidGains::default(),
                PidGains::default(),
                PidGains::default(),
            ),
            degenerate_dt: DegenerateDt::Hold,
        }
    }

    /// Checks the configuration before it reaches a controller.
    pub fn validate(&self) -> ControlResult<()> {
        for axis in CommandAxis::ALL {
            let Bounds { min, max } = self.limits[axis];
            if min > max {
                return Err(ControlError::InvertedBounds { axis, min, max });
            }
        }
        for axis in Axis::ALL {
            if !self.gains[axis].is_finite() {
                return Err(ControlError::NonFiniteGain { axis });
            }
        }
        validate_target(&self.target)?;
        if let DegenerateDt::ClampTo(min_dt) = self.degenerate_dt {
            if !(Float::is_finite(min_dt) && T::zero() < min_dt) {
                return Err(ControlError::InvalidMinimumDt);
            }
        }
        Ok(())
    }
}

impl<T: Number> Default for FlightControllerConfig<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Rejects targets with NaN or infinite components.
pub fn validate_target<T: Number>(target: &Axes<T>) -> ControlResult<()> {
    for axis in Axis::ALL {
        if !Float::is_finite(target[axis]) {
            return Err(ControlError::NonFiniteTarget { axis });
        }
    }
    Ok(())
}

/// One pose delivery from the motion-capture source.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoseSample<T: Number> {
    /// Tracked pose.
    pub pose: RigidBodyPose<T>,
    /// Capture time in hardware clock ticks.
    pub timestamp: u64,
    /// Frame counter of the source.
    pub frame: i32,
    /// Tick rate of the timestamp clock in ticks per second.
    pub clock_frequency: u64,
}

/// A rigid body entry of a motion-capture frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackedBody<T: Number> {
    /// Streaming id assigned by the motion-capture server.
    pub id: i32,
    /// The body was tracked in this frame.
    pub tracking_valid: bool,
    /// Tracked pose.
    pub pose: RigidBodyPose<T>,
}

/// All rigid bodies of one motion-capture frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MocapFrame<'a, T: Number> {
    /// Rigid bodies in this frame.
    pub bodies: &'a [TrackedBody<T>],
    /// Capture time in hardware clock ticks.
    pub timestamp: u64,
    /// Frame counter of the source.
    pub frame: i32,
    /// Tick rate of the timestamp clock in ticks per second.
    pub clock_frequency: u64,
}

/// A trait for position controllers that turn pose samples into
/// transmitter pulse widths.
pub trait FlightController<T: Number> {
    /// Takes one pose sample, runs the control law and returns the pulse
    /// widths for all transmitter channels.
    ///
    /// Calls for the same aircraft must not overlap.
    fn update(&mut self, sample: &PoseSample<T>) -> ControlResult<PulseFrame>;
}

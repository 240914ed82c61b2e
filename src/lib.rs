// src/lib.rs

//! # Motion-Capture Quadrotor Position Controller
//!
//! This crate turns rigid body poses streamed by a motion-capture system into
//! eight channel PPM pulse widths for a hobby transmitter. Four PID
//! (Proportional, Integral, Derivative) controllers hold x, y, z and yaw on a
//! target relative to where the aircraft was first seen; the horizontal
//! commands are rotated into the vehicle heading frame, rounded, clamped and
//! laid out in transmitter channel order.
//!
//! The control core is `no_std` and allocation free. The `std` feature adds
//! a lock protected handle for sharing one controller between threads.

#![cfg_attr(not(any(feature = "std", test)), no_std)]
#![deny(missing_docs)]

pub mod channels;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod mission;
pub mod pid;
#[cfg(feature = "std")]
pub mod shared;
pub mod telemetry;

#[doc(inline)]
pub use channels::{ChannelFrame, Direction, PulseFrame};
#[doc(inline)]
pub use controller::*;
#[doc(inline)]
pub use error::{ControlError, ControlResult};
#[doc(inline)]
pub use geometry::{Axes, Axis, Position, Quaternion, RigidBodyPose};
#[doc(inline)]
pub use mission::{CircleTrajectory, Maneuver, OperatorCommand};
#[doc(inline)]
pub use pid::{DegenerateDt, PidGains};
#[cfg(feature = "std")]
#[doc(inline)]
pub use shared::SharedController;
#[doc(inline)]
pub use telemetry::{TelemetryRecord, TELEMETRY_HEADER};

#[cfg(test)]
mod test_utils;

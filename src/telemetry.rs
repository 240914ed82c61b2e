// src/telemetry.rs

//! # Flight Log Records
//!
//! Per-sample snapshot of the controller in the column layout of the flight
//! log CSV. Records are rendered with `Display`; where they are written is up
//! to the caller.

use crate::channels::ChannelFrame;
use crate::controller::flight_controller::Number;
use crate::geometry::{Axes, Axis, Quaternion};
use crate::pid::{PidGains, PidTerms};
use core::fmt;

/// CSV header matching the `Display` output of [`TelemetryRecord`], without
/// a trailing newline.
pub const TELEMETRY_HEADER: &str = concat!(
    "frame number, time_at_capture",
    ", pos_x, target_x, pid_x_Kp, pid_x_Ki, pid_x_Kd, pid_x_P, pid_x_I, pid_x_D, pid_x_output",
    ", pos_y, target_y, pid_y_Kp, pid_y_Ki, pid_y_Kd, pid_y_P, pid_y_I, pid_y_D, pid_y_output",
    ", pos_z, target_z, pid_z_Kp, pid_z_Ki, pid_z_Kd, pid_z_P, pid_z_I, pid_z_D, pid_z_output",
    ", yaw, yaw_target, pid_yaw_Kp, pid_yaw_Ki, pid_yaw_Kd, pid_yaw_P, pid_yaw_I, pid_yaw_D, pid_yaw_output",
    ", qx, qy, qz, qw",
    ", chn_1, chn_2, chn_3, chn_4, chn_5, chn_6, chn_7, chn_8",
);

/// Log columns for one controlled axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisTelemetry<T> {
    /// Measured position, or yaw for the heading axis.
    pub measured: T,
    /// Target value.
    pub target: T,
    /// PID gains.
    pub gains: PidGains<T>,
    /// PID terms of the latest step.
    pub terms: PidTerms<T>,
}

/// One flight log row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryRecord<T: Number> {
    /// Frames since the session start.
    pub frame: i64,
    /// Milliseconds since the session start.
    pub elapsed_ms: T,
    /// Per axis measurements, targets and PID state.
    pub axes: Axes<AxisTelemetry<T>>,
    /// Raw orientation.
    pub orientation: Quaternion<T>,
    /// Channel values before pulse scaling.
    pub channels: ChannelFrame,
}

impl<T: Number> fmt::Display for TelemetryRecord<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {:.5}", self.frame, self.elapsed_ms)?;
        for axis in Axis::ALL {
            let row = &self.axes[axis];
            for value in [
                row.measured,
                row.target,
                row.gains.kp,
                row.gains.ki,
                row.gains.kd,
                row.terms.p,
                row.terms.i,
                row.terms.d,
                row.terms.output,
            ] {
                write!(f, ", {:.5}", value)?;
            }
        }
        let q = &self.orientation;
        write!(f, ", {:.5}, {:.5}, {:.5}, {:.5}", q.x, q.y, q.z, q.w)?;
        for channel in self.channels.0 {
            write!(f, ", {}", channel)?;
        }
        Ok(())
    }
}

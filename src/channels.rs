// src/channels.rs

//! # Transmitter Channels
//!
//! Conversion of attitude commands into the eight channel values the RC
//! transmitter bridge consumes. Commands live in a ±100 domain until the last
//! step, where they are scaled to PPM pulse widths around 1500.

use crate::controller::flight_controller::{cast, Number};
use crate::error::{ControlError, ControlResult};
use crate::geometry::Axes;
use core::fmt;
use core::ops::{Index, IndexMut};
use num_traits::{Float, ToPrimitive};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of transmitter channels.
pub const CHANNEL_COUNT: usize = 8;

/// Pulse width at the channel center.
pub const PULSE_CENTER: i32 = 1500;

/// Pulse width units per command unit. ±100 spans ±500 around the center.
pub const PULSE_SCALE: i32 = 5;

/// Command value for full-low stick, also used for unused channels.
pub const COMMAND_LOW: i32 = -100;

/// Command value for full-high stick.
pub const COMMAND_HIGH: i32 = 100;

/// Vehicle frame command axis, in clamp-bound order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CommandAxis {
    /// Roll, clockwise viewed from behind is positive.
    Roll,
    /// Pitch, nose down is positive.
    Pitch,
    /// Collective thrust.
    Thrust,
    /// Yaw rate.
    Yaw,
}

impl CommandAxis {
    /// All command axes in clamp-bound order.
    pub const ALL: [CommandAxis; 4] = [
        CommandAxis::Roll,
        CommandAxis::Pitch,
        CommandAxis::Thrust,
        CommandAxis::Yaw,
    ];
}

impl fmt::Display for CommandAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandAxis::Roll => "roll",
            CommandAxis::Pitch => "pitch",
            CommandAxis::Thrust => "thrust",
            CommandAxis::Yaw => "yaw",
        };
        f.write_str(name)
    }
}

/// A value for each vehicle frame command axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AttitudeCommand<T> {
    /// Roll command.
    pub roll: T,
    /// Pitch command.
    pub pitch: T,
    /// Thrust command.
    pub thrust: T,
    /// Yaw command.
    pub yaw: T,
}

impl<T> AttitudeCommand<T> {
    /// Builds the command from its four components.
    pub const fn new(roll: T, pitch: T, thrust: T, yaw: T) -> Self {
        Self {
            roll,
            pitch,
            thrust,
            yaw,
        }
    }
}

impl<T: Number> AttitudeCommand<T> {
    /// Rotates ground frame x/y commands into the vehicle heading frame and
    /// adds the throttle trim to the vertical command.
    pub fn from_ground_frame(command: Axes<T>, yaw: T, throttle_trim: i32) -> Self {
        let (sin, cos) = (Float::sin(yaw), Float::cos(yaw));
        let trim: T = cast(throttle_trim);
        Self {
            roll: command.x * cos + command.y * sin,
            pitch: command.y * cos - command.x * sin,
            thrust: command.z + trim,
            yaw: command.yaw,
        }
    }

    /// Rounds every axis half away from zero and clamps it into `limits`.
    pub fn quantize(&self, limits: &AttitudeCommand<Bounds>) -> ControlResult<AttitudeCommand<i32>> {
        let mut quantized = AttitudeCommand::default();
        for axis in CommandAxis::ALL {
            quantized[axis] = limits[axis].quantize(self[axis], axis)?;
        }
        Ok(quantized)
    }
}

impl<T> Index<CommandAxis> for AttitudeCommand<T> {
    type Output = T;

    fn index(&self, axis: CommandAxis) -> &T {
        match axis {
            CommandAxis::Roll => &self.roll,
            CommandAxis::Pitch => &self.pitch,
            CommandAxis::Thrust => &self.thrust,
            CommandAxis::Yaw => &self.yaw,
        }
    }
}

impl<T> IndexMut<CommandAxis> for AttitudeCommand<T> {
    fn index_mut(&mut self, axis: CommandAxis) -> &mut T {
        match axis {
            CommandAxis::Roll => &mut self.roll,
            CommandAxis::Pitch => &mut self.pitch,
            CommandAxis::Thrust => &mut self.thrust,
            CommandAxis::Yaw => &mut self.yaw,
        }
    }
}

/// Inclusive command range for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bounds {
    /// Lowest allowed command.
    pub min: i32,
    /// Highest allowed command.
    pub max: i32,
}

impl Bounds {
    /// Builds a range from its limits.
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// Clamps an integer command into the range.
    pub fn clamp(&self, value: i32) -> i32 {
        if value > self.max {
            self.max
        } else if value < self.min {
            self.min
        } else {
            value
        }
    }

    /// Rounds `value` half away from zero, then clamps it.
    ///
    /// Values beyond the `i32` range, infinities included, saturate at the
    /// nearest bound. NaN is an error.
    pub fn quantize<T: Number>(&self, value: T, axis: CommandAxis) -> ControlResult<i32> {
        let rounded = Float::round(value);
        if Float::is_nan(rounded) {
            return Err(ControlError::NonFiniteCommand { axis });
        }
        match ToPrimitive::to_i32(&rounded) {
            Some(command) => Ok(self.clamp(command)),
            None if rounded > T::zero() => Ok(self.max),
            None => Ok(self.min),
        }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(COMMAND_LOW, COMMAND_HIGH)
    }
}

/// What feeds one transmitter channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSource {
    /// A clamped attitude command.
    Command(CommandAxis),
    /// The arm switch.
    Arm,
    /// Not connected; held low.
    Unused,
}

/// Transmitter channel assignment, indexed by channel number.
pub const CHANNEL_MAP: [ChannelSource; CHANNEL_COUNT] = [
    ChannelSource::Command(CommandAxis::Thrust),
    ChannelSource::Command(CommandAxis::Roll),
    ChannelSource::Command(CommandAxis::Pitch),
    ChannelSource::Command(CommandAxis::Yaw),
    ChannelSource::Arm,
    ChannelSource::Unused,
    ChannelSource::Unused,
    ChannelSource::Unused,
];

/// Arm channel value: high is disarmed, low is armed.
pub const fn arm_command(armed: bool) -> i32 {
    if armed {
        COMMAND_LOW
    } else {
        COMMAND_HIGH
    }
}

/// Channel polarity on the transmitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Command and pulse move together.
    #[default]
    Normal,
    /// Command is mirrored around the center pulse.
    Reversed,
}

impl Direction {
    /// Sign multiplier for the pulse mapping.
    pub const fn sign(self) -> i32 {
        match self {
            Direction::Normal => 1,
            Direction::Reversed => -1,
        }
    }
}

/// Maps one channel command to a pulse width.
pub const fn pulse_width(direction: Direction, command: i32) -> i32 {
    direction.sign() * PULSE_SCALE * command + PULSE_CENTER
}

/// Pre-scale channel values in transmitter order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelFrame(pub [i32; CHANNEL_COUNT]);

impl ChannelFrame {
    /// Minimum throttle, centered sticks, disarmed.
    pub const IDLE: ChannelFrame = ChannelFrame([
        COMMAND_LOW,
        0,
        0,
        0,
        COMMAND_HIGH,
        COMMAND_LOW,
        COMMAND_LOW,
        COMMAND_LOW,
    ]);

    /// Lays the clamped commands and the arm state out per [`CHANNEL_MAP`].
    pub fn assemble(command: &AttitudeCommand<i32>, armed: bool) -> Self {
        let mut channels = [COMMAND_LOW; CHANNEL_COUNT];
        for (channel, source) in channels.iter_mut().zip(CHANNEL_MAP.iter()) {
            *channel = match *source {
                ChannelSource::Command(axis) => command[axis],
                ChannelSource::Arm => arm_command(armed),
                ChannelSource::Unused => COMMAND_LOW,
            };
        }
        ChannelFrame(channels)
    }

    /// Scales every channel to a pulse width using its direction.
    pub fn to_pulses(&self, directions: &[Direction; CHANNEL_COUNT]) -> PulseFrame {
        let mut pulses = [PULSE_CENTER; CHANNEL_COUNT];
        for ((pulse, command), direction) in pulses.iter_mut().zip(self.0).zip(directions) {
            *pulse = pulse_width(*direction, command);
        }
        PulseFrame(pulses)
    }
}

impl Default for ChannelFrame {
    fn default() -> Self {
        Self::IDLE
    }
}

/// Pulse widths ready for the transmitter bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseFrame(pub [i32; CHANNEL_COUNT]);

impl Default for PulseFrame {
    fn default() -> Self {
        ChannelFrame::IDLE.to_pulses(&[Direction::Normal; CHANNEL_COUNT])
    }
}

/// Serial line format of the bridge: each value followed by a single space.
impl fmt::Display for PulseFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for pulse in self.0 {
            write!(f, "{} ", pulse)?;
        }
        Ok(())
    }
}

// src/error.rs

//! Error type shared by the control modules.

use crate::channels::CommandAxis;
use crate::geometry::Axis;
use thiserror::Error;

/// Failures reported by the position controller.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlError {
    /// A command axis has its lower bound above its upper bound.
    #[error("{axis} bounds are inverted: min {min} > max {max}")]
    InvertedBounds {
        /// Offending command axis.
        axis: CommandAxis,
        /// Configured lower bound.
        min: i32,
        /// Configured upper bound.
        max: i32,
    },

    /// A PID gain is NaN or infinite.
    #[error("{axis} gains must be finite")]
    NonFiniteGain {
        /// Axis whose gain set is invalid.
        axis: Axis,
    },

    /// A target component is NaN or infinite.
    #[error("{axis} target must be finite")]
    NonFiniteTarget {
        /// Axis whose target is invalid.
        axis: Axis,
    },

    /// The minimum dt used by the clamping policy is not a positive, finite number.
    #[error("minimum dt must be positive and finite")]
    InvalidMinimumDt,

    /// The pose source reported a zero tick frequency.
    #[error("clock frequency must be non-zero")]
    InvalidClockFrequency,

    /// Commands were requested before any pose sample arrived.
    #[error("no pose sample has been ingested")]
    NoPoseSample,

    /// Configuration changes are only accepted before the first pose sample.
    #[error("controller is already tracking; configuration is locked")]
    ConfigureWhileTracking,

    /// A transformed command could not be rounded to a channel value.
    #[error("{axis} command is not a number")]
    NonFiniteCommand {
        /// Command axis that produced NaN.
        axis: CommandAxis,
    },
}

/// Result alias used throughout the crate.
pub type ControlResult<T> = Result<T, ControlError>;

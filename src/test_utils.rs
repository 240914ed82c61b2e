// src/test_utils.rs

//! This module contains utilities for testing.

use crate::geometry::{Axes, Axis};

/// A constant defining the tolerance within which floating-point values
/// are considered close enough to be equal.
pub const TEST_TOLERANCE: f64 = 1e-6;

/// Checks if two floating point numbers are close enough to be considered
/// equal.
///
/// # Arguments
/// * `target` - The target value.
/// * `value` - The value to compare against the target.
///
/// # Returns
/// `true` if the absolute difference between `target` and `value` is less than
/// `TEST_TOLERANCE`, otherwise `false`.
pub fn value_close(target: f64, value: f64) -> bool {
    (target - value).abs() < TEST_TOLERANCE
}

/// Checks if x, y, z and yaw are each close as per `value_close`.
pub fn axes_close(target: Axes<f64>, value: Axes<f64>) -> bool {
    Axis::ALL
        .iter()
        .all(|&axis| value_close(target[axis], value[axis]))
}

// src/geometry.rs

//! # Pose Geometry
//!
//! Labeled containers for the four controlled axes and the rigid body pose
//! reported by the motion-capture system, plus the yaw helpers the position
//! controller needs.

use crate::controller::flight_controller::Number;
use core::fmt;
use core::ops::{Index, IndexMut, Sub};
use num_traits::Float;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One of the four controlled axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    /// Ground frame x position.
    X,
    /// Ground frame y position.
    Y,
    /// Ground frame z position (height).
    Z,
    /// Heading.
    Yaw,
}

impl Axis {
    /// All axes in controller order.
    pub const ALL: [Axis; 4] = [Axis::X, Axis::Y, Axis::Z, Axis::Yaw];
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
            Axis::Yaw => "yaw",
        };
        f.write_str(name)
    }
}

/// A value for each of x, y, z and yaw.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Axes<T> {
    /// x component.
    pub x: T,
    /// y component.
    pub y: T,
    /// z component.
    pub z: T,
    /// Yaw component.
    pub yaw: T,
}

impl<T> Axes<T> {
    /// Builds the set from its four components.
    pub const fn new(x: T, y: T, z: T, yaw: T) -> Self {
        Self { x, y, z, yaw }
    }

    /// Applies `f` to every component.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Axes<U> {
        Axes {
            x: f(self.x),
            y: f(self.y),
            z: f(self.z),
            yaw: f(self.yaw),
        }
    }
}

impl<T> Index<Axis> for Axes<T> {
    type Output = T;

    fn index(&self, axis: Axis) -> &T {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
            Axis::Yaw => &self.yaw,
        }
    }
}

impl<T> IndexMut<Axis> for Axes<T> {
    fn index_mut(&mut self, axis: Axis) -> &mut T {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
            Axis::Yaw => &mut self.yaw,
        }
    }
}

/// Cartesian position in the motion-capture world frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position<T> {
    /// x coordinate.
    pub x: T,
    /// y coordinate.
    pub y: T,
    /// z coordinate.
    pub z: T,
}

impl<T> Position<T> {
    /// Builds a position from its coordinates.
    pub const fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }
}

impl<T: Number> Sub for Position<T> {
    type Output = Self;

    fn sub(self, origin: Self) -> Self {
        Self {
            x: self.x - origin.x,
            y: self.y - origin.y,
            z: self.z - origin.z,
        }
    }
}

/// Unit quaternion in the motion-capture component order (x, y, z, w).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Quaternion<T> {
    /// i component.
    pub x: T,
    /// j component.
    pub y: T,
    /// k component.
    pub z: T,
    /// Real component.
    pub w: T,
}

impl<T: Number> Quaternion<T> {
    /// Builds a quaternion from its components.
    pub const fn new(x: T, y: T, z: T, w: T) -> Self {
        Self { x, y, z, w }
    }

    /// The identity rotation.
    pub fn identity() -> Self {
        Self::new(T::zero(), T::zero(), T::zero(), T::one())
    }

    /// Rotation of `angle` radians about the vertical axis.
    pub fn from_heading(angle: T) -> Self {
        let half = angle / (T::one() + T::one());
        Self::new(T::zero(), T::zero(), Float::sin(half), Float::cos(half))
    }

    /// Vehicle yaw in radians, positive clockwise viewed from above.
    pub fn yaw(&self) -> T {
        let two = T::one() + T::one();
        -Float::atan2(
            two * (self.w * self.z + self.x * self.y),
            T::one() - two * (self.y * self.y + self.z * self.z),
        )
    }
}

impl<T: Number> Default for Quaternion<T> {
    fn default() -> Self {
        Self::identity()
    }
}

/// Position and orientation of one tracked rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RigidBodyPose<T: Number> {
    /// Position in the world frame.
    pub position: Position<T>,
    /// Orientation in the world frame.
    pub orientation: Quaternion<T>,
}

impl<T: Number> RigidBodyPose<T> {
    /// Builds a pose from position and orientation.
    pub fn new(position: Position<T>, orientation: Quaternion<T>) -> Self {
        Self {
            position,
            orientation,
        }
    }
}

/// Signed yaw error that takes the shorter way around the circle.
///
/// `yaw - target` and the same difference wrapped by a full turn are both
/// candidates; the one with the smaller magnitude wins. Ties keep the
/// unwrapped difference.
pub fn shortest_yaw_error<T: Number>(yaw: T, target: T) -> T {
    let direct = yaw - target;
    let turn = T::PI() + T::PI();
    let wrapped = if direct >= T::zero() {
        direct - turn
    } else {
        direct + turn
    };
    if Float::abs(direct) <= Float::abs(wrapped) {
        direct
    } else {
        wrapped
    }
}

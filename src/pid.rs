// src/pid.rs

//! # PID Control Module
//!
//! This module provides the compute function and control data structures
//! used to drive one position or heading axis through a PID controller.

pub mod axis;
pub use axis::*;

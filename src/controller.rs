// src/controller.rs

//! # Position Control Module
//!
//! This module provides the flight controller interface and the
//! motion-capture position controller that implements it.

pub mod flight_controller;
pub use flight_controller::*;
pub mod position;
pub use position::*;

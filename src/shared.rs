// src/shared.rs

//! # Shared Controller Handle
//!
//! A cloneable handle that serializes access to one [`PositionController`],
//! so the motion-capture callback and an operator input thread can drive the
//! same aircraft.

use crate::channels::PulseFrame;
use crate::controller::flight_controller::{FlightController, MocapFrame, Number, PoseSample};
use crate::controller::position::PositionController;
use crate::error::ControlResult;
use crate::geometry::Axes;
use crate::mission::OperatorCommand;
use crate::telemetry::TelemetryRecord;
use parking_lot::Mutex;
use std::sync::Arc;

/// Thread safe handle to one aircraft's controller.
pub struct SharedController<T: Number> {
    inner: Arc<Mutex<PositionController<T>>>,
}

impl<T: Number> Clone for SharedController<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Number> SharedController<T> {
    /// Wraps a controller.
    pub fn new(controller: PositionController<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    /// Runs one control step under the lock.
    pub fn update(&self, sample: &PoseSample<T>) -> ControlResult<PulseFrame> {
        self.inner.lock().update(sample)
    }

    /// Runs one control step from a motion-capture frame under the lock.
    pub fn process_frame(&self, frame: &MocapFrame<'_, T>) -> ControlResult<Option<PulseFrame>> {
        self.inner.lock().process_frame(frame)
    }

    /// Applies an operator command under the lock.
    pub fn apply(&self, command: OperatorCommand<T>) -> ControlResult<()> {
        self.inner.lock().apply(command)
    }

    /// Replaces the target.
    pub fn set_target(&self, target: Axes<T>) -> ControlResult<()> {
        self.inner.lock().set_target(target)
    }

    /// Sets the arm switch.
    pub fn set_armed(&self, armed: bool) {
        self.inner.lock().set_armed(armed);
    }

    /// Current arm switch state.
    pub fn is_armed(&self) -> bool {
        self.inner.lock().is_armed()
    }

    /// Snapshot for the flight log.
    pub fn telemetry(&self) -> Option<TelemetryRecord<T>> {
        self.inner.lock().telemetry()
    }

    /// Runs `f` with exclusive access to the controller.
    pub fn with<R>(&self, f: impl FnOnce(&mut PositionController<T>) -> R) -> R {
        let mut controller = self.inner.lock();
        f(&mut controller)
    }
}

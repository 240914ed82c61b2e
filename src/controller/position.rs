// src/controller/position.rs

//! # Motion-Capture Position Controller
//!
//! This module turns motion-capture pose samples of one aircraft into
//! transmitter channel commands. Four PID controllers hold x, y, z and yaw
//! on a target expressed relative to the point where the aircraft was first
//! seen.
//!
//! ## Control Step
//!
//! Each sample goes through three calls, in order:
//!
//! 1. [`PositionController::ingest_pose`] records the sample relative to the
//!    session origin and measures the time since the previous sample.
//! 2. [`PositionController::generate_commands`] computes the errors, runs the
//!    PID controllers, rotates the horizontal commands into the vehicle
//!    heading frame, rounds and clamps them, and lays them out in transmitter
//!    channel order.
//! 3. [`PositionController::map_to_pulse_range`] scales the channels to PPM
//!    pulse widths.
//!
//! [`FlightController::update`] chains all three. In circle mode it first
//! moves the target along the circle by the previous sample interval.
//!
//! ## Session Start
//!
//! The first sample fixes the origin, the start time and the start frame.
//! The first command after that is always minimum throttle with centered
//! sticks; the PID controllers only remember the first error so the second
//! sample does not see a derivative kick.
//!
//! ## Concurrency
//!
//! The controller mutates its state in place and has no internal locking.
//! Pose updates and target or arm changes for one aircraft must be
//! serialized by the caller, for example with `SharedController`.

use crate::channels::{AttitudeCommand, ChannelFrame, PulseFrame, COMMAND_LOW};
use crate::controller::flight_controller::{
    cast, validate_target, FlightController, FlightControllerConfig, MocapFrame, Number,
    PoseSample,
};
use crate::error::{ControlError, ControlResult};
use crate::geometry::{shortest_yaw_error, Axes, Axis, Position, Quaternion, RigidBodyPose};
use crate::mission::{CircleTrajectory, OperatorCommand};
use crate::pid::AxisPid;
use crate::telemetry::{AxisTelemetry, TelemetryRecord};

/// Latest pose sample, relative to the session start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation<T: Number> {
    /// Frames since the session start.
    pub frame: i64,
    /// Milliseconds since the session start.
    pub elapsed_ms: T,
    /// Milliseconds since the previous sample.
    pub dt_ms: T,
    /// Position relative to the session origin.
    pub position: Position<T>,
    /// Orientation as reported.
    pub orientation: Quaternion<T>,
}

/// Lifecycle of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerPhase {
    /// No pose sample yet.
    Uninitialized,
    /// Tracking; the next command is the fixed start command.
    Seeding,
    /// Tracking under closed-loop control.
    Steady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Seeding,
    Steady,
}

struct Session<T: Number> {
    origin: Position<T>,
    start_timestamp: u64,
    start_frame: i32,
    last_timestamp: u64,
    latest: Observation<T>,
}

enum Phase<T: Number> {
    Uninitialized,
    Tracking { session: Session<T>, stage: Stage },
}

/// Converts a signed tick interval to milliseconds.
///
/// Only intervals are converted; absolute tick counts do not fit the
/// mantissa of an `f32`.
fn ticks_to_ms<T: Number>(ticks: i128, clock_frequency: T) -> T {
    cast::<T, _>(ticks) * cast::<T, _>(1000) / clock_frequency
}

/// Ground frame command issued on the first control step: centered
/// sticks and a throttle that cancels the trim down to full low.
fn start_command<T: Number>(throttle_trim: i32) -> Axes<T> {
    let thrust = i64::from(COMMAND_LOW) - i64::from(throttle_trim);
    Axes::new(T::zero(), T::zero(), cast(thrust), T::zero())
}

/// Position and heading controller for one tracked aircraft.
pub struct PositionController<T: Number> {
    id: i32,
    config: FlightControllerConfig<T>,
    target: Axes<T>,
    circle: Option<CircleTrajectory<T>>,
    pids: Axes<AxisPid<T>>,
    armed: bool,
    phase: Phase<T>,
    yaw: T,
    error: Axes<T>,
    raw_command: Axes<T>,
    attitude_command: AttitudeCommand<T>,
    channels: ChannelFrame,
    pulses: PulseFrame,
}

impl<T: Number> PositionController<T> {
    /// Creates a disarmed controller for the rigid body with streaming id `id`.
    pub fn new(id: i32, config: FlightControllerConfig<T>) -> ControlResult<Self> {
        config.validate()?;
        let zero = Axes::new(T::zero(), T::zero(), T::zero(), T::zero());
        let channels = ChannelFrame::IDLE;
        Ok(Self {
            id,
            config,
            target: config.target,
            circle: None,
            pids: Self::build_pids(&config),
            armed: false,
            phase: Phase::Uninitialized,
            yaw: T::zero(),
            error: zero,
            raw_command: zero,
            attitude_command: AttitudeCommand::new(T::zero(), T::zero(), T::zero(), T::zero()),
            channels,
            pulses: channels.to_pulses(&config.directions),
        })
    }

    fn build_pids(config: &FlightControllerConfig<T>) -> Axes<AxisPid<T>> {
        config
            .gains
            .map(|gains| AxisPid::new(gains).with_degenerate_dt(config.degenerate_dt))
    }

    /// Replaces the configuration. Only allowed before the first sample.
    pub fn configure(&mut self, config: FlightControllerConfig<T>) -> ControlResult<()> {
        if !matches!(self.phase, Phase::Uninitialized) {
            log::warn!("aircraft {}: configuration rejected while tracking", self.id);
            return Err(ControlError::ConfigureWhileTracking);
        }
        config.validate()?;
        self.pids = Self::build_pids(&config);
        self.target = config.target;
        self.pulses = self.channels.to_pulses(&config.directions);
        self.config = config;
        Ok(())
    }

    /// Records one pose sample.
    ///
    /// The first sample opens the session: its position becomes the origin
    /// unless the configuration fixes one, and its timestamp and frame become
    /// time zero. No commands are computed here.
    pub fn ingest_pose(
        &mut self,
        pose: RigidBodyPose<T>,
        timestamp: u64,
        frame: i32,
        clock_frequency: u64,
    ) -> ControlResult<()> {
        if clock_frequency == 0 {
            return Err(ControlError::InvalidClockFrequency);
        }
        let frequency: T = cast(clock_frequency);

        if let Phase::Uninitialized = self.phase {
            let origin = self.config.origin.unwrap_or(pose.position);
            log::info!(
                "aircraft {}: session start at frame {}, origin ({}, {}, {})",
                self.id,
                frame,
                origin.x,
                origin.y,
                origin.z
            );
            self.phase = Phase::Tracking {
                session: Session {
                    origin,
                    start_timestamp: timestamp,
                    start_frame: frame,
                    last_timestamp: timestamp,
                    latest: Observation {
                        frame: 0,
                        elapsed_ms: T::zero(),
                        dt_ms: T::zero(),
                        position: Position::new(T::zero(), T::zero(), T::zero()),
                        orientation: pose.orientation,
                    },
                },
                stage: Stage::Seeding,
            };
        }
        let Phase::Tracking { session, .. } = &mut self.phase else {
            return Err(ControlError::NoPoseSample);
        };

        // Signed, so a late sample shows up as a negative interval.
        let delta_ticks = i128::from(timestamp) - i128::from(session.last_timestamp);
        let elapsed_ticks = i128::from(timestamp) - i128::from(session.start_timestamp);
        session.last_timestamp = timestamp;
        session.latest = Observation {
            frame: i64::from(frame) - i64::from(session.start_frame),
            elapsed_ms: ticks_to_ms(elapsed_ticks, frequency),
            dt_ms: ticks_to_ms(delta_ticks, frequency),
            position: pose.position - session.origin,
            orientation: pose.orientation,
        };
        Ok(())
    }

    /// Runs the control law on the latest sample and returns the pre-scale
    /// channel values.
    pub fn generate_commands(&mut self) -> ControlResult<ChannelFrame> {
        let Phase::Tracking { session, stage } = &mut self.phase else {
            return Err(ControlError::NoPoseSample);
        };
        let observation = session.latest;
        let position = observation.position;
        let yaw = observation.orientation.yaw();
        let error = Axes::new(
            position.x - self.target.x,
            position.y - self.target.y,
            position.z - self.target.z,
            shortest_yaw_error(yaw, self.target.yaw),
        );

        let current = *stage;
        let raw_command = match current {
            Stage::Seeding => {
                for axis in Axis::ALL {
                    self.pids[axis].seed(error[axis]);
                }
                *stage = Stage::Steady;
                log::info!("aircraft {}: first command, throttle held low", self.id);
                start_command(self.config.throttle_trim)
            }
            Stage::Steady => {
                let mut command = error;
                for axis in Axis::ALL {
                    command[axis] = self.pids[axis].evaluate(error[axis], observation.dt_ms);
                }
                command
            }
        };

        let attitude_command =
            AttitudeCommand::from_ground_frame(raw_command, yaw, self.config.throttle_trim);
        self.yaw = yaw;
        self.error = error;
        self.raw_command = raw_command;
        self.attitude_command = attitude_command;

        let clamped = attitude_command.quantize(&self.config.limits)?;
        let channels = ChannelFrame::assemble(&clamped, self.armed);
        log::debug!(
            "aircraft {}: frame {} channels {:?}",
            self.id,
            observation.frame,
            channels.0
        );
        self.channels = channels;
        Ok(channels)
    }

    /// Scales the current channels to pulse widths around 1500.
    pub fn map_to_pulse_range(&mut self) -> PulseFrame {
        self.pulses = self.channels.to_pulses(&self.config.directions);
        self.pulses
    }

    /// Feeds the aircraft's entry of a motion-capture frame through
    /// [`FlightController::update`].
    ///
    /// Returns `None` when the frame has no validly tracked body with this
    /// controller's id.
    pub fn process_frame(&mut self, frame: &MocapFrame<'_, T>) -> ControlResult<Option<PulseFrame>> {
        let Some(body) = frame
            .bodies
            .iter()
            .find(|body| body.tracking_valid && body.id == self.id)
        else {
            return Ok(None);
        };
        let sample = PoseSample {
            pose: body.pose,
            timestamp: frame.timestamp,
            frame: frame.frame,
            clock_frequency: frame.clock_frequency,
        };
        self.update(&sample).map(Some)
    }

    /// Applies an operator command.
    pub fn apply(&mut self, command: OperatorCommand<T>) -> ControlResult<()> {
        match command {
            OperatorCommand::ToggleArm => {
                self.toggle_armed();
            }
            OperatorCommand::Arm => self.set_armed(true),
            OperatorCommand::Disarm => self.set_armed(false),
            OperatorCommand::SetTarget(target) => self.set_target(target)?,
            OperatorCommand::Maneuver(maneuver) => self.set_target(maneuver.target())?,
            OperatorCommand::StartCircle => self.start_circle(),
            OperatorCommand::StopCircle => self.stop_circle(),
        }
        Ok(())
    }

    /// Starts flying the circle. From the next control step on, the target
    /// follows the circle, advanced by the previous sample interval. Has no
    /// effect while already circling.
    pub fn start_circle(&mut self) {
        if self.circle.is_none() {
            log::info!("aircraft {}: circle started", self.id);
            self.circle = Some(CircleTrajectory::default());
        }
    }

    /// Leaves circle mode and holds the current target.
    pub fn stop_circle(&mut self) {
        if self.circle.take().is_some() {
            log::info!("aircraft {}: circle stopped", self.id);
        }
    }

    /// Circle being flown, if any.
    pub fn circle(&self) -> Option<&CircleTrajectory<T>> {
        self.circle.as_ref()
    }

    fn advance_circle(&mut self) {
        let dt_ms = self.observation().map_or(T::zero(), |observation| observation.dt_ms);
        if let Some(circle) = self.circle.as_mut() {
            self.target = circle.advance(dt_ms);
        }
    }

    /// Sets the arm switch. Only the arm channel changes.
    pub fn set_armed(&mut self, armed: bool) {
        if self.armed != armed {
            log::info!(
                "aircraft {}: {}",
                self.id,
                if armed { "ARMED" } else { "DISARMED" }
            );
        }
        self.armed = armed;
    }

    /// Flips the arm switch and returns the new state.
    pub fn toggle_armed(&mut self) -> bool {
        self.set_armed(!self.armed);
        self.armed
    }

    /// Current arm switch state.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Replaces the target and leaves circle mode. Takes effect on the next
    /// control step.
    pub fn set_target(&mut self, target: Axes<T>) -> ControlResult<()> {
        validate_target(&target)?;
        self.stop_circle();
        self.target = target;
        Ok(())
    }

    /// Current target.
    pub fn target(&self) -> Axes<T> {
        self.target
    }

    /// Streaming id of the tracked rigid body.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Active configuration.
    pub fn config(&self) -> &FlightControllerConfig<T> {
        &self.config
    }

    /// Lifecycle phase.
    pub fn phase(&self) -> ControllerPhase {
        match &self.phase {
            Phase::Uninitialized => ControllerPhase::Uninitialized,
            Phase::Tracking {
                stage: Stage::Seeding,
                ..
            } => ControllerPhase::Seeding,
            Phase::Tracking {
                stage: Stage::Steady,
                ..
            } => ControllerPhase::Steady,
        }
    }

    /// World frame position of the session origin.
    pub fn origin(&self) -> Option<Position<T>> {
        match &self.phase {
            Phase::Uninitialized => None,
            Phase::Tracking { session, .. } => Some(session.origin),
        }
    }

    /// Latest pose sample.
    pub fn observation(&self) -> Option<Observation<T>> {
        match &self.phase {
            Phase::Uninitialized => None,
            Phase::Tracking { session, .. } => Some(session.latest),
        }
    }

    /// Yaw used by the latest control step.
    pub fn yaw(&self) -> T {
        self.yaw
    }

    /// Errors of the latest control step, yaw wrapped to the short way round.
    pub fn error(&self) -> Axes<T> {
        self.error
    }

    /// Ground frame commands of the latest control step.
    pub fn raw_command(&self) -> Axes<T> {
        self.raw_command
    }

    /// Vehicle frame commands of the latest control step, before rounding.
    pub fn attitude_command(&self) -> AttitudeCommand<T> {
        self.attitude_command
    }

    /// Pre-scale channel values.
    pub fn channels(&self) -> ChannelFrame {
        self.channels
    }

    /// Pulse widths of the latest mapping.
    pub fn pulses(&self) -> PulseFrame {
        self.pulses
    }

    /// PID controller of one axis.
    pub fn pid(&self, axis: Axis) -> &AxisPid<T> {
        &self.pids[axis]
    }

    /// Snapshot for the flight log. `None` before the first sample.
    pub fn telemetry(&self) -> Option<TelemetryRecord<T>> {
        let observation = self.observation()?;
        let position = observation.position;
        let measured = Axes::new(position.x, position.y, position.z, self.yaw);
        let row = |axis: Axis| AxisTelemetry {
            measured: measured[axis],
            target: self.target[axis],
            gains: self.pids[axis].gains(),
            terms: self.pids[axis].terms(),
        };
        Some(TelemetryRecord {
            frame: observation.frame,
            elapsed_ms: observation.elapsed_ms,
            axes: Axes::new(row(Axis::X), row(Axis::Y), row(Axis::Z), row(Axis::Yaw)),
            orientation: observation.orientation,
            channels: self.channels,
        })
    }
}

impl<T: Number> FlightController<T> for PositionController<T> {
    fn update(&mut self, sample: &PoseSample<T>) -> ControlResult<PulseFrame> {
        self.advance_circle();
        self.ingest_pose(
            sample.pose,
            sample.timestamp,
            sample.frame,
            sample.clock_frequency,
        )?;
        self.generate_commands()?;
        Ok(self.map_to_pulse_range())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::{Bounds, Direction};
    use crate::controller::flight_controller::TrackedBody;
    use crate::mission::Maneuver;
    use crate::pid::{DegenerateDt, PidGains};
    use crate::test_utils::*;
    use core::f64::consts::PI;

    const CLOCK: u64 = 1_000_000;
    const START: u64 = 5_000_000;

    /// Quadrotor test configuration.
    fn default_config() -> FlightControllerConfig<f64> {
        let mut config = FlightControllerConfig::<f64>::new();
        config.target = Axes::new(0.0, 0.0, 1.0, 0.0);
        config.throttle_trim = 10;
        config.gains = Axes::new(
            PidGains::new(18.0, 0.001, 21000.0),
            PidGains::new(18.0, 0.001, 21000.0),
            PidGains::new(200.0, 0.001, 80000.0),
            PidGains::new(100.0, 0.0, 10000.0),
        );
        config
    }

    /// Proportional-only gains, so commands stay inside the limits.
    fn proportional_config(kp: f64) -> FlightControllerConfig<f64> {
        let mut config = default_config();
        let gains = PidGains::new(kp, 0.0, 0.0);
        config.gains = Axes::new(gains, gains, gains, gains);
        config
    }

    fn pose(x: f64, y: f64, z: f64) -> RigidBodyPose<f64> {
        RigidBodyPose::new(Position::new(x, y, z), Quaternion::identity())
    }

    fn sample(pose: RigidBodyPose<f64>, ms: u64, frame: i32) -> PoseSample<f64> {
        PoseSample {
            pose,
            timestamp: START + ms * CLOCK / 1000,
            frame,
            clock_frequency: CLOCK,
        }
    }

    /// Test the fixed start command on the first sample.
    #[test]
    fn test_position_first_command_is_start_command() {
        let mut controller = PositionController::new(2, default_config()).unwrap();
        assert_eq!(ControllerPhase::Uninitialized, controller.phase());

        let pulses = controller.update(&sample(pose(0.0, 0.0, 0.0), 0, 100)).unwrap();

        assert!(axes_close(
            Axes::new(0.0, 0.0, -110.0, 0.0),
            controller.raw_command()
        ));
        assert_eq!(
            ChannelFrame([-100, 0, 0, 0, 100, -100, -100, -100]),
            controller.channels()
        );
        assert_eq!(
            PulseFrame([1000, 1500, 1500, 1500, 2000, 1000, 1000, 1000]),
            pulses
        );
        assert_eq!(ControllerPhase::Steady, controller.phase());
    }

    /// The start command clamps onto the configured throttle limit.
    #[test]
    fn test_position_first_command_respects_limits() {
        let mut config = default_config();
        config.limits.thrust = Bounds::new(-60, 80);
        let mut controller = PositionController::new(2, config).unwrap();
        controller.update(&sample(pose(3.0, -4.0, 2.0), 0, 0)).unwrap();
        assert_eq!(-60, controller.channels().0[0]);
    }

    /// Test the PID history seeded by the first sample.
    #[test]
    fn test_position_first_sample_seeds_pids() {
        let mut controller = PositionController::new(2, default_config()).unwrap();
        controller.update(&sample(pose(0.0, 0.0, 0.0), 0, 0)).unwrap();

        let z = controller.pid(Axis::Z);
        assert!(value_close(-1.0, z.previous_error()), "z error should be seeded.");
        assert!(value_close(0.0, z.integral()), "Integral should stay zero.");
        assert!(value_close(0.0, z.terms().output));
    }

    /// Test the closed-loop response on the second sample.
    #[test]
    fn test_position_second_sample_runs_pids() {
        let mut controller = PositionController::new(2, default_config()).unwrap();
        controller.update(&sample(pose(0.0, 0.0, 0.0), 0, 0)).unwrap();
        controller.update(&sample(pose(0.0, 0.0, 0.5), 20, 1)).unwrap();

        let observation = controller.observation().unwrap();
        assert!(value_close(20.0, observation.dt_ms));
        assert!(value_close(20.0, observation.elapsed_ms));

        // P = -0.5, I = 20 * -0.5, D = (-0.5 + 1) / 20
        let expected = -(200.0 * -0.5 + 0.001 * -10.0 + 80000.0 * 0.025);
        assert!(value_close(expected, controller.raw_command().z));
        assert!(value_close(-1899.99, controller.raw_command().z));
        assert_eq!(-100, controller.channels().0[0], "Throttle should clamp low.");
        assert_eq!(0, controller.channels().0[1]);
        assert_eq!(0, controller.channels().0[2]);
        assert_eq!(0, controller.channels().0[3]);
    }

    /// Below target with proportional gain only, throttle rises above trim.
    #[test]
    fn test_position_below_target_raises_throttle() {
        let mut controller = PositionController::new(2, proportional_config(10.0)).unwrap();
        controller.update(&sample(pose(0.0, 0.0, 0.0), 0, 0)).unwrap();
        controller.update(&sample(pose(0.0, 0.0, 0.5), 20, 1)).unwrap();

        assert!(value_close(5.0, controller.raw_command().z));
        assert_eq!(15, controller.channels().0[0]);
        assert_eq!(1575, controller.pulses().0[0]);
    }

    #[test]
    fn test_position_relative_to_first_sample() {
        let mut controller = PositionController::new(2, default_config()).unwrap();
        controller.ingest_pose(pose(10.0, 20.0, 30.0), START, 7, CLOCK).unwrap();
        assert_eq!(
            Position::new(0.0, 0.0, 0.0),
            controller.observation().unwrap().position
        );
        controller.ingest_pose(pose(10.0, 20.0, 31.0), START + 10_000, 8, CLOCK).unwrap();
        let observation = controller.observation().unwrap();
        assert_eq!(Position::new(0.0, 0.0, 1.0), observation.position);
        assert_eq!(1, observation.frame);
        assert!(value_close(10.0, observation.elapsed_ms));
        assert_eq!(Some(Position::new(10.0, 20.0, 30.0)), controller.origin());
    }

    #[test]
    fn test_position_fixed_origin() {
        let mut config = default_config();
        config.origin = Some(Position::new(1.0, 1.0, 0.0));
        let mut controller = PositionController::new(2, config).unwrap();
        controller.ingest_pose(pose(2.0, 3.0, 0.5), START, 0, CLOCK).unwrap();
        assert_eq!(
            Position::new(1.0, 2.0, 0.5),
            controller.observation().unwrap().position
        );
    }

    #[test]
    fn test_position_commands_require_sample() {
        let mut controller = PositionController::new(2, default_config()).unwrap();
        assert_eq!(Err(ControlError::NoPoseSample), controller.generate_commands());
        assert_eq!(ChannelFrame::IDLE, controller.channels());
        assert!(controller.telemetry().is_none());
    }

    #[test]
    fn test_position_rejects_zero_clock_frequency() {
        let mut controller = PositionController::new(2, default_config()).unwrap();
        assert_eq!(
            Err(ControlError::InvalidClockFrequency),
            controller.ingest_pose(pose(0.0, 0.0, 0.0), START, 0, 0)
        );
        assert_eq!(ControllerPhase::Uninitialized, controller.phase());
    }

    #[test]
    fn test_position_configure_locked_while_tracking() {
        let mut controller = PositionController::new(2, default_config()).unwrap();
        let retuned = proportional_config(3.0);
        assert_eq!(Ok(()), controller.configure(retuned));
        assert_eq!(PidGains::new(3.0, 0.0, 0.0), controller.pid(Axis::Yaw).gains());

        controller.update(&sample(pose(0.0, 0.0, 0.0), 0, 0)).unwrap();
        assert_eq!(
            Err(ControlError::ConfigureWhileTracking),
            controller.configure(default_config())
        );
    }

    #[test]
    fn test_position_rejects_invalid_config() {
        let mut config = default_config();
        config.limits.roll = Bounds::new(10, -10);
        assert!(PositionController::new(2, config).is_err());
    }

    /// The heading error takes the short way across ±180 degrees.
    #[test]
    fn test_position_yaw_error_wraps() {
        let mut config = default_config();
        config.target.yaw = -179.0 * PI / 180.0;
        let mut controller = PositionController::new(2, config).unwrap();
        let heading = Quaternion::from_heading(-179.0 * PI / 180.0);
        let pose = RigidBodyPose::new(Position::new(0.0, 0.0, 0.0), heading);
        controller.update(&sample(pose, 0, 0)).unwrap();

        let error = controller.error().yaw;
        assert!(error.abs() <= 2.0 * PI / 180.0 + 1e-9, "Yaw error was {}", error);
    }

    /// Horizontal commands follow the vehicle heading.
    #[test]
    fn test_position_rotates_into_heading_frame() {
        let mut config = proportional_config(10.0);
        config.target = Axes::new(1.0, 0.0, 0.0, PI / 2.0);
        let mut controller = PositionController::new(2, config).unwrap();
        let heading = Quaternion::from_heading(-PI / 2.0);
        let pose = RigidBodyPose::new(Position::new(0.0, 0.0, 0.0), heading);
        controller.update(&sample(pose, 0, 0)).unwrap();
        controller.update(&sample(pose, 20, 1)).unwrap();

        assert!(value_close(PI / 2.0, controller.yaw()));
        assert!(value_close(10.0, controller.raw_command().x));
        let attitude = controller.attitude_command();
        assert!(value_close(0.0, attitude.roll));
        assert!(value_close(-10.0, attitude.pitch));
        assert_eq!(0, controller.channels().0[1]);
        assert_eq!(-10, controller.channels().0[2]);
    }

    #[test]
    fn test_position_arm_state_only_changes_arm_channel() {
        let mut controller = PositionController::new(2, proportional_config(10.0)).unwrap();
        controller.update(&sample(pose(0.0, 0.0, 0.0), 0, 0)).unwrap();
        controller.update(&sample(pose(0.0, 0.0, 0.5), 20, 1)).unwrap();
        let disarmed = controller.channels();

        controller.set_armed(true);
        assert!(controller.is_armed());
        controller.generate_commands().unwrap();
        let armed = controller.channels();

        assert_eq!(100, disarmed.0[4]);
        assert_eq!(-100, armed.0[4]);
        assert_eq!(disarmed.0[..4], armed.0[..4]);
        assert_eq!(disarmed.0[5..], armed.0[5..]);
    }

    /// A repeated timestamp keeps every output finite.
    #[test]
    fn test_position_duplicate_timestamp_is_tolerated() {
        let mut controller = PositionController::new(2, default_config()).unwrap();
        controller.update(&sample(pose(0.0, 0.0, 0.0), 0, 0)).unwrap();
        controller.update(&sample(pose(0.0, 0.0, 0.5), 20, 1)).unwrap();
        let integral = controller.pid(Axis::Z).integral();

        controller.update(&sample(pose(0.0, 0.0, 0.6), 20, 2)).unwrap();
        assert!(value_close(0.0, controller.observation().unwrap().dt_ms));
        assert!(value_close(integral, controller.pid(Axis::Z).integral()));
        assert!(controller.raw_command().z.is_finite());
    }

    #[test]
    fn test_position_out_of_order_timestamp_is_negative() {
        let mut controller = PositionController::new(2, default_config()).unwrap();
        controller.update(&sample(pose(0.0, 0.0, 0.0), 20, 0)).unwrap();
        controller.update(&sample(pose(0.0, 0.0, 0.0), 10, 1)).unwrap();
        assert!(value_close(-10.0, controller.observation().unwrap().dt_ms));
        assert!(controller.raw_command().z.is_finite());
    }

    #[test]
    fn test_position_clamped_dt_policy() {
        let mut config = proportional_config(0.0);
        config.gains.z = PidGains::new(0.0, 1.0, 0.0);
        config.degenerate_dt = DegenerateDt::ClampTo(1.0);
        let mut controller = PositionController::new(2, config).unwrap();
        controller.update(&sample(pose(0.0, 0.0, 0.0), 0, 0)).unwrap();
        controller.update(&sample(pose(0.0, 0.0, 0.0), 0, 1)).unwrap();
        assert!(value_close(-1.0, controller.pid(Axis::Z).integral()));
    }

    #[test]
    fn test_position_reversed_channel_direction() {
        let mut config = proportional_config(10.0);
        config.directions[0] = Direction::Reversed;
        let mut controller = PositionController::new(2, config).unwrap();
        controller.update(&sample(pose(0.0, 0.0, 0.0), 0, 0)).unwrap();
        let pulses = controller.update(&sample(pose(0.0, 0.0, 0.5), 20, 1)).unwrap();
        assert_eq!(1425, pulses.0[0]);
    }

    #[test]
    fn test_position_process_frame_filters_bodies() {
        let mut controller = PositionController::new(2, default_config()).unwrap();
        let bodies = [
            TrackedBody {
                id: 1,
                tracking_valid: true,
                pose: pose(5.0, 5.0, 5.0),
            },
            TrackedBody {
                id: 2,
                tracking_valid: false,
                pose: pose(9.0, 9.0, 9.0),
            },
        ];
        let frame = MocapFrame {
            bodies: &bodies,
            timestamp: START,
            frame: 0,
            clock_frequency: CLOCK,
        };
        assert_eq!(Ok(None), controller.process_frame(&frame));
        assert_eq!(ControllerPhase::Uninitialized, controller.phase());

        let bodies = [TrackedBody {
            id: 2,
            tracking_valid: true,
            pose: pose(1.0, 2.0, 3.0),
        }];
        let frame = MocapFrame {
            bodies: &bodies,
            ..frame
        };
        let pulses = controller.process_frame(&frame).unwrap();
        assert_eq!(Some(controller.pulses()), pulses);
        assert_eq!(Some(Position::new(1.0, 2.0, 3.0)), controller.origin());
    }

    #[test]
    fn test_position_operator_commands() {
        let mut controller = PositionController::new(2, default_config()).unwrap();
        controller.apply(OperatorCommand::ToggleArm).unwrap();
        assert!(controller.is_armed());
        controller.apply(OperatorCommand::Disarm).unwrap();
        assert!(!controller.is_armed());

        controller
            .apply(OperatorCommand::Maneuver(Maneuver::StepPositiveX))
            .unwrap();
        assert_eq!(Axes::new(1.0, 0.0, 1.0, 0.0), controller.target());

        assert_eq!(
            Err(ControlError::NonFiniteTarget { axis: Axis::X }),
            controller.apply(OperatorCommand::SetTarget(Axes::new(f64::NAN, 0.0, 0.0, 0.0)))
        );
        assert_eq!(Axes::new(1.0, 0.0, 1.0, 0.0), controller.target());
    }

    /// A new target is used by the next control step.
    #[test]
    fn test_position_target_change_applies_next_step() {
        let mut controller = PositionController::new(2, proportional_config(10.0)).unwrap();
        controller.update(&sample(pose(0.0, 0.0, 0.0), 0, 0)).unwrap();
        controller.set_target(Axes::new(0.0, 0.0, 0.0, 0.0)).unwrap();
        controller.update(&sample(pose(0.0, 0.0, 0.0), 20, 1)).unwrap();
        assert!(value_close(0.0, controller.error().z));
        assert_eq!(10, controller.channels().0[0]);
    }

    #[test]
    fn test_position_telemetry_snapshot() {
        let mut controller = PositionController::new(2, default_config()).unwrap();
        controller.update(&sample(pose(0.0, 0.0, 0.0), 0, 40)).unwrap();
        controller.update(&sample(pose(0.0, 0.0, 0.5), 20, 42)).unwrap();
        let record = controller.telemetry().unwrap();

        assert_eq!(2, record.frame);
        assert!(value_close(20.0, record.elapsed_ms));
        assert!(value_close(0.5, record.axes.z.measured));
        assert!(value_close(1.0, record.axes.z.target));
        assert_eq!(PidGains::new(200.0, 0.001, 80000.0), record.axes.z.gains);
        assert_eq!(controller.pid(Axis::Z).terms(), record.axes.z.terms);
        assert_eq!(controller.channels(), record.channels);
    }

    #[test]
    fn test_position_works_with_f32() {
        let mut config = FlightControllerConfig::<f32>::new();
        config.target = Axes::new(0.0, 0.0, 1.0, 0.0);
        let mut controller = PositionController::new(3, config).unwrap();
        let pose = RigidBodyPose::new(Position::new(0.0, 0.0, 0.0), Quaternion::identity());
        let sample = PoseSample {
            pose,
            timestamp: 0,
            frame: 0,
            clock_frequency: 120,
        };
        let pulses = controller.update(&sample).unwrap();
        assert_eq!(1000, pulses.0[0]);
    }

    /// Elapsed time stays exact in `f32` long after the clock started.
    #[test]
    fn test_position_elapsed_time_with_f32_and_late_start() {
        const TICKS_PER_SECOND: u64 = 10_000_000;
        let start = 86_400 * TICKS_PER_SECOND;
        let mut controller = PositionController::new(3, FlightControllerConfig::<f32>::new()).unwrap();
        let pose = RigidBodyPose::new(Position::new(0.0, 0.0, 0.0), Quaternion::identity());

        for step in 0..4_u64 {
            let timestamp = start + step * TICKS_PER_SECOND / 100;
            controller
                .ingest_pose(pose, timestamp, step as i32, TICKS_PER_SECOND)
                .unwrap();
            let observation = controller.observation().unwrap();
            assert!(
                value_close(10.0 * step as f64, f64::from(observation.elapsed_ms)),
                "Elapsed time at step {} was {}",
                step,
                observation.elapsed_ms
            );
        }
        let observation = controller.observation().unwrap();
        assert!(value_close(10.0, f64::from(observation.dt_ms)));
    }

    /// In circle mode the target walks along the circle by the previous
    /// sample interval on every step.
    #[test]
    fn test_position_circle_mode_moves_target() {
        let mut controller = PositionController::new(2, proportional_config(10.0)).unwrap();
        let hover = pose(0.0, 0.0, 0.0);
        controller.update(&sample(hover, 0, 0)).unwrap();
        controller.apply(OperatorCommand::StartCircle).unwrap();
        assert!(controller.circle().is_some());

        let circle = CircleTrajectory::<f64>::default();
        controller.update(&sample(hover, 20, 1)).unwrap();
        assert!(axes_close(circle.target_at(0.0), controller.target()));
        controller.update(&sample(hover, 40, 2)).unwrap();
        assert!(axes_close(circle.target_at(20.0), controller.target()));
        controller.update(&sample(hover, 60, 3)).unwrap();
        assert!(axes_close(circle.target_at(40.0), controller.target()));
        assert!(controller.target().y > 0.0, "Target should have left the start.");

        let error = controller.error();
        let target = circle.target_at(40.0);
        assert!(value_close(-target.x, error.x));
        assert!(value_close(-target.y, error.y));

        // Starting again keeps the current lap.
        controller.apply(OperatorCommand::StartCircle).unwrap();
        assert!(value_close(40.0, controller.circle().unwrap().elapsed_ms()));
    }

    /// A preset maneuver ends circle mode and its target stays put.
    #[test]
    fn test_position_target_change_stops_circle() {
        let mut controller = PositionController::new(2, proportional_config(10.0)).unwrap();
        let hover = pose(0.0, 0.0, 0.0);
        controller.apply(OperatorCommand::StartCircle).unwrap();
        controller.update(&sample(hover, 0, 0)).unwrap();
        controller.update(&sample(hover, 20, 1)).unwrap();

        controller
            .apply(OperatorCommand::Maneuver(Maneuver::ReturnToStart))
            .unwrap();
        assert!(controller.circle().is_none());
        controller.update(&sample(hover, 40, 2)).unwrap();
        assert_eq!(Axes::new(0.0, 0.0, 0.5, 0.0), controller.target());

        controller.apply(OperatorCommand::StartCircle).unwrap();
        controller.apply(OperatorCommand::StopCircle).unwrap();
        controller.update(&sample(hover, 60, 3)).unwrap();
        assert_eq!(Axes::new(0.0, 0.0, 0.5, 0.0), controller.target());
    }
}

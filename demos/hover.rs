// demos/hover.rs

use mocap_flight_control::{
    Axes, FlightController, FlightControllerConfig, OperatorCommand, PidGains,
    PoseSample, Position, PositionController, Quaternion, RigidBodyPose, TELEMETRY_HEADER,
};

fn main() {
    let mut config = FlightControllerConfig::<f64>::new();

    // Hold one meter above the point where the aircraft is first seen.
    config.target = Axes::new(0.0, 0.0, 1.0, 0.0);

    // Add an extra 10 to the throttle so zero command roughly hovers.
    config.throttle_trim = 10;

    // Gains are in command units per meter (or radian) and milliseconds.
    config.gains = Axes::new(
        PidGains::new(18.0, 0.0001, 2000.0),
        PidGains::new(18.0, 0.0001, 2000.0),
        PidGains::new(60.0, 0.0001, 4000.0),
        PidGains::new(40.0, 0.0, 1000.0),
    );

    let mut controller = match PositionController::new(2, config) {
        Ok(controller) => controller,
        Err(error) => {
            eprintln!("invalid configuration: {}", error);
            return;
        }
    };
    if let Err(error) = controller.apply(OperatorCommand::Arm) {
        eprintln!("arm: {}", error);
        return;
    }

    // Simulated motion-capture stream at 100 Hz with a microsecond clock.
    let clock_frequency = 1_000_000;
    let dt_ms = 10.0;
    let mut position = Position::new(0.3, -0.2, 0.0);
    let mut heading: f64 = 0.2;

    println!("{}", TELEMETRY_HEADER);
    for frame in 0..400 {
        // Start circling once the aircraft has had time to climb.
        if frame == 200 {
            if let Err(error) = controller.apply(OperatorCommand::StartCircle) {
                eprintln!("frame {}: {}", frame, error);
                break;
            }
        }

        let sample = PoseSample {
            pose: RigidBodyPose::new(position, Quaternion::from_heading(-heading)),
            timestamp: frame as u64 * 10_000,
            frame,
            clock_frequency,
        };
        let pulses = match controller.update(&sample) {
            Ok(pulses) => pulses,
            Err(error) => {
                eprintln!("frame {}: {}", frame, error);
                break;
            }
        };
        if let Some(record) = controller.telemetry() {
            println!("{}", record);
        }
        if frame % 50 == 0 {
            eprintln!("pulses: {}", pulses);
        }

        // Crude kinematic response: sticks set velocity in the heading frame.
        let command = controller.attitude_command();
        let (sin, cos) = heading.sin_cos();
        let step = dt_ms / 1000.0 * 0.01;
        position.x += (command.roll * cos - command.pitch * sin) * step;
        position.y += (command.roll * sin + command.pitch * cos) * step;
        position.z += (command.thrust - 10.0) * step;
        heading += command.yaw * step;
    }
}

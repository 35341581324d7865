//! Headless replay of a scripted session.
//!
//! Both controllers sweep across the target sphere from opposite sides while
//! the headset stays still, and every focus change is logged. The right
//! controller pulls its trigger each time it holds focus.

use std::path::PathBuf;

use clap::Parser;
use sightline::{
    Button, ButtonEvent, DevicePose, DevicePoses, DeviceRole, FocusHandoff, FrameInput,
    FramePlayer, InteractionMode, Mat4, SessionConfig, Vec3,
};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "sightline")]
#[command(about = "Replay a scripted controller sweep through the focus tracker")]
struct Args {
    /// JSON session config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of frames to replay
    #[arg(long, default_value_t = 240)]
    frames: u32,

    /// Frames per second of the replay
    #[arg(long, default_value_t = 60.0)]
    fps: f32,

    /// Override the interaction mode (system-default, gaze, controller)
    #[arg(long)]
    mode: Option<InteractionMode>,

    /// Override the focus handoff policy (latest-engaged, first-engaged)
    #[arg(long)]
    handoff: Option<FocusHandoff>,

    /// Sweep amplitude in degrees
    #[arg(long, default_value_t = 60.0)]
    sweep: f32,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Yaw of a controller at `frame`, sweeping back and forth.
fn sweep_yaw(frame: u32, frames: u32, amplitude: f32, phase: f32) -> f32 {
    let t = frame as f32 / frames.max(1) as f32;
    (amplitude * (t * std::f32::consts::TAU + phase).sin()).to_radians()
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(args.log_level.as_str())
        .init();

    info!("Starting sightline v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    if let Some(mode) = args.mode {
        config.interaction_mode = mode;
    }
    if let Some(handoff) = args.handoff {
        config.handoff = handoff;
    }
    // The head looks at the sphere's home from the world origin.
    let aim = (config.sphere_center - config.world_origin).normalize_or_zero();
    let facing = Mat4::look_to_rh(Vec3::ZERO, aim, Vec3::Y).inverse();

    let mut player = FramePlayer::new(config)?;
    let dt = 1.0 / args.fps.max(1.0);
    let mut owner = player.focus().owner;
    let mut activations = 0;

    for frame in 0..args.frames {
        let right_yaw = sweep_yaw(frame, args.frames, args.sweep, 0.0);
        let left_yaw = sweep_yaw(frame, args.frames, args.sweep, std::f32::consts::PI);

        let poses = DevicePoses::new()
            .with(DeviceRole::Hmd, DevicePose::tracked(facing))
            .with(
                DeviceRole::ControllerRight,
                DevicePose::tracked(facing * Mat4::from_rotation_y(right_yaw)),
            )
            .with(
                DeviceRole::ControllerLeft,
                DevicePose::tracked(facing * Mat4::from_rotation_y(left_yaw)),
            );

        let trigger = if owner == DeviceRole::ControllerRight {
            ButtonEvent::pressed(DeviceRole::ControllerRight, Button::Trigger)
        } else {
            ButtonEvent::released(DeviceRole::ControllerRight, Button::Trigger)
        };
        let input = FrameInput::new(poses).dt(dt).event(trigger);

        let out = player.step(&input);
        if out.activated {
            activations += 1;
            info!(frame, center = ?out.sphere_center, "target activated");
        }
        if out.focus.owner != owner {
            info!(frame, owner = %out.focus.owner, color = ?out.focus.color.to_array(), "focus");
            owner = out.focus.owner;
        }
    }

    if activations == 0 {
        warn!("the sweep never activated the target; try a wider --sweep");
    }
    info!(frames = args.frames, activations, "replay finished");
    Ok(())
}

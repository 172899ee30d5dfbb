//! Coupled-axis (H-bot) drive mapping with limit-switch vetoes.
//!
//! The two motors are mechanically coupled: driving both in the same
//! direction moves the carriage along X, driving them in opposite
//! directions moves it along Y. Homing drives each axis in the negative
//! direction, so a triggered limit vetoes further negative command on that
//! axis while retraction stays possible.

use crate::util::clamp_drive;

/// The two carriage axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::X => f.write_str("X"),
            Axis::Y => f.write_str("Y"),
        }
    }
}

/// Limit-switch observation for the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LimitMask {
    pub x_at_limit: bool,
    pub y_at_limit: bool,
}

/// Per-motor drive values for one tick, each in [-255, 255].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrivePair {
    pub motor_a: i16,
    pub motor_b: i16,
}

/// Zero out any axis command that would drive deeper into an already
/// triggered limit (the homing direction is negative on both axes).
#[inline]
pub fn veto_limits(x_cmd: i16, y_cmd: i16, limits: LimitMask) -> (i16, i16) {
    let x = if limits.x_at_limit && x_cmd < 0 { 0 } else { x_cmd };
    let y = if limits.y_at_limit && y_cmd < 0 { 0 } else { y_cmd };
    (x, y)
}

/// H-bot mix: `motor_a = x + y`, `motor_b = x - y`, clamped to [-255, 255].
#[inline]
pub fn mix(x_cmd: i16, y_cmd: i16) -> DrivePair {
    let x = i32::from(x_cmd);
    let y = i32::from(y_cmd);
    DrivePair {
        motor_a: clamp_drive(x + y),
        motor_b: clamp_drive(x - y),
    }
}

/// Full per-tick pipeline: veto, mix, and cap to the configured maximum.
pub fn drive_commands(x_cmd: i16, y_cmd: i16, limits: LimitMask, max_drive: i16) -> DrivePair {
    let (x, y) = veto_limits(x_cmd, y_cmd, limits);
    let pair = mix(x, y);
    let cap = max_drive.unsigned_abs().min(255) as i16;
    DrivePair {
        motor_a: pair.motor_a.clamp(-cap, cap),
        motor_b: pair.motor_b.clamp(-cap, cap),
    }
}

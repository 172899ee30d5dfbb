//! Common helpers for gantry_core.

use std::time::Duration;

/// Full-scale magnitude of axis commands and motor drives.
pub const DRIVE_MAX: i16 = 255;

/// Clamp a combined drive value into the valid [-255, 255] range.
#[inline]
pub fn clamp_drive(v: i32) -> i16 {
    v.clamp(i32::from(-DRIVE_MAX), i32::from(DRIVE_MAX)) as i16
}

/// Control loop period for a given tick length, never zero.
#[inline]
pub fn tick_period(tick_ms: u64) -> Duration {
    Duration::from_millis(tick_ms.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_drive_bounds() {
        assert_eq!(clamp_drive(0), 0);
        assert_eq!(clamp_drive(255), 255);
        assert_eq!(clamp_drive(510), 255);
        assert_eq!(clamp_drive(-510), -255);
        assert_eq!(clamp_drive(-37), -37);
    }

    #[test]
    fn tick_period_is_never_zero() {
        assert_eq!(tick_period(0), Duration::from_millis(1));
        assert_eq!(tick_period(20), Duration::from_millis(20));
    }
}

//! Signed drive values to H-bridge outputs.
//!
//! `speed == 0` asserts an active brake; otherwise exactly one direction is
//! selected and the PWM duty is proportional to |speed|/255. Stateless,
//! called once per motor per tick.

use eyre::WrapErr;
use gantry_traits::{Direction, Motor};

use crate::error::{Result, map_hw_error_dyn};
use crate::util::DRIVE_MAX;

pub fn apply_drive(motor: &mut dyn Motor, speed: i16) -> Result<()> {
    let speed = speed.clamp(-DRIVE_MAX, DRIVE_MAX);
    if speed == 0 {
        return motor
            .brake()
            .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))
            .wrap_err("motor brake");
    }
    let (duty, dir) = if speed > 0 {
        (speed as u8, Direction::Forward)
    } else {
        ((-speed) as u8, Direction::Reverse)
    };
    motor
        .set_output(duty, dir)
        .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))
        .wrap_err("motor drive")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct SpyMotor {
        last: Option<(u8, Direction)>,
        braked: bool,
    }

    impl Motor for SpyMotor {
        fn set_output(
            &mut self,
            duty: u8,
            dir: Direction,
        ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.last = Some((duty, dir));
            self.braked = false;
            Ok(())
        }
        fn brake(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.braked = true;
            self.last = None;
            Ok(())
        }
    }

    #[test]
    fn zero_brakes() {
        let mut m = SpyMotor::default();
        apply_drive(&mut m, 0).unwrap();
        assert!(m.braked);
    }

    #[test]
    fn sign_selects_direction() {
        let mut m = SpyMotor::default();
        apply_drive(&mut m, 180).unwrap();
        assert_eq!(m.last, Some((180, Direction::Forward)));
        apply_drive(&mut m, -255).unwrap();
        assert_eq!(m.last, Some((255, Direction::Reverse)));
    }

    #[test]
    fn out_of_range_speed_is_clamped() {
        let mut m = SpyMotor::default();
        apply_drive(&mut m, i16::MIN).unwrap();
        assert_eq!(m.last, Some((255, Direction::Reverse)));
    }
}

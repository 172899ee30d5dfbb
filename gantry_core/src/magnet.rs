//! Electromagnet sequencing over the enable + polarity lines.
//!
//! Engage holds forward polarity until released. The hold-release leaves
//! the driver reverse-energized to actively repel the plate until the next
//! engage; the final release pulses reverse for a fixed duration and then
//! powers the driver down completely.

use eyre::WrapErr;
use gantry_traits::Magnet;

use crate::error::{Result, map_hw_error_dyn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagnetPhase {
    Off,
    Engaged,
    HoldRelease,
    ReversePulse { until_ms: u64 },
}

#[derive(Debug, Clone)]
pub struct MagnetController {
    phase: MagnetPhase,
    pulse_ms: u64,
}

impl MagnetController {
    pub fn new(pulse_ms: u64) -> Self {
        Self {
            phase: MagnetPhase::Off,
            pulse_ms,
        }
    }

    pub fn phase(&self) -> MagnetPhase {
        self.phase
    }

    /// Forward-energized grip is active.
    pub fn is_engaged(&self) -> bool {
        self.phase == MagnetPhase::Engaged
    }

    /// Power everything down and clear the polarity lines.
    pub fn disable(&mut self, out: &mut dyn Magnet) -> Result<()> {
        self.set(out, false, false, false)?;
        self.phase = MagnetPhase::Off;
        Ok(())
    }

    /// Forward polarity, driver enabled; stays until explicitly released.
    pub fn engage(&mut self, out: &mut dyn Magnet) -> Result<()> {
        self.set(out, true, true, false)?;
        self.phase = MagnetPhase::Engaged;
        tracing::debug!("magnet engaged");
        Ok(())
    }

    /// Reverse polarity, driver left energized until the next engage.
    pub fn hold_release(&mut self, out: &mut dyn Magnet) -> Result<()> {
        self.set(out, true, false, true)?;
        self.phase = MagnetPhase::HoldRelease;
        tracing::debug!("magnet hold-release");
        Ok(())
    }

    /// Reverse pulse for the configured duration, then full power-down
    /// (completed by `tick`).
    pub fn final_release(&mut self, out: &mut dyn Magnet, now_ms: u64) -> Result<()> {
        self.set(out, true, false, true)?;
        self.phase = MagnetPhase::ReversePulse {
            until_ms: now_ms + self.pulse_ms,
        };
        tracing::debug!(pulse_ms = self.pulse_ms, "magnet final release pulse");
        Ok(())
    }

    /// Advance timed phases; call once per control tick.
    pub fn tick(&mut self, out: &mut dyn Magnet, now_ms: u64) -> Result<()> {
        if let MagnetPhase::ReversePulse { until_ms } = self.phase
            && now_ms >= until_ms
        {
            self.set(out, false, false, false)?;
            self.phase = MagnetPhase::Off;
            tracing::debug!("magnet de-energized");
        }
        Ok(())
    }

    fn set(&self, out: &mut dyn Magnet, enable: bool, forward: bool, reverse: bool) -> Result<()> {
        out.set_lines(enable, forward, reverse)
            .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))
            .wrap_err("magnet lines")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct SpyMagnet {
        lines: (bool, bool, bool),
    }

    impl Magnet for SpyMagnet {
        fn set_lines(
            &mut self,
            enable: bool,
            forward: bool,
            reverse: bool,
        ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.lines = (enable, forward, reverse);
            Ok(())
        }
    }

    #[test]
    fn engage_asserts_forward_polarity() {
        let mut out = SpyMagnet::default();
        let mut ctl = MagnetController::new(1000);
        ctl.engage(&mut out).unwrap();
        assert_eq!(out.lines, (true, true, false));
        assert!(ctl.is_engaged());
    }

    #[test]
    fn hold_release_stays_reverse_energized() {
        let mut out = SpyMagnet::default();
        let mut ctl = MagnetController::new(1000);
        ctl.engage(&mut out).unwrap();
        ctl.hold_release(&mut out).unwrap();
        assert_eq!(out.lines, (true, false, true));
        // No amount of ticking powers it down
        for t in 0..10_000u64 {
            ctl.tick(&mut out, t).unwrap();
        }
        assert_eq!(out.lines, (true, false, true));
        assert_eq!(ctl.phase(), MagnetPhase::HoldRelease);
    }

    #[test]
    fn final_release_pulses_then_powers_down() {
        let mut out = SpyMagnet::default();
        let mut ctl = MagnetController::new(1000);
        ctl.engage(&mut out).unwrap();
        ctl.final_release(&mut out, 5_000).unwrap();
        assert_eq!(out.lines, (true, false, true));
        ctl.tick(&mut out, 5_999).unwrap();
        assert_eq!(out.lines, (true, false, true));
        ctl.tick(&mut out, 6_000).unwrap();
        assert_eq!(out.lines, (false, false, false));
        assert_eq!(ctl.phase(), MagnetPhase::Off);
    }
}

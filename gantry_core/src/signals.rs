//! Non-blocking buzzer pulse scheduling.
//!
//! The original confirmation beeps are fixed-length pulses; `Chime` queues
//! them and drives the output from the control tick so the loop never
//! sleeps for a beep.

use std::collections::VecDeque;

use eyre::WrapErr;
use gantry_traits::DigitalOut;

use crate::error::{Result, map_hw_error_dyn};

#[derive(Debug, Default)]
pub struct Chime {
    queue: VecDeque<u64>,
    active_until_ms: Option<u64>,
}

impl Chime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a pulse of the given length; played in order.
    pub fn pulse(&mut self, duration_ms: u64) {
        if duration_ms > 0 {
            self.queue.push_back(duration_ms);
        }
    }

    pub fn is_sounding(&self) -> bool {
        self.active_until_ms.is_some()
    }

    /// Advance the schedule; call once per control tick.
    pub fn tick(&mut self, out: &mut dyn DigitalOut, now_ms: u64) -> Result<()> {
        match self.active_until_ms {
            Some(until) if now_ms >= until => match self.queue.pop_front() {
                Some(d) => {
                    self.active_until_ms = Some(now_ms + d);
                    Ok(())
                }
                None => {
                    self.active_until_ms = None;
                    self.set(out, false)
                }
            },
            Some(_) => Ok(()),
            None => match self.queue.pop_front() {
                Some(d) => {
                    self.active_until_ms = Some(now_ms + d);
                    self.set(out, true)
                }
                None => Ok(()),
            },
        }
    }

    fn set(&self, out: &mut dyn DigitalOut, on: bool) -> Result<()> {
        out.set(on)
            .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))
            .wrap_err("buzzer output")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct SpyOut {
        on: bool,
    }

    impl DigitalOut for SpyOut {
        fn set(
            &mut self,
            on: bool,
        ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.on = on;
            Ok(())
        }
    }

    #[test]
    fn pulse_turns_on_then_off() {
        let mut chime = Chime::new();
        let mut out = SpyOut::default();
        chime.pulse(100);
        chime.tick(&mut out, 0).unwrap();
        assert!(out.on);
        chime.tick(&mut out, 60).unwrap();
        assert!(out.on);
        chime.tick(&mut out, 100).unwrap();
        assert!(!out.on);
        assert!(!chime.is_sounding());
    }

    #[test]
    fn queued_pulses_play_back_to_back() {
        let mut chime = Chime::new();
        let mut out = SpyOut::default();
        chime.pulse(100);
        chime.pulse(200);
        chime.tick(&mut out, 0).unwrap();
        assert!(out.on);
        // First pulse ends, second begins without dropping the line
        chime.tick(&mut out, 100).unwrap();
        assert!(out.on);
        chime.tick(&mut out, 299).unwrap();
        assert!(out.on);
        chime.tick(&mut out, 300).unwrap();
        assert!(!out.on);
    }
}

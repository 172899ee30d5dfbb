//! Joystick signal conditioning: oversampling, EMA smoothing, deadzone and
//! a sign-preserving quadratic response curve.

use eyre::WrapErr;
use gantry_traits::Pot;

use crate::config::FilterCfg;
use crate::error::{Result, map_hw_error_dyn};
use crate::util::DRIVE_MAX;

/// Per-axis filter state. The EMA state persists across ticks and is owned
/// exclusively by this struct; it initializes to the first observed average
/// so there is no warm-up transient.
#[derive(Debug, Clone)]
pub struct AxisFilter {
    oversample: usize,
    alpha: f32,
    deadzone: f32,
    midpoint: f32,
    smoothed: Option<f32>,
}

impl AxisFilter {
    pub fn new(cfg: &FilterCfg) -> Self {
        Self {
            oversample: cfg.oversample.max(1),
            alpha: cfg.ema_alpha.clamp(f32::MIN_POSITIVE, 1.0),
            deadzone: f32::from(cfg.deadzone),
            midpoint: f32::from(cfg.full_scale / 2),
            smoothed: None,
        }
    }

    /// Oversample the pot and fold the average into the axis command.
    pub fn sample(&mut self, pot: &mut dyn Pot) -> Result<i16> {
        let mut sum: u32 = 0;
        for _ in 0..self.oversample {
            let raw = pot
                .read()
                .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))
                .wrap_err("pot read")?;
            sum += u32::from(raw);
        }
        let avg = (sum / self.oversample as u32) as i32;
        Ok(self.update(avg))
    }

    /// Pure per-tick update from an already averaged raw value.
    pub fn update(&mut self, avg: i32) -> i16 {
        let x = avg as f32;
        let smoothed = match self.smoothed {
            None => x,
            Some(prev) => self.alpha * x + (1.0 - self.alpha) * prev,
        };
        self.smoothed = Some(smoothed);

        let centered = smoothed - self.midpoint;
        if centered.abs() < self.deadzone {
            return 0;
        }

        // Quadratic response: fine control near center, fast traversal at
        // the extremes. Sign-preserving and clamped.
        let norm = (centered / self.midpoint).clamp(-1.0, 1.0);
        let scaled = norm * norm.abs() * f32::from(DRIVE_MAX);
        scaled.round().clamp(f32::from(-DRIVE_MAX), f32::from(DRIVE_MAX)) as i16
    }

    /// Drop smoothing history (next update re-initializes from its input).
    pub fn reset(&mut self) {
        self.smoothed = None;
    }
}

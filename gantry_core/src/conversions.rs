//! `From` implementations bridging `gantry_config` types to `gantry_core` types.

use crate::config::{DriveCfg, FilterCfg, SequenceCfg};
use crate::workflow::{GridPos, PlatePlan};

// ── FilterCfg ────────────────────────────────────────────────────────────────

impl From<&gantry_config::FilterCfg> for FilterCfg {
    fn from(c: &gantry_config::FilterCfg) -> Self {
        Self {
            oversample: c.oversample,
            ema_alpha: c.ema_alpha,
            deadzone: c.deadzone,
            full_scale: c.full_scale,
        }
    }
}

// ── DriveCfg ─────────────────────────────────────────────────────────────────

impl From<&gantry_config::DriveCfg> for DriveCfg {
    fn from(c: &gantry_config::DriveCfg) -> Self {
        // Magnitudes are validated to 1..=255 by gantry_config
        Self {
            max_drive: c.max_drive.min(255) as i16,
            homing_drive: c.homing_drive.min(255) as i16,
            homing_settle_ms: c.homing_settle_ms,
            homing_timeout_ms: c.homing_timeout_ms,
        }
    }
}

// ── SequenceCfg ──────────────────────────────────────────────────────────────

impl From<&gantry_config::SequenceCfg> for SequenceCfg {
    fn from(c: &gantry_config::SequenceCfg) -> Self {
        Self {
            grip_settle_ms: c.grip_settle_ms,
            dwell_ms: c.dwell_ms,
            confirm_debounce_ms: c.confirm_debounce_ms,
            tick_ms: c.tick_ms,
            release_pulse_ms: c.release_pulse_ms,
            detect_beep_ms: c.detect_beep_ms,
            confirm_beep_ms: c.confirm_beep_ms,
            placement_beep_ms: c.placement_beep_ms,
            complete_beep_ms: c.complete_beep_ms,
        }
    }
}

// ── PlatePlan ────────────────────────────────────────────────────────────────

impl PlatePlan {
    /// Build the plan from a validated one-based target sequence and the two
    /// expected marker identities.
    pub fn from_seq(seq: gantry_config::PlateSeq, marker_ids: [i32; 2]) -> Self {
        let (r1, c1) = seq.first();
        let (r2, c2) = seq.second();
        // The sequence is validated one-based, so zero-based cells are in range
        let first = GridPos::new(r1, c1).unwrap_or(GridPos::ORIGIN);
        let second = GridPos::new(r2, c2).unwrap_or(GridPos::ORIGIN);
        Self::new(first, marker_ids[0], second, marker_ids[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_from_scanned_sequence() {
        let seq = gantry_config::PlateSeq::from_values([5, 4, 3, 2]).expect("valid");
        let plan = PlatePlan::from_seq(seq, [1, 2]);
        assert_eq!(plan.plates[0].target, GridPos::new(4, 3).expect("in range"));
        assert_eq!(plan.plates[1].target, GridPos::new(2, 1).expect("in range"));
        assert_eq!(plan.plates[0].marker_id, 1);
        assert!(!plan.plates[0].placed);
    }
}

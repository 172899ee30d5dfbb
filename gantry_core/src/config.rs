//! Runtime configuration for the gantry control core.
//!
//! These are the structs consumed by `Gantry`; they are separate from the
//! TOML-deserialized config in `gantry_config`.

/// Joystick signal conditioning.
#[derive(Debug, Clone)]
pub struct FilterCfg {
    /// Raw reads averaged per axis per tick (suppresses ADC noise).
    pub oversample: usize,
    /// EMA smoothing factor across ticks, (0.0, 1.0].
    pub ema_alpha: f32,
    /// Counts around the midpoint treated as exactly zero.
    pub deadzone: u16,
    /// Full-scale ADC count (12-bit sensor: 4095).
    pub full_scale: u16,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self {
            oversample: 8,
            ema_alpha: 0.3,
            deadzone: 600,
            full_scale: 4095,
        }
    }
}

/// Motor drive limits and homing behavior.
#[derive(Debug, Clone)]
pub struct DriveCfg {
    /// Cap on per-motor drive magnitude (1..=255).
    pub max_drive: i16,
    /// Fixed drive magnitude used while homing toward the limit switches.
    pub homing_drive: i16,
    /// Pause between homing the two axes (ms).
    pub homing_settle_ms: u64,
    /// Abort homing if an axis drives this long without hitting its limit
    /// switch. 0 disables the watchdog.
    pub homing_timeout_ms: u64,
}

impl Default for DriveCfg {
    fn default() -> Self {
        Self {
            max_drive: 255,
            homing_drive: 100,
            homing_settle_ms: 500,
            homing_timeout_ms: 0,
        }
    }
}

/// Workflow timing: grip settle, placement dwell, debounce and signaling.
#[derive(Debug, Clone)]
pub struct SequenceCfg {
    /// Magnet grip-settle delay after a confirmed pickup (ms).
    pub grip_settle_ms: u64,
    /// Continuous time at target before release is triggered (ms).
    pub dwell_ms: u64,
    /// Confirm-button debounce window (ms).
    pub confirm_debounce_ms: u64,
    /// Control loop period (ms).
    pub tick_ms: u64,
    /// Reverse pulse length of the magnet's final release (ms).
    pub release_pulse_ms: u64,
    pub detect_beep_ms: u64,
    pub confirm_beep_ms: u64,
    pub placement_beep_ms: u64,
    pub complete_beep_ms: u64,
}

impl Default for SequenceCfg {
    fn default() -> Self {
        Self {
            grip_settle_ms: 1000,
            dwell_ms: 5000,
            confirm_debounce_ms: 50,
            tick_ms: 20,
            release_pulse_ms: 1000,
            detect_beep_ms: 100,
            confirm_beep_ms: 200,
            placement_beep_ms: 500,
            complete_beep_ms: 1000,
        }
    }
}

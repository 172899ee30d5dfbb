#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and plate-plan parsing for the gantry station.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - `PlateSeq` parses the externally supplied 4-integer target sequence
//!   (one-based, as scanned) into the two plate targets.
use serde::Deserialize;

/// Grid dimension of the placement board.
pub const GRID_SIZE: u8 = 5;

/// Raspberry Pi pin assignments for hardware builds. Absent in simulation.
#[derive(Debug, Deserialize, Clone)]
pub struct Pins {
    /// sysfs IIO voltage files for the joystick pots (e.g. in_voltage0_raw)
    pub pot_x_path: String,
    pub pot_y_path: String,
    /// Hardware PWM channel per motor (0 or 1 on the Pi)
    pub motor_a_pwm_chan: u8,
    pub motor_b_pwm_chan: u8,
    pub motor_a_in1: u8,
    pub motor_a_in2: u8,
    pub motor_b_in3: u8,
    pub motor_b_in4: u8,
    pub limit_x: u8,
    pub limit_y: u8,
    pub confirm: u8,
    pub magnet_enable: u8,
    pub magnet_forward: u8,
    pub magnet_reverse: u8,
    pub buzzer: u8,
    pub indicator: u8,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FilterCfg {
    /// Raw reads averaged per axis per tick
    pub oversample: usize,
    /// EMA smoothing factor across ticks, (0.0, 1.0]
    pub ema_alpha: f32,
    /// Counts around center treated as exactly zero
    pub deadzone: u16,
    /// Full-scale ADC count (12-bit sensor: 4095)
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

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DriveCfg {
    /// Cap on per-motor drive magnitude (1..=255)
    pub max_drive: u16,
    /// Fixed drive magnitude used while homing
    pub homing_drive: u16,
    /// Pause between homing the two axes (ms)
    pub homing_settle_ms: u64,
    /// Abort homing if an axis travels this long without hitting its
    /// limit switch. 0 disables the watchdog.
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

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SequenceCfg {
    /// Magnet grip-settle delay after a confirmed pickup (ms)
    pub grip_settle_ms: u64,
    /// Continuous time at target before release is triggered (ms)
    pub dwell_ms: u64,
    /// Confirm-button debounce window (ms)
    pub confirm_debounce_ms: u64,
    /// Control loop period (ms)
    pub tick_ms: u64,
    /// Reverse pulse length of the magnet's final release (ms)
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

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PlatesCfg {
    /// One-based target sequence as scanned: row1, col1, row2, col2
    pub targets: [u8; 4],
    /// Expected fiducial marker identities for the two plates
    pub marker_ids: [i32; 2],
}

impl Default for PlatesCfg {
    fn default() -> Self {
        Self {
            targets: [5, 4, 3, 2],
            marker_ids: [1, 2],
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    /// Pin map; required only for hardware builds
    pub pins: Option<Pins>,
    pub filter: FilterCfg,
    pub drive: DriveCfg,
    pub sequence: SequenceCfg,
    pub plates: PlatesCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Filter
        if self.filter.oversample == 0 {
            eyre::bail!("filter.oversample must be >= 1");
        }
        if !(self.filter.ema_alpha > 0.0 && self.filter.ema_alpha <= 1.0) {
            eyre::bail!("filter.ema_alpha must be in (0.0, 1.0]");
        }
        if self.filter.full_scale == 0 {
            eyre::bail!("filter.full_scale must be > 0");
        }
        if self.filter.deadzone >= self.filter.full_scale / 2 {
            eyre::bail!("filter.deadzone must be below half of filter.full_scale");
        }

        // Drive
        if self.drive.max_drive == 0 || self.drive.max_drive > 255 {
            eyre::bail!("drive.max_drive must be in 1..=255");
        }
        if self.drive.homing_drive == 0 || self.drive.homing_drive > 255 {
            eyre::bail!("drive.homing_drive must be in 1..=255");
        }

        // Sequence
        if self.sequence.dwell_ms == 0 {
            eyre::bail!("sequence.dwell_ms must be >= 1");
        }
        if self.sequence.tick_ms == 0 {
            eyre::bail!("sequence.tick_ms must be >= 1");
        }
        if self.sequence.tick_ms > 1000 {
            eyre::bail!("sequence.tick_ms is unreasonably large (>1s)");
        }

        // Plates
        PlateSeq::from_values(self.plates.targets)?;
        if self.plates.marker_ids[0] == self.plates.marker_ids[1] {
            eyre::bail!("plates.marker_ids must be two distinct identities");
        }

        Ok(())
    }
}

/// Validated one-based plate-target sequence (row1, col1, row2, col2),
/// originally supplied by a scanned code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlateSeq(pub [u8; 4]);

impl PlateSeq {
    /// Build from raw values, requiring each to be in 1..=GRID_SIZE.
    pub fn from_values(values: [u8; 4]) -> eyre::Result<Self> {
        for (i, v) in values.iter().enumerate() {
            if !(1..=GRID_SIZE).contains(v) {
                eyre::bail!(
                    "plate target value {} at position {} out of range 1..={}",
                    v,
                    i,
                    GRID_SIZE
                );
            }
        }
        Ok(Self(values))
    }

    /// Parse the sequence from operator input: either four digits ("5432")
    /// or four comma-separated integers ("5,4,3,2").
    pub fn parse(s: &str) -> eyre::Result<Self> {
        let s = s.trim();
        let digits: Vec<u8> = if s.contains(',') {
            s.split(',')
                .map(|p| {
                    p.trim()
                        .parse::<u8>()
                        .map_err(|e| eyre::eyre!("invalid plate target {:?}: {}", p, e))
                })
                .collect::<eyre::Result<_>>()?
        } else {
            s.chars()
                .map(|c| {
                    c.to_digit(10)
                        .map(|d| d as u8)
                        .ok_or_else(|| eyre::eyre!("invalid plate target digit {:?}", c))
                })
                .collect::<eyre::Result<_>>()?
        };
        let values: [u8; 4] = digits
            .try_into()
            .map_err(|v: Vec<u8>| eyre::eyre!("expected 4 plate target values, got {}", v.len()))?;
        Self::from_values(values)
    }

    /// Zero-based (row, col) target of the first plate.
    pub fn first(&self) -> (u8, u8) {
        (self.0[0] - 1, self.0[1] - 1)
    }

    /// Zero-based (row, col) target of the second plate.
    pub fn second(&self) -> (u8, u8) {
        (self.0[2] - 1, self.0[3] - 1)
    }
}

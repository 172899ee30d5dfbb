//! Homing as an explicit sub-state machine ticked alongside the main loop.
//!
//! Each axis drives at a fixed speed in the negative direction until its
//! limit switch asserts, then settles briefly before the next axis starts.
//! Display and telemetry stay live throughout, and an optional travel
//! timeout can abort a run whose switch never asserts.

use crate::config::DriveCfg;
use crate::error::{GantryError, Result};
use crate::kinematics::{Axis, LimitMask};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    DriveX { since_ms: u64 },
    SettleX { until_ms: u64 },
    DriveY { since_ms: u64 },
    SettleY { until_ms: u64 },
    Done,
}

/// Commands for the current homing tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomingStep {
    Active { x_cmd: i16, y_cmd: i16 },
    Done,
}

#[derive(Debug, Clone)]
pub struct HomingSequencer {
    phase: Phase,
    drive: i16,
    settle_ms: u64,
    timeout_ms: u64,
}

impl HomingSequencer {
    pub fn new(now_ms: u64, cfg: &DriveCfg) -> Self {
        Self {
            phase: Phase::DriveX { since_ms: now_ms },
            drive: cfg.homing_drive,
            settle_ms: cfg.homing_settle_ms,
            timeout_ms: cfg.homing_timeout_ms,
        }
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Evaluate one tick of the sequence against the current limit inputs.
    pub fn tick(&mut self, now_ms: u64, limits: LimitMask) -> Result<HomingStep> {
        match self.phase {
            Phase::DriveX { since_ms } => {
                if limits.x_at_limit {
                    tracing::debug!("X limit reached");
                    self.phase = Phase::SettleX {
                        until_ms: now_ms + self.settle_ms,
                    };
                    Ok(HomingStep::Active { x_cmd: 0, y_cmd: 0 })
                } else {
                    self.check_travel(Axis::X, now_ms, since_ms)?;
                    Ok(HomingStep::Active {
                        x_cmd: -self.drive,
                        y_cmd: 0,
                    })
                }
            }
            Phase::SettleX { until_ms } => {
                if now_ms >= until_ms {
                    self.phase = Phase::DriveY { since_ms: now_ms };
                }
                Ok(HomingStep::Active { x_cmd: 0, y_cmd: 0 })
            }
            Phase::DriveY { since_ms } => {
                if limits.y_at_limit {
                    tracing::debug!("Y limit reached");
                    self.phase = Phase::SettleY {
                        until_ms: now_ms + self.settle_ms,
                    };
                    Ok(HomingStep::Active { x_cmd: 0, y_cmd: 0 })
                } else {
                    self.check_travel(Axis::Y, now_ms, since_ms)?;
                    Ok(HomingStep::Active {
                        x_cmd: 0,
                        y_cmd: -self.drive,
                    })
                }
            }
            Phase::SettleY { until_ms } => {
                if now_ms >= until_ms {
                    self.phase = Phase::Done;
                    return Ok(HomingStep::Done);
                }
                Ok(HomingStep::Active { x_cmd: 0, y_cmd: 0 })
            }
            Phase::Done => Ok(HomingStep::Done),
        }
    }

    fn check_travel(&self, axis: Axis, now_ms: u64, since_ms: u64) -> Result<()> {
        if self.timeout_ms == 0 {
            return Ok(());
        }
        let elapsed_ms = now_ms.saturating_sub(since_ms);
        if elapsed_ms >= self.timeout_ms {
            return Err(eyre::Report::new(GantryError::HomingTimeout {
                axis,
                elapsed_ms,
            }));
        }
        Ok(())
    }
}

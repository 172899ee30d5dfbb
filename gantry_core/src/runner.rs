//! Fixed-period control loop around [`Gantry::tick`].

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::Result;
use crate::util::tick_period;
use crate::{Gantry, GantryStatus};

/// Run the control loop until the shutdown flag is raised. Completion is
/// announced once; the loop keeps ticking afterwards so the operator can
/// jog the carriage freely.
pub fn run(gantry: &mut Gantry, shutdown: &AtomicBool) -> Result<()> {
    let period = tick_period(gantry.tick_ms());
    tracing::info!(tick_ms = gantry.tick_ms(), "control loop start");
    let mut announced = false;
    while !shutdown.load(Ordering::Relaxed) {
        match gantry.tick() {
            Ok(GantryStatus::Running) => {}
            Ok(GantryStatus::Complete) => {
                if !announced {
                    announced = true;
                    tracing::info!("both plates placed; free jog mode");
                }
            }
            Err(e) => {
                gantry.stop_motors();
                tracing::error!(error = %e, "control loop aborted");
                return Err(e);
            }
        }
        gantry.clock().sleep(period);
    }
    gantry.stop_motors();
    tracing::info!("control loop stopped");
    Ok(())
}

/// Tick a bounded number of times, returning the last status. Used by the
/// CLI self-check and by tests that drive virtual time.
pub fn run_ticks(gantry: &mut Gantry, ticks: usize) -> Result<GantryStatus> {
    let period = tick_period(gantry.tick_ms());
    let mut status = GantryStatus::Running;
    for _ in 0..ticks {
        status = gantry.tick()?;
        gantry.clock().sleep(period);
    }
    Ok(status)
}

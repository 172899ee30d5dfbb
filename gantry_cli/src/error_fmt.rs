//! Human-readable error descriptions and structured JSON error formatting.

use gantry_core::{BuildError, GantryError};

/// Map an eyre::Report to a human-readable explanation with likely causes
/// and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingPeripherals => {
                "What happened: No peripherals were provided to the control core.\nLikely causes: Hardware assembly failed or was not wired into the builder.\nHow to fix: Ensure the peripheral set is created successfully and passed via with_peripherals(...).".to_string()
            }
            BuildError::MissingFeed => {
                "What happened: No command feed was provided.\nLikely causes: The serial/TCP source failed to open.\nHow to fix: Check the camera connection, or run with --listen to accept a TCP feed.".to_string()
            }
            BuildError::MissingPlan => {
                "What happened: No plate plan was configured.\nLikely causes: Neither the config nor --targets supplied a target sequence.\nHow to fix: Provide [plates].targets in the config or pass --targets 5432.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See README for a sample."
            ),
        };
    }

    if let Some(ge) = err.downcast_ref::<GantryError>() {
        if let GantryError::HomingTimeout { axis, elapsed_ms } = ge {
            return format!(
                "What happened: Homing timed out on axis {axis} after {elapsed_ms} ms.\nLikely causes: Limit switch unplugged, jammed carriage, or motor not moving.\nHow to fix: Check the {axis} limit switch wiring and the drivetrain, or raise drive.homing_timeout_ms."
            );
        }
        return format!("What happened: {ge}.\nLikely causes: Wiring or driver fault.\nHow to fix: Check connections and rerun with --log-level debug.");
    }

    format!("{err:#}")
}

/// Structured error line for `--json` consumers.
pub fn json_error(err: &eyre::Report) -> String {
    serde_json::json!({
        "ok": false,
        "error": format!("{err:#}"),
    })
    .to_string()
}

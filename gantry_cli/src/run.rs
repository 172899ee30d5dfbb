//! Config mapping, peripheral assembly, and workflow execution.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use eyre::WrapErr;
use gantry_config::{Config, PlateSeq};
use gantry_core::error::Result as CoreResult;
use gantry_core::mocks::{ManualClock, NoopFeed};
use gantry_core::{Gantry, GantryStatus, Peripherals, PlatePlan, WorkflowState, runner};
use gantry_hardware::{SimDisplay, SimMagnet, SimMotor, SimOut, SimPot, SimSwitch};

/// Assemble the simulated peripheral set (no hardware attached). The pots
/// rest at the ADC midpoint, the limit switches read as triggered so homing
/// completes immediately on a bench without a carriage.
fn sim_peripherals(cfg: &Config) -> Peripherals {
    let center = cfg.filter.full_scale / 2;
    Peripherals {
        pot_x: Box::new(SimPot::new(center)),
        pot_y: Box::new(SimPot::new(center)),
        motor_a: Box::new(SimMotor::new("a")),
        motor_b: Box::new(SimMotor::new("b")),
        limit_x: Box::new(SimSwitch::new(true)),
        limit_y: Box::new(SimSwitch::new(true)),
        confirm: Box::new(SimSwitch::new(false)),
        magnet: Box::new(SimMagnet::new()),
        buzzer: Box::new(SimOut::new("buzzer")),
        indicator: Box::new(SimOut::new("indicator")),
        display: Box::new(SimDisplay::new()),
    }
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn hardware_peripherals(cfg: &Config) -> CoreResult<Peripherals> {
    use gantry_hardware::gpio;

    let pins = cfg
        .pins
        .as_ref()
        .ok_or_else(|| eyre::eyre!("hardware build requires a [pins] section in the config"))?;
    gpio::settle_inputs();
    Ok(Peripherals {
        pot_x: Box::new(gpio::IioPot::new(&pins.pot_x_path)),
        pot_y: Box::new(gpio::IioPot::new(&pins.pot_y_path)),
        motor_a: Box::new(
            gpio::L298Motor::new(pins.motor_a_pwm_chan, pins.motor_a_in1, pins.motor_a_in2)
                .wrap_err("motor A")?,
        ),
        motor_b: Box::new(
            gpio::L298Motor::new(pins.motor_b_pwm_chan, pins.motor_b_in3, pins.motor_b_in4)
                .wrap_err("motor B")?,
        ),
        limit_x: Box::new(gpio::SwitchIn::new(pins.limit_x, false).wrap_err("limit X")?),
        limit_y: Box::new(gpio::SwitchIn::new(pins.limit_y, false).wrap_err("limit Y")?),
        confirm: Box::new(gpio::SwitchIn::new(pins.confirm, true).wrap_err("confirm button")?),
        magnet: Box::new(
            gpio::MagnetOut::new(pins.magnet_enable, pins.magnet_forward, pins.magnet_reverse)
                .wrap_err("magnet driver")?,
        ),
        buzzer: Box::new(gpio::OutPin::new(pins.buzzer).wrap_err("buzzer")?),
        indicator: Box::new(gpio::OutPin::new(pins.indicator).wrap_err("indicator")?),
        display: Box::new(SimDisplay::new()),
    })
}

fn build_plan(cfg: &Config, targets_override: Option<&str>) -> CoreResult<PlatePlan> {
    let seq = match targets_override {
        Some(s) => PlateSeq::parse(s).wrap_err("invalid --targets")?,
        None => PlateSeq::from_values(cfg.plates.targets).wrap_err("invalid [plates].targets")?,
    };
    Ok(PlatePlan::from_seq(seq, cfg.plates.marker_ids))
}

fn build_gantry(
    cfg: &Config,
    periph: Peripherals,
    feed: impl gantry_traits::FeedSource + 'static,
    plan: PlatePlan,
) -> CoreResult<Gantry> {
    Gantry::builder()
        .with_peripherals(periph)
        .with_feed(feed)
        .with_plan(plan)
        .with_filter((&cfg.filter).into())
        .with_drive((&cfg.drive).into())
        .with_sequence((&cfg.sequence).into())
        .try_build()
}

/// Run the placement workflow until interrupted.
pub fn run_station(
    cfg: &Config,
    targets_override: Option<&str>,
    listen: Option<&str>,
    summary: bool,
) -> CoreResult<()> {
    let plan = build_plan(cfg, targets_override)?;

    #[cfg(all(feature = "hardware", target_os = "linux"))]
    let periph = hardware_peripherals(cfg)?;
    #[cfg(not(all(feature = "hardware", target_os = "linux")))]
    let periph = sim_peripherals(cfg);

    let feed = open_feed(listen)?;

    let mut gantry = build_gantry(cfg, periph, feed, plan)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_handler = shutdown.clone();
    ctrlc::set_handler(move || {
        shutdown_handler.store(true, Ordering::Relaxed);
    })
    .wrap_err("install ctrl-c handler")?;

    tracing::info!(
        target_1 = %plan.plates[0].target,
        target_2 = %plan.plates[1].target,
        "station starting"
    );
    let result = runner::run(&mut gantry, &shutdown);

    if summary {
        println!("{}", placement_summary(&gantry));
    }
    result
}

fn open_feed(listen: Option<&str>) -> CoreResult<gantry_core::feed::ThreadedFeed> {
    match listen {
        Some(addr) => {
            let listener = std::net::TcpListener::bind(addr)
                .wrap_err_with(|| format!("bind feed listener on {addr}"))?;
            tracing::info!(addr, "waiting for camera feed connection");
            let (stream, peer) = listener.accept().wrap_err("accept feed connection")?;
            tracing::info!(%peer, "camera feed connected");
            Ok(gantry_core::feed::ThreadedFeed::spawn(stream))
        }
        None => {
            tracing::info!("reading camera feed from stdin");
            Ok(gantry_core::feed::ThreadedFeed::spawn(std::io::stdin()))
        }
    }
}

fn placement_summary(gantry: &Gantry) -> String {
    let plates: Vec<_> = gantry
        .plates()
        .iter()
        .map(|p| {
            serde_json::json!({
                "marker_id": p.marker_id,
                "target": [p.target.row(), p.target.col()],
                "placed": p.placed,
            })
        })
        .collect();
    serde_json::json!({
        "ok": true,
        "state": gantry.state().name(),
        "plates": plates,
    })
    .to_string()
}

/// Assemble a simulated station and home it under virtual time; proves the
/// whole stack wires together without touching hardware.
pub fn self_check(cfg: &Config) -> CoreResult<()> {
    let plan = build_plan(cfg, None)?;
    let clock = ManualClock::new();
    let mut gantry = Gantry::builder()
        .with_peripherals(sim_peripherals(cfg))
        .with_feed(NoopFeed)
        .with_plan(plan)
        .with_filter((&cfg.filter).into())
        .with_drive((&cfg.drive).into())
        .with_sequence((&cfg.sequence).into())
        .with_clock(Box::new(clock))
        .try_build()?;

    // Enough virtual time for both homing settle windows
    let status = runner::run_ticks(&mut gantry, 200)?;
    if !matches!(gantry.state(), WorkflowState::WaitPlate { .. }) {
        return Err(eyre::eyre!(
            "self-check did not reach WAIT_PLATE_1 (state {}, status {status:?})",
            gantry.state().name()
        ));
    }
    println!("self-check ok: homed to origin, waiting for plate 1");
    Ok(())
}

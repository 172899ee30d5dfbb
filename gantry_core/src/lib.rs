#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Gantry control core (hardware-agnostic).
//!
//! This crate provides the hardware-independent control engine for the
//! plate-placement station. All hardware interactions go through the
//! `gantry_traits` traits.
//!
//! ## Architecture
//!
//! - **Filtering**: joystick oversampling, EMA, deadzone, quadratic curve
//!   (`filter` module)
//! - **Kinematics**: coupled-axis H-bot mix with limit vetoes
//!   (`kinematics` module)
//! - **Protocol**: newline-delimited command feed from the vision
//!   subsystem (`protocol`, `feed` modules)
//! - **Sequencing**: homing, magnet and buzzer phases
//!   (`homing`, `magnet`, `signals` modules)
//! - **Workflow**: the two-plate pick/move/verify state machine
//!   (`workflow` module, driven by [`Gantry::tick`])
//!
//! One `Gantry` owns all shared state (current position, targets, timers,
//! workflow state) and is ticked from a single control thread; the only
//! auxiliary thread is the feed reader in `feed`.

// Module declarations
pub mod config;
pub mod conversions;
pub mod debounce;
pub mod display;
pub mod error;
pub mod feed;
pub mod filter;
pub mod homing;
pub mod kinematics;
pub mod magnet;
pub mod mocks;
pub mod motor;
pub mod protocol;
pub mod runner;
pub mod signals;
pub mod util;
pub mod workflow;

use std::sync::Arc;
use std::time::Instant;

use eyre::WrapErr;
use gantry_traits::clock::{Clock, MonotonicClock};
use gantry_traits::{DigitalIn, DigitalOut, Display, FeedSource, Magnet, Motor, Pot};

pub use crate::config::{DriveCfg, FilterCfg, SequenceCfg};
pub use crate::error::{BuildError, GantryError};
use crate::error::{Result, map_hw_error_dyn};
use crate::debounce::EdgeDebouncer;
use crate::filter::AxisFilter;
use crate::homing::{HomingSequencer, HomingStep};
use crate::kinematics::LimitMask;
use crate::magnet::MagnetController;
use crate::protocol::{FeedEvent, FeedParser};
use crate::signals::Chime;
pub use crate::workflow::{
    GridPos, MarkerObservation, PlatePlan, PlateSlot, PlateTarget, WorkflowState,
};

/// The full set of hardware endpoints the core drives.
pub struct Peripherals {
    pub pot_x: Box<dyn Pot>,
    pub pot_y: Box<dyn Pot>,
    pub motor_a: Box<dyn Motor>,
    pub motor_b: Box<dyn Motor>,
    pub limit_x: Box<dyn DigitalIn>,
    pub limit_y: Box<dyn DigitalIn>,
    pub confirm: Box<dyn DigitalIn>,
    pub magnet: Box<dyn Magnet>,
    pub buzzer: Box<dyn DigitalOut>,
    pub indicator: Box<dyn DigitalOut>,
    pub display: Box<dyn Display>,
}

/// Public status of a single control tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GantryStatus {
    /// Workflow still in progress.
    Running,
    /// Both plates placed; motors keep following the pots for free jog.
    Complete,
}

/// The control core: owns all shared state and every peripheral, and
/// evaluates exactly one workflow transition per tick.
pub struct Gantry {
    periph: Peripherals,
    feed: Box<dyn FeedSource>,
    drive_cfg: DriveCfg,
    seq_cfg: SequenceCfg,
    // Unified clock for deterministic time in tests
    clock: Arc<dyn Clock + Send + Sync>,
    // Epoch Instant for computing monotonic milliseconds
    epoch: Instant,

    state: WorkflowState,
    plates: [PlateTarget; 2],
    observation: Option<MarkerObservation>,
    current: Option<GridPos>,

    filter_x: AxisFilter,
    filter_y: AxisFilter,
    parser: FeedParser,
    confirm_edge: EdgeDebouncer,
    magnet: MagnetController,
    chime: Chime,

    // Scratch buffers reused across ticks
    read_buf: [u8; 256],
    events: Vec<FeedEvent>,
    last_display: Option<(String, String)>,
}

impl core::fmt::Debug for Gantry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Gantry")
            .field("state", &self.state.name())
            .field("current", &self.current)
            .field("magnet", &self.magnet.phase())
            .finish()
    }
}

impl Gantry {
    /// Start building a Gantry.
    pub fn builder() -> GantryBuilder {
        GantryBuilder::default()
    }

    /// Control loop period in milliseconds.
    pub fn tick_ms(&self) -> u64 {
        self.seq_cfg.tick_ms
    }

    pub fn clock(&self) -> &Arc<dyn Clock + Send + Sync> {
        &self.clock
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn plates(&self) -> &[PlateTarget; 2] {
        &self.plates
    }

    pub fn current_position(&self) -> Option<GridPos> {
        self.current
    }

    pub fn observation(&self) -> Option<&MarkerObservation> {
        self.observation.as_ref()
    }

    pub fn magnet_phase(&self) -> magnet::MagnetPhase {
        self.magnet.phase()
    }

    /// One iteration of the control loop.
    pub fn tick(&mut self) -> Result<GantryStatus> {
        let now = self.clock.ms_since(self.epoch);

        // 1) Drain the command feed and fold events into shared state.
        let release_requested = self.drain_feed(now);

        // 2) Digital inputs.
        let confirm_level = self
            .periph
            .confirm
            .is_active()
            .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))
            .wrap_err("confirm input")?;
        let confirm = self.confirm_edge.poll(confirm_level, now);
        let limits = LimitMask {
            x_at_limit: self
                .periph
                .limit_x
                .is_active()
                .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))
                .wrap_err("limit switch X")?,
            y_at_limit: self
                .periph
                .limit_y
                .is_active()
                .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))
                .wrap_err("limit switch Y")?,
        };

        // 3) Axis commands; sampled every tick so smoothing stays warm.
        let x_cmd = self.filter_x.sample(self.periph.pot_x.as_mut())?;
        let y_cmd = self.filter_y.sample(self.periph.pot_y.as_mut())?;

        // 4) Exactly one workflow transition evaluation.
        self.step_workflow(now, confirm, release_requested, limits, x_cmd, y_cmd)?;

        // 5) Timed output phases.
        self.magnet.tick(self.periph.magnet.as_mut(), now)?;
        self.chime.tick(self.periph.buzzer.as_mut(), now)?;

        // 6) Display follows state and position within the same tick.
        self.update_display()?;

        Ok(match self.state {
            WorkflowState::Complete => GantryStatus::Complete,
            _ => GantryStatus::Running,
        })
    }

    /// Best-effort motor stop, used on shutdown paths.
    pub fn stop_motors(&mut self) {
        if let Err(e) = motor::apply_drive(self.periph.motor_a.as_mut(), 0) {
            tracing::warn!(error = %e, "motor A stop failed");
        }
        if let Err(e) = motor::apply_drive(self.periph.motor_b.as_mut(), 0) {
            tracing::warn!(error = %e, "motor B stop failed");
        }
    }

    /// Drain all buffered feed bytes, apply position reports and pickup
    /// directives, and report whether a RELEASE override arrived.
    fn drain_feed(&mut self, now: u64) -> bool {
        self.events.clear();
        loop {
            let n = match self.feed.read_available(&mut self.read_buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    tracing::warn!(error = %e, "command feed read failed");
                    break;
                }
            };
            let (head, _) = self.read_buf.split_at(n);
            self.parser.ingest(head, &mut self.events);
        }

        let mut release_requested = false;
        for i in 0..self.events.len() {
            let event = self.events[i];
            match event {
                FeedEvent::Report { id, pos } => {
                    self.observation = Some(MarkerObservation {
                        id,
                        pos,
                        seen_at_ms: now,
                    });
                    self.current = Some(pos);
                    tracing::trace!(id, %pos, "position report");
                }
                FeedEvent::Pickup { id, pos } => self.handle_pickup(id, pos),
                FeedEvent::Release => release_requested = true,
            }
        }
        release_requested
    }

    /// A PICKUP directive rebinds the awaiting/picking plate's target,
    /// superseding its configured one. Not honored mid-flight.
    fn handle_pickup(&mut self, id: i32, pos: GridPos) {
        match &self.state {
            WorkflowState::WaitPlate { slot, .. } | WorkflowState::PickPlate { slot, .. } => {
                let plate = &mut self.plates[slot.index()];
                plate.target = pos;
                plate.marker_id = id;
                tracing::info!(plate = slot.label(), id, %pos, "pickup directive rebound target");
            }
            other => {
                tracing::debug!(state = other.name(), id, "PICKUP ignored outside wait/pick")
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn step_workflow(
        &mut self,
        now: u64,
        confirm: bool,
        release_requested: bool,
        limits: LimitMask,
        x_cmd: i16,
        y_cmd: i16,
    ) -> Result<()> {
        use WorkflowState::*;

        if release_requested && !matches!(self.state, MovePlate { .. } | VerifyPlate { .. }) {
            tracing::debug!(state = self.state.name(), "RELEASE ignored in this state");
        }

        // Take the state out to transition enum variants that carry data;
        // every arm below assigns the successor.
        let state = std::mem::replace(&mut self.state, Init);
        let next = match state {
            Init => {
                self.magnet.disable(self.periph.magnet.as_mut())?;
                self.brake_motors()?;
                tracing::info!(
                    target_1 = %self.plates[0].target,
                    target_2 = %self.plates[1].target,
                    "plate targets loaded; homing"
                );
                Homing(HomingSequencer::new(now, &self.drive_cfg))
            }

            Homing(mut seq) => match seq.tick(now, limits)? {
                HomingStep::Active { x_cmd: hx, y_cmd: hy } => {
                    self.drive_axes(hx, hy, limits)?;
                    Homing(seq)
                }
                HomingStep::Done => {
                    self.brake_motors()?;
                    self.current = Some(GridPos::ORIGIN);
                    self.observation = None;
                    tracing::info!("homing complete; origin established");
                    WaitPlate {
                        slot: PlateSlot::First,
                        pending: false,
                    }
                }
            },

            WaitPlate { slot, pending } => {
                self.brake_motors()?;
                let seen_at_origin = self
                    .observation
                    .is_some_and(|obs| obs.pos == GridPos::ORIGIN);
                if !pending && seen_at_origin {
                    self.chime.pulse(self.seq_cfg.detect_beep_ms);
                    tracing::info!(plate = slot.label(), "marker detected at origin; confirm to pick");
                    WaitPlate {
                        slot,
                        pending: true,
                    }
                } else if pending && confirm {
                    self.bind_plate(slot);
                    self.magnet.engage(self.periph.magnet.as_mut())?;
                    self.chime.pulse(self.seq_cfg.confirm_beep_ms);
                    tracing::info!(plate = slot.label(), "pickup confirmed; magnet engaged");
                    PickPlate {
                        slot,
                        grip_until_ms: now + self.seq_cfg.grip_settle_ms,
                    }
                } else {
                    WaitPlate { slot, pending }
                }
            }

            PickPlate {
                slot,
                grip_until_ms,
            } => {
                self.brake_motors()?;
                if now >= grip_until_ms {
                    tracing::debug!(plate = slot.label(), "grip settled; jog enabled");
                    MovePlate { slot }
                } else {
                    PickPlate {
                        slot,
                        grip_until_ms,
                    }
                }
            }

            MovePlate { slot } => {
                self.drive_axes(x_cmd, y_cmd, limits)?;
                if release_requested {
                    self.release_plate(slot, now)?
                } else if self.at_target(slot) {
                    tracing::debug!(plate = slot.label(), "target reached; dwell armed");
                    VerifyPlate {
                        slot,
                        dwell_started_ms: now,
                    }
                } else {
                    MovePlate { slot }
                }
            }

            VerifyPlate {
                slot,
                dwell_started_ms,
            } => {
                self.drive_axes(x_cmd, y_cmd, limits)?;
                if release_requested {
                    self.release_plate(slot, now)?
                } else if !self.at_target(slot) {
                    tracing::debug!(plate = slot.label(), "position deviated; dwell disarmed");
                    MovePlate { slot }
                } else if now.saturating_sub(dwell_started_ms) >= self.seq_cfg.dwell_ms {
                    self.release_plate(slot, now)?
                } else {
                    VerifyPlate {
                        slot,
                        dwell_started_ms,
                    }
                }
            }

            Complete => {
                self.drive_axes(x_cmd, y_cmd, limits)?;
                Complete
            }
        };
        self.state = next;
        Ok(())
    }

    /// Bind the plate to the observed marker; if the second configured
    /// identity shows up first, the two targets swap so the detected plate
    /// still proceeds to its assigned cell.
    fn bind_plate(&mut self, slot: PlateSlot) {
        if slot == PlateSlot::First
            && let Some(obs) = self.observation
            && obs.id == self.plates[1].marker_id
        {
            self.plates.swap(0, 1);
            tracing::info!(id = obs.id, "second plate detected first; targets swapped");
        }
    }

    fn at_target(&self, slot: PlateSlot) -> bool {
        self.current == Some(self.plates[slot.index()].target)
    }

    /// Release the active plate and advance: hold-release toward plate 2,
    /// final release into COMPLETE.
    fn release_plate(&mut self, slot: PlateSlot, now: u64) -> Result<WorkflowState> {
        self.brake_motors()?;
        self.plates[slot.index()].placed = true;
        self.chime.pulse(self.seq_cfg.placement_beep_ms);
        match slot {
            PlateSlot::First => {
                self.magnet.hold_release(self.periph.magnet.as_mut())?;
                self.observation = None;
                tracing::info!("plate 1 placed; awaiting plate 2");
                Ok(WorkflowState::WaitPlate {
                    slot: PlateSlot::Second,
                    pending: false,
                })
            }
            PlateSlot::Second => {
                self.magnet.final_release(self.periph.magnet.as_mut(), now)?;
                self.periph
                    .indicator
                    .set(true)
                    .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))
                    .wrap_err("success indicator")?;
                self.chime.pulse(self.seq_cfg.complete_beep_ms);
                tracing::info!("plate 2 placed; sequence complete");
                Ok(WorkflowState::Complete)
            }
        }
    }

    fn drive_axes(&mut self, x_cmd: i16, y_cmd: i16, limits: LimitMask) -> Result<()> {
        let pair = kinematics::drive_commands(x_cmd, y_cmd, limits, self.drive_cfg.max_drive);
        motor::apply_drive(self.periph.motor_a.as_mut(), pair.motor_a)?;
        motor::apply_drive(self.periph.motor_b.as_mut(), pair.motor_b)?;
        Ok(())
    }

    fn brake_motors(&mut self) -> Result<()> {
        motor::apply_drive(self.periph.motor_a.as_mut(), 0)?;
        motor::apply_drive(self.periph.motor_b.as_mut(), 0)?;
        Ok(())
    }

    fn update_display(&mut self) -> Result<()> {
        let lines = display::render(
            &self.state,
            self.current,
            &self.plates,
            self.observation.as_ref(),
        );
        if self.last_display.as_ref() != Some(&lines) {
            self.periph
                .display
                .show(&lines.0, &lines.1)
                .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))
                .wrap_err("display update")?;
            self.last_display = Some(lines);
        }
        Ok(())
    }
}

/// Builder for `Gantry`. All fields are validated on `try_build()`.
#[derive(Default)]
pub struct GantryBuilder {
    periph: Option<Peripherals>,
    feed: Option<Box<dyn FeedSource>>,
    plan: Option<PlatePlan>,
    filter: Option<FilterCfg>,
    drive: Option<DriveCfg>,
    sequence: Option<SequenceCfg>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
}

impl GantryBuilder {
    pub fn with_peripherals(mut self, periph: Peripherals) -> Self {
        self.periph = Some(periph);
        self
    }

    pub fn with_feed(mut self, feed: impl FeedSource + 'static) -> Self {
        self.feed = Some(Box::new(feed));
        self
    }

    pub fn with_plan(mut self, plan: PlatePlan) -> Self {
        self.plan = Some(plan);
        self
    }

    pub fn with_filter(mut self, filter: FilterCfg) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_drive(mut self, drive: DriveCfg) -> Self {
        self.drive = Some(drive);
        self
    }

    pub fn with_sequence(mut self, sequence: SequenceCfg) -> Self {
        self.sequence = Some(sequence);
        self
    }

    /// Provide a custom clock implementation; defaults to MonotonicClock.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validate and build the Gantry.
    pub fn try_build(self) -> Result<Gantry> {
        let GantryBuilder {
            periph,
            feed,
            plan,
            filter,
            drive,
            sequence,
            clock,
        } = self;

        let periph = periph.ok_or_else(|| eyre::Report::new(BuildError::MissingPeripherals))?;
        let feed = feed.ok_or_else(|| eyre::Report::new(BuildError::MissingFeed))?;
        let plan = plan.ok_or_else(|| eyre::Report::new(BuildError::MissingPlan))?;

        let filter = filter.unwrap_or_default();
        let drive = drive.unwrap_or_default();
        let sequence = sequence.unwrap_or_default();
        let clock: Arc<dyn Clock + Send + Sync> = match clock {
            Some(b) => Arc::from(b),
            None => Arc::new(MonotonicClock::new()),
        };

        // Validate configs (non-panicking; return typed Config errors)
        if filter.oversample == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "filter.oversample must be >= 1",
            )));
        }
        if !(filter.ema_alpha > 0.0 && filter.ema_alpha <= 1.0) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "filter.ema_alpha must be in (0, 1]",
            )));
        }
        if filter.full_scale == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "filter.full_scale must be > 0",
            )));
        }
        if filter.deadzone >= filter.full_scale / 2 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "filter.deadzone must be below half of full_scale",
            )));
        }
        if !(1..=255).contains(&drive.max_drive) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "drive.max_drive must be in 1..=255",
            )));
        }
        if !(1..=255).contains(&drive.homing_drive) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "drive.homing_drive must be in 1..=255",
            )));
        }
        if sequence.dwell_ms == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "sequence.dwell_ms must be >= 1",
            )));
        }
        if sequence.tick_ms == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "sequence.tick_ms must be >= 1",
            )));
        }
        if plan.plates[0].marker_id == plan.plates[1].marker_id {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "plate marker identities must be distinct",
            )));
        }

        let epoch = clock.now();
        let filter_x = AxisFilter::new(&filter);
        let filter_y = AxisFilter::new(&filter);
        let confirm_edge = EdgeDebouncer::new(sequence.confirm_debounce_ms);
        let magnet = MagnetController::new(sequence.release_pulse_ms);

        Ok(Gantry {
            periph,
            feed,
            drive_cfg: drive,
            seq_cfg: sequence,
            clock,
            epoch,
            state: WorkflowState::Init,
            plates: plan.plates,
            observation: None,
            current: None,
            filter_x,
            filter_y,
            parser: FeedParser::new(),
            confirm_edge,
            magnet,
            chime: Chime::new(),
            read_buf: [0u8; 256],
            events: Vec::with_capacity(8),
            last_display: None,
        })
    }
}

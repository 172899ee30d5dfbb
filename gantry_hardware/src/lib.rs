pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;

use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, Mutex};

use gantry_traits::{DigitalIn, DigitalOut, Direction, Display, Magnet, Motor, Pot};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Simulated joystick potentiometer. The shared handle lets a test or a
/// demo driver move the stick while the control loop reads it.
pub struct SimPot {
    value: Arc<AtomicU16>,
}

#[derive(Clone)]
pub struct SimPotHandle(Arc<AtomicU16>);

impl SimPotHandle {
    pub fn set(&self, raw: u16) {
        self.0.store(raw, Ordering::Relaxed);
    }
}

impl SimPot {
    /// A pot resting at `initial` counts (use the ADC midpoint for neutral).
    pub fn new(initial: u16) -> Self {
        Self {
            value: Arc::new(AtomicU16::new(initial)),
        }
    }

    pub fn handle(&self) -> SimPotHandle {
        SimPotHandle(self.value.clone())
    }
}

impl Pot for SimPot {
    fn read(&mut self) -> Result<u16, BoxError> {
        Ok(self.value.load(Ordering::Relaxed))
    }
}

/// Last commanded output of a simulated motor channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotorState {
    #[default]
    Braked,
    Driving {
        duty: u8,
        dir: Direction,
    },
}

pub struct SimMotor {
    name: &'static str,
    state: Arc<Mutex<MotorState>>,
}

#[derive(Clone)]
pub struct SimMotorHandle(Arc<Mutex<MotorState>>);

impl SimMotorHandle {
    pub fn state(&self) -> MotorState {
        self.0.lock().map(|g| *g).unwrap_or_default()
    }
}

impl SimMotor {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Arc::new(Mutex::new(MotorState::Braked)),
        }
    }

    pub fn handle(&self) -> SimMotorHandle {
        SimMotorHandle(self.state.clone())
    }
}

impl Motor for SimMotor {
    fn set_output(&mut self, duty: u8, dir: Direction) -> Result<(), BoxError> {
        tracing::trace!(motor = self.name, duty, ?dir, "sim motor drive");
        if let Ok(mut g) = self.state.lock() {
            *g = MotorState::Driving { duty, dir };
        }
        Ok(())
    }

    fn brake(&mut self) -> Result<(), BoxError> {
        if let Ok(mut g) = self.state.lock() {
            *g = MotorState::Braked;
        }
        Ok(())
    }
}

/// Simulated switch or button; the handle toggles the level.
pub struct SimSwitch {
    active: Arc<AtomicBool>,
}

#[derive(Clone)]
pub struct SimSwitchHandle(Arc<AtomicBool>);

impl SimSwitchHandle {
    pub fn set(&self, active: bool) {
        self.0.store(active, Ordering::Relaxed);
    }
}

impl SimSwitch {
    pub fn new(active: bool) -> Self {
        Self {
            active: Arc::new(AtomicBool::new(active)),
        }
    }

    pub fn handle(&self) -> SimSwitchHandle {
        SimSwitchHandle(self.active.clone())
    }
}

impl DigitalIn for SimSwitch {
    fn is_active(&mut self) -> Result<bool, BoxError> {
        Ok(self.active.load(Ordering::Relaxed))
    }
}

/// Observed state of the simulated magnet driver lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MagnetLines {
    pub enable: bool,
    pub forward: bool,
    pub reverse: bool,
}

pub struct SimMagnet {
    lines: Arc<Mutex<MagnetLines>>,
}

#[derive(Clone)]
pub struct SimMagnetHandle(Arc<Mutex<MagnetLines>>);

impl SimMagnetHandle {
    pub fn lines(&self) -> MagnetLines {
        self.0.lock().map(|g| *g).unwrap_or_default()
    }
}

impl SimMagnet {
    pub fn new() -> Self {
        Self {
            lines: Arc::new(Mutex::new(MagnetLines::default())),
        }
    }

    pub fn handle(&self) -> SimMagnetHandle {
        SimMagnetHandle(self.lines.clone())
    }
}

impl Default for SimMagnet {
    fn default() -> Self {
        Self::new()
    }
}

impl Magnet for SimMagnet {
    fn set_lines(&mut self, enable: bool, forward: bool, reverse: bool) -> Result<(), BoxError> {
        tracing::trace!(enable, forward, reverse, "sim magnet lines");
        if let Ok(mut g) = self.lines.lock() {
            *g = MagnetLines {
                enable,
                forward,
                reverse,
            };
        }
        Ok(())
    }
}

/// Simulated buzzer / indicator output.
pub struct SimOut {
    name: &'static str,
    on: Arc<AtomicBool>,
}

#[derive(Clone)]
pub struct SimOutHandle(Arc<AtomicBool>);

impl SimOutHandle {
    pub fn is_on(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl SimOut {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            on: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn handle(&self) -> SimOutHandle {
        SimOutHandle(self.on.clone())
    }
}

impl DigitalOut for SimOut {
    fn set(&mut self, on: bool) -> Result<(), BoxError> {
        tracing::trace!(output = self.name, on, "sim digital out");
        self.on.store(on, Ordering::Relaxed);
        Ok(())
    }
}

/// Simulated 16x2 display; retains the last shown lines and logs them.
pub struct SimDisplay {
    lines: Arc<Mutex<(String, String)>>,
}

#[derive(Clone)]
pub struct SimDisplayHandle(Arc<Mutex<(String, String)>>);

impl SimDisplayHandle {
    pub fn lines(&self) -> (String, String) {
        self.0.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

impl SimDisplay {
    pub fn new() -> Self {
        Self {
            lines: Arc::new(Mutex::new((String::new(), String::new()))),
        }
    }

    pub fn handle(&self) -> SimDisplayHandle {
        SimDisplayHandle(self.lines.clone())
    }
}

impl Default for SimDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SimDisplay {
    fn show(&mut self, line0: &str, line1: &str) -> Result<(), BoxError> {
        tracing::info!(line0, line1, "display");
        if let Ok(mut g) = self.lines.lock() {
            *g = (line0.to_string(), line1.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_pot_follows_handle() {
        let mut pot = SimPot::new(2047);
        let handle = pot.handle();
        assert_eq!(pot.read().unwrap(), 2047);
        handle.set(4095);
        assert_eq!(pot.read().unwrap(), 4095);
    }

    #[test]
    fn sim_motor_records_last_command() {
        let mut motor = SimMotor::new("a");
        let handle = motor.handle();
        motor.set_output(120, Direction::Reverse).unwrap();
        assert_eq!(
            handle.state(),
            MotorState::Driving {
                duty: 120,
                dir: Direction::Reverse
            }
        );
        motor.brake().unwrap();
        assert_eq!(handle.state(), MotorState::Braked);
    }

    #[test]
    fn sim_magnet_records_lines() {
        let mut magnet = SimMagnet::new();
        let handle = magnet.handle();
        magnet.set_lines(true, true, false).unwrap();
        assert_eq!(
            handle.lines(),
            MagnetLines {
                enable: true,
                forward: true,
                reverse: false
            }
        );
    }
}

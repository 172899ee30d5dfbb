//! Raspberry Pi GPIO implementations of the hardware traits (rppal).
//!
//! The joystick pots are read through the kernel IIO sysfs interface; the
//! motors are L298-style bridges on the Pi's two hardware PWM channels.

use std::path::PathBuf;
use std::time::Duration;

use rppal::gpio::{Gpio, InputPin, OutputPin};
use rppal::pwm::{Channel, Polarity, Pwm};
use tracing::trace;

use crate::error::{HwError, Result};
use gantry_traits::{DigitalIn, DigitalOut, Direction, Magnet, Motor, Pot};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const PWM_FREQUENCY_HZ: f64 = 1000.0;

fn gpio() -> Result<Gpio> {
    Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))
}

fn pwm_channel(chan: u8) -> Result<Channel> {
    match chan {
        0 => Ok(Channel::Pwm0),
        1 => Ok(Channel::Pwm1),
        other => Err(HwError::Gpio(format!("invalid pwm channel {other}"))),
    }
}

/// Joystick pot sampled via an IIO ADC channel file (in_voltageN_raw).
pub struct IioPot {
    path: PathBuf,
}

impl IioPot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Pot for IioPot {
    fn read(&mut self) -> std::result::Result<u16, BoxError> {
        let text = std::fs::read_to_string(&self.path).map_err(HwError::Io)?;
        let raw: i64 = text
            .trim()
            .parse()
            .map_err(|e| HwError::Adc(format!("{}: {e}", self.path.display())))?;
        let raw = raw.clamp(0, i64::from(u16::MAX)) as u16;
        trace!(raw, path = %self.path.display(), "iio pot sample");
        Ok(raw)
    }
}

/// One channel of an L298-style dual H-bridge: hardware PWM on the enable
/// pin plus two direction inputs.
pub struct L298Motor {
    pwm: Pwm,
    in1: OutputPin,
    in2: OutputPin,
}

impl L298Motor {
    pub fn new(pwm_chan: u8, in1_pin: u8, in2_pin: u8) -> Result<Self> {
        let gpio = gpio()?;
        let pwm = Pwm::with_frequency(
            pwm_channel(pwm_chan)?,
            PWM_FREQUENCY_HZ,
            0.0,
            Polarity::Normal,
            true,
        )
        .map_err(|e| HwError::Gpio(e.to_string()))?;
        let in1 = gpio
            .get(in1_pin)
            .map_err(|e| HwError::Gpio(e.to_string()))?
            .into_output_low();
        let in2 = gpio
            .get(in2_pin)
            .map_err(|e| HwError::Gpio(e.to_string()))?
            .into_output_low();
        Ok(Self { pwm, in1, in2 })
    }
}

impl Motor for L298Motor {
    fn set_output(&mut self, duty: u8, dir: Direction) -> std::result::Result<(), BoxError> {
        match dir {
            Direction::Forward => {
                self.in1.set_high();
                self.in2.set_low();
            }
            Direction::Reverse => {
                self.in1.set_low();
                self.in2.set_high();
            }
        }
        self.pwm
            .set_duty_cycle(f64::from(duty) / 255.0)
            .map_err(|e| HwError::Gpio(e.to_string()))?;
        Ok(())
    }

    fn brake(&mut self) -> std::result::Result<(), BoxError> {
        // Hard stop: both inputs low, zero duty
        self.in1.set_low();
        self.in2.set_low();
        self.pwm
            .set_duty_cycle(0.0)
            .map_err(|e| HwError::Gpio(e.to_string()))?;
        Ok(())
    }
}

/// Limit switch or confirm button on a pulled-up GPIO input.
pub struct SwitchIn {
    pin: InputPin,
    active_low: bool,
}

impl SwitchIn {
    pub fn new(pin: u8, active_low: bool) -> Result<Self> {
        let pin = gpio()?
            .get(pin)
            .map_err(|e| HwError::Gpio(e.to_string()))?
            .into_input_pullup();
        Ok(Self { pin, active_low })
    }
}

impl DigitalIn for SwitchIn {
    fn is_active(&mut self) -> std::result::Result<bool, BoxError> {
        let high = self.pin.is_high();
        Ok(high != self.active_low)
    }
}

/// Electromagnet driver lines: enable plus forward/reverse polarity.
pub struct MagnetOut {
    enable: OutputPin,
    forward: OutputPin,
    reverse: OutputPin,
}

impl MagnetOut {
    pub fn new(enable_pin: u8, forward_pin: u8, reverse_pin: u8) -> Result<Self> {
        let gpio = gpio()?;
        let take = |pin: u8| -> Result<OutputPin> {
            Ok(gpio
                .get(pin)
                .map_err(|e| HwError::Gpio(e.to_string()))?
                .into_output_low())
        };
        Ok(Self {
            enable: take(enable_pin)?,
            forward: take(forward_pin)?,
            reverse: take(reverse_pin)?,
        })
    }
}

impl Magnet for MagnetOut {
    fn set_lines(
        &mut self,
        enable: bool,
        forward: bool,
        reverse: bool,
    ) -> std::result::Result<(), BoxError> {
        // Polarity lines settle before the driver is enabled
        self.forward.write(forward.into());
        self.reverse.write(reverse.into());
        self.enable.write(enable.into());
        Ok(())
    }
}

/// Buzzer or indicator LED on a plain GPIO output.
pub struct OutPin {
    pin: OutputPin,
}

impl OutPin {
    pub fn new(pin: u8) -> Result<Self> {
        let pin = gpio()?
            .get(pin)
            .map_err(|e| HwError::Gpio(e.to_string()))?
            .into_output_low();
        Ok(Self { pin })
    }
}

impl DigitalOut for OutPin {
    fn set(&mut self, on: bool) -> std::result::Result<(), BoxError> {
        self.pin.write(on.into());
        Ok(())
    }
}

/// Give mechanical contacts a moment to settle after power-up.
pub fn settle_inputs() {
    std::thread::sleep(Duration::from_millis(50));
}

//! Hobby servos on PWM pins.

use core::fmt::Debug;

use crate::conversion::{clamp, ServoConfig, MAX_DEGREES};
use crate::error::{Error, UnknownSelector};
use crate::pins::AnalogPin;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServoChannel {
    Sv1,
    Sv2,
}

impl TryFrom<u8> for ServoChannel {
    type Error = UnknownSelector;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(ServoChannel::Sv1),
            1 => Ok(ServoChannel::Sv2),
            other => Err(UnknownSelector(other)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServoError<PinError: Debug> {
    Period(PinError),
    Duty(PinError),
    Release(PinError),
}

impl<PinError: Debug> Error for ServoError<PinError> {}

pub struct Servo<P>
where
    P: AnalogPin,
{
    pin: P,
    config: ServoConfig,
}

impl<P> Servo<P>
where
    P: AnalogPin,
{
    pub fn new(pin: P) -> Self {
        Self::with_config(pin, ServoConfig::default())
    }

    pub fn with_config(pin: P, config: ServoConfig) -> Self {
        Self { pin, config }
    }

    pub fn config(&self) -> ServoConfig {
        self.config
    }

    pub fn set_config(&mut self, config: ServoConfig) {
        self.config = config;
    }

    pub fn free(self) -> P {
        self.pin
    }

    /// Move to `degrees`, clamped to 0..=180.
    ///
    /// The frame period is written before every duty so the pin is in servo
    /// timing even if something else changed it.
    pub fn set_angle(&mut self, degrees: i32) -> Result<(), ServoError<P::Error>> {
        let degrees = clamp(degrees, 0, MAX_DEGREES);
        let pulse_us = self.config.pulse_us(degrees);
        let duty = self.config.pulse_to_duty(pulse_us);

        trace!("servo {}deg pulse={}us duty={}", degrees, pulse_us, duty);

        self.pin
            .set_period_us(self.config.period_us)
            .map_err(ServoError::Period)?;
        self.pin.write_analog(duty).map_err(ServoError::Duty)?;

        Ok(())
    }

    /// Best-effort release: zero duty, then hold the line low. Whether the
    /// servo actually goes limp depends on the servo.
    pub fn stop(&mut self) -> Result<(), ServoError<P::Error>> {
        self.pin.write_analog(0).map_err(ServoError::Duty)?;
        self.pin.write_digital(false).map_err(ServoError::Release)?;

        Ok(())
    }
}

/// The two servo headers, SV1 and SV2.
pub struct Servos<P1, P2>
where
    P1: AnalogPin,
    P2: AnalogPin,
{
    sv1: Servo<P1>,
    sv2: Servo<P2>,
}

impl<P1, P2> Servos<P1, P2>
where
    P1: AnalogPin,
    P2: AnalogPin<Error = P1::Error>,
{
    pub fn new(sv1: Servo<P1>, sv2: Servo<P2>) -> Self {
        Self { sv1, sv2 }
    }

    pub fn free(self) -> (Servo<P1>, Servo<P2>) {
        (self.sv1, self.sv2)
    }

    pub fn sv1(&mut self) -> &mut Servo<P1> {
        &mut self.sv1
    }

    pub fn sv2(&mut self) -> &mut Servo<P2> {
        &mut self.sv2
    }

    pub fn set_angle(
        &mut self,
        channel: ServoChannel,
        degrees: i32,
    ) -> Result<(), ServoError<P1::Error>> {
        debug!("servo {} -> {}deg", channel, degrees);

        match channel {
            ServoChannel::Sv1 => self.sv1.set_angle(degrees),
            ServoChannel::Sv2 => self.sv2.set_angle(degrees),
        }
    }

    pub fn stop(&mut self, channel: ServoChannel) -> Result<(), ServoError<P1::Error>> {
        trace!("servo {} stop", channel);

        match channel {
            ServoChannel::Sv1 => self.sv1.stop(),
            ServoChannel::Sv2 => self.sv2.stop(),
        }
    }

    pub fn stop_all(&mut self) -> Result<(), ServoError<P1::Error>> {
        self.stop(ServoChannel::Sv1)?;
        self.stop(ServoChannel::Sv2)
    }
}

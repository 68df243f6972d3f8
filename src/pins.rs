//! Pin primitives the driver needs beyond `embedded-hal` 0.2.
//!
//! Direction pins and buttons use `embedded_hal::digital::v2` and the ADC uses
//! `embedded_hal::blocking::i2c`. What remains are the micro:bit style analog
//! pins: a PWM output with a configurable period and a 10-bit duty, and a
//! 10-bit analog input.

use core::fmt::Debug;

/// Full-scale duty for [`AnalogPin::write_analog`].
pub const MAX_DUTY: u16 = 1023;

/// Full-scale sample for [`AnalogInput::read_analog`].
pub const MAX_SAMPLE: u16 = 1023;

/// A PWM-capable pin that can also be driven to a plain digital level.
pub trait AnalogPin {
    type Error: Debug;

    /// Set the PWM period in microseconds.
    fn set_period_us(&mut self, period_us: u32) -> Result<(), Self::Error>;

    /// Write a duty cycle in `0..=MAX_DUTY`.
    fn write_analog(&mut self, duty: u16) -> Result<(), Self::Error>;

    /// Stop PWM and hold the line at a digital level.
    fn write_digital(&mut self, is_high: bool) -> Result<(), Self::Error>;
}

impl<T: AnalogPin + ?Sized> AnalogPin for &mut T {
    type Error = T::Error;

    fn set_period_us(&mut self, period_us: u32) -> Result<(), Self::Error> {
        (**self).set_period_us(period_us)
    }

    fn write_analog(&mut self, duty: u16) -> Result<(), Self::Error> {
        (**self).write_analog(duty)
    }

    fn write_digital(&mut self, is_high: bool) -> Result<(), Self::Error> {
        (**self).write_digital(is_high)
    }
}

/// A pin sampled by the MCU's own ADC.
pub trait AnalogInput {
    type Error: Debug;

    /// Read a sample in `0..=MAX_SAMPLE`.
    fn read_analog(&mut self) -> Result<u16, Self::Error>;
}

/// Counter settings for a PWM timer fed by a power-of-two prescaler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmTiming {
    /// The counter runs at `clock_hz >> prescaler_shift`.
    pub prescaler_shift: u8,
    /// Counter top in prescaled ticks, one full period.
    pub top: u16,
}

impl PwmTiming {
    /// Finest prescaler whose counter spans `period_us` within `max_top`.
    ///
    /// `None` when the period needs more than `max_shift` or rounds down to
    /// zero ticks.
    pub fn for_period(period_us: u32, clock_hz: u32, max_shift: u8, max_top: u16) -> Option<Self> {
        let ticks = u64::from(period_us) * u64::from(clock_hz) / 1_000_000;

        (0..=max_shift).find_map(|shift| {
            let top = ticks >> shift;
            (top > 0 && top <= u64::from(max_top)).then(|| Self {
                prescaler_shift: shift,
                top: top as u16,
            })
        })
    }
}

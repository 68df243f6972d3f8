//! Driver for the iBIT robotics expansion board for the BBC micro:bit.
//!
//! The board carries two DC motor channels behind a driver IC, two servo
//! headers and an 8-channel ADC on the I2C bus. [`Ibit`] bundles all three
//! over injected `embedded-hal` pins, and [`qc`] runs the button driven board
//! test on top of it.
//!
//! Logging goes through `defmt` when the `defmt` feature is enabled.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod adc;
pub mod board;
pub mod conversion;
pub mod error;
pub mod motion;
pub mod pins;
pub mod qc;
pub mod servo;

#[cfg(test)]
mod mock;

pub use adc::{Adc, AdcChannel, AdcError, ADC_INVALID};
pub use board::{Ibit, IbitBuilder, IbitBuilderError, IbitError};
pub use conversion::ServoConfig;
pub use error::{Error, UnknownSelector};
pub use motion::{
    Direction, Motion, MotionError, MotorChannel, MotorPins, SpinDirection, TurnDirection,
};
pub use pins::{AnalogInput, AnalogPin, PwmTiming};
pub use servo::{Servo, ServoChannel, ServoError, Servos};

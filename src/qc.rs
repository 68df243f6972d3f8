//! Board QC routine driven by the two micro:bit buttons.
//!
//! Every 500 ms slot:
//!
//! - button A shows the "A" icon and samples the three edge analog pins and
//!   all eight ADC channels;
//! - button B shows the "B" icon, alternates the motors between running and
//!   braked, and swings both servos between 60 and 120 degrees;
//! - without button B everything is put in the safe state.
//!
//! The motor direction flips every fourth slot.

use core::fmt::Debug;
use embedded_hal::blocking::i2c::{Read as I2cRead, Write as I2cWrite};
use embedded_hal::digital::v2::{InputPin, OutputPin};
use fugit::{MillisDurationU32, TimerInstantU32};

use crate::adc::AdcChannel;
use crate::board::{Ibit, IbitError};
use crate::error::Error;
use crate::motion::Direction;
use crate::pins::{AnalogInput, AnalogPin};
use crate::servo::ServoChannel;

pub type QcInstant = TimerInstantU32<1_000>;

pub const ANALOG_PINS_COUNT: usize = 3;
pub const ADC_CHANNELS_COUNT: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QcConfig {
    pub slot_period: MillisDurationU32,
    /// Sleep between polls, used by the firmware loop.
    pub tick: MillisDurationU32,
    pub speed_percent: i32,
    pub toggle_every_slots: u32,
    pub near_degrees: i32,
    pub far_degrees: i32,
}

impl Default for QcConfig {
    fn default() -> Self {
        Self {
            slot_period: MillisDurationU32::millis(500),
            tick: MillisDurationU32::millis(10),
            speed_percent: 60,
            toggle_every_slots: 4,
            near_degrees: 60,
            far_degrees: 120,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Icon {
    A,
    B,
    All,
}

impl Icon {
    /// 5x5 brightness frame, `0..=9` per LED.
    pub fn frame(self) -> [[u8; 5]; 5] {
        match self {
            Icon::A => [
                [0, 0, 9, 0, 0],
                [0, 9, 0, 9, 0],
                [9, 0, 0, 0, 9],
                [9, 9, 9, 9, 9],
                [9, 0, 0, 0, 9],
            ],
            Icon::B => [
                [9, 9, 9, 9, 0],
                [9, 0, 0, 0, 9],
                [9, 9, 9, 9, 0],
                [9, 0, 0, 0, 9],
                [9, 9, 9, 9, 0],
            ],
            Icon::All => [[9; 5]; 5],
        }
    }
}

pub trait IconDisplay {
    type Error: Debug;

    fn show(&mut self, icon: Icon) -> Result<(), Self::Error>;
}

/// What the QC routine needs from a board.
pub trait QcBoard {
    type Error: Error;

    fn drive(&mut self, direction: Direction, speed_percent: i32) -> Result<(), Self::Error>;
    fn brake(&mut self) -> Result<(), Self::Error>;
    fn set_servo(&mut self, channel: ServoChannel, degrees: i32) -> Result<(), Self::Error>;
    fn read_adc(&mut self, channel: AdcChannel) -> Result<u16, Self::Error>;
    fn safe_stop(&mut self) -> Result<(), Self::Error>;
}

impl<Dir1, Speed1, Dir2, Speed2, Sv1, Sv2, I2C> QcBoard
    for Ibit<Dir1, Speed1, Dir2, Speed2, Sv1, Sv2, I2C>
where
    Dir1: OutputPin,
    Dir1::Error: Debug,
    Speed1: AnalogPin,
    Dir2: OutputPin<Error = Dir1::Error>,
    Speed2: AnalogPin<Error = Speed1::Error>,
    Sv1: AnalogPin<Error = Speed1::Error>,
    Sv2: AnalogPin<Error = Speed1::Error>,
    I2C: I2cWrite + I2cRead,
    <I2C as I2cWrite>::Error: Debug,
    <I2C as I2cRead>::Error: Debug,
{
    type Error = IbitError<
        Dir1::Error,
        Speed1::Error,
        <I2C as I2cWrite>::Error,
        <I2C as I2cRead>::Error,
    >;

    fn drive(&mut self, direction: Direction, speed_percent: i32) -> Result<(), Self::Error> {
        self.motor(direction, speed_percent)
    }

    fn brake(&mut self) -> Result<(), Self::Error> {
        self.motor_stop()
    }

    fn set_servo(&mut self, channel: ServoChannel, degrees: i32) -> Result<(), Self::Error> {
        self.servo(channel, degrees)
    }

    fn read_adc(&mut self, channel: AdcChannel) -> Result<u16, Self::Error> {
        Ok(self.adc().read(channel)?)
    }

    fn safe_stop(&mut self) -> Result<(), Self::Error> {
        Ibit::safe_stop(self)
    }
}

/// One 500 ms action slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QcSlot {
    /// Slots elapsed, including this one.
    pub count: u32,
    pub direction: Direction,
    /// Motors run on odd slots and brake on even ones.
    pub run_motors: bool,
}

/// Slot timing and the motor direction schedule, without any I/O.
#[derive(Clone, Copy, Debug)]
pub struct QcSequencer {
    config: QcConfig,
    last_slot: QcInstant,
    count: u32,
    direction: Direction,
}

impl QcSequencer {
    pub fn new(config: QcConfig, start: QcInstant) -> Self {
        Self {
            config,
            last_slot: start,
            count: 0,
            direction: Direction::Forward,
        }
    }

    pub fn config(&self) -> &QcConfig {
        &self.config
    }

    /// Returns a slot once at least one slot period elapsed since the last.
    pub fn poll(&mut self, now: QcInstant) -> Option<QcSlot> {
        let elapsed = now.checked_duration_since(self.last_slot)?;
        if elapsed < self.config.slot_period {
            return None;
        }
        self.last_slot = now;

        if self.count % self.config.toggle_every_slots.max(1) == 0 {
            self.direction = self.direction.toggled();
        }
        self.count = self.count.wrapping_add(1);

        Some(QcSlot {
            count: self.count,
            direction: self.direction,
            run_motors: self.count % 2 != 0,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QcSamples {
    pub analog: [u16; ANALOG_PINS_COUNT],
    pub adc: [u16; ADC_CHANNELS_COUNT],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QcExercise {
    pub direction: Direction,
    pub speed_percent: i32,
    pub running: bool,
    pub sv1_degrees: i32,
    pub sv2_degrees: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QcReport {
    pub slot: QcSlot,
    /// Set while button A is held.
    pub samples: Option<QcSamples>,
    /// Set while button B is held; `None` means the board was put in the safe state.
    pub exercise: Option<QcExercise>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QcError<BoardError, ButtonError, AnalogError, DisplayError> {
    Board(BoardError),
    Button(ButtonError),
    Analog(AnalogError),
    Display(DisplayError),
}

impl<BoardError, ButtonError, AnalogError, DisplayError> Error
    for QcError<BoardError, ButtonError, AnalogError, DisplayError>
where
    BoardError: Debug,
    ButtonError: Debug,
    AnalogError: Debug,
    DisplayError: Debug,
{
}

pub type QcResult<T, Board, Button, AnalogError, Display> = Result<
    T,
    QcError<
        <Board as QcBoard>::Error,
        <Button as InputPin>::Error,
        AnalogError,
        <Display as IconDisplay>::Error,
    >,
>;

/// Runs the QC routine on a board. Buttons are active low.
pub struct QcRunner<'a, Board, ButtonA, ButtonB, Display, AnalogError>
where
    Board: QcBoard,
    ButtonA: InputPin,
    ButtonB: InputPin<Error = ButtonA::Error>,
    Display: IconDisplay,
    AnalogError: Debug,
{
    board: Board,
    button_a: ButtonA,
    button_b: ButtonB,
    analog: [&'a mut dyn AnalogInput<Error = AnalogError>; ANALOG_PINS_COUNT],
    display: Display,
    sequencer: QcSequencer,
}

impl<'a, Board, ButtonA, ButtonB, Display, AnalogError>
    QcRunner<'a, Board, ButtonA, ButtonB, Display, AnalogError>
where
    Board: QcBoard,
    ButtonA: InputPin,
    ButtonA::Error: Debug,
    ButtonB: InputPin<Error = ButtonA::Error>,
    Display: IconDisplay,
    AnalogError: Debug,
{
    pub fn new(
        board: Board,
        button_a: ButtonA,
        button_b: ButtonB,
        analog: [&'a mut dyn AnalogInput<Error = AnalogError>; ANALOG_PINS_COUNT],
        display: Display,
        sequencer: QcSequencer,
    ) -> Self {
        Self {
            board,
            button_a,
            button_b,
            analog,
            display,
            sequencer,
        }
    }

    pub fn board(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn free(self) -> (Board, ButtonA, ButtonB, Display) {
        (self.board, self.button_a, self.button_b, self.display)
    }

    /// Light every LED to show the routine is alive.
    pub fn start(&mut self) -> QcResult<(), Board, ButtonA, AnalogError, Display> {
        info!("qc start");
        self.display.show(Icon::All).map_err(QcError::Display)
    }

    /// Poll once; returns a report whenever a slot ran.
    pub fn poll(
        &mut self,
        now: QcInstant,
    ) -> QcResult<Option<QcReport>, Board, ButtonA, AnalogError, Display> {
        let slot = match self.sequencer.poll(now) {
            Some(slot) => slot,
            None => return Ok(None),
        };

        let samples = if self.button_a.is_low().map_err(QcError::Button)? {
            Some(self.sample()?)
        } else {
            None
        };

        let exercise = if self.button_b.is_low().map_err(QcError::Button)? {
            Some(self.exercise(slot)?)
        } else {
            self.board.safe_stop().map_err(QcError::Board)?;
            None
        };

        Ok(Some(QcReport {
            slot,
            samples,
            exercise,
        }))
    }

    fn sample(&mut self) -> QcResult<QcSamples, Board, ButtonA, AnalogError, Display> {
        self.display.show(Icon::A).map_err(QcError::Display)?;

        let mut analog = [0u16; ANALOG_PINS_COUNT];
        for (value, pin) in analog.iter_mut().zip(self.analog.iter_mut()) {
            *value = pin.read_analog().map_err(QcError::Analog)?;
        }
        info!("AN0-2 {}", analog);

        let mut adc = [0u16; ADC_CHANNELS_COUNT];
        for (value, channel) in adc.iter_mut().zip(AdcChannel::ALL) {
            *value = self.board.read_adc(channel).map_err(QcError::Board)?;
        }
        info!("ADC0-7 {}", adc);

        Ok(QcSamples { analog, adc })
    }

    fn exercise(
        &mut self,
        slot: QcSlot,
    ) -> QcResult<QcExercise, Board, ButtonA, AnalogError, Display> {
        self.display.show(Icon::B).map_err(QcError::Display)?;

        let config = *self.sequencer.config();
        info!(
            "motor {} at {}% running={}",
            slot.direction, config.speed_percent, slot.run_motors
        );

        if slot.run_motors {
            self.board
                .drive(slot.direction, config.speed_percent)
                .map_err(QcError::Board)?;
        } else {
            self.board.brake().map_err(QcError::Board)?;
        }

        let (sv1_degrees, sv2_degrees) = match slot.direction {
            Direction::Backward => (config.near_degrees, config.far_degrees),
            Direction::Forward => (config.far_degrees, config.near_degrees),
        };
        self.board
            .set_servo(ServoChannel::Sv1, sv1_degrees)
            .map_err(QcError::Board)?;
        self.board
            .set_servo(ServoChannel::Sv2, sv2_degrees)
            .map_err(QcError::Board)?;
        info!("SV1={}deg SV2={}deg", sv1_degrees, sv2_degrees);

        Ok(QcExercise {
            direction: slot.direction,
            speed_percent: config.speed_percent,
            running: slot.run_motors,
            sv1_degrees,
            sv2_degrees,
        })
    }
}

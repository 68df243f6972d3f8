//! The iBIT device handle.

use core::fmt::Debug;
use embedded_hal::blocking::i2c::{Read as I2cRead, Write as I2cWrite};
use embedded_hal::digital::v2::OutputPin;

use crate::adc::{Adc, AdcError, DEFAULT_ADDRESS};
use crate::conversion::ServoConfig;
use crate::error::Error;
use crate::motion::{
    Direction, Motion, MotionError, MotorChannel, MotorPins, SpinDirection, TurnDirection,
};
use crate::pins::AnalogPin;
use crate::servo::{Servo, ServoChannel, ServoError, Servos};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IbitError<DirError: Debug, PwmError: Debug, WriteError: Debug, ReadError: Debug> {
    Motion(MotionError<DirError, PwmError>),
    Servo(ServoError<PwmError>),
    Adc(AdcError<WriteError, ReadError>),
}

impl<DirError: Debug, PwmError: Debug, WriteError: Debug, ReadError: Debug>
    Error for IbitError<DirError, PwmError, WriteError, ReadError>
{
}

impl<DirError: Debug, PwmError: Debug, WriteError: Debug, ReadError: Debug>
    From<MotionError<DirError, PwmError>> for IbitError<DirError, PwmError, WriteError, ReadError>
{
    fn from(error: MotionError<DirError, PwmError>) -> Self {
        IbitError::Motion(error)
    }
}

impl<DirError: Debug, PwmError: Debug, WriteError: Debug, ReadError: Debug>
    From<ServoError<PwmError>> for IbitError<DirError, PwmError, WriteError, ReadError>
{
    fn from(error: ServoError<PwmError>) -> Self {
        IbitError::Servo(error)
    }
}

impl<DirError: Debug, PwmError: Debug, WriteError: Debug, ReadError: Debug>
    From<AdcError<WriteError, ReadError>> for IbitError<DirError, PwmError, WriteError, ReadError>
{
    fn from(error: AdcError<WriteError, ReadError>) -> Self {
        IbitError::Adc(error)
    }
}

pub type IbitResult<T, Dir, Pwm, I2C> = Result<
    T,
    IbitError<
        <Dir as OutputPin>::Error,
        <Pwm as AnalogPin>::Error,
        <I2C as I2cWrite>::Error,
        <I2C as I2cRead>::Error,
    >,
>;

/// One iBIT board: two motors, two servo headers and the I2C ADC.
///
/// Pins are injected so the same handle runs against the micro:bit HAL or
/// test doubles. Nothing but the ADC address changes after construction.
pub struct Ibit<Dir1, Speed1, Dir2, Speed2, Sv1, Sv2, I2C>
where
    Dir1: OutputPin,
    Speed1: AnalogPin,
    Dir2: OutputPin,
    Speed2: AnalogPin,
    Sv1: AnalogPin,
    Sv2: AnalogPin,
    I2C: I2cWrite + I2cRead,
{
    motion: Motion<Dir1, Speed1, Dir2, Speed2>,
    servos: Servos<Sv1, Sv2>,
    adc: Adc<I2C>,
}

impl<Dir1, Speed1, Dir2, Speed2, Sv1, Sv2, I2C>
    Ibit<Dir1, Speed1, Dir2, Speed2, Sv1, Sv2, I2C>
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
    pub fn new(
        motion: Motion<Dir1, Speed1, Dir2, Speed2>,
        servos: Servos<Sv1, Sv2>,
        adc: Adc<I2C>,
    ) -> Self {
        Self {
            motion,
            servos,
            adc,
        }
    }

    pub fn free(
        self,
    ) -> (
        Motion<Dir1, Speed1, Dir2, Speed2>,
        Servos<Sv1, Sv2>,
        Adc<I2C>,
    ) {
        (self.motion, self.servos, self.adc)
    }

    pub fn motion(&mut self) -> &mut Motion<Dir1, Speed1, Dir2, Speed2> {
        &mut self.motion
    }

    pub fn servos(&mut self) -> &mut Servos<Sv1, Sv2> {
        &mut self.servos
    }

    pub fn adc(&mut self) -> &mut Adc<I2C> {
        &mut self.adc
    }

    pub fn motor(
        &mut self,
        direction: Direction,
        speed_percent: i32,
    ) -> IbitResult<(), Dir1, Speed1, I2C> {
        self.motion.drive(direction, speed_percent)?;
        Ok(())
    }

    pub fn motor2(
        &mut self,
        direction: Direction,
        speed_percent_m1: i32,
        speed_percent_m2: i32,
    ) -> IbitResult<(), Dir1, Speed1, I2C> {
        self.motion
            .drive_differential(direction, speed_percent_m1, speed_percent_m2)?;
        Ok(())
    }

    pub fn turn(
        &mut self,
        turn: TurnDirection,
        speed_percent: i32,
    ) -> IbitResult<(), Dir1, Speed1, I2C> {
        self.motion.turn(turn, speed_percent)?;
        Ok(())
    }

    pub fn spin(
        &mut self,
        spin: SpinDirection,
        speed_percent: i32,
    ) -> IbitResult<(), Dir1, Speed1, I2C> {
        self.motion.spin(spin, speed_percent)?;
        Ok(())
    }

    pub fn motor_stop(&mut self) -> IbitResult<(), Dir1, Speed1, I2C> {
        self.motion.stop()?;
        Ok(())
    }

    pub fn set_motor(
        &mut self,
        channel: MotorChannel,
        direction: Direction,
        speed_percent: i32,
    ) -> IbitResult<(), Dir1, Speed1, I2C> {
        self.motion.set_channel(channel, direction, speed_percent)?;
        Ok(())
    }

    pub fn servo(
        &mut self,
        channel: ServoChannel,
        degrees: i32,
    ) -> IbitResult<(), Dir1, Speed1, I2C> {
        self.servos.set_angle(channel, degrees)?;
        Ok(())
    }

    pub fn servo_stop(&mut self, channel: ServoChannel) -> IbitResult<(), Dir1, Speed1, I2C> {
        self.servos.stop(channel)?;
        Ok(())
    }

    pub fn set_adc_address(&mut self, address: u8) {
        self.adc.set_address(address);
    }

    /// See [`Adc::read_selector`]: `-1` for an unknown channel or command.
    pub fn read_adc(&mut self, selector: i32) -> IbitResult<i32, Dir1, Speed1, I2C> {
        Ok(self.adc.read_selector(selector)?)
    }

    /// Brake both motors and release both servos.
    pub fn safe_stop(&mut self) -> IbitResult<(), Dir1, Speed1, I2C> {
        self.motion.stop()?;
        self.servos.stop_all()?;
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IbitBuilderError {
    MissingMotors,
    MissingServos,
    MissingI2c,
}

impl Error for IbitBuilderError {}

pub struct IbitBuilder<Dir1, Speed1, Dir2, Speed2, Sv1, Sv2, I2C>
where
    Dir1: OutputPin,
    Speed1: AnalogPin,
    Dir2: OutputPin,
    Speed2: AnalogPin,
    Sv1: AnalogPin,
    Sv2: AnalogPin,
    I2C: I2cWrite + I2cRead,
{
    motors: Option<(MotorPins<Dir1, Speed1>, MotorPins<Dir2, Speed2>)>,
    servo_pins: Option<(Sv1, Sv2)>,
    servo_configs: [ServoConfig; 2],
    i2c: Option<I2C>,
    adc_address: u8,
}

impl<Dir1, Speed1, Dir2, Speed2, Sv1, Sv2, I2C> Default
    for IbitBuilder<Dir1, Speed1, Dir2, Speed2, Sv1, Sv2, I2C>
where
    Dir1: OutputPin,
    Speed1: AnalogPin,
    Dir2: OutputPin,
    Speed2: AnalogPin,
    Sv1: AnalogPin,
    Sv2: AnalogPin,
    I2C: I2cWrite + I2cRead,
{
    fn default() -> Self {
        Self {
            motors: None,
            servo_pins: None,
            servo_configs: [ServoConfig::default(); 2],
            i2c: None,
            adc_address: DEFAULT_ADDRESS,
        }
    }
}

impl<Dir1, Speed1, Dir2, Speed2, Sv1, Sv2, I2C>
    IbitBuilder<Dir1, Speed1, Dir2, Speed2, Sv1, Sv2, I2C>
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
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_motors(&mut self, m1: MotorPins<Dir1, Speed1>, m2: MotorPins<Dir2, Speed2>) {
        self.motors = Some((m1, m2));
    }

    pub fn set_servo_pins(&mut self, sv1: Sv1, sv2: Sv2) {
        self.servo_pins = Some((sv1, sv2));
    }

    pub fn set_servo_config(&mut self, channel: ServoChannel, config: ServoConfig) {
        let index = match channel {
            ServoChannel::Sv1 => 0,
            ServoChannel::Sv2 => 1,
        };
        self.servo_configs[index] = config;
    }

    pub fn set_i2c(&mut self, i2c: I2C) {
        self.i2c = Some(i2c);
    }

    pub fn set_adc_address(&mut self, address: u8) {
        self.adc_address = address;
    }

    pub fn build(
        self,
    ) -> Result<Ibit<Dir1, Speed1, Dir2, Speed2, Sv1, Sv2, I2C>, IbitBuilderError> {
        let (m1, m2) = self.motors.ok_or(IbitBuilderError::MissingMotors)?;
        let (sv1, sv2) = self.servo_pins.ok_or(IbitBuilderError::MissingServos)?;
        let i2c = self.i2c.ok_or(IbitBuilderError::MissingI2c)?;
        let [sv1_config, sv2_config] = self.servo_configs;

        info!("ibit adc at {=u8:#x}", self.adc_address);

        Ok(Ibit::new(
            Motion::new(m1, m2),
            Servos::new(
                Servo::with_config(sv1, sv1_config),
                Servo::with_config(sv2, sv2_config),
            ),
            Adc::with_address(i2c, self.adc_address),
        ))
    }
}

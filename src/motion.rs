//! Two-motor differential drive.
//!
//! Each motor has a digital direction pin and a PWM speed pin. Motor 2 is
//! mounted mirrored on the chassis, so its direction level is the inverse of
//! motor 1's for the same logical direction.

use core::fmt::Debug;
use embedded_hal::digital::v2::{OutputPin, PinState};

use crate::conversion::speed_to_duty;
use crate::error::{Error, UnknownSelector};
use crate::pins::AnalogPin;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn toggled(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

impl TryFrom<u8> for Direction {
    type Error = UnknownSelector;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Direction::Forward),
            1 => Ok(Direction::Backward),
            other => Err(UnknownSelector(other)),
        }
    }
}

/// Pivot turn: one wheel holds, the other drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TurnDirection {
    Left,
    Right,
}

impl TryFrom<u8> for TurnDirection {
    type Error = UnknownSelector;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(TurnDirection::Left),
            1 => Ok(TurnDirection::Right),
            other => Err(UnknownSelector(other)),
        }
    }
}

/// In-place rotation: both wheels drive in opposite directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpinDirection {
    Left,
    Right,
}

impl TryFrom<u8> for SpinDirection {
    type Error = UnknownSelector;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(SpinDirection::Left),
            1 => Ok(SpinDirection::Right),
            other => Err(UnknownSelector(other)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorChannel {
    M1,
    M2,
}

impl TryFrom<u8> for MotorChannel {
    type Error = UnknownSelector;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(MotorChannel::M1),
            1 => Ok(MotorChannel::M2),
            other => Err(UnknownSelector(other)),
        }
    }
}

/// Direction pin level that moves `channel` in `direction`.
pub fn direction_level(channel: MotorChannel, direction: Direction) -> PinState {
    match (channel, direction) {
        (MotorChannel::M1, Direction::Forward) => PinState::High,
        (MotorChannel::M1, Direction::Backward) => PinState::Low,
        (MotorChannel::M2, Direction::Forward) => PinState::Low,
        (MotorChannel::M2, Direction::Backward) => PinState::High,
    }
}

pub struct MotorPins<Dir, Speed>
where
    Dir: OutputPin,
    Speed: AnalogPin,
{
    pub dir: Dir,
    pub speed: Speed,
}

impl<Dir, Speed> MotorPins<Dir, Speed>
where
    Dir: OutputPin,
    Speed: AnalogPin,
{
    pub fn new(dir: Dir, speed: Speed) -> Self {
        Self { dir, speed }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionError<DirError: Debug, SpeedError: Debug> {
    Direction(MotorChannel, DirError),
    Speed(MotorChannel, SpeedError),
}

impl<DirError: Debug, SpeedError: Debug> Error for MotionError<DirError, SpeedError> {}

pub type MotionResult<Dir, Speed> =
    Result<(), MotionError<<Dir as OutputPin>::Error, <Speed as AnalogPin>::Error>>;

pub struct Motion<Dir1, Speed1, Dir2, Speed2>
where
    Dir1: OutputPin,
    Speed1: AnalogPin,
    Dir2: OutputPin,
    Speed2: AnalogPin,
{
    m1: MotorPins<Dir1, Speed1>,
    m2: MotorPins<Dir2, Speed2>,
}

impl<Dir1, Speed1, Dir2, Speed2> Motion<Dir1, Speed1, Dir2, Speed2>
where
    Dir1: OutputPin,
    Dir1::Error: Debug,
    Speed1: AnalogPin,
    Dir2: OutputPin<Error = Dir1::Error>,
    Speed2: AnalogPin<Error = Speed1::Error>,
{
    pub fn new(m1: MotorPins<Dir1, Speed1>, m2: MotorPins<Dir2, Speed2>) -> Self {
        Self { m1, m2 }
    }

    pub fn free(self) -> (MotorPins<Dir1, Speed1>, MotorPins<Dir2, Speed2>) {
        (self.m1, self.m2)
    }

    /// Direction pin first, then speed.
    fn write(
        &mut self,
        channel: MotorChannel,
        level: PinState,
        duty: u16,
    ) -> MotionResult<Dir1, Speed1> {
        match channel {
            MotorChannel::M1 => {
                self.m1
                    .dir
                    .set_state(level)
                    .map_err(|err| MotionError::Direction(channel, err))?;
                self.m1
                    .speed
                    .write_analog(duty)
                    .map_err(|err| MotionError::Speed(channel, err))?;
            }
            MotorChannel::M2 => {
                self.m2
                    .dir
                    .set_state(level)
                    .map_err(|err| MotionError::Direction(channel, err))?;
                self.m2
                    .speed
                    .write_analog(duty)
                    .map_err(|err| MotionError::Speed(channel, err))?;
            }
        }

        Ok(())
    }

    /// Drive both motors in `direction` at the same speed.
    pub fn drive(
        &mut self,
        direction: Direction,
        speed_percent: i32,
    ) -> MotionResult<Dir1, Speed1> {
        self.drive_differential(direction, speed_percent, speed_percent)
    }

    /// Drive both motors in `direction` with independent speeds.
    pub fn drive_differential(
        &mut self,
        direction: Direction,
        speed_percent_m1: i32,
        speed_percent_m2: i32,
    ) -> MotionResult<Dir1, Speed1> {
        debug!(
            "drive {} m1={}% m2={}%",
            direction, speed_percent_m1, speed_percent_m2
        );

        self.write(
            MotorChannel::M1,
            direction_level(MotorChannel::M1, direction),
            speed_to_duty(speed_percent_m1),
        )?;
        self.write(
            MotorChannel::M2,
            direction_level(MotorChannel::M2, direction),
            speed_to_duty(speed_percent_m2),
        )
    }

    pub fn turn(&mut self, turn: TurnDirection, speed_percent: i32) -> MotionResult<Dir1, Speed1> {
        debug!("turn {} at {}%", turn, speed_percent);

        let duty = speed_to_duty(speed_percent);
        let (duty_m1, duty_m2) = match turn {
            TurnDirection::Left => (0, duty),
            TurnDirection::Right => (duty, 0),
        };

        self.write(
            MotorChannel::M1,
            direction_level(MotorChannel::M1, Direction::Forward),
            duty_m1,
        )?;
        self.write(
            MotorChannel::M2,
            direction_level(MotorChannel::M2, Direction::Forward),
            duty_m2,
        )
    }

    pub fn spin(&mut self, spin: SpinDirection, speed_percent: i32) -> MotionResult<Dir1, Speed1> {
        debug!("spin {} at {}%", spin, speed_percent);

        let duty = speed_to_duty(speed_percent);
        let (direction_m1, direction_m2) = match spin {
            SpinDirection::Left => (Direction::Backward, Direction::Forward),
            SpinDirection::Right => (Direction::Forward, Direction::Backward),
        };

        self.write(
            MotorChannel::M1,
            direction_level(MotorChannel::M1, direction_m1),
            duty,
        )?;
        self.write(
            MotorChannel::M2,
            direction_level(MotorChannel::M2, direction_m2),
            duty,
        )
    }

    /// Safe state: both direction pins high and both speeds zero, which puts
    /// the driver IC into brake rather than coast.
    pub fn stop(&mut self) -> MotionResult<Dir1, Speed1> {
        trace!("stop");

        self.write(MotorChannel::M1, PinState::High, 0)?;
        self.write(MotorChannel::M2, PinState::High, 0)
    }

    /// Drive one motor, leaving the other untouched.
    pub fn set_channel(
        &mut self,
        channel: MotorChannel,
        direction: Direction,
        speed_percent: i32,
    ) -> MotionResult<Dir1, Speed1> {
        debug!("set {} {} at {}%", channel, direction, speed_percent);

        self.write(
            channel,
            direction_level(channel, direction),
            speed_to_duty(speed_percent),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Event, FakeAnalog, FakeError, FakeOutput, Log};

    const HIGH: bool = true;
    const LOW: bool = false;

    fn motion(log: &Log) -> Motion<FakeOutput, FakeAnalog, FakeOutput, FakeAnalog> {
        Motion::new(
            MotorPins::new(log.output("dir1"), log.analog("speed1")),
            MotorPins::new(log.output("dir2"), log.analog("speed2")),
        )
    }

    fn expected(dir1: bool, speed1: u16, dir2: bool, speed2: u16) -> Vec<Event> {
        vec![
            Event::Level("dir1", dir1),
            Event::Duty("speed1", speed1),
            Event::Level("dir2", dir2),
            Event::Duty("speed2", speed2),
        ]
    }

    #[test]
    fn drive_mirrors_motor_two() {
        let log = Log::new();
        let mut motion = motion(&log);

        motion.drive(Direction::Forward, 60).unwrap();
        assert_eq!(log.take(), expected(HIGH, 613, LOW, 613));

        motion.drive(Direction::Backward, 100).unwrap();
        assert_eq!(log.take(), expected(LOW, 1023, HIGH, 1023));
    }

    #[test]
    fn drive_clamps_speed() {
        let log = Log::new();
        let mut motion = motion(&log);

        motion.drive(Direction::Forward, 150).unwrap();
        assert_eq!(log.take(), expected(HIGH, 1023, LOW, 1023));

        motion.drive(Direction::Forward, -20).unwrap();
        assert_eq!(log.take(), expected(HIGH, 0, LOW, 0));
    }

    #[test]
    fn drive_differential_uses_both_speeds() {
        let log = Log::new();
        let mut motion = motion(&log);

        motion.drive_differential(Direction::Forward, 50, 100).unwrap();
        assert_eq!(log.take(), expected(HIGH, 511, LOW, 1023));

        motion.drive_differential(Direction::Backward, 0, 50).unwrap();
        assert_eq!(log.take(), expected(LOW, 0, HIGH, 511));
    }

    #[test]
    fn turn_holds_one_wheel() {
        let log = Log::new();
        let mut motion = motion(&log);

        motion.turn(TurnDirection::Left, 50).unwrap();
        assert_eq!(log.take(), expected(HIGH, 0, LOW, 511));

        motion.turn(TurnDirection::Right, 50).unwrap();
        assert_eq!(log.take(), expected(HIGH, 511, LOW, 0));
    }

    #[test]
    fn spin_shares_direction_level() {
        let log = Log::new();
        let mut motion = motion(&log);

        motion.spin(SpinDirection::Left, 100).unwrap();
        assert_eq!(log.take(), expected(LOW, 1023, LOW, 1023));

        motion.spin(SpinDirection::Right, 100).unwrap();
        assert_eq!(log.take(), expected(HIGH, 1023, HIGH, 1023));
    }

    #[test]
    fn stop_is_independent_of_prior_state() {
        let log = Log::new();
        let mut motion = motion(&log);

        for prior in [Direction::Forward, Direction::Backward] {
            motion.drive(prior, 80).unwrap();
            log.take();
            motion.stop().unwrap();
            assert_eq!(log.take(), expected(HIGH, 0, HIGH, 0));
        }

        motion.spin(SpinDirection::Left, 30).unwrap();
        log.take();
        motion.stop().unwrap();
        assert_eq!(log.take(), expected(HIGH, 0, HIGH, 0));
    }

    #[test]
    fn set_channel_touches_one_motor() {
        let log = Log::new();
        let mut motion = motion(&log);

        let cases = [
            (MotorChannel::M1, Direction::Forward, Event::Level("dir1", HIGH), "speed1"),
            (MotorChannel::M2, Direction::Forward, Event::Level("dir2", LOW), "speed2"),
            (MotorChannel::M1, Direction::Backward, Event::Level("dir1", LOW), "speed1"),
            (MotorChannel::M2, Direction::Backward, Event::Level("dir2", HIGH), "speed2"),
        ];

        for (channel, direction, level, speed) in cases {
            motion.set_channel(channel, direction, 50).unwrap();
            assert_eq!(log.take(), vec![level, Event::Duty(speed, 511)]);
        }
    }

    #[test]
    fn pin_failure_aborts_sequence() {
        let log = Log::new();
        let dir2 = log.output("dir2");
        let fail = dir2.fail.clone();
        let mut motion = Motion::new(
            MotorPins::new(log.output("dir1"), log.analog("speed1")),
            MotorPins::new(dir2, log.analog("speed2")),
        );

        fail.set(true);
        let err = motion.drive(Direction::Forward, 10).unwrap_err();
        assert_eq!(err, MotionError::Direction(MotorChannel::M2, FakeError("dir2")));
        assert_eq!(
            log.take(),
            vec![Event::Level("dir1", HIGH), Event::Duty("speed1", 102)]
        );
    }

    #[test]
    fn raw_selectors() {
        assert_eq!(Direction::try_from(0), Ok(Direction::Forward));
        assert_eq!(Direction::try_from(1), Ok(Direction::Backward));
        assert_eq!(Direction::try_from(2), Err(UnknownSelector(2)));
        assert_eq!(MotorChannel::try_from(1), Ok(MotorChannel::M2));
        assert_eq!(MotorChannel::try_from(9), Err(UnknownSelector(9)));
        assert_eq!(TurnDirection::try_from(1), Ok(TurnDirection::Right));
        assert_eq!(SpinDirection::try_from(0), Ok(SpinDirection::Left));
        assert_eq!(SpinDirection::try_from(255), Err(UnknownSelector(255)));
    }

    #[test]
    fn toggled_flips_direction() {
        assert_eq!(Direction::Forward.toggled(), Direction::Backward);
        assert_eq!(Direction::Backward.toggled(), Direction::Forward);
    }
}

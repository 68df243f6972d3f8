//! micro:bit v2 implementations of the `ibit` pin traits.

use core::cell::RefCell;
use core::convert::Infallible;

use embedded_hal::adc::OneShot;
use embedded_hal::timer::CountDown;
use ibit::pins::{AnalogInput, AnalogPin, PwmTiming, MAX_DUTY, MAX_SAMPLE};
use ibit::qc::{Icon, IconDisplay, QcInstant};
use microbit::display::blocking::Display;
use microbit::hal::pwm::{self, Prescaler, Pwm};
use microbit::hal::saadc::Saadc;
use microbit::hal::timer::{Instance, Periodic, Timer};

/// PWM counter clock before the prescaler.
const PWM_CLOCK_HZ: u32 = 16_000_000;
/// COUNTERTOP is 15 bits wide.
const PWM_MAX_TOP: u16 = 32_767;

const PRESCALERS: [Prescaler; 8] = [
    Prescaler::Div1,
    Prescaler::Div2,
    Prescaler::Div4,
    Prescaler::Div8,
    Prescaler::Div16,
    Prescaler::Div32,
    Prescaler::Div64,
    Prescaler::Div128,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PwmError {
    /// The period in microseconds cannot be generated by the PWM counter.
    PeriodOutOfRange(u32),
}

/// Program prescaler and counter top so the instance runs at `period_us`.
pub fn set_period_us<T: pwm::Instance>(pwm: &Pwm<T>, period_us: u32) -> Result<(), PwmError> {
    let timing = PwmTiming::for_period(
        period_us,
        PWM_CLOCK_HZ,
        (PRESCALERS.len() - 1) as u8,
        PWM_MAX_TOP,
    )
    .ok_or(PwmError::PeriodOutOfRange(period_us))?;

    pwm.set_prescaler(PRESCALERS[usize::from(timing.prescaler_shift)])
        .set_max_duty(timing.top);
    Ok(())
}

/// One channel of an nRF PWM instance.
///
/// The period is shared by all four channels of an instance, so pins that
/// need different periods must live on different instances.
pub struct PwmOut<'a, T: pwm::Instance> {
    pwm: &'a Pwm<T>,
    channel: pwm::Channel,
}

impl<'a, T: pwm::Instance> PwmOut<'a, T> {
    pub fn new(pwm: &'a Pwm<T>, channel: pwm::Channel) -> Self {
        Self { pwm, channel }
    }
}

impl<'a, T: pwm::Instance> AnalogPin for PwmOut<'a, T> {
    type Error = PwmError;

    fn set_period_us(&mut self, period_us: u32) -> Result<(), Self::Error> {
        set_period_us(self.pwm, period_us)
    }

    fn write_analog(&mut self, duty: u16) -> Result<(), Self::Error> {
        let max = u32::from(self.pwm.max_duty());
        let duty = u32::from(duty.min(MAX_DUTY)) * max / u32::from(MAX_DUTY);
        self.pwm.set_duty_on(self.channel, duty as u16);
        Ok(())
    }

    fn write_digital(&mut self, is_high: bool) -> Result<(), Self::Error> {
        let duty = if is_high { self.pwm.max_duty() } else { 0 };
        self.pwm.set_duty_on(self.channel, duty);
        Ok(())
    }
}

/// An edge connector pin sampled by the shared SAADC.
pub struct EdgeAnalog<'a, P> {
    saadc: &'a RefCell<Saadc>,
    pin: P,
}

impl<'a, P> EdgeAnalog<'a, P> {
    pub fn new(saadc: &'a RefCell<Saadc>, pin: P) -> Self {
        Self { saadc, pin }
    }
}

impl<'a, P> AnalogInput for EdgeAnalog<'a, P>
where
    Saadc: OneShot<Saadc, i16, P, Error = ()>,
{
    type Error = ();

    fn read_analog(&mut self) -> Result<u16, Self::Error> {
        let sample = nb::block!(self.saadc.borrow_mut().read(&mut self.pin))?;
        // single-ended readings can dip slightly below zero
        Ok((sample.max(0) as u16).min(MAX_SAMPLE))
    }
}

/// The 5x5 LED matrix, holding each icon for a fixed time.
pub struct Matrix<T: Instance> {
    display: Display,
    timer: Timer<T>,
    hold_ms: u32,
}

impl<T: Instance> Matrix<T> {
    pub fn new(display: Display, timer: Timer<T>, hold_ms: u32) -> Self {
        Self {
            display,
            timer,
            hold_ms,
        }
    }
}

impl<T: Instance> IconDisplay for Matrix<T> {
    type Error = Infallible;

    fn show(&mut self, icon: Icon) -> Result<(), Self::Error> {
        self.display.show(&mut self.timer, icon.frame(), self.hold_ms);
        Ok(())
    }
}

/// Millisecond clock on a free-running 1 MHz timer.
pub struct Clock<T: Instance> {
    timer: Timer<T, Periodic>,
    last_us: u32,
    elapsed_us: u64,
}

impl<T: Instance> Clock<T> {
    pub fn new(mut timer: Timer<T, Periodic>) -> Self {
        timer.start(u32::MAX);
        let last_us = timer.read();
        Self {
            timer,
            last_us,
            elapsed_us: 0,
        }
    }

    pub fn now(&mut self) -> QcInstant {
        let now_us = self.timer.read();
        self.elapsed_us += u64::from(now_us.wrapping_sub(self.last_us));
        self.last_us = now_us;
        // wraps after ~49 days, which the sequencer tolerates
        QcInstant::from_ticks((self.elapsed_us / 1_000) as u32)
    }
}

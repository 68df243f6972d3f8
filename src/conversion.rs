//! Integer conversions from user units (percent, degrees) to PWM duty.

use crate::pins::MAX_DUTY;

pub const MAX_SPEED_PERCENT: i32 = 100;
pub const MAX_DEGREES: i32 = 180;

pub const SERVO_MIN_PULSE_US_DEFAULT: u32 = 500;
pub const SERVO_MAX_PULSE_US_DEFAULT: u32 = 2_500;
pub const SERVO_PERIOD_US_DEFAULT: u32 = 20_000; // 50 Hz

pub(crate) fn clamp<T: Ord>(value: T, lo: T, hi: T) -> T {
    if value < lo {
        lo
    } else if value > hi {
        hi
    } else {
        value
    }
}

/// Map a speed percentage to a motor duty, `floor(clamp(speed, 0, 100) * 1023 / 100)`.
pub fn speed_to_duty(speed_percent: i32) -> u16 {
    let speed = clamp(speed_percent, 0, MAX_SPEED_PERCENT);
    // 0..=1023
    (speed * i32::from(MAX_DUTY) / MAX_SPEED_PERCENT) as u16
}

/// Pulse bounds and frame period of one servo.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServoConfig {
    /// Pulse width at 0 degrees.
    pub min_pulse_us: u32,
    /// Pulse width at 180 degrees.
    pub max_pulse_us: u32,
    pub period_us: u32,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            min_pulse_us: SERVO_MIN_PULSE_US_DEFAULT,
            max_pulse_us: SERVO_MAX_PULSE_US_DEFAULT,
            period_us: SERVO_PERIOD_US_DEFAULT,
        }
    }
}

impl ServoConfig {
    pub fn new(min_pulse_us: u32, max_pulse_us: u32) -> Self {
        Self {
            min_pulse_us,
            max_pulse_us,
            ..Self::default()
        }
    }

    /// Linear interpolation between the pulse bounds, floored.
    ///
    /// Bounds may be given in reverse for a servo mounted the other way round.
    pub fn pulse_us(&self, degrees: i32) -> u32 {
        let degrees = i64::from(clamp(degrees, 0, MAX_DEGREES));
        let min = i64::from(self.min_pulse_us);
        let span = i64::from(self.max_pulse_us) - min;
        let pulse = min + (span * degrees).div_euclid(i64::from(MAX_DEGREES));
        // between min and max, both u32
        pulse as u32
    }

    /// Duty for a pulse width against this period, clamped to `0..=MAX_DUTY`.
    pub fn pulse_to_duty(&self, pulse_us: u32) -> u16 {
        let period = u64::from(self.period_us.max(1));
        let duty = u64::from(pulse_us) * u64::from(MAX_DUTY) / period;
        duty.min(u64::from(MAX_DUTY)) as u16
    }

    pub fn degrees_to_duty(&self, degrees: i32) -> u16 {
        self.pulse_to_duty(self.pulse_us(degrees))
    }
}

/// Servo duty for the default 500..2500 us pulse over a 20 ms frame.
pub fn degrees_to_duty(degrees: i32) -> u16 {
    ServoConfig::default().degrees_to_duty(degrees)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_to_duty_floors() {
        assert_eq!(speed_to_duty(0), 0);
        assert_eq!(speed_to_duty(50), 511);
        assert_eq!(speed_to_duty(60), 613);
        assert_eq!(speed_to_duty(100), 1023);
    }

    #[test]
    fn speed_to_duty_clamps() {
        for speed in [-1, -100, i32::MIN] {
            assert_eq!(speed_to_duty(speed), speed_to_duty(0));
        }
        for speed in [101, 250, i32::MAX] {
            assert_eq!(speed_to_duty(speed), speed_to_duty(100));
        }
    }

    #[test]
    fn degrees_to_duty_bounds() {
        assert_eq!(degrees_to_duty(0), 25);
        assert_eq!(degrees_to_duty(90), 76);
        assert_eq!(degrees_to_duty(180), 127);
    }

    #[test]
    fn degrees_clamp_to_nearest_bound() {
        let config = ServoConfig::default();
        assert_eq!(config.pulse_us(-30), config.pulse_us(0));
        assert_eq!(config.pulse_us(720), config.pulse_us(180));
        assert_eq!(degrees_to_duty(i32::MIN), 25);
        assert_eq!(degrees_to_duty(i32::MAX), 127);
    }

    #[test]
    fn pulse_interpolates() {
        let config = ServoConfig::default();
        assert_eq!(config.pulse_us(0), 500);
        assert_eq!(config.pulse_us(60), 1166);
        assert_eq!(config.pulse_us(120), 1833);
        assert_eq!(config.pulse_us(180), 2500);
    }

    #[test]
    fn narrow_and_reversed_bounds() {
        let narrow = ServoConfig::new(1_000, 2_000);
        assert_eq!(narrow.pulse_us(90), 1_500);
        assert_eq!(narrow.degrees_to_duty(0), 51);

        let reversed = ServoConfig::new(2_500, 500);
        assert_eq!(reversed.pulse_us(0), 2_500);
        assert_eq!(reversed.pulse_us(180), 500);
        assert_eq!(reversed.pulse_us(1), 2_488);
    }

    #[test]
    fn duty_saturates() {
        let config = ServoConfig::default();
        assert_eq!(config.pulse_to_duty(40_000), 1023);
        let zero_period = ServoConfig {
            period_us: 0,
            ..ServoConfig::default()
        };
        assert_eq!(zero_period.pulse_to_duty(500), 1023);
    }
}

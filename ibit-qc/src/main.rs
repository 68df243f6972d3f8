#![no_main]
#![no_std]

mod adapters;

use core::cell::RefCell;

use cortex_m_rt::entry;
use defmt::Debug2Format;
use defmt_rtt as _; // global logger
use embedded_hal::blocking::delay::DelayMs;
use ibit::qc::{QcConfig, QcRunner, QcSequencer};
use ibit::{Adc, Ibit, Motion, MotorPins, Servo, Servos};
use microbit::display::blocking::Display;
use microbit::hal::gpio::Level;
use microbit::hal::pwm::{Channel, Pwm};
use microbit::hal::saadc::{Resolution, Saadc, SaadcConfig};
use microbit::hal::timer::Timer;
use microbit::hal::twim::{self, Twim};
use microbit::Board;
use panic_probe as _;

use adapters::{set_period_us, Clock, EdgeAnalog, Matrix, PwmOut};

const MOTOR_PWM_PERIOD_US: u32 = 1_000;
const SERVO_PWM_PERIOD_US: u32 = 20_000;
const ICON_HOLD_MS: u32 = 100;

// same panicking *behavior* as `panic-probe` but doesn't print a panic message
// this prevents the panic message being printed *twice* when `defmt::panic` is invoked
#[defmt::panic_handler]
fn panic() -> ! {
    cortex_m::asm::udf()
}

#[entry]
fn main() -> ! {
    defmt::println!("Init!");

    let board = Board::take().unwrap();

    // motor 1: P13 direction, P14 speed; motor 2: P15 direction, P16 speed
    let dir1 = board.pins.p0_17.into_push_pull_output(Level::High).degrade();
    let speed1 = board.pins.p0_01.into_push_pull_output(Level::Low).degrade();
    let dir2 = board.pins.p0_13.into_push_pull_output(Level::High).degrade();
    let speed2 = board.pins.p1_02.into_push_pull_output(Level::Low).degrade();

    // SV1 on P8, SV2 on P12
    let sv1 = board.pins.p0_10.into_push_pull_output(Level::Low).degrade();
    let sv2 = board.pins.p0_12.into_push_pull_output(Level::Low).degrade();

    let motor_pwm = Pwm::new(board.PWM0);
    motor_pwm
        .set_output_pin(Channel::C0, speed1)
        .set_output_pin(Channel::C1, speed2);
    set_period_us(&motor_pwm, MOTOR_PWM_PERIOD_US).unwrap();

    let servo_pwm = Pwm::new(board.PWM1);
    servo_pwm
        .set_output_pin(Channel::C0, sv1)
        .set_output_pin(Channel::C1, sv2);
    set_period_us(&servo_pwm, SERVO_PWM_PERIOD_US).unwrap();

    let i2c = Twim::new(
        board.TWIM0,
        board.i2c_external.into(),
        twim::Frequency::K100,
    );

    let motion = Motion::new(
        MotorPins::new(dir1, PwmOut::new(&motor_pwm, Channel::C0)),
        MotorPins::new(dir2, PwmOut::new(&motor_pwm, Channel::C1)),
    );
    let servos = Servos::new(
        Servo::new(PwmOut::new(&servo_pwm, Channel::C0)),
        Servo::new(PwmOut::new(&servo_pwm, Channel::C1)),
    );
    let ibit = Ibit::new(motion, servos, Adc::new(i2c));

    let saadc = RefCell::new(Saadc::new(
        board.SAADC,
        SaadcConfig {
            resolution: Resolution::_10BIT,
            ..SaadcConfig::default()
        },
    ));
    // AN0..AN2 on edge pins P0, P1, P2
    let mut an0 = EdgeAnalog::new(&saadc, board.pins.p0_02.into_floating_input());
    let mut an1 = EdgeAnalog::new(&saadc, board.pins.p0_03.into_floating_input());
    let mut an2 = EdgeAnalog::new(&saadc, board.pins.p0_04.into_floating_input());

    let display = Display::new(board.display_pins);
    let matrix = Matrix::new(display, Timer::new(board.TIMER0), ICON_HOLD_MS);
    let mut delay = Timer::new(board.TIMER2);
    let mut clock = Clock::new(Timer::periodic(board.TIMER1));

    let config = QcConfig::default();
    let mut runner = QcRunner::new(
        ibit,
        board.buttons.button_a,
        board.buttons.button_b,
        [&mut an0, &mut an1, &mut an2],
        matrix,
        QcSequencer::new(config, clock.now()),
    );

    if let Err(err) = runner.start() {
        defmt::println!("Unexpected error: {}", Debug2Format(&err));
    }

    loop {
        match runner.poll(clock.now()) {
            Ok(Some(report)) => defmt::println!("{}", report),
            Ok(None) => {}
            Err(err) => {
                defmt::println!("Unexpected error: {}", Debug2Format(&err));

                if let Err(err) = runner.board().safe_stop() {
                    defmt::println!("Safe stop failed: {}", Debug2Format(&err));
                }
            }
        }

        delay.delay_ms(config.tick.to_millis());
    }
}

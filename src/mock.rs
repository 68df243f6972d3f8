//! Recording fakes for unit tests. Every pin appends to one shared log so tests
//! can assert on the order of writes across pins.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::digital::v2::{InputPin, OutputPin};

use crate::pins::{AnalogInput, AnalogPin};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Level(&'static str, bool),
    Duty(&'static str, u16),
    Period(&'static str, u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FakeError(pub &'static str);

#[derive(Clone, Default)]
pub struct Log(Rc<RefCell<Vec<Event>>>);

impl Log {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn take(&self) -> Vec<Event> {
        self.0.borrow_mut().drain(..).collect()
    }

    pub fn output(&self, name: &'static str) -> FakeOutput {
        FakeOutput {
            name,
            log: self.clone(),
            fail: Rc::new(Cell::new(false)),
        }
    }

    pub fn analog(&self, name: &'static str) -> FakeAnalog {
        FakeAnalog {
            name,
            log: self.clone(),
            fail: Rc::new(Cell::new(false)),
        }
    }
}

pub struct FakeOutput {
    name: &'static str,
    log: Log,
    pub fail: Rc<Cell<bool>>,
}

impl OutputPin for FakeOutput {
    type Error = FakeError;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.fail.get() {
            return Err(FakeError(self.name));
        }
        self.log.push(Event::Level(self.name, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if self.fail.get() {
            return Err(FakeError(self.name));
        }
        self.log.push(Event::Level(self.name, true));
        Ok(())
    }
}

pub struct FakeAnalog {
    name: &'static str,
    log: Log,
    pub fail: Rc<Cell<bool>>,
}

impl AnalogPin for FakeAnalog {
    type Error = FakeError;

    fn set_period_us(&mut self, period_us: u32) -> Result<(), Self::Error> {
        if self.fail.get() {
            return Err(FakeError(self.name));
        }
        self.log.push(Event::Period(self.name, period_us));
        Ok(())
    }

    fn write_analog(&mut self, duty: u16) -> Result<(), Self::Error> {
        if self.fail.get() {
            return Err(FakeError(self.name));
        }
        self.log.push(Event::Duty(self.name, duty));
        Ok(())
    }

    fn write_digital(&mut self, is_high: bool) -> Result<(), Self::Error> {
        if self.fail.get() {
            return Err(FakeError(self.name));
        }
        self.log.push(Event::Level(self.name, is_high));
        Ok(())
    }
}

/// Active-low push button.
#[derive(Clone, Default)]
pub struct FakeButton {
    pub pressed: Rc<Cell<bool>>,
}

impl InputPin for FakeButton {
    type Error = FakeError;

    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(!self.pressed.get())
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(self.pressed.get())
    }
}

pub struct FakeAnalogInput(pub u16);

impl AnalogInput for FakeAnalogInput {
    type Error = FakeError;

    fn read_analog(&mut self) -> Result<u16, Self::Error> {
        Ok(self.0)
    }
}

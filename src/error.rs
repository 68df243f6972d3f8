use core::fmt::{Debug, Display, Formatter, Result as FmtResult};

pub trait Error: Debug {}

/// A raw selector constant (direction, channel, servo) that names nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnknownSelector(pub u8);

impl Display for UnknownSelector {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "unknown selector {}", self.0)
    }
}

impl Error for UnknownSelector {}

// Every error type must stay loggable when the `defmt` feature is on.
#[cfg(feature = "defmt")]
const _: fn() = || {
    use crate::{AdcError, IbitBuilderError, IbitError, MotionError, ServoError};
    use crate::qc::QcError;

    fn assert_format<T: defmt::Format>() {}

    assert_format::<UnknownSelector>();
    assert_format::<MotionError<u8, u16>>();
    assert_format::<ServoError<u8>>();
    assert_format::<AdcError<u8, u16>>();
    assert_format::<IbitError<u8, u16, u32, bool>>();
    assert_format::<IbitBuilderError>();
    assert_format::<QcError<u8, u16, u32, bool>>();
};

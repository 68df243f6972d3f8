//! 8-channel ADC on the iBIT's I2C bus.
//!
//! A conversion is one command byte written to the ADC, followed by a
//! separate two byte read of the big-endian result. Both transfers are plain
//! (stop-terminated) transactions.

use core::fmt::Debug;
use embedded_hal::blocking::i2c::{Read as I2cRead, Write as I2cWrite};

use crate::error::{Error, UnknownSelector};

/// ADC address on first revision boards.
pub const ADDRESS_V1: u8 = 0x48;
/// ADC address on second revision boards.
pub const ADDRESS_V2: u8 = 0x4A;
pub const DEFAULT_ADDRESS: u8 = ADDRESS_V2;

/// Returned by [`Adc::read_selector`] for a selector that names no channel.
pub const ADC_INVALID: i32 = -1;

/// Command byte for each channel, indexed by channel number.
pub const COMMANDS: [u8; 8] = [132, 196, 148, 212, 164, 228, 180, 244];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcChannel {
    Adc0,
    Adc1,
    Adc2,
    Adc3,
    Adc4,
    Adc5,
    Adc6,
    Adc7,
}

impl AdcChannel {
    pub const ALL: [AdcChannel; 8] = [
        AdcChannel::Adc0,
        AdcChannel::Adc1,
        AdcChannel::Adc2,
        AdcChannel::Adc3,
        AdcChannel::Adc4,
        AdcChannel::Adc5,
        AdcChannel::Adc6,
        AdcChannel::Adc7,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn command(self) -> u8 {
        COMMANDS[self.index()]
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn from_command(command: u8) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|channel| channel.command() == command)
    }

    /// Resolve a channel index `0..=7` or one of the eight command bytes.
    pub fn from_selector(selector: i32) -> Option<Self> {
        if let Some(channel) = usize::try_from(selector).ok().and_then(Self::from_index) {
            return Some(channel);
        }

        u8::try_from(selector).ok().and_then(Self::from_command)
    }
}

impl TryFrom<u8> for AdcChannel {
    type Error = UnknownSelector;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Self::from_selector(i32::from(raw)).ok_or(UnknownSelector(raw))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcError<WriteError: Debug, ReadError: Debug> {
    Write(WriteError),
    Read(ReadError),
}

impl<WriteError: Debug, ReadError: Debug> Error for AdcError<WriteError, ReadError> {}

pub type AdcResult<T, I2C> =
    Result<T, AdcError<<I2C as I2cWrite>::Error, <I2C as I2cRead>::Error>>;

pub struct Adc<I2C>
where
    I2C: I2cWrite + I2cRead,
{
    i2c: I2C,
    address: u8,
}

impl<I2C> Adc<I2C>
where
    I2C: I2cWrite + I2cRead,
    <I2C as I2cWrite>::Error: Debug,
    <I2C as I2cRead>::Error: Debug,
{
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS)
    }

    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    pub fn free(self) -> I2C {
        self.i2c
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Any address is accepted; only later reads use it.
    pub fn set_address(&mut self, address: u8) {
        debug!("adc address {=u8:#x}", address);
        self.address = address;
    }

    pub fn read(&mut self, channel: AdcChannel) -> AdcResult<u16, I2C> {
        let address = self.address;
        let command = channel.command();
        let mut data = [0u8; 2];

        self.i2c
            .write(address, &[command])
            .map_err(AdcError::Write)?;
        self.i2c.read(address, &mut data).map_err(AdcError::Read)?;

        let value = u16::from_be_bytes(data);
        trace!(
            "adc {=u8:#x} cmd={=u8} -> {=u16}",
            address,
            command,
            value
        );

        Ok(value)
    }

    /// Read by channel index or raw command byte, [`ADC_INVALID`] if `selector`
    /// is neither. An invalid selector never touches the bus.
    pub fn read_selector(&mut self, selector: i32) -> AdcResult<i32, I2C> {
        match AdcChannel::from_selector(selector) {
            Some(channel) => Ok(i32::from(self.read(channel)?)),
            None => {
                warn!("adc selector {} is not a channel", selector);
                Ok(ADC_INVALID)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
    use embedded_hal_mock::MockError;
    use std::io::ErrorKind;

    fn conversion(address: u8, command: u8, data: [u8; 2]) -> [I2cTransaction; 2] {
        [
            I2cTransaction::write(address, vec![command]),
            I2cTransaction::read(address, data.to_vec()),
        ]
    }

    #[test]
    fn read_composes_big_endian() {
        let expectations = conversion(ADDRESS_V2, 132, [0x0A, 0xBC]);
        let mut adc = Adc::new(I2cMock::new(&expectations));

        assert_eq!(adc.read(AdcChannel::Adc0).unwrap(), 0x0ABC);

        adc.free().done();
    }

    #[test]
    fn index_and_command_issue_same_byte() {
        let mut expectations = Vec::new();
        for command in COMMANDS {
            expectations.extend(conversion(ADDRESS_V2, command, [0x01, 0x02]));
            expectations.extend(conversion(ADDRESS_V2, command, [0x01, 0x02]));
        }
        let mut adc = Adc::new(I2cMock::new(&expectations));

        for (index, command) in COMMANDS.iter().enumerate() {
            assert_eq!(adc.read_selector(index as i32).unwrap(), 0x0102);
            assert_eq!(adc.read_selector(i32::from(*command)).unwrap(), 0x0102);
        }

        adc.free().done();
    }

    #[test]
    fn invalid_selector_skips_bus() {
        let mut adc = Adc::new(I2cMock::new(&[]));

        for selector in [999, 8, -1, 133, 255, 256 + 132] {
            assert_eq!(adc.read_selector(selector).unwrap(), ADC_INVALID);
        }

        adc.free().done();
    }

    #[test]
    fn address_change_applies_to_later_reads() {
        let expectations = [
            conversion(ADDRESS_V2, 212, [0x00, 0x10]),
            conversion(ADDRESS_V1, 212, [0x00, 0x20]),
            conversion(0x33, 244, [0xFF, 0xFF]),
        ]
        .concat();
        let mut adc = Adc::new(I2cMock::new(&expectations));

        assert_eq!(adc.address(), ADDRESS_V2);
        let before = adc.read(AdcChannel::Adc3).unwrap();
        adc.set_address(ADDRESS_V1);
        let after = adc.read(AdcChannel::Adc3).unwrap();
        adc.set_address(0x33);
        let max = adc.read_selector(7).unwrap();

        assert_eq!((before, after, max), (0x10, 0x20, 0xFFFF));

        adc.free().done();
    }

    #[test]
    fn write_failure_skips_read() {
        let expectations = [I2cTransaction::write(ADDRESS_V1, vec![196])
            .with_error(MockError::Io(ErrorKind::Other))];
        let mut adc = Adc::with_address(I2cMock::new(&expectations), ADDRESS_V1);

        assert!(matches!(
            adc.read(AdcChannel::Adc1),
            Err(AdcError::Write(MockError::Io(ErrorKind::Other)))
        ));

        adc.free().done();
    }

    #[test]
    fn read_failure_propagates() {
        let expectations = [
            I2cTransaction::write(ADDRESS_V2, vec![148]),
            I2cTransaction::read(ADDRESS_V2, vec![0, 0])
                .with_error(MockError::Io(ErrorKind::Other)),
        ];
        let mut adc = Adc::new(I2cMock::new(&expectations));

        assert!(matches!(
            adc.read_selector(2),
            Err(AdcError::Read(MockError::Io(ErrorKind::Other)))
        ));

        adc.free().done();
    }

    #[test]
    fn channel_lookups() {
        assert_eq!(AdcChannel::from_index(5), Some(AdcChannel::Adc5));
        assert_eq!(AdcChannel::from_index(8), None);
        assert_eq!(AdcChannel::from_command(180), Some(AdcChannel::Adc6));
        assert_eq!(AdcChannel::from_command(181), None);
        assert_eq!(AdcChannel::Adc7.command(), 244);
        assert_eq!(AdcChannel::try_from(228), Ok(AdcChannel::Adc5));
        assert_eq!(AdcChannel::try_from(3), Ok(AdcChannel::Adc3));
        assert_eq!(AdcChannel::try_from(9), Err(UnknownSelector(9)));
    }
}

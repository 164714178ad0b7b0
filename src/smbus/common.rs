// Licensed under the Apache-2.0 license

//! Common types and constants for the PCU SMBus driver modules.
//!
//! This module provides shared definitions for error handling, transaction
//! descriptors, adapter functionality bits, and polling configuration used
//! across the SMBus engine.

use core::fmt;
use embedded_hal::i2c::{ErrorKind, SevenBitAddress};
use fugit::MicrosDurationU32;

/// Number of SMBus segments exposed by the PCU.
pub const NR_BUSES: usize = 3;

/// Largest payload of an SMBus block transfer.
pub const BLOCK_MAX: usize = 32;

/// Highest valid 7-bit target address.
pub const ADDRESS_MAX: SevenBitAddress = 0x7F;

/// Addresses reserved for SPD/identification EEPROMs. Writes are refused.
pub const PROTECTED_ADDRESSES: core::ops::RangeInclusive<SevenBitAddress> = 0x50..=0x57;

// SMBus functionality bits, same values as the Linux `I2C_FUNC_SMBUS_*` set.
pub const FUNC_SMBUS_QUICK: u32 = 0x0001_0000;
pub const FUNC_SMBUS_READ_BYTE: u32 = 0x0002_0000;
pub const FUNC_SMBUS_WRITE_BYTE: u32 = 0x0004_0000;
pub const FUNC_SMBUS_READ_BYTE_DATA: u32 = 0x0008_0000;
pub const FUNC_SMBUS_WRITE_BYTE_DATA: u32 = 0x0010_0000;
pub const FUNC_SMBUS_READ_WORD_DATA: u32 = 0x0020_0000;
pub const FUNC_SMBUS_WRITE_WORD_DATA: u32 = 0x0040_0000;
pub const FUNC_SMBUS_PROC_CALL: u32 = 0x0080_0000;
pub const FUNC_SMBUS_READ_BLOCK_DATA: u32 = 0x0100_0000;
pub const FUNC_SMBUS_WRITE_BLOCK_DATA: u32 = 0x0200_0000;

pub const FUNC_SMBUS_BYTE: u32 = FUNC_SMBUS_READ_BYTE | FUNC_SMBUS_WRITE_BYTE;
pub const FUNC_SMBUS_BYTE_DATA: u32 = FUNC_SMBUS_READ_BYTE_DATA | FUNC_SMBUS_WRITE_BYTE_DATA;
pub const FUNC_SMBUS_WORD_DATA: u32 = FUNC_SMBUS_READ_WORD_DATA | FUNC_SMBUS_WRITE_WORD_DATA;
pub const FUNC_SMBUS_BLOCK_DATA: u32 = FUNC_SMBUS_READ_BLOCK_DATA | FUNC_SMBUS_WRITE_BLOCK_DATA;

/// Errors reported by the SMBus engine and its host wrapper.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Malformed descriptor: block length out of range, payload not matching
    /// the protocol, address wider than 7 bits, or bus index out of range.
    InvalidArgument,
    /// Protocol not implemented by the controller, or write to a protected
    /// address.
    Unsupported,
    /// Register access failed, or the controller did not confirm the
    /// transfer with WRITE_OK/READ_OK.
    Io,
    /// The controller flagged a bus error.
    Bus,
    /// BUSY never cleared within the configured number of status reads.
    Timeout,
    /// Another handle currently owns the bus.
    Busy,
    /// The device is suspended.
    Suspended,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::InvalidArgument => "invalid argument",
            Error::Unsupported => "operation not supported",
            Error::Io => "i/o error",
            Error::Bus => "smbus error",
            Error::Timeout => "timed out waiting for controller",
            Error::Busy => "bus already claimed",
            Error::Suspended => "device suspended",
        };
        f.write_str(msg)
    }
}

impl core::error::Error for Error {}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Error::Bus => ErrorKind::Bus,
            _ => ErrorKind::Other,
        }
    }
}

/// Index of one of the PCU SMBus segments.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BusId(u8);

impl BusId {
    pub const BUS0: BusId = BusId(0);
    pub const BUS1: BusId = BusId(1);
    pub const BUS2: BusId = BusId(2);

    pub const fn new(index: u8) -> Result<Self, Error> {
        if (index as usize) < NR_BUSES {
            Ok(Self(index))
        } else {
            Err(Error::InvalidArgument)
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[must_use]
    pub const fn all() -> [BusId; NR_BUSES] {
        [Self::BUS0, Self::BUS1, Self::BUS2]
    }
}

impl TryFrom<u8> for BusId {
    type Error = Error;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::new(index)
    }
}

impl fmt::Display for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

/// SMBus transaction shapes.
///
/// Only `Quick`, `Byte`, `ByteData`, `WordData` and (write) `BlockData` are
/// implemented by the controller; the remaining shapes exist so callers
/// coming from a generic SMBus stack get a clean `Unsupported`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Protocol {
    Quick,
    Byte,
    ByteData,
    WordData,
    ProcCall,
    BlockData,
    BlockProcCall,
    I2cBlockData,
}

impl Protocol {
    /// Functionality bits the controller supports for this shape, or 0.
    #[must_use]
    pub const fn functionality(self, direction: Direction) -> u32 {
        match (self, direction) {
            (Protocol::Quick, _) => FUNC_SMBUS_QUICK,
            (Protocol::Byte, Direction::Read) => FUNC_SMBUS_READ_BYTE,
            (Protocol::Byte, Direction::Write) => FUNC_SMBUS_WRITE_BYTE,
            (Protocol::ByteData, Direction::Read) => FUNC_SMBUS_READ_BYTE_DATA,
            (Protocol::ByteData, Direction::Write) => FUNC_SMBUS_WRITE_BYTE_DATA,
            (Protocol::WordData, Direction::Read) => FUNC_SMBUS_READ_WORD_DATA,
            (Protocol::WordData, Direction::Write) => FUNC_SMBUS_WRITE_WORD_DATA,
            (Protocol::BlockData, Direction::Write) => FUNC_SMBUS_WRITE_BLOCK_DATA,
            _ => 0,
        }
    }
}

/// SMBus block payload.
pub type Block = heapless::Vec<u8, BLOCK_MAX>;

/// Payload carried by a transaction: the outgoing value on writes, the
/// decoded result on reads.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SmbusData {
    #[default]
    None,
    Byte(u8),
    Word(u16),
    Block(Block),
}

impl SmbusData {
    /// Builds a block payload. Fails with `InvalidArgument` above
    /// [`BLOCK_MAX`] bytes.
    pub fn block(bytes: &[u8]) -> Result<Self, Error> {
        Block::from_slice(bytes)
            .map(SmbusData::Block)
            .map_err(|()| Error::InvalidArgument)
    }

    #[must_use]
    pub fn as_byte(&self) -> Option<u8> {
        match self {
            SmbusData::Byte(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_word(&self) -> Option<u16> {
        match self {
            SmbusData::Word(w) => Some(*w),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_block(&self) -> Option<&[u8]> {
        match self {
            SmbusData::Block(b) => Some(b.as_slice()),
            _ => None,
        }
    }
}

/// One SMBus transaction to run on a bus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub address: SevenBitAddress,
    pub command: u8,
    pub direction: Direction,
    pub protocol: Protocol,
    pub data: SmbusData,
}

impl Transaction {
    #[must_use]
    pub fn read(address: SevenBitAddress, command: u8, protocol: Protocol) -> Self {
        Self {
            address,
            command,
            direction: Direction::Read,
            protocol,
            data: SmbusData::None,
        }
    }

    #[must_use]
    pub fn write(
        address: SevenBitAddress,
        command: u8,
        protocol: Protocol,
        data: SmbusData,
    ) -> Self {
        Self {
            address,
            command,
            direction: Direction::Write,
            protocol,
            data,
        }
    }

    #[must_use]
    pub fn is_write(&self) -> bool {
        self.direction == Direction::Write
    }
}

/// Completion polling policy.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PollConfig {
    /// Shortest pause between two status reads while BUSY is set.
    pub min_interval: MicrosDurationU32,
    /// Longest pause between two status reads while BUSY is set.
    pub max_interval: MicrosDurationU32,
    /// Status reads allowed per wait before giving up with `Timeout`.
    /// `None` polls until BUSY clears.
    pub max_polls: Option<u32>,
    /// Seed for the backoff jitter generator.
    pub jitter_seed: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfigBuilder::new().build()
    }
}

pub struct PollConfigBuilder {
    min_interval: MicrosDurationU32,
    max_interval: MicrosDurationU32,
    max_polls: Option<u32>,
    jitter_seed: u64,
}

impl Default for PollConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PollConfigBuilder {
    pub const DEFAULT_MIN_INTERVAL_US: u32 = 250;
    pub const DEFAULT_MAX_INTERVAL_US: u32 = 500;
    pub const DEFAULT_MAX_POLLS: u32 = 2000;
    pub const DEFAULT_JITTER_SEED: u64 = 0x5043_5553_4d42_5553;

    #[must_use]
    pub fn new() -> Self {
        Self {
            min_interval: MicrosDurationU32::micros(Self::DEFAULT_MIN_INTERVAL_US),
            max_interval: MicrosDurationU32::micros(Self::DEFAULT_MAX_INTERVAL_US),
            max_polls: Some(Self::DEFAULT_MAX_POLLS),
            jitter_seed: Self::DEFAULT_JITTER_SEED,
        }
    }
    #[must_use]
    pub fn interval(mut self, min: MicrosDurationU32, max: MicrosDurationU32) -> Self {
        self.min_interval = min;
        self.max_interval = max;
        self
    }
    #[must_use]
    pub fn max_polls(mut self, max_polls: Option<u32>) -> Self {
        self.max_polls = max_polls;
        self
    }
    #[must_use]
    pub fn jitter_seed(mut self, seed: u64) -> Self {
        self.jitter_seed = seed;
        self
    }
    /// A bound given in the wrong order is swapped; a cap of zero polls is
    /// raised to one so every wait reads the status at least once.
    #[must_use]
    pub fn build(self) -> PollConfig {
        let (min_interval, max_interval) = if self.min_interval <= self.max_interval {
            (self.min_interval, self.max_interval)
        } else {
            (self.max_interval, self.min_interval)
        };
        PollConfig {
            min_interval,
            max_interval,
            max_polls: self.max_polls.map(|cap| cap.max(1)),
            jitter_seed: self.jitter_seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_id_range() {
        assert_eq!(BusId::new(2), Ok(BusId::BUS2));
        assert_eq!(BusId::new(3), Err(Error::InvalidArgument));
        assert_eq!(BusId::try_from(1).map(BusId::index), Ok(1));
        assert_eq!(BusId::all().len(), NR_BUSES);
    }

    #[test]
    fn test_block_payload_limit() {
        assert!(SmbusData::block(&[0u8; BLOCK_MAX]).is_ok());
        assert_eq!(
            SmbusData::block(&[0u8; BLOCK_MAX + 1]),
            Err(Error::InvalidArgument)
        );
    }

    #[test]
    fn test_functionality_excludes_block_read() {
        assert_eq!(Protocol::BlockData.functionality(Direction::Read), 0);
        assert_eq!(
            Protocol::BlockData.functionality(Direction::Write),
            FUNC_SMBUS_WRITE_BLOCK_DATA
        );
        assert_eq!(Protocol::ProcCall.functionality(Direction::Write), 0);
        assert_eq!(
            Protocol::Quick.functionality(Direction::Read),
            FUNC_SMBUS_QUICK
        );
    }

    #[test]
    fn test_error_kind_mapping() {
        use embedded_hal::i2c::Error as _;
        assert_eq!(Error::Bus.kind(), ErrorKind::Bus);
        assert_eq!(Error::Io.kind(), ErrorKind::Other);
    }

    #[test]
    fn test_poll_config_builder() {
        let config = PollConfigBuilder::new()
            .interval(
                MicrosDurationU32::micros(900),
                MicrosDurationU32::micros(100),
            )
            .max_polls(Some(0))
            .build();
        assert_eq!(config.min_interval, MicrosDurationU32::micros(100));
        assert_eq!(config.max_interval, MicrosDurationU32::micros(900));
        assert_eq!(config.max_polls, Some(1));

        let default = PollConfig::default();
        assert_eq!(default.min_interval.ticks(), 250);
        assert_eq!(default.max_interval.ticks(), 500);
        assert_eq!(default.max_polls, Some(2000));
    }
}

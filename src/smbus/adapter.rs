// Licensed under the Apache-2.0 license

//! # Host-facing wrapper for the PCU SMBus segments
//!
//! [`PcuSmbus`] owns the device's config space accessor and exposes its
//! three SMBus segments as claimable handles.
//!
//! ## One transaction per bus
//!
//! The register triplet of a bus has no sequencing protection, so two
//! transactions on the same bus must never overlap. Instead of relying on
//! call-site discipline, [`PcuSmbus::claim`] hands out at most one
//! [`SmbusBus`] per bus; every transaction on a handle takes `&mut self`.
//! The claim is released when the handle is dropped. Handles for
//! different buses are independent and may be moved to different threads
//! when the config space accessor is `Sync`.
//!
//! ## Suspend
//!
//! Register behavior while the device is in a low-power state is
//! undefined, so after [`PcuSmbus::suspend`] every transaction fails with
//! [`Error::Suspended`] before touching a register, until
//! [`PcuSmbus::resume`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! let smbus = PcuSmbus::new(config_space, PollConfig::default());
//! let mut bus0 = smbus.claim(BusId::BUS0, delay)?;
//! let temp = bus0.read_word_data(0x18, 0x05)?;
//! bus0.write_byte_data(0x30, 0x01, 0x80)?;
//! ```

use crate::common::{Logger, NoOpLogger};
use crate::smbus::common::{
    BusId, Direction, Error, PollConfig, Protocol, SmbusData, Transaction, FUNC_SMBUS_BYTE,
    FUNC_SMBUS_BYTE_DATA, FUNC_SMBUS_QUICK, FUNC_SMBUS_WORD_DATA, FUNC_SMBUS_WRITE_BLOCK_DATA,
    NR_BUSES,
};
use crate::smbus::engine::SmbusEngine;
use crate::smbus::registers::PcuRegisters;
use crate::smbus::traits::ConfigSpace;
use core::fmt::Write as _;
use core::sync::atomic::{AtomicBool, Ordering};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Operation, SevenBitAddress};

/// Functionality mask reported for every bus.
pub const PCU_SMBUS_FUNCTIONALITY: u32 = FUNC_SMBUS_QUICK
    | FUNC_SMBUS_BYTE
    | FUNC_SMBUS_BYTE_DATA
    | FUNC_SMBUS_WORD_DATA
    | FUNC_SMBUS_WRITE_BLOCK_DATA;

/// Adapter name as registered with the host I2C core.
pub type AdapterName = heapless::String<32>;

pub struct PcuSmbus<C: ConfigSpace> {
    registers: PcuRegisters<C>,
    config: PollConfig,
    claimed: [AtomicBool; NR_BUSES],
    suspended: AtomicBool,
}

impl<C: ConfigSpace> PcuSmbus<C> {
    pub fn new(config_space: C, config: PollConfig) -> Self {
        Self {
            registers: PcuRegisters::new(config_space),
            config,
            claimed: [const { AtomicBool::new(false) }; NR_BUSES],
            suspended: AtomicBool::new(false),
        }
    }

    pub fn registers(&self) -> &PcuRegisters<C> {
        &self.registers
    }

    pub fn poll_config(&self) -> &PollConfig {
        &self.config
    }

    /// Take exclusive use of `bus`.
    ///
    /// # Errors
    ///
    /// `Busy` if a handle for `bus` is still alive.
    pub fn claim<D: DelayNs>(&self, bus: BusId, delay: D) -> Result<SmbusBus<'_, C, D>, Error> {
        self.claim_with_logger(bus, delay, NoOpLogger)
    }

    /// Like [`claim`](Self::claim), logging every transaction through
    /// `logger`.
    ///
    /// # Errors
    ///
    /// `Busy` if a handle for `bus` is still alive.
    pub fn claim_with_logger<D: DelayNs, L: Logger>(
        &self,
        bus: BusId,
        delay: D,
        logger: L,
    ) -> Result<SmbusBus<'_, C, D, L>, Error> {
        let flag = self.claimed.get(bus.index()).ok_or(Error::InvalidArgument)?;
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| Error::Busy)?;
        Ok(SmbusBus {
            host: self,
            engine: SmbusEngine::with_logger(&self.registers, bus, delay, &self.config, logger),
        })
    }

    #[must_use]
    pub fn is_claimed(&self, bus: BusId) -> bool {
        self.claimed
            .get(bus.index())
            .is_some_and(|flag| flag.load(Ordering::Acquire))
    }

    /// Stop accepting transactions.
    pub fn suspend(&self) {
        self.suspended.store(true, Ordering::Release);
    }

    pub fn resume(&self) {
        self.suspended.store(false, Ordering::Release);
    }

    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Acquire)
    }

    #[must_use]
    pub const fn functionality() -> u32 {
        PCU_SMBUS_FUNCTIONALITY
    }

    #[must_use]
    pub const fn supports(protocol: Protocol, direction: Direction) -> bool {
        let bits = protocol.functionality(direction);
        bits != 0 && PCU_SMBUS_FUNCTIONALITY & bits == bits
    }

    pub fn into_inner(self) -> C {
        self.registers.into_inner()
    }

    fn release(&self, bus: BusId) {
        if let Some(flag) = self.claimed.get(bus.index()) {
            flag.store(false, Ordering::Release);
        }
    }
}

/// Exclusive handle to one SMBus segment.
pub struct SmbusBus<'a, C: ConfigSpace, D: DelayNs, L: Logger = NoOpLogger> {
    host: &'a PcuSmbus<C>,
    engine: SmbusEngine<'a, PcuRegisters<C>, D, L>,
}

impl<C: ConfigSpace, D: DelayNs, L: Logger> Drop for SmbusBus<'_, C, D, L> {
    fn drop(&mut self) {
        self.host.release(self.engine.bus);
    }
}

impl<C: ConfigSpace, D: DelayNs, L: Logger> SmbusBus<'_, C, D, L> {
    #[must_use]
    pub fn bus(&self) -> BusId {
        self.engine.bus
    }

    #[must_use]
    pub fn name(&self) -> AdapterName {
        let mut name = AdapterName::new();
        // The bus index is a single digit, so this always fits.
        let _ = write!(name, "Skylake-X PCU adapter {}", self.engine.bus);
        name
    }

    /// Run a raw transaction.
    ///
    /// # Errors
    ///
    /// `Suspended` while the device is suspended, otherwise whatever the
    /// engine reports.
    pub fn transfer(&mut self, txn: &mut Transaction) -> Result<(), Error> {
        if self.host.is_suspended() {
            return Err(Error::Suspended);
        }
        self.engine.transfer(txn)
    }

    fn smbus_read(
        &mut self,
        address: SevenBitAddress,
        command: u8,
        protocol: Protocol,
    ) -> Result<SmbusData, Error> {
        let mut txn = Transaction::read(address, command, protocol);
        self.transfer(&mut txn)?;
        Ok(txn.data)
    }

    fn smbus_write(
        &mut self,
        address: SevenBitAddress,
        command: u8,
        protocol: Protocol,
        data: SmbusData,
    ) -> Result<(), Error> {
        self.transfer(&mut Transaction::write(address, command, protocol, data))
    }

    /// # Errors
    ///
    /// See [`transfer`](Self::transfer).
    pub fn write_quick(&mut self, address: SevenBitAddress) -> Result<(), Error> {
        self.smbus_write(address, 0, Protocol::Quick, SmbusData::None)
    }

    /// # Errors
    ///
    /// See [`transfer`](Self::transfer).
    pub fn read_quick(&mut self, address: SevenBitAddress) -> Result<(), Error> {
        self.smbus_read(address, 0, Protocol::Quick).map(|_| ())
    }

    /// Receive byte.
    ///
    /// # Errors
    ///
    /// See [`transfer`](Self::transfer).
    pub fn read_byte(&mut self, address: SevenBitAddress) -> Result<u8, Error> {
        self.smbus_read(address, 0, Protocol::Byte)?
            .as_byte()
            .ok_or(Error::Io)
    }

    /// Send byte; `value` goes out in the command code slot.
    ///
    /// # Errors
    ///
    /// See [`transfer`](Self::transfer).
    pub fn write_byte(&mut self, address: SevenBitAddress, value: u8) -> Result<(), Error> {
        self.smbus_write(address, value, Protocol::Byte, SmbusData::None)
    }

    /// # Errors
    ///
    /// See [`transfer`](Self::transfer).
    pub fn read_byte_data(&mut self, address: SevenBitAddress, command: u8) -> Result<u8, Error> {
        self.smbus_read(address, command, Protocol::ByteData)?
            .as_byte()
            .ok_or(Error::Io)
    }

    /// # Errors
    ///
    /// See [`transfer`](Self::transfer).
    pub fn write_byte_data(
        &mut self,
        address: SevenBitAddress,
        command: u8,
        value: u8,
    ) -> Result<(), Error> {
        self.smbus_write(address, command, Protocol::ByteData, SmbusData::Byte(value))
    }

    /// # Errors
    ///
    /// See [`transfer`](Self::transfer).
    pub fn read_word_data(&mut self, address: SevenBitAddress, command: u8) -> Result<u16, Error> {
        self.smbus_read(address, command, Protocol::WordData)?
            .as_word()
            .ok_or(Error::Io)
    }

    /// # Errors
    ///
    /// See [`transfer`](Self::transfer).
    pub fn write_word_data(
        &mut self,
        address: SevenBitAddress,
        command: u8,
        value: u16,
    ) -> Result<(), Error> {
        self.smbus_write(address, command, Protocol::WordData, SmbusData::Word(value))
    }

    /// # Errors
    ///
    /// `InvalidArgument` unless `1 <= bytes.len() <= 32`; otherwise see
    /// [`transfer`](Self::transfer).
    pub fn write_block_data(
        &mut self,
        address: SevenBitAddress,
        command: u8,
        bytes: &[u8],
    ) -> Result<(), Error> {
        let data = SmbusData::block(bytes)?;
        self.smbus_write(address, command, Protocol::BlockData, data)
    }
}

impl<C: ConfigSpace, D: DelayNs, L: Logger> embedded_hal::i2c::ErrorType for SmbusBus<'_, C, D, L> {
    type Error = Error;
}

/// Plain I2C transfers are mapped onto the SMBus shapes the controller can
/// run; SMBus puts the low byte of a word first on the wire.
///
/// | Operations                     | SMBus shape     |
/// |--------------------------------|-----------------|
/// | `write([])`                    | Quick write     |
/// | `write([v])`                   | Send byte       |
/// | `write([cmd, v])`              | Write byte data |
/// | `write([cmd, lo, hi])`         | Write word data |
/// | `read([_])`                    | Receive byte    |
/// | `write([cmd])`, `read([_])`    | Read byte data  |
/// | `write([cmd])`, `read([_, _])` | Read word data  |
///
/// Anything else is `Unsupported`.
impl<C: ConfigSpace, D: DelayNs, L: Logger> embedded_hal::i2c::I2c for SmbusBus<'_, C, D, L> {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        match operations {
            [Operation::Write(bytes)] => self.i2c_write(address, bytes),
            [Operation::Read(buffer)] => self.i2c_read(address, None, buffer),
            [Operation::Write(bytes), Operation::Read(buffer)] => match **bytes {
                [command] => self.i2c_read(address, Some(command), buffer),
                _ => Err(Error::Unsupported),
            },
            _ => Err(Error::Unsupported),
        }
    }
}

impl<C: ConfigSpace, D: DelayNs, L: Logger> SmbusBus<'_, C, D, L> {
    fn i2c_write(&mut self, address: SevenBitAddress, bytes: &[u8]) -> Result<(), Error> {
        match *bytes {
            [] => self.write_quick(address),
            [value] => self.write_byte(address, value),
            [command, value] => self.write_byte_data(address, command, value),
            [command, lo, hi] => {
                self.write_word_data(address, command, u16::from_le_bytes([lo, hi]))
            }
            _ => Err(Error::Unsupported),
        }
    }

    fn i2c_read(
        &mut self,
        address: SevenBitAddress,
        command: Option<u8>,
        buffer: &mut [u8],
    ) -> Result<(), Error> {
        match (command, buffer) {
            (None, [byte]) => *byte = self.read_byte(address)?,
            (Some(command), [byte]) => *byte = self.read_byte_data(address, command)?,
            (Some(command), [lo, hi]) => {
                [*lo, *hi] = self.read_word_data(address, command)?.to_le_bytes();
            }
            _ => return Err(Error::Unsupported),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smbus::registers::{SMB_BUSY, SMB_RDO, SMB_WOD};
    use crate::smbus::testing::{MockConfigSpace, RecordingDelay};
    use embedded_hal::i2c::I2c;

    fn host() -> PcuSmbus<MockConfigSpace> {
        PcuSmbus::new(MockConfigSpace::new(), PollConfig::default())
    }

    #[test]
    fn test_single_claim_per_bus() {
        let smbus = host();
        let bus0 = smbus.claim(BusId::BUS0, RecordingDelay::default()).unwrap();
        assert!(smbus.is_claimed(BusId::BUS0));
        assert_eq!(
            smbus.claim(BusId::BUS0, RecordingDelay::default()).err(),
            Some(Error::Busy)
        );
        // Other buses are independent.
        let bus1 = smbus.claim(BusId::BUS1, RecordingDelay::default()).unwrap();
        assert_eq!(bus1.bus(), BusId::BUS1);

        drop(bus0);
        assert!(!smbus.is_claimed(BusId::BUS0));
        assert!(smbus.claim(BusId::BUS0, RecordingDelay::default()).is_ok());
    }

    #[test]
    fn test_suspended_blocks_transactions() {
        let smbus = host();
        smbus.registers().config_space().set_idle_status(SMB_WOD);
        let mut bus = smbus.claim(BusId::BUS2, RecordingDelay::default()).unwrap();

        smbus.suspend();
        assert!(smbus.is_suspended());
        assert_eq!(bus.write_byte_data(0x30, 0x01, 0x02), Err(Error::Suspended));
        assert!(smbus.registers().config_space().accesses().is_empty());

        smbus.resume();
        assert_eq!(bus.write_byte_data(0x30, 0x01, 0x02), Ok(()));
    }

    #[test]
    fn test_adapter_name() {
        let smbus = host();
        let bus = smbus.claim(BusId::BUS2, RecordingDelay::default()).unwrap();
        assert_eq!(bus.name().as_str(), "Skylake-X PCU adapter 2");
    }

    #[test]
    fn test_functionality() {
        assert!(PcuSmbus::<MockConfigSpace>::supports(Protocol::WordData, Direction::Read));
        assert!(PcuSmbus::<MockConfigSpace>::supports(Protocol::BlockData, Direction::Write));
        assert!(!PcuSmbus::<MockConfigSpace>::supports(Protocol::BlockData, Direction::Read));
        assert!(!PcuSmbus::<MockConfigSpace>::supports(Protocol::ProcCall, Direction::Write));
        assert_eq!(
            PcuSmbus::<MockConfigSpace>::functionality() & FUNC_SMBUS_QUICK,
            FUNC_SMBUS_QUICK
        );
    }

    #[test]
    fn test_typed_helpers() {
        let smbus = host();
        let cfg = smbus.registers().config_space();
        cfg.set_idle_status(SMB_RDO);
        cfg.set_data(0x0000_CDAB);
        let mut bus = smbus.claim(BusId::BUS0, RecordingDelay::default()).unwrap();

        assert_eq!(bus.read_byte_data(0x20, 0x00), Ok(0xAB));
        assert_eq!(bus.read_word_data(0x20, 0x00), Ok(0xABCD));
        assert_eq!(bus.read_byte(0x20), Ok(0xAB));
        assert_eq!(bus.read_quick(0x20), Ok(()));
        // Writes need WRITE_OK.
        assert_eq!(bus.write_word_data(0x20, 0x00, 1), Err(Error::Io));

        cfg.set_idle_status(SMB_WOD);
        assert_eq!(bus.write_quick(0x20), Ok(()));
        assert_eq!(bus.write_byte(0x20, 0x7E), Ok(()));
        assert_eq!(bus.write_block_data(0x20, 0x00, &[1, 2]), Ok(()));
        assert_eq!(bus.write_block_data(0x20, 0x00, &[]), Err(Error::InvalidArgument));
        assert_eq!(
            bus.write_block_data(0x20, 0x00, &[0; 33]),
            Err(Error::InvalidArgument)
        );
        assert_eq!(bus.write_byte_data(0x51, 0x00, 0), Err(Error::Unsupported));
    }

    #[test]
    fn test_send_byte_uses_command_slot() {
        let smbus = host();
        smbus.registers().config_space().set_idle_status(SMB_WOD);
        let mut bus = smbus.claim(BusId::BUS0, RecordingDelay::default()).unwrap();

        bus.write_byte(0x20, 0x7E).unwrap();
        let writes = smbus.registers().config_space().writes();
        assert_eq!(writes[0], (0xB4, 0));
        assert_eq!(writes[1].1 & 0xFF, 0x7E);
    }

    #[test]
    fn test_i2c_mapping() {
        let smbus = host();
        let cfg = smbus.registers().config_space();
        cfg.set_idle_status(SMB_RDO | SMB_WOD);
        cfg.set_data(0x0000_3412);
        let mut bus = smbus.claim(BusId::BUS1, RecordingDelay::default()).unwrap();

        let mut word = [0u8; 2];
        bus.write_read(0x48, &[0x05], &mut word).unwrap();
        assert_eq!(u16::from_le_bytes(word), 0x1234);

        let mut byte = [0u8; 1];
        bus.write_read(0x48, &[0x05], &mut byte).unwrap();
        assert_eq!(byte, [0x12]);

        bus.write(0x48, &[0x01, 0x34, 0x12]).unwrap();
        let staged = cfg.writes().iter().rev().nth(1).copied();
        assert_eq!(staged, Some((0xB8, 0x3412_0000)));

        assert_eq!(bus.write(0x48, &[0; 4]), Err(Error::Unsupported));
        assert_eq!(bus.read(0x48, &mut [0u8; 3]), Err(Error::Unsupported));
    }

    #[test]
    fn test_busy_then_complete_through_handle() {
        let smbus = host();
        let cfg = smbus.registers().config_space();
        cfg.push_busy(3, SMB_BUSY);
        cfg.set_idle_status(SMB_WOD);
        let mut bus = smbus.claim(BusId::BUS0, RecordingDelay::default()).unwrap();

        bus.write_word_data(0x2C, 0x10, 0xBEEF).unwrap();
        assert_eq!(cfg.status_reads(), 4);
    }
}

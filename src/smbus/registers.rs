// Licensed under the Apache-2.0 license

//! PCU SMBus register map.
//!
//! Each bus owns three consecutive-stride dwords in config space:
//!
//! | Register | Offset         | Contents                                    |
//! |----------|----------------|---------------------------------------------|
//! | COMMAND  | `0x9C + 4*b`   | CKOVRD, TRIGGER, WORD_ACCESS, WRT, SA, CMD   |
//! | STATUS   | `0xA8 + 4*b`   | WOD, RDO, SBE, BUSY                         |
//! | DATA     | `0xB4 + 4*b`   | write data in `[31:16]`, read data `[15:0]` |

use crate::smbus::common::{BusId, Direction, Protocol};
use crate::smbus::traits::{ConfigSpace, RegisterAccess};
use embedded_hal::i2c::SevenBitAddress;

pub const PCI_VENDOR_ID_INTEL: u16 = 0x8086;
pub const PCI_DEVICE_ID_INTEL_SKLX_PCU: u16 = 0x2085;

pub const SMB_CMD_CFG: u16 = 0x9C;
pub const SMB_STATUS_CFG: u16 = 0xA8;
pub const SMB_DATA_CFG: u16 = 0xB4;
pub const SMB_BUS_STRIDE: u16 = 4;

// COMMAND
pub const SMB_CKOVRD: u32 = 1 << 29;
pub const SMB_CMD_TRIGGER: u32 = 1 << 19;
pub const SMB_WORD_ACCESS: u32 = 1 << 17;
pub const SMB_WRT: u32 = 1 << 15;
pub const SMB_SA_SHIFT: u32 = 8;
pub const SMB_SA_MASK: u32 = 0x7F00;
pub const SMB_CMD_MASK: u32 = 0x00FF;

// STATUS
pub const SMB_WOD: u32 = 1 << 3;
pub const SMB_RDO: u32 = 1 << 2;
pub const SMB_SBE: u32 = 1 << 1;
pub const SMB_BUSY: u32 = 1 << 0;

// DATA
pub const SMB_WDATA_SHIFT: u32 = 16;
pub const SMB_RDATA_MASK_BYTE: u32 = 0x00FF;
pub const SMB_RDATA_MASK_WORD: u32 = 0xFFFF;

/// Logical register of a bus.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Register {
    Command,
    Status,
    Data,
}

impl Register {
    /// Config-space offset of this register for `bus`.
    #[must_use]
    pub const fn offset(self, bus: BusId) -> u16 {
        let base = match self {
            Register::Command => SMB_CMD_CFG,
            Register::Status => SMB_STATUS_CFG,
            Register::Data => SMB_DATA_CFG,
        };
        base + SMB_BUS_STRIDE * bus.index() as u16
    }
}

/// Bit-packed COMMAND register value.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandWord(u32);

impl CommandWord {
    /// Command that triggers a transaction. Clock override and trigger are
    /// always set; word access only for word transfers.
    #[must_use]
    pub const fn new(
        address: SevenBitAddress,
        command: u8,
        direction: Direction,
        protocol: Protocol,
    ) -> Self {
        let mut bits = SMB_CKOVRD | SMB_CMD_TRIGGER;
        if matches!(direction, Direction::Write) {
            bits |= SMB_WRT;
        }
        if matches!(protocol, Protocol::WordData) {
            bits |= SMB_WORD_ACCESS;
        }
        bits |= ((address as u32) << SMB_SA_SHIFT) & SMB_SA_MASK;
        bits |= command as u32 & SMB_CMD_MASK;
        Self(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }
}

/// STATUS register sample.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusWord(u32);

impl StatusWord {
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn is_busy(self) -> bool {
        self.0 & SMB_BUSY != 0
    }

    #[must_use]
    pub const fn bus_error(self) -> bool {
        self.0 & SMB_SBE != 0
    }

    #[must_use]
    pub const fn write_ok(self) -> bool {
        self.0 & SMB_WOD != 0
    }

    #[must_use]
    pub const fn read_ok(self) -> bool {
        self.0 & SMB_RDO != 0
    }
}

/// [`RegisterAccess`] over a device's config space using the PCU map.
pub struct PcuRegisters<C> {
    config: C,
}

impl<C: ConfigSpace> PcuRegisters<C> {
    pub fn new(config: C) -> Self {
        Self { config }
    }

    pub fn config_space(&self) -> &C {
        &self.config
    }

    pub fn into_inner(self) -> C {
        self.config
    }
}

impl<C: ConfigSpace> RegisterAccess for PcuRegisters<C> {
    type Error = C::Error;

    fn read(&self, bus: BusId, reg: Register) -> Result<u32, Self::Error> {
        self.config.read_config_dword(reg.offset(bus))
    }

    fn write(&self, bus: BusId, reg: Register, value: u32) -> Result<(), Self::Error> {
        self.config.write_config_dword(reg.offset(bus), value)
    }
}

// Licensed under the Apache-2.0 license

//! # Register access traits
//!
//! The SMBus engine never touches hardware directly. The host provides
//! register access through one of two traits:
//!
//! ```text
//! ConfigSpace (flat 32-bit config dwords, e.g. PCI config space)
//!     └── PcuRegisters<C> (register map)
//!             └── RegisterAccess (per-bus COMMAND/STATUS/DATA)
//! ```
//!
//! Both traits take `&self`: a single device is shared by every bus, and
//! transactions on different buses may run concurrently when the
//! implementation is `Sync`. Serializing transactions on one bus is the
//! job of [`crate::smbus::adapter::PcuSmbus`].

use crate::smbus::common::BusId;
use crate::smbus::registers::Register;

/// Per-bus access to the COMMAND/STATUS/DATA register triplet.
///
/// Implementations are pure transport: no retries and no protocol
/// knowledge. Any error aborts the running transaction.
pub trait RegisterAccess {
    type Error: core::fmt::Debug;

    /// Read a 32-bit register of the given bus.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying transport faults.
    fn read(&self, bus: BusId, reg: Register) -> Result<u32, Self::Error>;

    /// Write a 32-bit register of the given bus.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying transport faults.
    fn write(&self, bus: BusId, reg: Register, value: u32) -> Result<(), Self::Error>;
}

impl<T: RegisterAccess + ?Sized> RegisterAccess for &T {
    type Error = T::Error;

    fn read(&self, bus: BusId, reg: Register) -> Result<u32, Self::Error> {
        T::read(self, bus, reg)
    }

    fn write(&self, bus: BusId, reg: Register, value: u32) -> Result<(), Self::Error> {
        T::write(self, bus, reg, value)
    }
}

/// Flat dword accessor to the device's configuration space.
///
/// This is what a PCI host binding supplies; offsets are byte offsets
/// into the function's config space.
pub trait ConfigSpace {
    type Error: core::fmt::Debug;

    /// # Errors
    ///
    /// Returns an error if the config cycle fails.
    fn read_config_dword(&self, offset: u16) -> Result<u32, Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the config cycle fails.
    fn write_config_dword(&self, offset: u16, value: u32) -> Result<(), Self::Error>;
}

// Licensed under the Apache-2.0 license

//! SMBus master driver for the PCU function of Skylake-X class processors.
//!
//! The PCU exposes three SMBus segments. Each segment is driven through a
//! COMMAND/STATUS/DATA register triplet in PCI config space; there is no
//! interrupt, so every transaction is issued and then polled to
//! completion.
//!
//! Layering, bottom-up:
//!
//! * [`traits`]: config space and register access seams.
//! * [`registers`]: register map and bit-level views.
//! * [`encoder`], [`poller`], [`block`], [`decoder`]: the transaction steps.
//! * [`transfer`]: the per-transaction state machine.
//! * [`engine`]: blocking driver with backoff and poll cap.
//! * [`adapter`]: host-facing wrapper with per-bus claims and suspend.

pub mod adapter;
pub mod block;
pub mod common;
pub mod decoder;
pub mod encoder;
pub mod engine;
pub mod poller;
pub mod registers;
pub mod traits;
pub mod transfer;

#[cfg(test)]
mod testing;

pub use adapter::{AdapterName, PcuSmbus, SmbusBus, PCU_SMBUS_FUNCTIONALITY};
pub use common::{
    BusId, Direction, Error, PollConfig, PollConfigBuilder, Protocol, SmbusData, Transaction,
};
pub use engine::SmbusEngine;
pub use registers::PcuRegisters;
pub use traits::{ConfigSpace, RegisterAccess};
pub use transfer::{Progress, Transfer, TransferState};

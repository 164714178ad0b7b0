// Licensed under the Apache-2.0 license

//! Transaction encoder.
//!
//! Turns a [`Transaction`] into the command word and the optional value
//! pre-loaded into DATA, then issues them: at most one DATA write followed
//! by exactly one COMMAND write. All validation happens before the first
//! register write.

use crate::smbus::common::{
    BusId, Direction, Error, Protocol, SmbusData, Transaction, ADDRESS_MAX, BLOCK_MAX,
    PROTECTED_ADDRESSES,
};
use crate::smbus::registers::{CommandWord, Register, SMB_WDATA_SHIFT};
use crate::smbus::traits::RegisterAccess;

/// Value staged in DATA before the command is triggered.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Preload {
    None,
    Byte(u8),
    Word(u16),
    /// Declared length of a block write; the payload follows byte by byte.
    BlockLength(u8),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Encoded {
    pub command: CommandWord,
    pub preload: Preload,
}

/// Validate `txn` and compute what has to be written.
///
/// # Errors
///
/// * `InvalidArgument` for an address above 0x7F, a write payload that does
///   not match the protocol, or a block length outside `1..=32`.
/// * `Unsupported` for writes to `0x50..=0x57` and for protocols the
///   controller does not implement.
pub fn encode(txn: &Transaction) -> Result<Encoded, Error> {
    if txn.address > ADDRESS_MAX {
        return Err(Error::InvalidArgument);
    }
    let preload = match txn.direction {
        Direction::Write => write_preload(txn)?,
        Direction::Read => read_preload(txn.protocol)?,
    };
    Ok(Encoded {
        command: CommandWord::new(txn.address, txn.command, txn.direction, txn.protocol),
        preload,
    })
}

fn write_preload(txn: &Transaction) -> Result<Preload, Error> {
    if PROTECTED_ADDRESSES.contains(&txn.address) {
        return Err(Error::Unsupported);
    }
    match txn.protocol {
        Protocol::Quick => Ok(Preload::None),
        // The value travels in the command code field.
        Protocol::Byte => match txn.data {
            SmbusData::None => Ok(Preload::Byte(0)),
            _ => Err(Error::InvalidArgument),
        },
        Protocol::ByteData => txn
            .data
            .as_byte()
            .map(Preload::Byte)
            .ok_or(Error::InvalidArgument),
        Protocol::WordData => txn
            .data
            .as_word()
            .map(Preload::Word)
            .ok_or(Error::InvalidArgument),
        Protocol::BlockData => {
            let block = txn.data.as_block().ok_or(Error::InvalidArgument)?;
            if block.is_empty() || block.len() > BLOCK_MAX {
                return Err(Error::InvalidArgument);
            }
            u8::try_from(block.len())
                .map(Preload::BlockLength)
                .map_err(|_| Error::InvalidArgument)
        }
        Protocol::ProcCall | Protocol::BlockProcCall | Protocol::I2cBlockData => {
            Err(Error::Unsupported)
        }
    }
}

fn read_preload(protocol: Protocol) -> Result<Preload, Error> {
    match protocol {
        Protocol::Quick | Protocol::Byte | Protocol::ByteData | Protocol::WordData => {
            Ok(Preload::None)
        }
        _ => Err(Error::Unsupported),
    }
}

/// DATA value carrying an outgoing word. The register expects the bytes in
/// the opposite order from the caller-facing value.
#[must_use]
pub const fn stage_word(word: u16) -> u32 {
    (word.swap_bytes() as u32) << SMB_WDATA_SHIFT
}

/// DATA value carrying an outgoing byte.
#[must_use]
pub const fn stage_byte(byte: u8) -> u32 {
    (byte as u32) << SMB_WDATA_SHIFT
}

/// Write one outgoing byte into DATA.
///
/// Shared by byte writes, the block length and every block payload byte.
///
/// # Errors
///
/// `Io` if the register write fails.
pub fn stage_payload_byte<R: RegisterAccess>(regs: &R, bus: BusId, byte: u8) -> Result<(), Error> {
    regs.write(bus, Register::Data, stage_byte(byte))
        .map_err(|_| Error::Io)
}

/// Write the pre-load (if any) and then the command word.
///
/// # Errors
///
/// `Io` if either register write fails. A failing DATA write means the
/// command is never triggered.
pub fn issue<R: RegisterAccess>(regs: &R, bus: BusId, encoded: &Encoded) -> Result<(), Error> {
    match encoded.preload {
        Preload::None => {}
        Preload::Byte(byte) | Preload::BlockLength(byte) => stage_payload_byte(regs, bus, byte)?,
        Preload::Word(word) => regs
            .write(bus, Register::Data, stage_word(word))
            .map_err(|_| Error::Io)?,
    }
    regs.write(bus, Register::Command, encoded.command.bits())
        .map_err(|_| Error::Io)
}

// Licensed under the Apache-2.0 license

//! Result decoder.
//!
//! Runs once the last poll reported a clean completion. Writes are
//! confirmed by WRITE_OK, reads by READ_OK after DATA has been fetched.
//! Quick commands carry no payload and are done once the poll is clean.

use crate::smbus::common::{BusId, Direction, Error, Protocol, SmbusData, Transaction};
use crate::smbus::registers::{Register, StatusWord, SMB_RDATA_MASK_BYTE, SMB_RDATA_MASK_WORD};
use crate::smbus::traits::RegisterAccess;

/// Incoming byte from a raw DATA value.
#[must_use]
pub const fn decode_byte(raw: u32) -> u8 {
    (raw & SMB_RDATA_MASK_BYTE) as u8
}

/// Incoming word from a raw DATA value. The register holds the bytes in
/// the opposite order from the caller-facing value.
#[must_use]
pub const fn decode_word(raw: u32) -> u16 {
    ((raw & SMB_RDATA_MASK_WORD) as u16).swap_bytes()
}

/// Complete `txn` from the final status sample, filling `txn.data` for
/// reads.
///
/// # Errors
///
/// * `Io` if WRITE_OK/READ_OK is missing or the DATA read fails.
/// * `Unsupported` for a read shape without a decoder.
pub fn finish<R: RegisterAccess>(
    regs: &R,
    bus: BusId,
    txn: &mut Transaction,
    status: StatusWord,
) -> Result<(), Error> {
    if txn.protocol == Protocol::Quick {
        return Ok(());
    }
    match txn.direction {
        Direction::Write => {
            if status.write_ok() {
                Ok(())
            } else {
                Err(Error::Io)
            }
        }
        Direction::Read => {
            let raw = regs.read(bus, Register::Data).map_err(|_| Error::Io)?;
            txn.data = match txn.protocol {
                Protocol::Byte | Protocol::ByteData => SmbusData::Byte(decode_byte(raw)),
                Protocol::WordData => SmbusData::Word(decode_word(raw)),
                _ => return Err(Error::Unsupported),
            };
            if status.read_ok() {
                Ok(())
            } else {
                Err(Error::Io)
            }
        }
    }
}

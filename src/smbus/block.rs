// Licensed under the Apache-2.0 license

//! Block transfer driver.
//!
//! A block write triggers with the declared length staged in DATA. After
//! every clean completion the next payload byte is staged and the
//! controller is polled again, until the whole payload has gone out.

use crate::smbus::common::{BusId, Direction, Error, Protocol, Transaction};
use crate::smbus::encoder::stage_payload_byte;
use crate::smbus::traits::RegisterAccess;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlockWriter {
    len: usize,
    sent: usize,
}

impl BlockWriter {
    /// Driver for `txn` if it is a block write.
    #[must_use]
    pub fn for_transaction(txn: &Transaction) -> Option<Self> {
        match (txn.direction, txn.protocol) {
            (Direction::Write, Protocol::BlockData) => txn.data.as_block().map(|block| Self {
                len: block.len(),
                sent: 0,
            }),
            _ => None,
        }
    }

    /// Stage the next payload byte, if any remain.
    ///
    /// Returns `true` when a byte was written and another poll is needed.
    ///
    /// # Errors
    ///
    /// `Io` if the DATA write fails; `InvalidArgument` if `payload` is
    /// shorter than the declared length.
    pub fn stage_next<R: RegisterAccess>(
        &mut self,
        regs: &R,
        bus: BusId,
        payload: &[u8],
    ) -> Result<bool, Error> {
        if self.is_done() {
            return Ok(false);
        }
        let byte = payload
            .get(self.sent)
            .copied()
            .ok_or(Error::InvalidArgument)?;
        stage_payload_byte(regs, bus, byte)?;
        self.sent += 1;
        Ok(true)
    }

    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.sent >= self.len
    }

    #[must_use]
    pub const fn sent(&self) -> usize {
        self.sent
    }

    #[must_use]
    pub const fn declared_len(&self) -> usize {
        self.len
    }
}

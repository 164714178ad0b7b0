// Licensed under the Apache-2.0 license

//! Per-transaction state machine.
//!
//! ```text
//! Idle -> CommandIssued -> Polling -> Completed
//!                           |  ^          |
//!                           |  +----------+  NextByteStaged (block writes)
//!                           v
//!                         Failed(Bus | Io | ...)
//! ```
//!
//! Every call to [`Transfer::step`] performs at most one status read plus
//! the register writes that follow from it, so a host can interleave
//! transfers on different buses or run them from a main loop through the
//! `nb` interface of [`Transfer::poll`].

use crate::smbus::block::BlockWriter;
use crate::smbus::common::{BusId, Error, Transaction};
use crate::smbus::traits::RegisterAccess;
use crate::smbus::{decoder, encoder, poller};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransferState {
    Idle,
    CommandIssued,
    Polling,
    NextByteStaged,
    Completed,
    Failed(Error),
}

/// What a single step did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Progress {
    /// The command has been written; the controller is running.
    CommandIssued,
    /// Status read back BUSY.
    Busy,
    /// A block payload byte was staged after a clean completion.
    NextByteStaged,
    /// The transaction finished; for reads `txn.data` holds the result.
    Completed,
}

pub struct Transfer<'t> {
    bus: BusId,
    txn: &'t mut Transaction,
    state: TransferState,
    block: Option<BlockWriter>,
}

impl<'t> Transfer<'t> {
    pub fn new(bus: BusId, txn: &'t mut Transaction) -> Self {
        Self {
            bus,
            txn,
            state: TransferState::Idle,
            block: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> TransferState {
        self.state
    }

    #[must_use]
    pub fn bus(&self) -> BusId {
        self.bus
    }

    /// Abort with `error`, e.g. when the caller's poll budget runs out.
    /// Later steps keep returning the error.
    pub fn fail(&mut self, error: Error) {
        self.state = TransferState::Failed(error);
    }

    /// Advance the transaction by one step.
    ///
    /// # Errors
    ///
    /// The first error aborts the transfer and is returned from this and
    /// every later call.
    pub fn step<R: RegisterAccess>(&mut self, regs: &R) -> Result<Progress, Error> {
        let result = self.advance(regs);
        if let Err(e) = result {
            self.state = TransferState::Failed(e);
        }
        result
    }

    /// `nb` view of [`step`](Self::step): `WouldBlock` until completed.
    ///
    /// # Errors
    ///
    /// As for [`step`](Self::step).
    pub fn poll<R: RegisterAccess>(&mut self, regs: &R) -> nb::Result<(), Error> {
        match self.step(regs)? {
            Progress::Completed => Ok(()),
            Progress::CommandIssued | Progress::Busy | Progress::NextByteStaged => {
                Err(nb::Error::WouldBlock)
            }
        }
    }

    fn advance<R: RegisterAccess>(&mut self, regs: &R) -> Result<Progress, Error> {
        match self.state {
            TransferState::Idle => {
                let encoded = encoder::encode(self.txn)?;
                encoder::issue(regs, self.bus, &encoded)?;
                self.block = BlockWriter::for_transaction(self.txn);
                self.state = TransferState::CommandIssued;
                Ok(Progress::CommandIssued)
            }
            TransferState::CommandIssued
            | TransferState::Polling
            | TransferState::NextByteStaged => {
                let status = match poller::sample_status(regs, self.bus) {
                    Ok(status) => status,
                    Err(nb::Error::WouldBlock) => {
                        self.state = TransferState::Polling;
                        return Ok(Progress::Busy);
                    }
                    Err(nb::Error::Other(e)) => return Err(e),
                };
                if let Some(block) = self.block.as_mut() {
                    let payload = self.txn.data.as_block().unwrap_or_default();
                    if block.stage_next(regs, self.bus, payload)? {
                        self.state = TransferState::NextByteStaged;
                        return Ok(Progress::NextByteStaged);
                    }
                }
                decoder::finish(regs, self.bus, self.txn, status)?;
                self.state = TransferState::Completed;
                Ok(Progress::Completed)
            }
            TransferState::Completed => Ok(Progress::Completed),
            TransferState::Failed(e) => Err(e),
        }
    }
}

// Licensed under the Apache-2.0 license

//! Blocking SMBus engine for one bus.
//!
//! This module drives a [`Transfer`] to completion: issue the command, poll
//! STATUS with randomized backoff, feed block payload bytes, decode the
//! result. It holds no state between transactions beyond the jitter
//! generator.

use crate::common::{Logger, NoOpLogger};
use crate::smbus::common::{BusId, Error, PollConfig, Transaction};
use crate::smbus::poller::{Backoff, PollBudget};
use crate::smbus::traits::RegisterAccess;
use crate::smbus::transfer::{Progress, Transfer};
use embedded_hal::delay::DelayNs;

pub struct SmbusEngine<'r, R: RegisterAccess, D: DelayNs, L: Logger = NoOpLogger> {
    pub registers: &'r R,
    pub bus: BusId,
    pub logger: L,
    backoff: Backoff<D>,
    max_polls: Option<u32>,
}

impl<'r, R: RegisterAccess, D: DelayNs> SmbusEngine<'r, R, D, NoOpLogger> {
    pub fn new(registers: &'r R, bus: BusId, delay: D, config: &PollConfig) -> Self {
        Self::with_logger(registers, bus, delay, config, NoOpLogger)
    }
}

impl<'r, R: RegisterAccess, D: DelayNs, L: Logger> SmbusEngine<'r, R, D, L> {
    pub fn with_logger(
        registers: &'r R,
        bus: BusId,
        delay: D,
        config: &PollConfig,
        logger: L,
    ) -> Self {
        Self {
            registers,
            bus,
            logger,
            backoff: Backoff::new(delay, config, bus),
            max_polls: config.max_polls,
        }
    }

    /// Run `txn` to completion. On success, reads leave their result in
    /// `txn.data`.
    ///
    /// # Errors
    ///
    /// The first error of the encoder, poller, block driver or decoder; no
    /// retries are attempted.
    pub fn transfer(&mut self, txn: &mut Transaction) -> Result<(), Error> {
        self.logger.debug(format_args!(
            "smbus{}: {:?} {:?} addr={:#04x} cmd={:#04x}",
            self.bus, txn.direction, txn.protocol, txn.address, txn.command
        ));
        let (address, command) = (txn.address, txn.command);
        let result = self.run(txn);
        if let Err(e) = result {
            self.logger.error(format_args!(
                "smbus{}: addr={address:#04x} cmd={command:#04x} failed: {e}",
                self.bus
            ));
        }
        result
    }

    fn run(&mut self, txn: &mut Transaction) -> Result<(), Error> {
        let registers = self.registers;
        let mut transfer = Transfer::new(self.bus, txn);
        let mut budget = PollBudget::new(self.max_polls);
        loop {
            match transfer.step(registers)? {
                Progress::CommandIssued | Progress::NextByteStaged => budget.reset(),
                Progress::Busy => {
                    if let Err(e) = budget.spend() {
                        transfer.fail(e);
                        return Err(e);
                    }
                    self.backoff.pause();
                }
                Progress::Completed => return Ok(()),
            }
        }
    }

    pub fn into_delay(self) -> D {
        self.backoff.into_inner()
    }
}

// Licensed under the Apache-2.0 license

//! Completion poller.
//!
//! [`sample_status`] reads STATUS once and classifies it in `nb` terms:
//! `WouldBlock` while BUSY is set, `Bus` when the finished transfer
//! flagged SBE. The blocking side pauses between samples with a
//! [`Backoff`] and bounds the number of samples with a [`PollBudget`].

use crate::smbus::common::{BusId, Error, PollConfig};
use crate::smbus::registers::{Register, StatusWord};
use crate::smbus::traits::RegisterAccess;
use embedded_hal::delay::DelayNs;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Read STATUS once.
///
/// # Errors
///
/// * `WouldBlock` while the controller is busy.
/// * `Io` if the register read fails.
/// * `Bus` if BUSY is clear and SBE is set.
pub fn sample_status<R: RegisterAccess>(regs: &R, bus: BusId) -> nb::Result<StatusWord, Error> {
    let status = regs
        .read(bus, Register::Status)
        .map(StatusWord::from_bits)
        .map_err(|_| Error::Io)?;
    if status.is_busy() {
        return Err(nb::Error::WouldBlock);
    }
    if status.bus_error() {
        return Err(nb::Error::Other(Error::Bus));
    }
    Ok(status)
}

/// Randomized pause between two status samples.
pub struct Backoff<D> {
    delay: D,
    rng: SmallRng,
    min_us: u32,
    max_us: u32,
}

impl<D: DelayNs> Backoff<D> {
    /// Each bus gets its own jitter stream derived from the configured seed.
    pub fn new(delay: D, config: &PollConfig, bus: BusId) -> Self {
        Self {
            delay,
            rng: SmallRng::seed_from_u64(config.jitter_seed ^ bus.index() as u64),
            min_us: config.min_interval.ticks(),
            max_us: config.max_interval.ticks(),
        }
    }

    /// Sleep for a random interval within the configured bounds and return
    /// it in microseconds.
    pub fn pause(&mut self) -> u32 {
        let us = if self.min_us >= self.max_us {
            self.min_us
        } else {
            self.rng.random_range(self.min_us..=self.max_us)
        };
        self.delay.delay_us(us);
        us
    }

    pub fn into_inner(self) -> D {
        self.delay
    }
}

/// Counts status samples within one wait.
#[derive(Copy, Clone, Debug)]
pub struct PollBudget {
    cap: Option<u32>,
    spent: u32,
}

impl PollBudget {
    #[must_use]
    pub const fn new(cap: Option<u32>) -> Self {
        Self { cap, spent: 0 }
    }

    /// Account for one busy sample.
    ///
    /// # Errors
    ///
    /// `Timeout` once the cap is reached.
    pub fn spend(&mut self) -> Result<(), Error> {
        self.spent = self.spent.saturating_add(1);
        match self.cap {
            Some(cap) if self.spent >= cap => Err(Error::Timeout),
            _ => Ok(()),
        }
    }

    /// Start a new wait.
    pub fn reset(&mut self) {
        self.spent = 0;
    }
}

// Licensed under the Apache-2.0 license

//! Test doubles shared by the SMBus unit tests.

use crate::smbus::common::NR_BUSES;
use crate::smbus::registers::{SMB_BUS_STRIDE, SMB_DATA_CFG, SMB_STATUS_CFG};
use crate::smbus::traits::ConfigSpace;
use core::cell::{Cell, RefCell};
use embedded_hal::delay::DelayNs;
use std::collections::VecDeque;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Access {
    Read(u16),
    Write(u16, u32),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MockFault;

fn is_status(offset: u16) -> bool {
    (SMB_STATUS_CFG..SMB_STATUS_CFG + SMB_BUS_STRIDE * NR_BUSES as u16).contains(&offset)
}

fn is_data(offset: u16) -> bool {
    (SMB_DATA_CFG..SMB_DATA_CFG + SMB_BUS_STRIDE * NR_BUSES as u16).contains(&offset)
}

/// Scripted config space.
///
/// STATUS reads pop the scripted values in order and fall back to
/// `idle_status` once the script runs out. DATA reads return `data`.
/// Every access is recorded, including the failing one.
pub struct MockConfigSpace {
    accesses: RefCell<Vec<Access>>,
    statuses: RefCell<VecDeque<u32>>,
    idle_status: Cell<u32>,
    data: Cell<u32>,
    fail_read: Cell<Option<u16>>,
    fail_write: Cell<Option<u16>>,
}

impl MockConfigSpace {
    pub fn new() -> Self {
        Self {
            accesses: RefCell::new(Vec::new()),
            statuses: RefCell::new(VecDeque::new()),
            idle_status: Cell::new(0),
            data: Cell::new(0),
            fail_read: Cell::new(None),
            fail_write: Cell::new(None),
        }
    }

    pub fn push_status(&self, status: u32) {
        self.statuses.borrow_mut().push_back(status);
    }

    pub fn push_busy(&self, count: usize, busy: u32) {
        for _ in 0..count {
            self.push_status(busy);
        }
    }

    pub fn set_idle_status(&self, status: u32) {
        self.idle_status.set(status);
    }

    pub fn set_data(&self, value: u32) {
        self.data.set(value);
    }

    pub fn fail_reads_at(&self, offset: u16) {
        self.fail_read.set(Some(offset));
    }

    pub fn fail_writes_at(&self, offset: u16) {
        self.fail_write.set(Some(offset));
    }

    pub fn accesses(&self) -> Vec<Access> {
        self.accesses.borrow().clone()
    }

    pub fn writes(&self) -> Vec<(u16, u32)> {
        self.accesses
            .borrow()
            .iter()
            .filter_map(|a| match a {
                Access::Write(offset, value) => Some((*offset, *value)),
                Access::Read(_) => None,
            })
            .collect()
    }

    pub fn status_reads(&self) -> usize {
        self.accesses
            .borrow()
            .iter()
            .filter(|a| matches!(a, Access::Read(offset) if is_status(*offset)))
            .count()
    }
}

impl ConfigSpace for MockConfigSpace {
    type Error = MockFault;

    fn read_config_dword(&self, offset: u16) -> Result<u32, Self::Error> {
        self.accesses.borrow_mut().push(Access::Read(offset));
        if self.fail_read.get() == Some(offset) {
            return Err(MockFault);
        }
        if is_status(offset) {
            let next = self.statuses.borrow_mut().pop_front();
            Ok(next.unwrap_or(self.idle_status.get()))
        } else if is_data(offset) {
            Ok(self.data.get())
        } else {
            Ok(0)
        }
    }

    fn write_config_dword(&self, offset: u16, value: u32) -> Result<(), Self::Error> {
        self.accesses.borrow_mut().push(Access::Write(offset, value));
        if self.fail_write.get() == Some(offset) {
            return Err(MockFault);
        }
        Ok(())
    }
}

/// Delay that only records the requested pauses, in microseconds.
#[derive(Default)]
pub struct RecordingDelay {
    pub pauses_us: Vec<u32>,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.pauses_us.push(ns / 1_000);
    }

    fn delay_us(&mut self, us: u32) {
        self.pauses_us.push(us);
    }
}

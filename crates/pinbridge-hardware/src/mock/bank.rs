//! Handle bookkeeping shared by the mock ports.
//!
//! Emulates the driver-side rules the bridge must respect: a peripheral can
//! only be open once, handles are never reused, and closing a stale handle
//! fails.

use std::collections::{HashMap, HashSet};

use crate::error::{HardwareError, Result};
use crate::notice::{HardwareNotice, NoticeSender};
use crate::types::HandleId;

#[derive(Debug)]
pub(crate) struct Slot<T> {
    pub name: String,
    pub state: T,
    pub listener: Option<NoticeSender>,
}

impl<T> Slot<T> {
    /// Deliver a notice through the attached listener, if any.
    pub fn notify(&self, notice: HardwareNotice) -> bool {
        match &self.listener {
            Some(listener) => {
                listener.notify(notice);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Bank<T> {
    /// Names that may be opened; `None` accepts any name.
    available: Option<Vec<String>>,
    open: HashMap<HandleId, Slot<T>>,
    next_handle: u64,
    fail_open: HashSet<String>,
    fail_close: HashSet<String>,
    opens: usize,
    closes: usize,
}

impl<T: Default> Bank<T> {
    pub fn new(available: Option<Vec<String>>) -> Self {
        Self {
            available,
            open: HashMap::new(),
            next_handle: 0,
            fail_open: HashSet::new(),
            fail_close: HashSet::new(),
            opens: 0,
            closes: 0,
        }
    }

    pub fn available(&self) -> Vec<String> {
        self.available.clone().unwrap_or_default()
    }

    pub fn open(&mut self, name: &str) -> Result<HandleId> {
        if let Some(available) = &self.available
            && !available.iter().any(|n| n == name)
        {
            return Err(HardwareError::not_found(name));
        }
        if self.fail_open.contains(name) {
            return Err(HardwareError::communication(format!("open {name} failed")));
        }
        if self.open.values().any(|slot| slot.name == name) {
            return Err(HardwareError::busy(name));
        }

        self.next_handle += 1;
        let handle = HandleId::new(self.next_handle);
        self.open.insert(
            handle,
            Slot {
                name: name.to_string(),
                state: T::default(),
                listener: None,
            },
        );
        self.opens += 1;
        Ok(handle)
    }

    /// Release the slot. An injected close failure still releases it, the
    /// way a driver that errors on close leaves the device unusable anyway.
    pub fn close(&mut self, handle: HandleId) -> Result<()> {
        let slot = self
            .open
            .remove(&handle)
            .ok_or_else(|| HardwareError::invalid_handle(handle))?;
        self.closes += 1;

        if self.fail_close.contains(&slot.name) {
            return Err(HardwareError::communication(format!(
                "close {} failed",
                slot.name
            )));
        }
        Ok(())
    }

    pub fn slot(&self, handle: HandleId) -> Result<&Slot<T>> {
        self.open
            .get(&handle)
            .ok_or_else(|| HardwareError::invalid_handle(handle))
    }

    pub fn slot_mut(&mut self, handle: HandleId) -> Result<&mut Slot<T>> {
        self.open
            .get_mut(&handle)
            .ok_or_else(|| HardwareError::invalid_handle(handle))
    }

    pub fn find(&self, name: &str) -> Option<(HandleId, &Slot<T>)> {
        self.open
            .iter()
            .find(|(_, slot)| slot.name == name)
            .map(|(handle, slot)| (*handle, slot))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<(HandleId, &mut Slot<T>)> {
        self.open
            .iter_mut()
            .find(|(_, slot)| slot.name == name)
            .map(|(handle, slot)| (*handle, slot))
    }

    pub fn fail_open(&mut self, name: &str, fail: bool) {
        if fail {
            self.fail_open.insert(name.to_string());
        } else {
            self.fail_open.remove(name);
        }
    }

    pub fn fail_close(&mut self, name: &str, fail: bool) {
        if fail {
            self.fail_close.insert(name.to_string());
        } else {
            self.fail_close.remove(name);
        }
    }

    /// Total successful opens since creation.
    pub fn opens(&self) -> usize {
        self.opens
    }

    /// Total close calls on valid handles since creation.
    pub fn closes(&self) -> usize {
        self.closes
    }

    /// Peripherals currently open.
    pub fn open_count(&self) -> usize {
        self.open.len()
    }
}

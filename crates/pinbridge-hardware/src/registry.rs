//! Ownership of open peripheral handles.
//!
//! The registry is the only place a [`HandleId`] outlives a single call. It
//! keeps one partition per [`PeripheralClass`], each indexed both ways
//! (name to handle for inbound messages, handle to entry for hardware
//! notices), so the same logical name can be open as a digital line and as a
//! pulse output at the same time but never twice within one class.
//!
//! Every mutating operation is a complete check-then-act sequence taking
//! `&mut self`; callers guard the registry with a single lock and hold it for
//! the whole operation.
//!
//! Hardware failures surface as [`Error::PeripheralIo`] and are never
//! retried here.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use pinbridge_core::{Direction, Error, PeripheralClass, PinLevel, Result};
use tracing::{debug, warn};

use crate::devices::Peripherals;
use crate::types::HandleId;

/// One open peripheral.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    pub name: String,
    pub class: PeripheralClass,
    pub handle: HandleId,
    /// Role the peripheral was opened for. Only digital lines carry one.
    pub direction: Option<Direction>,
    /// Whether a hardware listener is currently attached.
    pub listening: bool,
    /// Last level written to or observed on a digital line.
    pub level: Option<PinLevel>,
    pub opened_at: DateTime<Utc>,
}

/// Result of [`PeripheralRegistry::open_or_reuse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lease {
    pub handle: HandleId,
    /// `true` when the handle was opened by this call.
    pub fresh: bool,
}

#[derive(Debug, Default)]
struct Partition {
    by_name: HashMap<String, HandleId>,
    by_handle: HashMap<HandleId, RegistryEntry>,
}

impl Partition {
    fn get(&self, name: &str) -> Option<&RegistryEntry> {
        self.by_name
            .get(name)
            .and_then(|handle| self.by_handle.get(handle))
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut RegistryEntry> {
        let handle = self.by_name.get(name)?;
        self.by_handle.get_mut(handle)
    }

    fn insert(&mut self, entry: RegistryEntry) {
        self.by_name.insert(entry.name.clone(), entry.handle);
        self.by_handle.insert(entry.handle, entry);
    }

    fn remove(&mut self, name: &str) -> Option<RegistryEntry> {
        let handle = self.by_name.remove(name)?;
        self.by_handle.remove(&handle)
    }
}

/// Open handles keyed by `(class, name)`.
#[derive(Debug, Default)]
pub struct PeripheralRegistry {
    digital: Partition,
    pulse: Partition,
    analog: Partition,
}

impl PeripheralRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn partition(&self, class: PeripheralClass) -> &Partition {
        match class {
            PeripheralClass::DigitalLine => &self.digital,
            PeripheralClass::PulseOutput => &self.pulse,
            PeripheralClass::AnalogSensor => &self.analog,
        }
    }

    fn partition_mut(&mut self, class: PeripheralClass) -> &mut Partition {
        match class {
            PeripheralClass::DigitalLine => &mut self.digital,
            PeripheralClass::PulseOutput => &mut self.pulse,
            PeripheralClass::AnalogSensor => &mut self.analog,
        }
    }

    /// Return the open handle for `(class, name)`, opening one if needed.
    ///
    /// An entry opened for a different `direction` is closed first, then a
    /// fresh handle is opened; both happen inside this one call. An entry
    /// with the same direction is reused without touching hardware.
    ///
    /// # Errors
    ///
    /// [`Error::PeripheralIo`] if closing the stale handle or opening the new
    /// one fails. A failed close still leaves the stale entry removed.
    pub async fn open_or_reuse(
        &mut self,
        peripherals: &Peripherals,
        class: PeripheralClass,
        name: &str,
        direction: Option<Direction>,
    ) -> Result<Lease> {
        if let Some(entry) = self.partition(class).get(name) {
            if entry.direction == direction {
                return Ok(Lease {
                    handle: entry.handle,
                    fresh: false,
                });
            }
            debug!(
                %class,
                name,
                from = ?entry.direction,
                to = ?direction,
                "Role changed, reopening"
            );
            self.close(peripherals, class, name).await?;
        }

        let handle = peripherals
            .open(class, name)
            .await
            .map_err(|e| Error::peripheral_io(name, e))?;

        self.partition_mut(class).insert(RegistryEntry {
            name: name.to_string(),
            class,
            handle,
            direction,
            listening: false,
            level: None,
            opened_at: Utc::now(),
        });
        debug!(%class, name, %handle, "Opened peripheral");

        Ok(Lease {
            handle,
            fresh: true,
        })
    }

    /// Close and forget `(class, name)`.
    ///
    /// Detaches the listener first when one is attached. Returns `Ok(false)`
    /// without touching hardware when nothing is registered under the name.
    pub async fn close(
        &mut self,
        peripherals: &Peripherals,
        class: PeripheralClass,
        name: &str,
    ) -> Result<bool> {
        let Some(entry) = self.partition_mut(class).remove(name) else {
            return Ok(false);
        };

        if entry.listening {
            peripherals.detach_listener(class, entry.handle).await;
        }
        peripherals
            .close(class, entry.handle)
            .await
            .map_err(|e| Error::peripheral_io(name, e))?;

        debug!(%class, name, handle = %entry.handle, "Closed peripheral");
        Ok(true)
    }

    /// Close every entry in every class.
    ///
    /// Works from a snapshot of the registered names. Failures are logged
    /// and do not stop the sweep. Returns the number of handles closed
    /// cleanly.
    pub async fn close_all(&mut self, peripherals: &Peripherals) -> usize {
        let snapshot: Vec<(PeripheralClass, String)> = self
            .entries()
            .map(|entry| (entry.class, entry.name.clone()))
            .collect();

        let mut closed = 0;
        for (class, name) in snapshot {
            match self.close(peripherals, class, &name).await {
                Ok(true) => closed += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(%class, name, error = %e, "Failed to close peripheral during sweep")
                }
            }
        }
        closed
    }

    /// Logical name behind a hardware handle.
    pub fn lookup_name(&self, class: PeripheralClass, handle: HandleId) -> Option<&str> {
        self.partition(class)
            .by_handle
            .get(&handle)
            .map(|entry| entry.name.as_str())
    }

    pub fn get(&self, class: PeripheralClass, name: &str) -> Option<&RegistryEntry> {
        self.partition(class).get(name)
    }

    pub fn get_mut(&mut self, class: PeripheralClass, name: &str) -> Option<&mut RegistryEntry> {
        self.partition_mut(class).get_mut(name)
    }

    pub fn contains(&self, class: PeripheralClass, name: &str) -> bool {
        self.partition(class).by_name.contains_key(name)
    }

    /// All entries, digital lines first.
    pub fn entries(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.digital
            .by_handle
            .values()
            .chain(self.pulse.by_handle.values())
            .chain(self.analog.by_handle.values())
    }

    /// Mutable access to every entry of one class.
    pub fn entries_mut(
        &mut self,
        class: PeripheralClass,
    ) -> impl Iterator<Item = &mut RegistryEntry> {
        self.partition_mut(class).by_handle.values_mut()
    }

    pub fn len(&self) -> usize {
        self.digital.by_handle.len() + self.pulse.by_handle.len() + self.analog.by_handle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

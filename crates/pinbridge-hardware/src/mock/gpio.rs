//! Mock digital line port for testing and development.
//!
//! Every port call is recorded in order, so tests can assert exactly which
//! hardware operations a message caused (including none at all).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pinbridge_core::{PeripheralClass, PinLevel};

use super::bank::Bank;
use crate::{
    HardwareError, Result,
    notice::{HardwareNotice, NoticeSender},
    traits::{DigitalLinePort, PeripheralPort},
    types::{ActiveType, EdgeTrigger, HandleId, LineDirection},
};

/// One recorded call on a [`MockGpio`].
#[derive(Debug, Clone, PartialEq)]
pub enum GpioCall {
    Open(String),
    Close(HandleId),
    SetDirection(HandleId, LineDirection),
    SetActiveType(HandleId, ActiveType),
    SetEdgeTrigger(HandleId, EdgeTrigger),
    SetLevel(HandleId, PinLevel),
    ReadLevel(HandleId),
    AttachEdgeListener(HandleId),
    DetachListener(HandleId),
}

#[derive(Debug)]
struct LineState {
    direction: Option<LineDirection>,
    active: ActiveType,
    trigger: EdgeTrigger,
    level: PinLevel,
}

impl Default for LineState {
    fn default() -> Self {
        Self {
            direction: None,
            active: ActiveType::ActiveHigh,
            trigger: EdgeTrigger::None,
            level: PinLevel::Low,
        }
    }
}

impl LineState {
    fn fires_on(&self, level: PinLevel) -> bool {
        match self.trigger {
            EdgeTrigger::None => false,
            EdgeTrigger::Rising => level.is_high(),
            EdgeTrigger::Falling => !level.is_high(),
            EdgeTrigger::Both => true,
        }
    }
}

#[derive(Debug)]
struct Inner {
    bank: Bank<LineState>,
    calls: Vec<GpioCall>,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Simulated bank of digital lines.
///
/// # Examples
///
/// ```
/// use pinbridge_core::PinLevel;
/// use pinbridge_hardware::mock::MockGpio;
/// use pinbridge_hardware::traits::{DigitalLinePort, PeripheralPort};
/// use pinbridge_hardware::types::LineDirection;
///
/// #[tokio::main]
/// async fn main() -> pinbridge_hardware::Result<()> {
///     let (gpio, handle) = MockGpio::new();
///
///     let line = gpio.open("BCM6").await?;
///     gpio.set_direction(line, LineDirection::OutputInitiallyLow).await?;
///     gpio.set_level(line, PinLevel::High).await?;
///
///     assert_eq!(handle.level("BCM6"), Some(PinLevel::High));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockGpio {
    inner: Arc<Mutex<Inner>>,
}

impl MockGpio {
    /// Create a mock that accepts any line name.
    pub fn new() -> (Self, MockGpioHandle) {
        Self::build(None)
    }

    /// Create a mock exposing only the given lines.
    pub fn with_lines<I, S>(lines: I) -> (Self, MockGpioHandle)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::build(Some(lines.into_iter().map(Into::into).collect()))
    }

    fn build(available: Option<Vec<String>>) -> (Self, MockGpioHandle) {
        let inner = Arc::new(Mutex::new(Inner {
            bank: Bank::new(available),
            calls: Vec::new(),
        }));
        (
            Self {
                inner: Arc::clone(&inner),
            },
            MockGpioHandle { inner },
        )
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock(&self.inner)
    }
}

impl Default for MockGpio {
    fn default() -> Self {
        Self::new().0
    }
}

impl PeripheralPort for MockGpio {
    async fn available(&self) -> Result<Vec<String>> {
        Ok(self.lock().bank.available())
    }

    async fn open(&self, name: &str) -> Result<HandleId> {
        let mut inner = self.lock();
        inner.calls.push(GpioCall::Open(name.to_string()));
        inner.bank.open(name)
    }

    async fn close(&self, handle: HandleId) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(GpioCall::Close(handle));
        inner.bank.close(handle)
    }

    async fn detach_listener(&self, handle: HandleId) {
        let mut inner = self.lock();
        inner.calls.push(GpioCall::DetachListener(handle));
        if let Ok(slot) = inner.bank.slot_mut(handle) {
            slot.listener = None;
        }
    }
}

impl DigitalLinePort for MockGpio {
    async fn set_direction(&self, handle: HandleId, direction: LineDirection) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(GpioCall::SetDirection(handle, direction));
        let slot = inner.bank.slot_mut(handle)?;
        slot.state.direction = Some(direction);
        match direction {
            LineDirection::OutputInitiallyLow => slot.state.level = PinLevel::Low,
            LineDirection::OutputInitiallyHigh => slot.state.level = PinLevel::High,
            LineDirection::Input => {}
        }
        Ok(())
    }

    async fn set_active_type(&self, handle: HandleId, active: ActiveType) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(GpioCall::SetActiveType(handle, active));
        inner.bank.slot_mut(handle)?.state.active = active;
        Ok(())
    }

    async fn set_edge_trigger(&self, handle: HandleId, trigger: EdgeTrigger) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(GpioCall::SetEdgeTrigger(handle, trigger));
        let slot = inner.bank.slot_mut(handle)?;
        if slot.state.direction.is_some_and(|d| d.is_output()) {
            return Err(HardwareError::unsupported("edge trigger on output line"));
        }
        slot.state.trigger = trigger;
        Ok(())
    }

    async fn set_level(&self, handle: HandleId, level: PinLevel) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(GpioCall::SetLevel(handle, level));
        let slot = inner.bank.slot_mut(handle)?;
        if !slot.state.direction.is_some_and(|d| d.is_output()) {
            return Err(HardwareError::unsupported("set_level on non-output line"));
        }
        slot.state.level = level;
        Ok(())
    }

    async fn read_level(&self, handle: HandleId) -> Result<PinLevel> {
        let mut inner = self.lock();
        inner.calls.push(GpioCall::ReadLevel(handle));
        Ok(inner.bank.slot(handle)?.state.level)
    }

    async fn attach_edge_listener(&self, handle: HandleId, listener: NoticeSender) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(GpioCall::AttachEdgeListener(handle));
        let slot = inner.bank.slot_mut(handle)?;
        if slot.state.direction != Some(LineDirection::Input) {
            return Err(HardwareError::unsupported("edge listener on non-input line"));
        }
        if slot.listener.is_some() {
            return Err(HardwareError::configuration(format!(
                "listener already attached to {}",
                slot.name
            )));
        }
        slot.listener = Some(listener);
        Ok(())
    }
}

/// Handle for observing and driving a [`MockGpio`] from tests.
#[derive(Debug, Clone)]
pub struct MockGpioHandle {
    inner: Arc<Mutex<Inner>>,
}

impl MockGpioHandle {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock(&self.inner)
    }

    /// Every call made on the port, oldest first.
    pub fn calls(&self) -> Vec<GpioCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Total successful opens.
    pub fn opens(&self) -> usize {
        self.lock().bank.opens()
    }

    /// Total closes of valid handles.
    pub fn closes(&self) -> usize {
        self.lock().bank.closes()
    }

    /// Lines currently open.
    pub fn open_count(&self) -> usize {
        self.lock().bank.open_count()
    }

    pub fn is_open(&self, name: &str) -> bool {
        self.lock().bank.find(name).is_some()
    }

    /// Current level of an open line.
    pub fn level(&self, name: &str) -> Option<PinLevel> {
        self.lock().bank.find(name).map(|(_, slot)| slot.state.level)
    }

    pub fn direction(&self, name: &str) -> Option<LineDirection> {
        self.lock()
            .bank
            .find(name)
            .and_then(|(_, slot)| slot.state.direction)
    }

    pub fn edge_trigger(&self, name: &str) -> Option<EdgeTrigger> {
        self.lock().bank.find(name).map(|(_, slot)| slot.state.trigger)
    }

    pub fn has_listener(&self, name: &str) -> bool {
        self.lock()
            .bank
            .find(name)
            .is_some_and(|(_, slot)| slot.listener.is_some())
    }

    /// Change the level seen on an open input line.
    ///
    /// Raises an edge notice when a listener is attached and the transition
    /// matches the configured trigger. Returns whether a notice was raised.
    pub fn trigger_edge(&self, name: &str, level: PinLevel) -> bool {
        let mut inner = self.lock();
        let Some((handle, slot)) = inner.bank.find_mut(name) else {
            return false;
        };
        if slot.state.direction != Some(LineDirection::Input) {
            return false;
        }
        let changed = slot.state.level != level;
        slot.state.level = level;
        changed && slot.state.fires_on(level) && slot.notify(HardwareNotice::Edge { handle })
    }

    /// Simulate the driver reporting an error on a watched line.
    pub fn report_error(&self, name: &str, code: i32) -> bool {
        let inner = self.lock();
        inner.bank.find(name).is_some_and(|(handle, slot)| {
            slot.notify(HardwareNotice::ListenerError {
                class: PeripheralClass::DigitalLine,
                handle,
                code,
            })
        })
    }

    /// Make subsequent opens of `name` fail.
    pub fn fail_open(&self, name: &str, fail: bool) {
        self.lock().bank.fail_open(name, fail);
    }

    /// Make subsequent closes of `name` fail.
    pub fn fail_close(&self, name: &str, fail: bool) {
        self.lock().bank.fail_close(name, fail);
    }
}

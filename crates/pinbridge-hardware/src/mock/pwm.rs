//! Mock pulse output port for testing and development.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::bank::Bank;
use crate::{
    Result,
    traits::{PeripheralPort, PulseOutputPort},
    types::HandleId,
};

/// One recorded call on a [`MockPwm`].
#[derive(Debug, Clone, PartialEq)]
pub enum PwmCall {
    Open(String),
    Close(HandleId),
    SetEnabled(HandleId, bool),
    SetFrequency(HandleId, f64),
    SetDutyCycle(HandleId, f64),
    DetachListener(HandleId),
}

#[derive(Debug, Default)]
struct OutputState {
    enabled: bool,
    frequency: Option<f64>,
    duty_cycle: Option<f64>,
}

#[derive(Debug)]
struct Inner {
    bank: Bank<OutputState>,
    calls: Vec<PwmCall>,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Simulated bank of pulse-width modulated outputs.
///
/// # Examples
///
/// ```
/// use pinbridge_hardware::mock::MockPwm;
/// use pinbridge_hardware::traits::{PeripheralPort, PulseOutputPort};
///
/// #[tokio::main]
/// async fn main() -> pinbridge_hardware::Result<()> {
///     let (pwm, handle) = MockPwm::new();
///
///     let output = pwm.open("PWM0").await?;
///     pwm.set_frequency(output, 50.0).await?;
///
///     assert_eq!(handle.frequency("PWM0"), Some(50.0));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockPwm {
    inner: Arc<Mutex<Inner>>,
}

impl MockPwm {
    /// Create a mock that accepts any output name.
    pub fn new() -> (Self, MockPwmHandle) {
        Self::build(None)
    }

    /// Create a mock exposing only the given outputs.
    pub fn with_outputs<I, S>(outputs: I) -> (Self, MockPwmHandle)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::build(Some(outputs.into_iter().map(Into::into).collect()))
    }

    fn build(available: Option<Vec<String>>) -> (Self, MockPwmHandle) {
        let inner = Arc::new(Mutex::new(Inner {
            bank: Bank::new(available),
            calls: Vec::new(),
        }));
        (
            Self {
                inner: Arc::clone(&inner),
            },
            MockPwmHandle { inner },
        )
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock(&self.inner)
    }
}

impl Default for MockPwm {
    fn default() -> Self {
        Self::new().0
    }
}

impl PeripheralPort for MockPwm {
    async fn available(&self) -> Result<Vec<String>> {
        Ok(self.lock().bank.available())
    }

    async fn open(&self, name: &str) -> Result<HandleId> {
        let mut inner = self.lock();
        inner.calls.push(PwmCall::Open(name.to_string()));
        inner.bank.open(name)
    }

    async fn close(&self, handle: HandleId) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(PwmCall::Close(handle));
        inner.bank.close(handle)
    }

    async fn detach_listener(&self, handle: HandleId) {
        // Outputs never carry listeners.
        self.lock().calls.push(PwmCall::DetachListener(handle));
    }
}

impl PulseOutputPort for MockPwm {
    async fn set_enabled(&self, handle: HandleId, enabled: bool) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(PwmCall::SetEnabled(handle, enabled));
        inner.bank.slot_mut(handle)?.state.enabled = enabled;
        Ok(())
    }

    async fn set_frequency(&self, handle: HandleId, hz: f64) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(PwmCall::SetFrequency(handle, hz));
        inner.bank.slot_mut(handle)?.state.frequency = Some(hz);
        Ok(())
    }

    async fn set_duty_cycle(&self, handle: HandleId, percent: f64) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(PwmCall::SetDutyCycle(handle, percent));
        inner.bank.slot_mut(handle)?.state.duty_cycle = Some(percent);
        Ok(())
    }
}

/// Handle for observing a [`MockPwm`] from tests.
#[derive(Debug, Clone)]
pub struct MockPwmHandle {
    inner: Arc<Mutex<Inner>>,
}

impl MockPwmHandle {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock(&self.inner)
    }

    pub fn calls(&self) -> Vec<PwmCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn opens(&self) -> usize {
        self.lock().bank.opens()
    }

    pub fn closes(&self) -> usize {
        self.lock().bank.closes()
    }

    pub fn open_count(&self) -> usize {
        self.lock().bank.open_count()
    }

    pub fn is_open(&self, name: &str) -> bool {
        self.lock().bank.find(name).is_some()
    }

    pub fn enabled(&self, name: &str) -> Option<bool> {
        self.lock().bank.find(name).map(|(_, slot)| slot.state.enabled)
    }

    pub fn frequency(&self, name: &str) -> Option<f64> {
        self.lock()
            .bank
            .find(name)
            .and_then(|(_, slot)| slot.state.frequency)
    }

    pub fn duty_cycle(&self, name: &str) -> Option<f64> {
        self.lock()
            .bank
            .find(name)
            .and_then(|(_, slot)| slot.state.duty_cycle)
    }

    pub fn fail_open(&self, name: &str, fail: bool) {
        self.lock().bank.fail_open(name, fail);
    }

    pub fn fail_close(&self, name: &str, fail: bool) {
        self.lock().bank.fail_close(name, fail);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_output_settings_recorded() {
        let (pwm, handle) = MockPwm::new();

        let output = pwm.open("PWM1").await.unwrap();
        pwm.set_duty_cycle(output, 25.0).await.unwrap();
        pwm.set_enabled(output, true).await.unwrap();

        assert_eq!(handle.duty_cycle("PWM1"), Some(25.0));
        assert_eq!(handle.enabled("PWM1"), Some(true));
        assert_eq!(handle.frequency("PWM1"), None);
        assert_eq!(
            handle.calls(),
            vec![
                PwmCall::Open("PWM1".to_string()),
                PwmCall::SetDutyCycle(output, 25.0),
                PwmCall::SetEnabled(output, true),
            ]
        );
    }

    #[tokio::test]
    async fn test_stale_handle_rejected() {
        let (pwm, handle) = MockPwm::new();

        let output = pwm.open("PWM1").await.unwrap();
        pwm.close(output).await.unwrap();

        assert!(pwm.set_enabled(output, true).await.is_err());
        assert!(pwm.close(output).await.is_err());
        assert_eq!(handle.closes(), 1);
        assert!(!handle.is_open("PWM1"));
    }
}

//! Mock analog sensor port for testing and development.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pinbridge_core::PeripheralClass;

use super::bank::Bank;
use crate::{
    HardwareError, Result,
    notice::{HardwareNotice, NoticeSender},
    traits::{AnalogSensorPort, PeripheralPort},
    types::{HandleId, Oversampling},
};

/// Sample reported by sensors that were never given an explicit value.
pub const DEFAULT_SAMPLE: f64 = 21.5;

/// One recorded call on a [`MockSensor`].
#[derive(Debug, Clone, PartialEq)]
pub enum SensorCall {
    Open(String),
    Close(HandleId),
    SetOversampling(HandleId, Oversampling),
    ReadSample(HandleId),
    AttachSampleListener(HandleId),
    DetachListener(HandleId),
}

#[derive(Debug, Default)]
struct SensorState {
    oversampling: Option<Oversampling>,
}

#[derive(Debug)]
struct Inner {
    bank: Bank<SensorState>,
    calls: Vec<SensorCall>,
    /// Value each sensor reports, keyed by name so it survives reopening.
    samples: HashMap<String, f64>,
    fail_read: bool,
}

impl Inner {
    fn sample_for(&self, name: &str) -> f64 {
        self.samples.get(name).copied().unwrap_or(DEFAULT_SAMPLE)
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Simulated set of temperature sensors.
///
/// # Examples
///
/// ```
/// use pinbridge_hardware::mock::MockSensor;
/// use pinbridge_hardware::traits::{AnalogSensorPort, PeripheralPort};
///
/// #[tokio::main]
/// async fn main() -> pinbridge_hardware::Result<()> {
///     let (sensor, handle) = MockSensor::new();
///     handle.set_sample("I2C1", 23.25);
///
///     let device = sensor.open("I2C1").await?;
///     assert_eq!(sensor.read_sample(device).await?, 23.25);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockSensor {
    inner: Arc<Mutex<Inner>>,
}

impl MockSensor {
    /// Create a mock that accepts any sensor name.
    pub fn new() -> (Self, MockSensorHandle) {
        Self::build(None)
    }

    /// Create a mock exposing only the given sensors.
    pub fn with_sensors<I, S>(sensors: I) -> (Self, MockSensorHandle)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::build(Some(sensors.into_iter().map(Into::into).collect()))
    }

    fn build(available: Option<Vec<String>>) -> (Self, MockSensorHandle) {
        let inner = Arc::new(Mutex::new(Inner {
            bank: Bank::new(available),
            calls: Vec::new(),
            samples: HashMap::new(),
            fail_read: false,
        }));
        (
            Self {
                inner: Arc::clone(&inner),
            },
            MockSensorHandle { inner },
        )
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock(&self.inner)
    }
}

impl Default for MockSensor {
    fn default() -> Self {
        Self::new().0
    }
}

impl PeripheralPort for MockSensor {
    async fn available(&self) -> Result<Vec<String>> {
        Ok(self.lock().bank.available())
    }

    async fn open(&self, name: &str) -> Result<HandleId> {
        let mut inner = self.lock();
        inner.calls.push(SensorCall::Open(name.to_string()));
        inner.bank.open(name)
    }

    async fn close(&self, handle: HandleId) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(SensorCall::Close(handle));
        inner.bank.close(handle)
    }

    async fn detach_listener(&self, handle: HandleId) {
        let mut inner = self.lock();
        inner.calls.push(SensorCall::DetachListener(handle));
        if let Ok(slot) = inner.bank.slot_mut(handle) {
            slot.listener = None;
        }
    }
}

impl AnalogSensorPort for MockSensor {
    async fn set_oversampling(&self, handle: HandleId, oversampling: Oversampling) -> Result<()> {
        let mut inner = self.lock();
        inner
            .calls
            .push(SensorCall::SetOversampling(handle, oversampling));
        inner.bank.slot_mut(handle)?.state.oversampling = Some(oversampling);
        Ok(())
    }

    async fn read_sample(&self, handle: HandleId) -> Result<f64> {
        let mut inner = self.lock();
        inner.calls.push(SensorCall::ReadSample(handle));
        let name = inner.bank.slot(handle)?.name.clone();
        if inner.fail_read {
            return Err(HardwareError::communication(format!("read {name} failed")));
        }
        Ok(inner.sample_for(&name))
    }

    async fn attach_sample_listener(&self, handle: HandleId, listener: NoticeSender) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(SensorCall::AttachSampleListener(handle));
        let slot = inner.bank.slot_mut(handle)?;
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

/// Handle for observing and driving a [`MockSensor`] from tests.
#[derive(Debug, Clone)]
pub struct MockSensorHandle {
    inner: Arc<Mutex<Inner>>,
}

impl MockSensorHandle {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock(&self.inner)
    }

    pub fn calls(&self) -> Vec<SensorCall> {
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

    pub fn has_listener(&self, name: &str) -> bool {
        self.lock()
            .bank
            .find(name)
            .is_some_and(|(_, slot)| slot.listener.is_some())
    }

    /// Oversampling last applied to an open sensor.
    pub fn oversampling(&self, name: &str) -> Option<Oversampling> {
        self.lock()
            .bank
            .find(name)
            .and_then(|(_, slot)| slot.state.oversampling)
    }

    /// Set the value the named sensor reports from now on.
    pub fn set_sample(&self, name: &str, value: f64) {
        self.lock().samples.insert(name.to_string(), value);
    }

    /// Push a sample through the attached listener, as a monitoring driver
    /// would. Returns whether a listener received it.
    pub fn emit_sample(&self, name: &str, value: f64) -> bool {
        let mut inner = self.lock();
        inner.samples.insert(name.to_string(), value);
        inner
            .bank
            .find(name)
            .is_some_and(|(handle, slot)| slot.notify(HardwareNotice::Sample { handle, value }))
    }

    /// Simulate the driver reporting an error on a monitored sensor.
    pub fn report_error(&self, name: &str, code: i32) -> bool {
        let inner = self.lock();
        inner.bank.find(name).is_some_and(|(handle, slot)| {
            slot.notify(HardwareNotice::ListenerError {
                class: PeripheralClass::AnalogSensor,
                handle,
                code,
            })
        })
    }

    /// Make every read fail.
    pub fn fail_read(&self, fail: bool) {
        self.lock().fail_read = fail;
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
    async fn test_default_sample() {
        let (sensor, _handle) = MockSensor::new();
        let device = sensor.open("I2C1").await.unwrap();

        assert_eq!(sensor.read_sample(device).await.unwrap(), DEFAULT_SAMPLE);
    }

    #[tokio::test]
    async fn test_sample_survives_reopen() {
        let (sensor, handle) = MockSensor::new();
        handle.set_sample("I2C1", -4.5);

        let device = sensor.open("I2C1").await.unwrap();
        sensor.close(device).await.unwrap();
        let device = sensor.open("I2C1").await.unwrap();

        assert_eq!(sensor.read_sample(device).await.unwrap(), -4.5);
    }

    #[tokio::test]
    async fn test_read_failure() {
        let (sensor, handle) = MockSensor::new();
        handle.fail_read(true);
        let device = sensor.open("I2C1").await.unwrap();

        assert!(sensor.read_sample(device).await.is_err());
    }

    #[tokio::test]
    async fn test_emit_sample_reaches_listener() {
        let (sensor, handle) = MockSensor::new();
        let (sender, mut rx) = NoticeSender::channel(4);

        let device = sensor.open("I2C1").await.unwrap();
        assert!(!handle.emit_sample("I2C1", 19.0));

        sensor.attach_sample_listener(device, sender).await.unwrap();
        assert!(handle.emit_sample("I2C1", 20.0));
        assert_eq!(
            rx.recv().await,
            Some(HardwareNotice::Sample {
                handle: device,
                value: 20.0
            })
        );
    }

    #[tokio::test]
    async fn test_oversampling_recorded() {
        let (sensor, handle) = MockSensor::new();
        let device = sensor.open("I2C1").await.unwrap();
        sensor
            .set_oversampling(device, Oversampling::X4)
            .await
            .unwrap();

        assert_eq!(handle.oversampling("I2C1"), Some(Oversampling::X4));
        assert_eq!(
            handle.calls(),
            vec![
                SensorCall::Open("I2C1".to_string()),
                SensorCall::SetOversampling(device, Oversampling::X4),
            ]
        );
    }
}

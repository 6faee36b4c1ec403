use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Device availability check failed: {0}")]
pub struct DeviceCheckError(pub String);

/// Reports whether a machine's controller is reachable.
///
/// Implementations talk to the device gateway and must bound the probe with a timeout. The
/// engine treats an `Err` the same as "offline": order creation is refused outright rather than
/// queued, because unattended hardware cannot later catch up a missed dispense.
#[allow(async_fn_in_trait)]
pub trait DeviceAvailabilityChecker {
    async fn is_online(&self, device_code: &str) -> Result<bool, DeviceCheckError>;
}

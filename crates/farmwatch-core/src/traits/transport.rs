// # Device Transport Trait
//
// Defines the interface for talking to the security device.
//
// ## Implementations
//
// - HTTP: `farmwatch-http` crate (live device)
// - Mock: `crate::transport::MockTransport` (synthetic data)
// - Mode router: `crate::transport::ModeRouter` picks one of the two per
//   call based on the `mock` setting
//
// ## REST surface
//
// | Method | Path                        |
// |--------|-----------------------------|
// | GET    | `/alerts`                   |
// | GET    | `/api/system/status`        |
// | POST   | `/system`                   |
// | POST   | `/api/system/siren/toggle`  |
// | GET    | `/camera/status`            |
// | DELETE | `/api/events/clear`         |

use async_trait::async_trait;

use crate::model::{Alert, CameraStatus, SirenAction, SirenToggleResponse, SystemStatus};

/// Trait for device transport implementations
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Trust Level: Untrusted
///
/// Transports are single-shot request/response adapters.
///
/// ## Allowed Capabilities
/// - ✅ Perform one HTTP call per invocation
/// - ✅ Parse device responses
/// - ✅ Return success or failure (callers decide the fallback)
///
/// ## Forbidden Capabilities
/// - ❌ Retry or back off (pollers own scheduling)
/// - ❌ Touch the settings or intent stores
/// - ❌ Substitute default values on failure (owned by the callers)
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    /// Fetch the alert log (unsorted, as the device returns it)
    async fn fetch_alerts(&self) -> Result<Vec<Alert>, crate::Error>;

    /// Fetch the authoritative system status
    async fn system_status(&self) -> Result<SystemStatus, crate::Error>;

    /// Arm or disarm the system
    async fn set_system_enabled(&self, enabled: bool) -> Result<(), crate::Error>;

    /// Ask the device to switch the siren
    ///
    /// A reply with `success: false` is still `Ok`; only transport
    /// failures are `Err`.
    async fn toggle_siren(&self, action: SirenAction)
    -> Result<SirenToggleResponse, crate::Error>;

    /// Fetch the camera connection status
    async fn camera_status(&self) -> Result<CameraStatus, crate::Error>;

    /// Delete every stored detection event
    async fn clear_events(&self) -> Result<(), crate::Error>;

    /// Get the transport name (for logging/debugging)
    fn transport_name(&self) -> &'static str;
}

// # Farmwatch HTTP
//
// Live device access for the Farmwatch client.
//
// ## Purpose
//
// - [`HttpTransport`]: the `DeviceTransport` used when the `mock` setting is
//   off. One request per call, fixed timeout, no retries.
// - [`HttpFeedConnector`]: opens the live feed and reads it until it ends,
//   counting bytes without decoding.
//
// ## Architecture
//
// The transport reads the API base URL from the `SettingsStore` on every
// request, so a settings change applies to the next call. Mock/live routing
// is not done here; wrap the transport in `farmwatch_core::ModeRouter`.

mod feed;
mod transport;

pub use feed::HttpFeedConnector;
pub use transport::{DEFAULT_TIMEOUT, HttpTransport};

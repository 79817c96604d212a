//! Core traits for the Farmwatch client
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`DeviceTransport`]: Talk to the security device
//! - [`StateStore`]: Durable storage for the `settings` and `system` records
//! - [`FeedConnector`]: Hold a live feed connection open

pub mod feed;
pub mod state_store;
pub mod transport;

pub use feed::{FeedConnector, FeedProgress};
pub use state_store::{SETTINGS_KEY, SYSTEM_KEY, StateStore};
pub use transport::DeviceTransport;

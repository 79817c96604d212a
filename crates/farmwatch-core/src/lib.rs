// # farmwatch-core
//
// Core library for the Farmwatch security client.
//
// ## Architecture Overview
//
// The client talks to a remote security device (system switch, siren,
// camera, alert log) and keeps local state consistent with it:
// - **SettingsStore / IntentCache**: Persisted `settings` and `system` records
// - **DeviceTransport**: Trait for device calls; `ModeRouter` picks live or mock
// - **StatusReconciler**: Folds polled status into the cached intent
// - **SystemActuator / SirenActuator**: Single-flight control requests
// - **AlertFeed**: Sorted, refreshable, clearable alert log
// - **FeedSession**: Keeps the live feed bound to the resolved URL
// - **ClientEngine**: Wires the above together and owns each view's timers
//
// ## Design Principles
//
// 1. **Mode-agnostic logic**: Mock/live branching lives only in the transport layer
// 2. **Optimistic then reconciled**: Intent and remote truth are separate fields
// 3. **Nothing fatal**: Device failures degrade to safe defaults
// 4. **Library-First**: `farmwatchd` is a thin consumer of this crate

pub mod actuator;
pub mod alerts;
pub mod camera;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod feed;
pub mod model;
pub mod reconciler;
pub mod scheduler;
pub mod state;
pub mod stores;
pub mod traits;
pub mod transport;

// Re-export core types for convenience
pub use actuator::{ActuatorOutcome, SirenActuator, SystemActuator};
pub use alerts::{AlertFeed, AlertFeedState, ClearOutcome, ConfirmClear};
pub use camera::CameraMonitor;
pub use config::{ClientConfig, EngineConfig, StateStoreConfig};
pub use engine::{ClientEngine, EngineEvent, EventSink, View};
pub use error::{Error, Result};
pub use feed::{FeedSession, resolve};
pub use reconciler::{StatusReconciler, SystemView, merge_view};
pub use scheduler::{PollHandle, spawn_poll};
pub use state::{FileStateStore, MemoryStateStore};
pub use stores::{IntentCache, SettingsStore};
pub use traits::{DeviceTransport, FeedConnector, FeedProgress, StateStore};
pub use transport::{MockTransport, ModeRouter};

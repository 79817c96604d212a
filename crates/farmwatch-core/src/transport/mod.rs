//! Transport implementations that live in the core
//!
//! The live HTTP transport is in the `farmwatch-http` crate.

mod mock;
mod router;

pub use mock::MockTransport;
pub use router::ModeRouter;

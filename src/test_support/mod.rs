//! Test utilities shared across crate-level unit tests.

pub mod host;
pub mod http;
pub mod transport;

pub use host::FakeHost;
pub use transport::{ScriptedBeacon, ScriptedRequest};

//! Host and runtime abstractions shared by the monitor and performance modules.

#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
pub mod browser;
pub mod environment;
pub mod host;
pub mod runtime;

//! Browser/WebView adapters for the `tether-core` ports.
//!
//! Everything here targets `wasm32-unknown-unknown` and talks to the host
//! through wasm-bindgen: `fetch` and `EventSource` via gloo-net, timers via
//! gloo-timers, persistence via IndexedDB.

pub mod events;
pub mod http;
pub mod spawn;
pub mod storage;
pub mod timer;

pub use http::{HttpConnector, HttpRemote};
pub use spawn::WasmSpawner;
pub use timer::GlooTimer;

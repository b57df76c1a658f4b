//! Tether App: WASM entry point.
//!
//! This crate is the composition root (DI wiring layer). It assembles the
//! platform adapters into an `AppState` and exports it to the mobile UI as
//! [`TetherClient`].

mod app;
mod view;


pub use app::TetherClient;

use wasm_bindgen::prelude::*;

/// WASM entry point, run once when the module is instantiated.
#[wasm_bindgen(start)]
pub fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("Tether WASM starting...");
}

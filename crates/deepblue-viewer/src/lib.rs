//! DeepBlue Viewer - Globe viewer for the browser
//!
//! A Bevy globe with satellite imagery, a fixed initial view over the Pearl
//! River estuary and a toolbar for dropping glTF models onto it.

mod app;
mod blobs;
mod chrome;
#[cfg(debug_assertions)]
mod debug_panel;
mod file_picker;
mod globe_host;
mod loader_host;
mod toolbar;

use wasm_bindgen::prelude::*;

/// WASM entry point
#[wasm_bindgen(start)]
pub fn main() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging with filtering to reduce noise
    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(tracing::Level::INFO)
            .build()
    );

    app::run();
}

mod api;
mod app;
mod assets;
mod components;
mod doc;
mod editor;
mod engine;
mod models;
mod pages;
mod render;
mod state;
mod storage;
mod suggest;
mod util;
mod viewer;

use leptos::prelude::*;

use crate::app::App;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    mount_to_body(App);
}

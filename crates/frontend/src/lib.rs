//! Study Sets - Yew WASM Frontend
//!
//! This crate provides the web UI for browsing study sets: the app shell,
//! routing, and the live-updating sidebar.

mod app;
mod components;
mod diagnostics;
mod pages;
mod sidebar;
pub mod signals;

pub use app::{App, Route};

use study_db::SupabaseConfig;
use wasm_bindgen::prelude::*;

/// WASM entry point.
#[wasm_bindgen(start)]
pub fn main() {
    diagnostics::init();

    // The client is built once; a bad config still renders the app and
    // every fetch reports the failure.
    if let Err(e) = study_db::init(SupabaseConfig::from_build_env()) {
        diagnostics::error(&format!("Error creating database client: {}", e));
    }

    yew::Renderer::<App>::new().render();
}

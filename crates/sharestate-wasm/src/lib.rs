//! WASM bindings for sharestate.
//!
//! Provides the browser backends (`window.location` query parameter and
//! `window.localStorage`) and exposes the analysis store to TypeScript.

pub mod analysis;
mod error;
pub mod local_storage;
pub mod location;

pub use local_storage::BrowserLocalStorage;
pub use location::BrowserLocation;

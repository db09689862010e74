// === PUBLIC CONTRACT ===
pub mod contract;

// Re-export the public contract components
pub use contract::model;

pub mod config;

// === INTERNAL MODULES ===
// Exposed for wiring in the server binary and for tests.
pub mod api;
pub mod domain;
pub mod infra;

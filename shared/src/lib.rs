//! Shared types and models for the Lumber Inventory Platform
//!
//! This crate contains the domain model, workflow state machines and pure
//! stock calculations shared between the backend and the browser (via WASM).

pub mod models;
pub mod types;
pub mod validation;
pub mod workflow;

pub use models::*;
pub use types::*;
pub use validation::*;
pub use workflow::*;

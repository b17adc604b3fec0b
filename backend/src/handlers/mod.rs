//! HTTP handlers for the Lumber Inventory Platform

pub mod allocations;
pub mod audit;
pub mod health;
pub mod items;
pub mod picking;
pub mod projects;
pub mod reconciliation;
pub mod stock;
pub mod transfers;

pub use allocations::*;
pub use audit::*;
pub use health::*;
pub use items::*;
pub use picking::*;
pub use projects::*;
pub use reconciliation::*;
pub use stock::*;
pub use transfers::*;

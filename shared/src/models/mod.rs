//! Domain models for the Lumber Inventory Platform

mod alert;
mod allocation;
mod audit;
mod item;
mod location;
mod pick_list;
mod project;
mod reconciliation;
mod stock;
mod transfer;

pub use alert::*;
pub use allocation::*;
pub use audit::*;
pub use item::*;
pub use location::*;
pub use pick_list::*;
pub use project::*;
pub use reconciliation::*;
pub use stock::*;
pub use transfer::*;

//! Inter-hub transfers routed through the Transit zone

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflow::{ParseStatusError, StateMachine};

/// Movement of one SKU between two physical locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: i64,
    pub sku: String,
    pub quantity: i32,
    pub from_location: String,
    pub to_location: String,
    pub status: TransferStatus,
    pub request_date: DateTime<Utc>,
    pub shipped_date: Option<DateTime<Utc>>,
    pub received_date: Option<DateTime<Utc>>,
    pub requested_by: String,
    pub received_by: Option<String>,
    pub quantity_received: Option<i32>,
    pub notes: Option<String>,
}

/// Linear transfer lifecycle
///
/// ```text
/// Requested --ship--> In Transit --receive--> Received
/// Requested --cancel--> Cancelled
/// In Transit --cancel--> Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Requested,
    InTransit,
    Received,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferAction {
    Ship,
    Receive,
    Cancel,
}

impl std::fmt::Display for TransferAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferAction::Ship => write!(f, "ship"),
            TransferAction::Receive => write!(f, "receive"),
            TransferAction::Cancel => write!(f, "cancel"),
        }
    }
}

impl StateMachine for TransferStatus {
    type Action = TransferAction;
    const ENTITY: &'static str = "transfer";

    fn next(self, action: TransferAction) -> Option<Self> {
        use TransferStatus::*;
        match (self, action) {
            (Requested, TransferAction::Ship) => Some(InTransit),
            (InTransit, TransferAction::Receive) => Some(Received),
            (Requested | InTransit, TransferAction::Cancel) => Some(Cancelled),
            _ => None,
        }
    }
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Requested => "requested",
            TransferStatus::InTransit => "in_transit",
            TransferStatus::Received => "received",
            TransferStatus::Cancelled => "cancelled",
        }
    }

    /// Whether the transfer's quantity currently sits in the Transit zone
    pub fn holds_transit_stock(&self) -> bool {
        *self == TransferStatus::InTransit
    }
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferStatus::Requested => write!(f, "Requested"),
            TransferStatus::InTransit => write!(f, "In Transit"),
            TransferStatus::Received => write!(f, "Received"),
            TransferStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl std::str::FromStr for TransferStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requested" => Ok(TransferStatus::Requested),
            "in_transit" => Ok(TransferStatus::InTransit),
            "received" => Ok(TransferStatus::Received),
            "cancelled" => Ok(TransferStatus::Cancelled),
            _ => Err(ParseStatusError::new("transfer status", s)),
        }
    }
}

/// Input for requesting a transfer
#[derive(Debug, Clone, Deserialize)]
pub struct NewTransfer {
    pub sku: String,
    pub quantity: i32,
    pub from_location: String,
    pub to_location: String,
    pub notes: Option<String>,
}

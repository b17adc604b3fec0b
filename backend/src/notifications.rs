//! Outbound notifications for transfer and reconciliation events
//!
//! Delivery is best-effort: events are dispatched on a spawned task after the
//! unit of work commits, and a failed delivery is logged but never reported
//! back to the caller.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use shared::{ReconciliationReport, Transfer};

use crate::config::NotificationConfig;

/// Header carrying the base64 HMAC-SHA256 of the request body
pub const SIGNATURE_HEADER: &str = "x-lumber-signature";

type HmacSha256 = Hmac<Sha256>;

/// Something worth telling the yard about
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InventoryEvent {
    TransferRequested {
        transfer: Transfer,
    },
    TransferShipped {
        transfer: Transfer,
    },
    TransferReceived {
        transfer: Transfer,
        /// Units still sitting in Transit after a partial receipt
        shortfall: i32,
    },
    TransferCancelled {
        transfer: Transfer,
        stock_returned: bool,
    },
    ReconciliationSubmitted {
        report: ReconciliationReport,
    },
}

impl InventoryEvent {
    /// One-line subject for the email relay
    pub fn subject(&self) -> String {
        match self {
            InventoryEvent::TransferRequested { transfer } => format!(
                "Transfer #{} requested: {} x {} from {} to {}",
                transfer.id,
                transfer.quantity,
                transfer.sku,
                transfer.from_location,
                transfer.to_location
            ),
            InventoryEvent::TransferShipped { transfer } => format!(
                "Transfer #{} shipped: {} x {} to {}",
                transfer.id, transfer.quantity, transfer.sku, transfer.to_location
            ),
            InventoryEvent::TransferReceived {
                transfer,
                shortfall,
            } if *shortfall > 0 => format!(
                "Transfer #{} received short: {} of {} x {} at {}",
                transfer.id,
                transfer.quantity_received.unwrap_or(0),
                transfer.quantity,
                transfer.sku,
                transfer.to_location
            ),
            InventoryEvent::TransferReceived { transfer, .. } => format!(
                "Transfer #{} received: {} x {} at {}",
                transfer.id, transfer.quantity, transfer.sku, transfer.to_location
            ),
            InventoryEvent::TransferCancelled { transfer, .. } => {
                format!("Transfer #{} cancelled", transfer.id)
            }
            InventoryEvent::ReconciliationSubmitted { report } => format!(
                "Physical count at {}: {} discrepancies",
                report.location_id, report.discrepancy_count
            ),
        }
    }
}

/// Delivery channel for inventory events
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &InventoryEvent) -> anyhow::Result<()>;
}

/// Writes events to the application log
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: &InventoryEvent) -> anyhow::Result<()> {
        tracing::info!(subject = %event.subject(), "Inventory event");
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    subject: String,
    recipients: &'a [String],
    #[serde(flatten)]
    event: &'a InventoryEvent,
}

/// Posts events as JSON to an email relay
#[derive(Clone)]
pub struct WebhookNotifier {
    url: String,
    secret: Option<String>,
    recipients: Vec<String>,
    http_client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(
        url: String,
        secret: Option<String>,
        recipients: Vec<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url,
            secret,
            recipients,
            http_client,
        })
    }
}

/// Base64 HMAC-SHA256 of `body` under `secret`
pub fn sign(secret: &str, body: &[u8]) -> anyhow::Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| anyhow::anyhow!("Failed to create HMAC"))?;
    mac.update(body);
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, event: &InventoryEvent) -> anyhow::Result<()> {
        let body = serde_json::to_vec(&WebhookPayload {
            subject: event.subject(),
            recipients: &self.recipients,
            event,
        })?;

        let mut request = self
            .http_client
            .post(&self.url)
            .header("Content-Type", "application/json");
        if let Some(secret) = &self.secret {
            request = request.header(SIGNATURE_HEADER, sign(secret, &body)?);
        }

        let response = request.body(body).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("Email relay responded with {}", response.status());
        }
        Ok(())
    }
}

/// Pick the notifier the configuration asks for
pub fn from_config(config: &NotificationConfig) -> anyhow::Result<Arc<dyn Notifier>> {
    match &config.webhook_url {
        Some(url) => {
            tracing::info!("Sending notifications to {}", url);
            Ok(Arc::new(WebhookNotifier::new(
                url.clone(),
                config.webhook_secret.clone(),
                config.recipients.clone(),
                Duration::from_secs(config.timeout_secs),
            )?))
        }
        None => Ok(Arc::new(LogNotifier)),
    }
}

/// Fire and forget; must only be called after the unit of work committed
pub fn dispatch(notifier: &Arc<dyn Notifier>, event: InventoryEvent) {
    let notifier = Arc::clone(notifier);
    tokio::spawn(async move {
        if let Err(e) = notifier.notify(&event).await {
            tracing::error!(subject = %event.subject(), "Failed to send notification: {:#}", e);
        }
    });
}

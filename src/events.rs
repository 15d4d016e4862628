use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::entities::inventory_movement::MovementReason;

/// Events emitted by the services after their transactions commit.
/// Consumers must treat these as notifications; the ledger rows are the
/// authoritative record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    PurchaseOrderCreated {
        order_id: i64,
        order_number: String,
    },
    PurchaseOrderIssued(i64),
    PurchaseOrderCancelled(i64),
    PurchaseOrderDeleted(i64),
    PurchaseOrderLineRemoved {
        order_id: i64,
        line_id: i64,
    },
    PurchaseOrderReceived {
        order_id: i64,
        line_id: i64,
        product_id: i64,
        warehouse_id: i64,
        quantity: Decimal,
    },
    StockIssued {
        product_id: i64,
        warehouse_id: i64,
        quantity: Decimal,
        reason: MovementReason,
    },
    OperatorCleared {
        operator_id: String,
        movements: u64,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the receiver is gone.
    /// Used after a transaction has already committed, where the mutation
    /// must not be reported as failed because of a dropped consumer.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event.clone()).await {
            error!(?event, "event dropped: {}", e);
        }
    }
}

/// Drains the event channel and logs each event. Runs until every sender
/// handle has been dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        info!(?event, "processing event");
    }
    info!("event channel closed, processor shutting down");
}

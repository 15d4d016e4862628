use rust_decimal::Decimal;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait, IsolationLevel, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    entities::{
        inventory_movement::{self, MovementDirection, MovementReason},
        product::Entity as ProductEntity,
        warehouse::Entity as WarehouseEntity,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        movements::{MovementLedgerService, NewMovement},
        stock::StockQueryService,
    },
};

/// A manual outbound issue: stock leaving a warehouse for a sale or for
/// internal consumption.
#[derive(Debug, Clone, Deserialize)]
pub struct OutboundRequest {
    pub product_id: i64,
    pub warehouse_id: i64,
    pub quantity: Decimal,
    pub reason: MovementReason,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

/// Issues outbound stock movements, guarding against negative balances.
#[derive(Clone)]
pub struct OutboundService {
    db: Arc<DatabaseConnection>,
    ledger: MovementLedgerService,
    event_sender: EventSender,
}

impl OutboundService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        ledger: MovementLedgerService,
        event_sender: EventSender,
    ) -> Self {
        Self {
            db,
            ledger,
            event_sender,
        }
    }

    /// Issues stock out of a warehouse.
    ///
    /// The availability check and the ledger append happen in one
    /// transaction. After the append the balance is recomputed inside the
    /// same transaction; if a concurrent issue drove it negative, the
    /// transaction rolls back with a conflict instead of committing an
    /// oversold ledger.
    #[instrument(skip(self))]
    pub async fn issue(
        &self,
        request: OutboundRequest,
        operator_id: Option<String>,
    ) -> Result<inventory_movement::Model, ServiceError> {
        if request.quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Outbound quantity must be greater than zero".to_string(),
            ));
        }

        if !matches!(
            request.reason,
            MovementReason::Sale | MovementReason::Consumption
        ) {
            return Err(ServiceError::ValidationError(format!(
                "Reason {} is not valid for a manual outbound issue",
                request.reason
            )));
        }

        let db = &*self.db;
        // SQLite serializes writers on its own; other backends need
        // serializable isolation so the post-append balance check observes
        // competing uncommitted issues.
        let txn = match db.get_database_backend() {
            DbBackend::Sqlite => db.begin().await,
            _ => {
                db.begin_with_config(Some(IsolationLevel::Serializable), None)
                    .await
            }
        }
        .map_err(ServiceError::db_error)?;

        let product = ProductEntity::find_by_id(request.product_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .filter(|p| p.active)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", request.product_id))
            })?;

        let warehouse = WarehouseEntity::find_by_id(request.warehouse_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .filter(|w| w.active)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Warehouse {} not found", request.warehouse_id))
            })?;

        let available =
            StockQueryService::on_hand(&txn, request.product_id, request.warehouse_id).await?;
        if available < request.quantity {
            return Err(ServiceError::InsufficientStock(format!(
                "available: {}",
                available
            )));
        }

        let movement = self
            .ledger
            .append(
                &txn,
                NewMovement {
                    product_id: request.product_id,
                    warehouse_id: request.warehouse_id,
                    direction: MovementDirection::Out,
                    reason: request.reason,
                    quantity: request.quantity,
                    unit_cost: None,
                    purchase_order_line_id: None,
                    operator_id,
                    reference: request.reference.clone(),
                    notes: request.notes.clone(),
                },
            )
            .await?;

        // Re-check inside the transaction; a concurrent issue may have
        // drained the balance between our read and our append.
        let balance =
            StockQueryService::on_hand(&txn, request.product_id, request.warehouse_id).await?;
        if balance < Decimal::ZERO {
            return Err(ServiceError::Conflict(format!(
                "Stock for product {} in warehouse {} was issued concurrently, retry",
                product.sku, warehouse.code
            )));
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        self.event_sender
            .send_or_log(Event::StockIssued {
                product_id: request.product_id,
                warehouse_id: request.warehouse_id,
                quantity: request.quantity,
                reason: request.reason,
            })
            .await;

        info!(
            "Issued {} x product {} out of warehouse {} ({})",
            request.quantity, product.sku, warehouse.code, request.reason
        );

        Ok(movement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use tokio::sync::mpsc;

    fn service() -> OutboundService {
        let (tx, _rx) = mpsc::channel(8);
        let db = Arc::new(DatabaseConnection::Disconnected);
        let sender = EventSender::new(tx);
        OutboundService::new(
            db.clone(),
            MovementLedgerService::new(db, sender.clone()),
            sender,
        )
    }

    fn request(quantity: Decimal, reason: MovementReason) -> OutboundRequest {
        OutboundRequest {
            product_id: 1,
            warehouse_id: 1,
            quantity,
            reason,
            reference: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn rejects_nonpositive_quantity_before_touching_db() {
        let svc = service();
        let err = svc
            .issue(request(dec!(0), MovementReason::Sale), None)
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(_));
    }

    #[tokio::test]
    async fn rejects_inbound_reasons_before_touching_db() {
        let svc = service();
        for reason in [
            MovementReason::Purchase,
            MovementReason::CustomerReturn,
            MovementReason::Adjustment,
        ] {
            let err = svc.issue(request(dec!(1), reason), None).await.unwrap_err();
            assert_matches!(err, ServiceError::ValidationError(_));
        }
    }
}

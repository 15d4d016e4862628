use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::{
    entities::{
        inventory_movement::{MovementDirection, MovementReason},
        purchase_order::{self, Entity as OrderEntity, PurchaseOrderStatus},
        purchase_order_line::{self, Entity as LineEntity},
        warehouse::Entity as WarehouseEntity,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::movements::{MovementLedgerService, NewMovement},
};

/// One requested receipt quantity against a purchase order line.
#[derive(Debug, Clone, Deserialize)]
pub struct ReceiveLine {
    pub line_id: i64,
    pub quantity: Decimal,
}

/// Outcome for one line of a receipt. `accepted` may be lower than the
/// requested quantity when the line was close to fully received, and zero
/// when the line was skipped entirely.
#[derive(Debug, Clone, Serialize)]
pub struct ReceiptLineResult {
    pub line_id: i64,
    pub requested: Decimal,
    pub accepted: Decimal,
}

/// Result of a receipt against a purchase order.
#[derive(Debug, Clone, Serialize)]
pub struct ReceiptSummary {
    pub order_id: i64,
    pub status: PurchaseOrderStatus,
    pub lines: Vec<ReceiptLineResult>,
}

/// Quantity to accept for a line: the requested amount, capped at what is
/// still outstanding. Never negative, even when the line is over-received.
pub fn accepted_quantity(requested: Decimal, ordered: Decimal, received: Decimal) -> Decimal {
    let pending = ordered - received;
    requested.min(pending).max(Decimal::ZERO)
}

/// Receives goods against purchase orders, appending purchase movements to
/// the ledger and advancing the order status.
#[derive(Clone)]
pub struct ReceivingService {
    db: Arc<DatabaseConnection>,
    ledger: MovementLedgerService,
    event_sender: EventSender,
}

struct AcceptedLine {
    line_id: i64,
    product_id: i64,
    quantity: Decimal,
}

impl ReceivingService {
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

    /// Receives goods against a purchase order in a single transaction.
    ///
    /// Unknown lines, non-positive quantities, and lines that are already
    /// fully received are skipped without failing the receipt. Accepted
    /// quantities are clamped so that `quantity_received` can never exceed
    /// `quantity_ordered`. Each line increment is guarded against concurrent
    /// receipts; losing the race rolls the whole receipt back with a
    /// conflict, and the caller may retry.
    #[instrument(skip(self, lines))]
    pub async fn receive(
        &self,
        order_id: i64,
        warehouse_id: i64,
        lines: Vec<ReceiveLine>,
        operator_id: Option<String>,
    ) -> Result<ReceiptSummary, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let order = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Purchase order {} not found", order_id))
            })?;

        if order.status == PurchaseOrderStatus::Cancelled {
            return Err(ServiceError::ValidationError(format!(
                "Purchase order {} is cancelled and cannot receive goods",
                order.order_number
            )));
        }

        let warehouse = WarehouseEntity::find_by_id(warehouse_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Receiving warehouse {} does not exist",
                    warehouse_id
                ))
            })?;
        if !warehouse.active {
            return Err(ServiceError::ValidationError(format!(
                "Receiving warehouse {} is inactive",
                warehouse.code
            )));
        }

        let order_lines = LineEntity::find()
            .filter(purchase_order_line::Column::PurchaseOrderId.eq(order_id))
            .order_by_asc(purchase_order_line::Column::Id)
            .all(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        let mut results = Vec::with_capacity(lines.len());
        let mut accepted_lines: Vec<AcceptedLine> = Vec::new();
        // received quantities after this receipt, for the status decision
        let mut received_after: std::collections::HashMap<i64, Decimal> = order_lines
            .iter()
            .map(|l| (l.id, l.quantity_received))
            .collect();

        for request in &lines {
            let Some(line) = order_lines.iter().find(|l| l.id == request.line_id) else {
                warn!(
                    "Skipping receipt line {}: not part of order {}",
                    request.line_id, order_id
                );
                results.push(ReceiptLineResult {
                    line_id: request.line_id,
                    requested: request.quantity,
                    accepted: Decimal::ZERO,
                });
                continue;
            };

            if request.quantity <= Decimal::ZERO {
                results.push(ReceiptLineResult {
                    line_id: line.id,
                    requested: request.quantity,
                    accepted: Decimal::ZERO,
                });
                continue;
            }

            // Earlier occurrences of the same line within this request count
            // toward the clamp, so duplicates cannot jointly over-receive.
            let observed = received_after[&line.id];

            let accepted = accepted_quantity(request.quantity, line.quantity_ordered, observed);
            if accepted <= Decimal::ZERO {
                results.push(ReceiptLineResult {
                    line_id: line.id,
                    requested: request.quantity,
                    accepted: Decimal::ZERO,
                });
                continue;
            }

            let new_received = observed + accepted;

            // Guarded increment: only applies if nobody else has received
            // against this line since we read it.
            let updated = LineEntity::update_many()
                .col_expr(
                    purchase_order_line::Column::QuantityReceived,
                    Expr::value(new_received),
                )
                .col_expr(
                    purchase_order_line::Column::UpdatedAt,
                    Expr::value(Utc::now()),
                )
                .filter(purchase_order_line::Column::Id.eq(line.id))
                .filter(purchase_order_line::Column::QuantityReceived.eq(observed))
                .exec(&txn)
                .await
                .map_err(ServiceError::db_error)?;

            if updated.rows_affected == 0 {
                return Err(ServiceError::Conflict(format!(
                    "Purchase order line {} was received concurrently, retry the receipt",
                    line.id
                )));
            }

            self.ledger
                .append(
                    &txn,
                    NewMovement {
                        product_id: line.product_id,
                        warehouse_id,
                        direction: MovementDirection::In,
                        reason: MovementReason::Purchase,
                        quantity: accepted,
                        unit_cost: Some(line.unit_cost),
                        purchase_order_line_id: Some(line.id),
                        operator_id: operator_id.clone(),
                        reference: Some(order.order_number.clone()),
                        notes: Some("Purchase order receipt".to_string()),
                    },
                )
                .await?;

            received_after.insert(line.id, new_received);
            accepted_lines.push(AcceptedLine {
                line_id: line.id,
                product_id: line.product_id,
                quantity: accepted,
            });
            results.push(ReceiptLineResult {
                line_id: line.id,
                requested: request.quantity,
                accepted,
            });
        }

        let fully_received = order_lines
            .iter()
            .all(|l| received_after[&l.id] >= l.quantity_ordered);
        let new_status = if fully_received {
            PurchaseOrderStatus::FullyReceived
        } else {
            PurchaseOrderStatus::PartiallyReceived
        };

        OrderEntity::update_many()
            .col_expr(
                purchase_order::Column::ReceivingWarehouseId,
                Expr::value(Some(warehouse_id)),
            )
            .col_expr(purchase_order::Column::Status, Expr::value(new_status))
            .col_expr(purchase_order::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(purchase_order::Column::Id.eq(order_id))
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        for accepted in &accepted_lines {
            self.event_sender
                .send_or_log(Event::PurchaseOrderReceived {
                    order_id,
                    line_id: accepted.line_id,
                    product_id: accepted.product_id,
                    warehouse_id,
                    quantity: accepted.quantity,
                })
                .await;
        }

        info!(
            "Received {} of {} requested lines on order {}, status now {:?}",
            accepted_lines.len(),
            lines.len(),
            order.order_number,
            new_status
        );

        Ok(ReceiptSummary {
            order_id,
            status: new_status,
            lines: results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn accepted_is_requested_when_enough_pending() {
        assert_eq!(accepted_quantity(dec!(3), dec!(10), dec!(2)), dec!(3));
    }

    #[test]
    fn accepted_clamps_to_pending() {
        assert_eq!(accepted_quantity(dec!(1000), dec!(10), dec!(7)), dec!(3));
    }

    #[test]
    fn accepted_is_zero_when_fully_received() {
        assert_eq!(accepted_quantity(dec!(5), dec!(10), dec!(10)), dec!(0));
    }

    #[test]
    fn accepted_never_goes_negative() {
        // over-received line, e.g. from historical data
        assert_eq!(accepted_quantity(dec!(5), dec!(10), dec!(12)), dec!(0));
    }
}

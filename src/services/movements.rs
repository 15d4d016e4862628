use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Value,
};
use sea_orm::sea_query::Expr;
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::{
    entities::inventory_movement::{
        self, Entity as MovementEntity, MovementDirection, MovementReason,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// A movement to be appended to the ledger. The `occurred_at` timestamp is
/// assigned at insert time.
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub product_id: i64,
    pub warehouse_id: i64,
    pub direction: MovementDirection,
    pub reason: MovementReason,
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub purchase_order_line_id: Option<i64>,
    pub operator_id: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

/// Rejects movements that would corrupt the ledger. Quantities are strictly
/// positive; the direction carries the sign. Purchase receipts must be inbound
/// and linked to the purchase order line they fulfil.
pub fn validate_movement(movement: &NewMovement) -> Result<(), ServiceError> {
    if movement.quantity <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Movement quantity must be greater than zero".to_string(),
        ));
    }

    if let Some(cost) = movement.unit_cost {
        if cost < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Movement unit cost cannot be negative".to_string(),
            ));
        }
    }

    if movement.reason == MovementReason::Purchase {
        if movement.direction != MovementDirection::In {
            return Err(ServiceError::ValidationError(
                "Purchase movements must be inbound".to_string(),
            ));
        }
        if movement.purchase_order_line_id.is_none() {
            return Err(ServiceError::ValidationError(
                "Purchase movements require a purchase order line".to_string(),
            ));
        }
    }

    Ok(())
}

/// Filters for listing ledger entries.
#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    pub product_id: Option<i64>,
    pub warehouse_id: Option<i64>,
    pub operator_id: Option<String>,
    pub direction: Option<MovementDirection>,
}

/// Append-only access to the inventory movement ledger.
#[derive(Clone)]
pub struct MovementLedgerService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl MovementLedgerService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Appends one movement inside the caller's connection or transaction.
    /// Rows are never updated or deleted after this insert; corrections are
    /// expressed as compensating movements.
    pub async fn append<C: ConnectionTrait>(
        &self,
        conn: &C,
        movement: NewMovement,
    ) -> Result<inventory_movement::Model, ServiceError> {
        validate_movement(&movement)?;

        let row = inventory_movement::ActiveModel {
            product_id: Set(movement.product_id),
            warehouse_id: Set(movement.warehouse_id),
            direction: Set(movement.direction),
            reason: Set(movement.reason),
            quantity: Set(movement.quantity),
            unit_cost: Set(movement.unit_cost),
            purchase_order_line_id: Set(movement.purchase_order_line_id),
            occurred_at: Set(Utc::now()),
            operator_id: Set(movement.operator_id),
            reference: Set(movement.reference),
            notes: Set(movement.notes),
            ..Default::default()
        };

        row.insert(conn).await.map_err(|e| {
            error!("Failed to append inventory movement: {}", e);
            ServiceError::db_error(e)
        })
    }

    /// Lists ledger entries, newest first.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: MovementFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<inventory_movement::Model>, u64), ServiceError> {
        let db = &*self.db;

        let mut query = MovementEntity::find();
        if let Some(product_id) = filter.product_id {
            query = query.filter(inventory_movement::Column::ProductId.eq(product_id));
        }
        if let Some(warehouse_id) = filter.warehouse_id {
            query = query.filter(inventory_movement::Column::WarehouseId.eq(warehouse_id));
        }
        if let Some(operator_id) = &filter.operator_id {
            query = query.filter(inventory_movement::Column::OperatorId.eq(operator_id.clone()));
        }
        if let Some(direction) = filter.direction {
            query = query.filter(inventory_movement::Column::Direction.eq(direction));
        }

        let paginator = query
            .order_by_desc(inventory_movement::Column::OccurredAt)
            .order_by_desc(inventory_movement::Column::Id)
            .paginate(db, per_page.max(1));

        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok((items, total))
    }

    /// Detaches an operator from every movement they recorded. The movements
    /// themselves are preserved; only the identity link is cleared, so the
    /// operator account can be removed without breaking the ledger.
    #[instrument(skip(self))]
    pub async fn clear_operator(&self, operator_id: &str) -> Result<u64, ServiceError> {
        let db = &*self.db;

        let result = MovementEntity::update_many()
            .col_expr(
                inventory_movement::Column::OperatorId,
                Expr::value(Value::String(None)),
            )
            .filter(inventory_movement::Column::OperatorId.eq(operator_id))
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;

        info!(
            "Cleared operator {} from {} movements",
            operator_id, result.rows_affected
        );

        self.event_sender
            .send_or_log(Event::OperatorCleared {
                operator_id: operator_id.to_string(),
                movements: result.rows_affected,
            })
            .await;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn base_movement() -> NewMovement {
        NewMovement {
            product_id: 1,
            warehouse_id: 1,
            direction: MovementDirection::In,
            reason: MovementReason::Adjustment,
            quantity: dec!(5),
            unit_cost: None,
            purchase_order_line_id: None,
            operator_id: None,
            reference: None,
            notes: None,
        }
    }

    #[test]
    fn accepts_plain_inbound_adjustment() {
        assert!(validate_movement(&base_movement()).is_ok());
    }

    #[test]
    fn rejects_nonpositive_quantity() {
        let mut m = base_movement();
        m.quantity = Decimal::ZERO;
        assert_matches!(validate_movement(&m), Err(ServiceError::ValidationError(_)));

        m.quantity = dec!(-1);
        assert_matches!(validate_movement(&m), Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn rejects_negative_unit_cost() {
        let mut m = base_movement();
        m.unit_cost = Some(dec!(-0.01));
        assert_matches!(validate_movement(&m), Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn purchase_requires_inbound_direction_and_line_link() {
        let mut m = base_movement();
        m.reason = MovementReason::Purchase;
        m.direction = MovementDirection::Out;
        m.purchase_order_line_id = Some(10);
        assert_matches!(validate_movement(&m), Err(ServiceError::ValidationError(_)));

        m.direction = MovementDirection::In;
        m.purchase_order_line_id = None;
        assert_matches!(validate_movement(&m), Err(ServiceError::ValidationError(_)));

        m.purchase_order_line_id = Some(10);
        assert!(validate_movement(&m).is_ok());
    }
}

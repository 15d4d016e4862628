use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::{
    entities::{
        inventory_movement::{self, Entity as MovementEntity},
        product::Entity as ProductEntity,
        purchase_order::{self, Entity as OrderEntity, PurchaseOrderStatus},
        purchase_order_line::{self, Entity as LineEntity},
        supplier::Entity as SupplierEntity,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

const DEFAULT_CURRENCY: &str = "USD";

/// Input for one line of a new purchase order.
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub product_id: i64,
    pub quantity_ordered: Decimal,
    pub unit_cost: Decimal,
    pub tax_pct: Option<Decimal>,
    pub discount_pct: Option<Decimal>,
}

/// Input for a new purchase order. Orders are created in draft and may start
/// without lines.
#[derive(Debug, Clone)]
pub struct NewPurchaseOrder {
    pub order_number: String,
    pub supplier_id: i64,
    pub expected_date: Option<DateTime<Utc>>,
    pub currency: Option<String>,
    pub notes: Option<String>,
    pub lines: Vec<NewOrderLine>,
}

/// A purchase order together with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOrderWithLines {
    #[serde(flatten)]
    pub order: purchase_order::Model,
    pub lines: Vec<purchase_order_line::Model>,
}

fn validate_pct(value: Option<Decimal>, field: &str) -> Result<(), ServiceError> {
    if let Some(pct) = value {
        if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
            return Err(ServiceError::ValidationError(format!(
                "{} must be between 0 and 100",
                field
            )));
        }
    }
    Ok(())
}

fn validate_new_line(line: &NewOrderLine) -> Result<(), ServiceError> {
    if line.quantity_ordered <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Line quantity must be greater than zero".to_string(),
        ));
    }
    if line.unit_cost < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Line unit cost cannot be negative".to_string(),
        ));
    }
    validate_pct(line.tax_pct, "tax_pct")?;
    validate_pct(line.discount_pct, "discount_pct")?;
    Ok(())
}

/// Purchase order lifecycle management. Receiving lives in its own service;
/// this one covers creation, issue, cancellation, and removal.
#[derive(Clone)]
pub struct PurchaseOrderService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl PurchaseOrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Creates a draft purchase order with its lines.
    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        input: NewPurchaseOrder,
    ) -> Result<PurchaseOrderWithLines, ServiceError> {
        let order_number = input.order_number.trim().to_string();
        if order_number.is_empty() {
            return Err(ServiceError::ValidationError(
                "Order number must not be empty".to_string(),
            ));
        }
        for line in &input.lines {
            validate_new_line(line)?;
        }

        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        SupplierEntity::find_by_id(input.supplier_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supplier {} not found", input.supplier_id))
            })?;

        let duplicate = OrderEntity::find()
            .filter(purchase_order::Column::OrderNumber.eq(order_number.clone()))
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Purchase order {} already exists",
                order_number
            )));
        }

        for line in &input.lines {
            let product = ProductEntity::find_by_id(line.product_id)
                .one(&txn)
                .await
                .map_err(ServiceError::db_error)?
                .filter(|p| p.active);
            if product.is_none() {
                return Err(ServiceError::NotFound(format!(
                    "Product {} not found",
                    line.product_id
                )));
            }
        }

        let now = Utc::now();
        let order = purchase_order::ActiveModel {
            order_number: Set(order_number.clone()),
            supplier_id: Set(input.supplier_id),
            issue_date: Set(now),
            expected_date: Set(input.expected_date),
            status: Set(PurchaseOrderStatus::Draft),
            currency: Set(input
                .currency
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string())),
            notes: Set(input.notes),
            receiving_warehouse_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let order = order.insert(&txn).await.map_err(|e| {
            error!("Failed to create purchase order {}: {}", order_number, e);
            ServiceError::db_error(e)
        })?;

        let mut lines = Vec::with_capacity(input.lines.len());
        for line in input.lines {
            let row = purchase_order_line::ActiveModel {
                purchase_order_id: Set(order.id),
                product_id: Set(line.product_id),
                quantity_ordered: Set(line.quantity_ordered),
                quantity_received: Set(Decimal::ZERO),
                unit_cost: Set(line.unit_cost),
                tax_pct: Set(line.tax_pct),
                discount_pct: Set(line.discount_pct),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };
            lines.push(row.insert(&txn).await.map_err(ServiceError::db_error)?);
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        self.event_sender
            .send_or_log(Event::PurchaseOrderCreated {
                order_id: order.id,
                order_number: order.order_number.clone(),
            })
            .await;

        info!(
            "Purchase order {} created with {} lines",
            order.order_number,
            lines.len()
        );

        Ok(PurchaseOrderWithLines { order, lines })
    }

    /// Moves a draft order to issued.
    #[instrument(skip(self))]
    pub async fn issue(&self, order_id: i64) -> Result<purchase_order::Model, ServiceError> {
        let order = self
            .transition(order_id, PurchaseOrderStatus::Issued, |status| {
                status == PurchaseOrderStatus::Draft
            })
            .await?;

        self.event_sender
            .send_or_log(Event::PurchaseOrderIssued(order_id))
            .await;
        Ok(order)
    }

    /// Cancels a non-terminal order. Ledger entries from earlier receipts are
    /// untouched; cancellation only stops further receiving.
    #[instrument(skip(self))]
    pub async fn cancel(&self, order_id: i64) -> Result<purchase_order::Model, ServiceError> {
        let order = self
            .transition(order_id, PurchaseOrderStatus::Cancelled, |status| {
                !status.is_terminal()
            })
            .await?;

        self.event_sender
            .send_or_log(Event::PurchaseOrderCancelled(order_id))
            .await;
        Ok(order)
    }

    async fn transition(
        &self,
        order_id: i64,
        target: PurchaseOrderStatus,
        allowed: impl Fn(PurchaseOrderStatus) -> bool,
    ) -> Result<purchase_order::Model, ServiceError> {
        let db = &*self.db;

        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Purchase order {} not found", order_id))
            })?;

        if !allowed(order.status) {
            return Err(ServiceError::InvalidOperation(format!(
                "Purchase order {} cannot move from {:?} to {:?}",
                order.order_number, order.status, target
            )));
        }

        let mut active: purchase_order::ActiveModel = order.into();
        active.status = Set(target);
        active.updated_at = Set(Utc::now());
        active.update(db).await.map_err(ServiceError::db_error)
    }

    /// Fetches one order with its lines.
    pub async fn get(&self, order_id: i64) -> Result<PurchaseOrderWithLines, ServiceError> {
        let db = &*self.db;

        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Purchase order {} not found", order_id))
            })?;

        let lines = order
            .find_related(LineEntity)
            .order_by_asc(purchase_order_line::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(PurchaseOrderWithLines { order, lines })
    }

    /// Lists orders, newest first, optionally filtered by status.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        status: Option<PurchaseOrderStatus>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<purchase_order::Model>, u64), ServiceError> {
        let db = &*self.db;

        let mut query = OrderEntity::find();
        if let Some(status) = status {
            query = query.filter(purchase_order::Column::Status.eq(status));
        }

        let paginator = query
            .order_by_desc(purchase_order::Column::Id)
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

    /// Deletes an order and its lines. Refused once any line has a ledger
    /// movement, because movements are immutable and must keep their link.
    #[instrument(skip(self))]
    pub async fn delete(&self, order_id: i64) -> Result<(), ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let order = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Purchase order {} not found", order_id))
            })?;

        let line_ids: Vec<i64> = order
            .find_related(LineEntity)
            .all(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|l| l.id)
            .collect();

        if !line_ids.is_empty() {
            let movements = MovementEntity::find()
                .filter(inventory_movement::Column::PurchaseOrderLineId.is_in(line_ids))
                .count(&txn)
                .await
                .map_err(ServiceError::db_error)?;
            if movements > 0 {
                return Err(ServiceError::Conflict(format!(
                    "Purchase order {} has linked inventory movements",
                    order.order_number
                )));
            }
        }

        LineEntity::delete_many()
            .filter(purchase_order_line::Column::PurchaseOrderId.eq(order_id))
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        OrderEntity::delete_by_id(order_id)
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        self.event_sender
            .send_or_log(Event::PurchaseOrderDeleted(order_id))
            .await;

        info!("Purchase order {} deleted", order_id);
        Ok(())
    }

    /// Removes one line from an order, with the same movement guard as
    /// order deletion.
    #[instrument(skip(self))]
    pub async fn remove_line(&self, order_id: i64, line_id: i64) -> Result<(), ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let line = LineEntity::find_by_id(line_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .filter(|l| l.purchase_order_id == order_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Line {} not found on purchase order {}",
                    line_id, order_id
                ))
            })?;

        let movements = MovementEntity::find()
            .filter(inventory_movement::Column::PurchaseOrderLineId.eq(line_id))
            .count(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        if movements > 0 {
            return Err(ServiceError::Conflict(format!(
                "Line {} has linked inventory movements",
                line_id
            )));
        }

        line.delete(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        self.event_sender
            .send_or_log(Event::PurchaseOrderLineRemoved { order_id, line_id })
            .await;

        Ok(())
    }
}

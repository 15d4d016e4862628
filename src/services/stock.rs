use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

use crate::{
    entities::{
        inventory_movement::{self, Entity as MovementEntity},
        product::{self, Entity as ProductEntity},
        warehouse::{self, Entity as WarehouseEntity},
    },
    errors::ServiceError,
};

/// On-hand stock for one product in one warehouse, derived entirely from the
/// movement ledger.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StockBalance {
    pub product_id: i64,
    pub product_sku: String,
    pub product_name: String,
    pub warehouse_id: i64,
    pub warehouse_code: String,
    pub warehouse_name: String,
    #[schema(value_type = String, example = "42.00")]
    pub on_hand: Decimal,
    pub last_movement_at: Option<DateTime<Utc>>,
}

/// Filters for the stock report.
#[derive(Debug, Clone, Default)]
pub struct StockFilter {
    pub product_id: Option<i64>,
    pub warehouse_id: Option<i64>,
}

/// Reduces ledger rows to per-pair balances. Inbound quantities add, outbound
/// subtract, and the most recent `occurred_at` is tracked per pair.
pub fn fold_balances(
    movements: &[inventory_movement::Model],
) -> HashMap<(i64, i64), (Decimal, DateTime<Utc>)> {
    let mut balances: HashMap<(i64, i64), (Decimal, DateTime<Utc>)> = HashMap::new();
    for movement in movements {
        let entry = balances
            .entry((movement.product_id, movement.warehouse_id))
            .or_insert((Decimal::ZERO, movement.occurred_at));
        entry.0 += movement.signed_quantity();
        if movement.occurred_at > entry.1 {
            entry.1 = movement.occurred_at;
        }
    }
    balances
}

/// Read-side stock queries. There is no materialized balance table; every
/// answer is a reduction over the ledger.
#[derive(Clone)]
pub struct StockQueryService {
    db: Arc<DatabaseConnection>,
}

impl StockQueryService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// On-hand quantity for one product/warehouse pair, usable inside an open
    /// transaction. Returns zero when the pair has no movements.
    pub async fn on_hand<C: ConnectionTrait>(
        conn: &C,
        product_id: i64,
        warehouse_id: i64,
    ) -> Result<Decimal, ServiceError> {
        let movements = MovementEntity::find()
            .filter(inventory_movement::Column::ProductId.eq(product_id))
            .filter(inventory_movement::Column::WarehouseId.eq(warehouse_id))
            .all(conn)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(movements.iter().map(|m| m.signed_quantity()).sum())
    }

    /// Stock report across all product/warehouse pairs that have at least one
    /// movement, sorted by product name then warehouse code. Pairs with no
    /// movements do not appear; a zero or negative balance from offsetting
    /// movements does.
    #[instrument(skip(self))]
    pub async fn current_stock(
        &self,
        filter: StockFilter,
    ) -> Result<Vec<StockBalance>, ServiceError> {
        let db = &*self.db;

        let mut query = MovementEntity::find();
        if let Some(product_id) = filter.product_id {
            query = query.filter(inventory_movement::Column::ProductId.eq(product_id));
        }
        if let Some(warehouse_id) = filter.warehouse_id {
            query = query.filter(inventory_movement::Column::WarehouseId.eq(warehouse_id));
        }

        let movements = query.all(db).await.map_err(ServiceError::db_error)?;
        let balances = fold_balances(&movements);

        if balances.is_empty() {
            return Ok(Vec::new());
        }

        let product_ids: Vec<i64> = balances.keys().map(|(p, _)| *p).collect();
        let warehouse_ids: Vec<i64> = balances.keys().map(|(_, w)| *w).collect();

        let products: HashMap<i64, product::Model> = ProductEntity::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let warehouses: HashMap<i64, warehouse::Model> = WarehouseEntity::find()
            .filter(warehouse::Column::Id.is_in(warehouse_ids))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|w| (w.id, w))
            .collect();

        let mut rows: Vec<StockBalance> = balances
            .into_iter()
            .filter_map(|((product_id, warehouse_id), (on_hand, last_movement_at))| {
                let product = products.get(&product_id)?;
                let warehouse = warehouses.get(&warehouse_id)?;
                Some(StockBalance {
                    product_id,
                    product_sku: product.sku.clone(),
                    product_name: product.name.clone(),
                    warehouse_id,
                    warehouse_code: warehouse.code.clone(),
                    warehouse_name: warehouse.name.clone(),
                    on_hand,
                    last_movement_at: Some(last_movement_at),
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            a.product_name
                .cmp(&b.product_name)
                .then_with(|| a.warehouse_code.cmp(&b.warehouse_code))
        });

        Ok(rows)
    }
}

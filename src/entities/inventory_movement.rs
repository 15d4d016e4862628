use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};

/// Whether a movement adds to or removes from on-hand stock.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(3))")]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementDirection {
    #[sea_orm(string_value = "IN")]
    In,
    #[sea_orm(string_value = "OUT")]
    Out,
}

/// Why a movement occurred. Purchase receipts are the only reason that
/// requires a purchase-order line link, and they are always inbound.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "i16", db_type = "SmallInteger")]
pub enum MovementReason {
    #[sea_orm(num_value = 1)]
    Purchase,
    #[sea_orm(num_value = 2)]
    Sale,
    #[sea_orm(num_value = 3)]
    Consumption,
    #[sea_orm(num_value = 4)]
    CustomerReturn,
    #[sea_orm(num_value = 5)]
    SupplierReturn,
    #[sea_orm(num_value = 6)]
    TransferIn,
    #[sea_orm(num_value = 7)]
    TransferOut,
    #[sea_orm(num_value = 8)]
    Adjustment,
}

/// One atomic, immutable inventory quantity change. The ledger of these rows
/// is the single source of truth for stock on hand.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_movements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub product_id: i64,
    pub warehouse_id: i64,
    pub direction: MovementDirection,
    pub reason: MovementReason,
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub purchase_order_line_id: Option<i64>,
    pub occurred_at: DateTime<Utc>,
    pub operator_id: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

impl Model {
    /// Contribution of this movement to on-hand stock.
    pub fn signed_quantity(&self) -> Decimal {
        match self.direction {
            MovementDirection::In => self.quantity,
            MovementDirection::Out => -self.quantity,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::warehouse::Entity",
        from = "Column::WarehouseId",
        to = "super::warehouse::Column::Id"
    )]
    Warehouse,
    #[sea_orm(
        belongs_to = "super::purchase_order_line::Entity",
        from = "Column::PurchaseOrderLineId",
        to = "super::purchase_order_line::Column::Id"
    )]
    PurchaseOrderLine,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::warehouse::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Warehouse.def()
    }
}

impl Related<super::purchase_order_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrderLine.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub mod common;
pub mod movements;
pub mod purchase_orders;
pub mod stock;

use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub ledger: crate::services::movements::MovementLedgerService,
    pub stock: crate::services::stock::StockQueryService,
    pub receiving: crate::services::receiving::ReceivingService,
    pub outbound: crate::services::outbound::OutboundService,
    pub purchase_orders: crate::services::purchase_orders::PurchaseOrderService,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        let ledger = crate::services::movements::MovementLedgerService::new(
            db_pool.clone(),
            event_sender.clone(),
        );

        Self {
            ledger: ledger.clone(),
            stock: crate::services::stock::StockQueryService::new(db_pool.clone()),
            receiving: crate::services::receiving::ReceivingService::new(
                db_pool.clone(),
                ledger.clone(),
                event_sender.clone(),
            ),
            outbound: crate::services::outbound::OutboundService::new(
                db_pool.clone(),
                ledger,
                event_sender.clone(),
            ),
            purchase_orders: crate::services::purchase_orders::PurchaseOrderService::new(
                db_pool,
                event_sender,
            ),
        }
    }
}

pub mod movements;
pub mod outbound;
pub mod purchase_orders;
pub mod receiving;
pub mod stock;

pub mod inventory_movement;
pub mod product;
pub mod purchase_order;
pub mod purchase_order_line;
pub mod supplier;
pub mod warehouse;

//! Application services and ports.

#![forbid(unsafe_code)]

mod authorization;
mod history_ports;
mod history_service;
mod item_ports;
mod item_service;

pub use authorization::require_permission;
pub use history_ports::{HistoryFilter, HistoryRepository};
pub use history_service::HistoryService;
pub use item_ports::{ItemMutation, ItemRepository, SessionContext};
pub use item_service::ItemService;

//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_item_repository;
mod postgres_history_repository;
mod postgres_item_repository;
mod postgres_session_context;

pub use in_memory_item_repository::InMemoryItemRepository;
pub use postgres_history_repository::PostgresHistoryRepository;
pub use postgres_item_repository::PostgresItemRepository;

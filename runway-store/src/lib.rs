pub mod app_config;
pub mod database;
pub mod events;
pub mod flight_repo;
pub mod memory;
pub mod ticket_repo;
pub mod token_repo;
pub mod user_repo;

pub use app_config::{Config, ConfigLoadError, StorageBackend, TransitionPolicyConfig};
pub use database::DbClient;
pub use events::BroadcastNotifier;
pub use memory::MemoryStore;

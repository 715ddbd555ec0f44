pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};

use services::{AuthService, InventoryService, TopologyService};
use storage::LocalImageStore;

/// Shared handler state: one clone per request, all members cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub inventory: InventoryService,
    pub topology: TopologyService,
    pub auth: AuthService,
    pub images: LocalImageStore,
}

pub mod auth_service;
pub mod hierarchy;
pub mod inventory_service;
pub mod qr_service;
pub mod topology_service;

pub use auth_service::AuthService;
pub use inventory_service::InventoryService;
pub use topology_service::TopologyService;

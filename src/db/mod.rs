pub mod containers;
pub mod items;
pub mod pool;
pub mod users;

pub use pool::create_pool;

pub mod container;
pub mod item;
pub mod user;

pub use container::*;
pub use item::*;
pub use user::*;

use serde::{Deserialize, Deserializer};

/// Deserializes a field that distinguishes "absent" from "null": absent stays
/// `None`, an explicit `null` becomes `Some(None)` (clear the field), and a
/// value becomes `Some(Some(value))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

//! Cross-entity nesting invariants, consulted by every mutating entry point.
//!
//! The store alone cannot express "deletion forbidden while referenced" or
//! "placement must not form a cycle", so those checks live here.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::db;
use crate::error::{AppError, AppResult};

/// Hard bound on parent-chain traversal. Matches the topology resolver's
/// depth cap, so a chain the resolver can display is always accepted here.
pub const MAX_NESTING_DEPTH: u32 = 20;

/// A container may only be deleted once it holds no items and no child
/// containers. No cascading delete.
pub async fn ensure_container_deletable(
    conn: &mut PgConnection,
    container_id: Uuid,
) -> AppResult<()> {
    if db::containers::has_items(conn, container_id).await? {
        return Err(AppError::Conflict(
            "Cannot delete non-empty container. Remove items first.".to_string(),
        ));
    }
    if db::containers::has_child_containers(conn, container_id).await? {
        return Err(AppError::Conflict(
            "Cannot delete container with child containers.".to_string(),
        ));
    }
    Ok(())
}

/// An item may only be deleted once no other item references it as parent.
pub async fn ensure_item_deletable(conn: &mut PgConnection, item_id: Uuid) -> AppResult<()> {
    if db::items::has_child_items(conn, item_id).await? {
        return Err(AppError::Conflict(
            "Cannot delete item with child dependencies. Remove children first.".to_string(),
        ));
    }
    Ok(())
}

pub async fn ensure_container_exists(
    conn: &mut PgConnection,
    container_id: Uuid,
) -> AppResult<()> {
    if db::containers::get_by_id(conn, container_id).await?.is_none() {
        return Err(AppError::NotFound("Target container not found.".to_string()));
    }
    Ok(())
}

/// Validates assigning `parent_id` as the parent item of `item_id`: the
/// target must exist, must not be the item itself, and must not already have
/// the item among its ancestors (which would close a cycle). The ancestor
/// walk is bounded by [`MAX_NESTING_DEPTH`] so it terminates even over data
/// that predates this check.
pub async fn ensure_valid_parent_item(
    conn: &mut PgConnection,
    item_id: Uuid,
    parent_id: Uuid,
) -> AppResult<()> {
    if parent_id == item_id {
        return Err(AppError::InvalidInput(
            "Item cannot be its own parent.".to_string(),
        ));
    }

    let Some(mut current) = db::items::parent_of(conn, parent_id).await? else {
        return Err(AppError::NotFound("Target parent item not found.".to_string()));
    };

    let mut depth = 0;
    while let Some(ancestor) = current {
        if ancestor == item_id {
            return Err(AppError::InvalidInput(
                "Move would create a cycle in the item hierarchy.".to_string(),
            ));
        }
        depth += 1;
        if depth >= MAX_NESTING_DEPTH {
            break;
        }
        current = db::items::parent_of(conn, ancestor).await?.flatten();
    }

    Ok(())
}

/// Validates assigning `parent_id` as the parent container of
/// `container_id`. Containers share the self-reference rule with items.
pub async fn ensure_valid_parent_container(
    conn: &mut PgConnection,
    container_id: Uuid,
    parent_id: Uuid,
) -> AppResult<()> {
    if parent_id == container_id {
        return Err(AppError::InvalidInput(
            "Container cannot be its own parent.".to_string(),
        ));
    }
    ensure_container_exists(conn, parent_id).await
}

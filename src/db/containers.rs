use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::{map_unique_violation, AppResult};
use crate::models::{ContainerCreate, ContainerModel};

pub async fn insert(
    conn: &mut PgConnection,
    data: &ContainerCreate,
) -> AppResult<ContainerModel> {
    sqlx::query_as::<_, ContainerModel>(
        "INSERT INTO containers (name, description, location, qr_code_id, parent_container_id) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(&data.name)
    .bind(&data.description)
    .bind(&data.location)
    .bind(&data.qr_code_id)
    .bind(data.parent_container_id)
    .fetch_one(conn)
    .await
    .map_err(|e| map_unique_violation(e, "qr_code_id"))
}

pub async fn get_by_id(
    conn: &mut PgConnection,
    container_id: Uuid,
) -> AppResult<Option<ContainerModel>> {
    let container = sqlx::query_as::<_, ContainerModel>("SELECT * FROM containers WHERE id = $1")
        .bind(container_id)
        .fetch_optional(conn)
        .await?;
    Ok(container)
}

pub async fn get_by_qr_code(
    conn: &mut PgConnection,
    qr_code_id: &str,
) -> AppResult<Option<ContainerModel>> {
    let container =
        sqlx::query_as::<_, ContainerModel>("SELECT * FROM containers WHERE qr_code_id = $1")
            .bind(qr_code_id)
            .fetch_optional(conn)
            .await?;
    Ok(container)
}

pub async fn list_all(conn: &mut PgConnection) -> AppResult<Vec<ContainerModel>> {
    let containers =
        sqlx::query_as::<_, ContainerModel>("SELECT * FROM containers ORDER BY name ASC")
            .fetch_all(conn)
            .await?;
    Ok(containers)
}

pub async fn list_children(
    conn: &mut PgConnection,
    container_id: Uuid,
) -> AppResult<Vec<ContainerModel>> {
    let children = sqlx::query_as::<_, ContainerModel>(
        "SELECT * FROM containers WHERE parent_container_id = $1 ORDER BY name ASC",
    )
    .bind(container_id)
    .fetch_all(conn)
    .await?;
    Ok(children)
}

/// Writes the full merged row back; callers apply the patch first.
pub async fn update(
    conn: &mut PgConnection,
    container: &ContainerModel,
) -> AppResult<ContainerModel> {
    sqlx::query_as::<_, ContainerModel>(
        "UPDATE containers SET name = $2, description = $3, location = $4, \
         parent_container_id = $5, updated_at = NOW() \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(container.id)
    .bind(&container.name)
    .bind(&container.description)
    .bind(&container.location)
    .bind(container.parent_container_id)
    .fetch_one(conn)
    .await
    .map_err(|e| map_unique_violation(e, "qr_code_id"))
}

pub async fn delete(conn: &mut PgConnection, container_id: Uuid) -> AppResult<bool> {
    let rows_affected = sqlx::query("DELETE FROM containers WHERE id = $1")
        .bind(container_id)
        .execute(conn)
        .await?
        .rows_affected();
    Ok(rows_affected > 0)
}

pub async fn has_items(conn: &mut PgConnection, container_id: Uuid) -> AppResult<bool> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM items WHERE container_id = $1)")
            .bind(container_id)
            .fetch_one(conn)
            .await?;
    Ok(exists)
}

pub async fn has_child_containers(conn: &mut PgConnection, container_id: Uuid) -> AppResult<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM containers WHERE parent_container_id = $1)",
    )
    .bind(container_id)
    .fetch_one(conn)
    .await?;
    Ok(exists)
}

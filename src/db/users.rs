use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::{map_unique_violation, AppResult};
use crate::models::{Role, UserModel};

pub async fn insert(
    conn: &mut PgConnection,
    username: &str,
    email: &str,
    hashed_password: &str,
    role: Role,
) -> AppResult<UserModel> {
    sqlx::query_as::<_, UserModel>(
        "INSERT INTO users (username, email, hashed_password, role) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(username)
    .bind(email)
    .bind(hashed_password)
    .bind(role)
    .fetch_one(conn)
    .await
    .map_err(|e| map_unique_violation(e, "username or email"))
}

pub async fn get_by_id(conn: &mut PgConnection, user_id: Uuid) -> AppResult<Option<UserModel>> {
    let user = sqlx::query_as::<_, UserModel>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

pub async fn get_by_username(
    conn: &mut PgConnection,
    username: &str,
) -> AppResult<Option<UserModel>> {
    let user = sqlx::query_as::<_, UserModel>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::{map_unique_violation, AppResult};
use crate::models::{ItemListQuery, ItemModel, ItemStatus, SummaryReport};

/// Columns callers may sort by. Anything else falls back to `updated_at`.
const SORTABLE_COLUMNS: &[&str] = &[
    "name",
    "category",
    "quantity",
    "status",
    "unit_price",
    "purchase_date",
    "created_at",
    "updated_at",
];

fn sort_column(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|s| SORTABLE_COLUMNS.iter().find(|c| **c == s))
        .copied()
        .unwrap_or("updated_at")
}

fn sort_direction(requested: Option<&str>) -> &'static str {
    match requested {
        Some("asc") => "ASC",
        _ => "DESC",
    }
}

/// 1-based page, size bounded to 1..=100.
fn clamp_paging(page: u32, page_size: u32) -> (u32, u32) {
    (page.max(1), page_size.clamp(1, 100))
}

/// Row offset for a page. Widened to i64 so large page numbers cannot
/// overflow the multiplication.
fn page_offset(page: u32, page_size: u32) -> i64 {
    (i64::from(page) - 1) * i64::from(page_size)
}

/// Shared by the `low_stock` list filter and the low-stock report, so both
/// paths exclude assets even if out-of-band data gave one a threshold.
const LOW_STOCK_FILTER: &str =
    "item_type = 'consumable' AND min_stock IS NOT NULL AND quantity < min_stock";

// Single-field mutations write only their own columns, so concurrent
// operations on different fields of the same row cannot undo each other.
const QUANTITY_UPDATE_SQL: &str =
    "UPDATE items SET quantity = $2, updated_at = NOW() WHERE id = $1 RETURNING *";
const STATUS_UPDATE_SQL: &str =
    "UPDATE items SET status = $2, assigned_to = $3, updated_at = NOW() WHERE id = $1 RETURNING *";
const PLACEMENT_UPDATE_SQL: &str =
    "UPDATE items SET container_id = $2, parent_item_id = $3, updated_at = NOW() \
     WHERE id = $1 RETURNING *";
const IMAGE_UPDATE_SQL: &str =
    "UPDATE items SET image_url = $2, updated_at = NOW() WHERE id = $1 RETURNING *";

/// Normalizes a comma-separated filter list for `string_to_array` matching.
fn csv_list(raw: &str) -> String {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

pub async fn insert(conn: &mut PgConnection, item: &ItemModel) -> AppResult<ItemModel> {
    sqlx::query_as::<_, ItemModel>(
        "INSERT INTO items (id, item_type, name, sku, category, container_id, parent_item_id, \
         location_note, quantity, unit, min_stock, unit_price, purchase_date, status, \
         assigned_to, attributes, restock_url, barcode, image_url) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19) \
         RETURNING *",
    )
    .bind(item.id)
    .bind(item.item_type)
    .bind(&item.name)
    .bind(&item.sku)
    .bind(&item.category)
    .bind(item.container_id)
    .bind(item.parent_item_id)
    .bind(&item.location_note)
    .bind(item.quantity)
    .bind(&item.unit)
    .bind(item.min_stock)
    .bind(item.unit_price)
    .bind(item.purchase_date)
    .bind(item.status)
    .bind(&item.assigned_to)
    .bind(&item.attributes)
    .bind(&item.restock_url)
    .bind(&item.barcode)
    .bind(&item.image_url)
    .fetch_one(conn)
    .await
    .map_err(|e| map_unique_violation(e, "barcode"))
}

pub async fn get_by_id(conn: &mut PgConnection, item_id: Uuid) -> AppResult<Option<ItemModel>> {
    let item = sqlx::query_as::<_, ItemModel>("SELECT * FROM items WHERE id = $1")
        .bind(item_id)
        .fetch_optional(conn)
        .await?;
    Ok(item)
}

/// Reads and row-locks an item for a read-modify-write inside a transaction.
pub async fn get_by_id_locked(
    conn: &mut PgConnection,
    item_id: Uuid,
) -> AppResult<Option<ItemModel>> {
    let item = sqlx::query_as::<_, ItemModel>("SELECT * FROM items WHERE id = $1 FOR UPDATE")
        .bind(item_id)
        .fetch_optional(conn)
        .await?;
    Ok(item)
}

/// Writes the full merged row back; callers apply the patch and re-run
/// normalization first.
pub async fn update(conn: &mut PgConnection, item: &ItemModel) -> AppResult<ItemModel> {
    sqlx::query_as::<_, ItemModel>(
        "UPDATE items SET item_type = $2, name = $3, sku = $4, category = $5, container_id = $6, \
         parent_item_id = $7, location_note = $8, quantity = $9, unit = $10, min_stock = $11, \
         unit_price = $12, purchase_date = $13, status = $14, assigned_to = $15, \
         attributes = $16, restock_url = $17, barcode = $18, image_url = $19, updated_at = NOW() \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(item.id)
    .bind(item.item_type)
    .bind(&item.name)
    .bind(&item.sku)
    .bind(&item.category)
    .bind(item.container_id)
    .bind(item.parent_item_id)
    .bind(&item.location_note)
    .bind(item.quantity)
    .bind(&item.unit)
    .bind(item.min_stock)
    .bind(item.unit_price)
    .bind(item.purchase_date)
    .bind(item.status)
    .bind(&item.assigned_to)
    .bind(&item.attributes)
    .bind(&item.restock_url)
    .bind(&item.barcode)
    .bind(&item.image_url)
    .fetch_one(conn)
    .await
    .map_err(|e| map_unique_violation(e, "barcode"))
}

pub async fn update_quantity(
    conn: &mut PgConnection,
    item_id: Uuid,
    quantity: Decimal,
) -> AppResult<ItemModel> {
    let item = sqlx::query_as::<_, ItemModel>(QUANTITY_UPDATE_SQL)
        .bind(item_id)
        .bind(quantity)
        .fetch_one(conn)
        .await?;
    Ok(item)
}

pub async fn update_status(
    conn: &mut PgConnection,
    item_id: Uuid,
    status: ItemStatus,
    assigned_to: Option<&str>,
) -> AppResult<ItemModel> {
    let item = sqlx::query_as::<_, ItemModel>(STATUS_UPDATE_SQL)
        .bind(item_id)
        .bind(status)
        .bind(assigned_to)
        .fetch_one(conn)
        .await?;
    Ok(item)
}

pub async fn update_placement(
    conn: &mut PgConnection,
    item_id: Uuid,
    container_id: Option<Uuid>,
    parent_item_id: Option<Uuid>,
) -> AppResult<ItemModel> {
    let item = sqlx::query_as::<_, ItemModel>(PLACEMENT_UPDATE_SQL)
        .bind(item_id)
        .bind(container_id)
        .bind(parent_item_id)
        .fetch_one(conn)
        .await?;
    Ok(item)
}

pub async fn update_image_url(
    conn: &mut PgConnection,
    item_id: Uuid,
    image_url: Option<&str>,
) -> AppResult<ItemModel> {
    let item = sqlx::query_as::<_, ItemModel>(IMAGE_UPDATE_SQL)
        .bind(item_id)
        .bind(image_url)
        .fetch_one(conn)
        .await?;
    Ok(item)
}

pub async fn delete(conn: &mut PgConnection, item_id: Uuid) -> AppResult<bool> {
    let rows_affected = sqlx::query("DELETE FROM items WHERE id = $1")
        .bind(item_id)
        .execute(conn)
        .await?
        .rows_affected();
    Ok(rows_affected > 0)
}

pub async fn has_child_items(conn: &mut PgConnection, item_id: Uuid) -> AppResult<bool> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM items WHERE parent_item_id = $1)")
            .bind(item_id)
            .fetch_one(conn)
            .await?;
    Ok(exists)
}

/// Parent pointer of an item. Outer `None` means the item does not exist.
pub async fn parent_of(
    conn: &mut PgConnection,
    item_id: Uuid,
) -> AppResult<Option<Option<Uuid>>> {
    let parent: Option<Option<Uuid>> =
        sqlx::query_scalar("SELECT parent_item_id FROM items WHERE id = $1")
            .bind(item_id)
            .fetch_optional(conn)
            .await?;
    Ok(parent)
}

pub async fn list_in_container(
    conn: &mut PgConnection,
    container_id: Uuid,
) -> AppResult<Vec<ItemModel>> {
    let items = sqlx::query_as::<_, ItemModel>(
        "SELECT * FROM items WHERE container_id = $1 ORDER BY name ASC",
    )
    .bind(container_id)
    .fetch_all(conn)
    .await?;
    Ok(items)
}

/// Filtered, paginated, sorted listing. Returns the page plus the total match
/// count before pagination.
pub async fn list(
    conn: &mut PgConnection,
    query: &ItemListQuery,
) -> AppResult<(Vec<ItemModel>, i64)> {
    // Build dynamic WHERE clause; every parameter binds as text, uuid values
    // are cast in SQL.
    let mut conditions: Vec<String> = Vec::new();
    let mut binds: Vec<String> = Vec::new();

    if let Some(item_type) = query.item_type {
        binds.push(item_type.as_str().to_string());
        conditions.push(format!("item_type = ${}", binds.len()));
    }
    if let Some(ref category) = query.category {
        binds.push(csv_list(category));
        conditions.push(format!(
            "category = ANY(string_to_array(${}, ','))",
            binds.len()
        ));
    }
    if let Some(ref status) = query.status {
        binds.push(csv_list(status));
        conditions.push(format!(
            "status = ANY(string_to_array(${}, ','))",
            binds.len()
        ));
    }
    if let Some(container_id) = query.container_id {
        binds.push(container_id.to_string());
        conditions.push(format!("container_id = ${}::uuid", binds.len()));
    }
    if query.low_stock {
        conditions.push(LOW_STOCK_FILTER.to_string());
    }
    if let Some(ref search) = query.search {
        binds.push(format!("%{}%", search));
        let n = binds.len();
        conditions.push(format!(
            "(name ILIKE ${n} OR sku ILIKE ${n} OR barcode ILIKE ${n})"
        ));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM items {}", where_clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for bind in &binds {
        count_query = count_query.bind(bind);
    }
    let total: i64 = count_query.fetch_one(&mut *conn).await?;

    let (page, page_size) = clamp_paging(query.page, query.page_size);
    let offset = page_offset(page, page_size);
    let sql = format!(
        "SELECT * FROM items {} ORDER BY {} {} LIMIT {} OFFSET {}",
        where_clause,
        sort_column(query.sort_by.as_deref()),
        sort_direction(query.sort_order.as_deref()),
        page_size,
        offset,
    );

    let mut items_query = sqlx::query_as::<_, ItemModel>(&sql);
    for bind in &binds {
        items_query = items_query.bind(bind);
    }
    let items = items_query.fetch_all(conn).await?;

    Ok((items, total))
}

/// Consumables whose quantity fell below their configured threshold. Assets
/// never carry a threshold and are excluded by the type filter.
pub async fn list_low_stock(conn: &mut PgConnection) -> AppResult<Vec<ItemModel>> {
    let sql = format!("SELECT * FROM items WHERE {} ORDER BY name ASC", LOW_STOCK_FILTER);
    let items = sqlx::query_as::<_, ItemModel>(&sql).fetch_all(conn).await?;
    Ok(items)
}

pub async fn list_by_status(
    conn: &mut PgConnection,
    status: ItemStatus,
) -> AppResult<Vec<ItemModel>> {
    let items =
        sqlx::query_as::<_, ItemModel>("SELECT * FROM items WHERE status = $1 ORDER BY name ASC")
            .bind(status)
            .fetch_all(conn)
            .await?;
    Ok(items)
}

pub async fn summary(conn: &mut PgConnection) -> AppResult<SummaryReport> {
    let total_items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
        .fetch_one(&mut *conn)
        .await?;

    let total_value: Decimal =
        sqlx::query_scalar("SELECT COALESCE(SUM(unit_price * quantity), 0) FROM items")
            .fetch_one(&mut *conn)
            .await?;

    let by_category = grouped_counts(conn, "category").await?;
    let by_type = grouped_counts(conn, "item_type").await?;
    let by_status = grouped_counts(conn, "status").await?;

    Ok(SummaryReport {
        total_items,
        total_value: total_value.to_f64().unwrap_or(0.0),
        by_category,
        by_type,
        by_status,
    })
}

async fn grouped_counts(
    conn: &mut PgConnection,
    column: &str,
) -> AppResult<HashMap<String, i64>> {
    // `column` is a compile-time constant from `summary`, never user input.
    let sql = format!("SELECT {column}, COUNT(*) FROM items GROUP BY {column}");
    let rows: Vec<(String, i64)> = sqlx::query_as(&sql).fetch_all(conn).await?;
    Ok(rows.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_sort_column_falls_back_to_updated_at() {
        assert_eq!(sort_column(Some("name")), "name");
        assert_eq!(sort_column(Some("quantity")), "quantity");
        assert_eq!(sort_column(Some("; DROP TABLE items")), "updated_at");
        assert_eq!(sort_column(None), "updated_at");
    }

    #[test]
    fn sort_direction_defaults_to_desc() {
        assert_eq!(sort_direction(Some("asc")), "ASC");
        assert_eq!(sort_direction(Some("desc")), "DESC");
        assert_eq!(sort_direction(Some("sideways")), "DESC");
        assert_eq!(sort_direction(None), "DESC");
    }

    #[test]
    fn paging_is_one_based_and_bounded() {
        assert_eq!(clamp_paging(0, 0), (1, 1));
        assert_eq!(clamp_paging(2, 20), (2, 20));
        assert_eq!(clamp_paging(1, 500), (1, 100));
    }

    #[test]
    fn page_two_of_twenty_skips_first_twenty() {
        let (page, page_size) = clamp_paging(2, 20);
        assert_eq!(page_offset(page, page_size), 20);
    }

    #[test]
    fn huge_page_numbers_do_not_overflow_the_offset() {
        let (page, page_size) = clamp_paging(50_000_000, 100);
        assert_eq!(page_offset(page, page_size), 4_999_999_900);
        assert_eq!(page_offset(u32::MAX, 100), (i64::from(u32::MAX) - 1) * 100);
    }

    #[test]
    fn single_field_updates_leave_other_columns_alone() {
        assert!(!QUANTITY_UPDATE_SQL.contains("status"));
        assert!(!QUANTITY_UPDATE_SQL.contains("container_id"));
        assert!(!QUANTITY_UPDATE_SQL.contains("assigned_to"));
        assert!(!STATUS_UPDATE_SQL.contains("quantity"));
        assert!(!STATUS_UPDATE_SQL.contains("container_id"));
        assert!(!PLACEMENT_UPDATE_SQL.contains("quantity"));
        assert!(!PLACEMENT_UPDATE_SQL.contains("status"));
        assert!(!IMAGE_UPDATE_SQL.contains("quantity"));
    }

    #[test]
    fn low_stock_filter_excludes_assets() {
        assert!(LOW_STOCK_FILTER.contains("item_type = 'consumable'"));
    }

    #[test]
    fn csv_list_trims_entries() {
        assert_eq!(csv_list("tools, electronics , "), "tools,electronics");
        assert_eq!(csv_list("hardware"), "hardware");
    }
}

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::error::{AppError, AppResult};
use crate::models::{
    AdjustPayload, ContainerCreate, ContainerDetail, ContainerModel, ContainerPatch, ItemCreate,
    ItemListQuery, ItemModel, ItemPatch, ItemStatus, MovePayload, PaginatedItems, StatusPayload,
    SummaryReport,
};
use crate::services::hierarchy;

/// Guarded CRUD and state transitions over containers and items. Every
/// mutating operation runs its checks and writes inside one transaction, so a
/// rejected request never partially applies.
#[derive(Clone)]
pub struct InventoryService {
    pool: PgPool,
}

impl InventoryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---- containers ----

    pub async fn list_containers(&self) -> AppResult<Vec<ContainerModel>> {
        let mut conn = self.pool.acquire().await?;
        db::containers::list_all(&mut conn).await
    }

    pub async fn create_container(&self, data: ContainerCreate) -> AppResult<ContainerModel> {
        if data.name.trim().is_empty() {
            return Err(AppError::InvalidInput("name is required".to_string()));
        }
        if data.qr_code_id.trim().is_empty() {
            return Err(AppError::InvalidInput("qr_code_id is required".to_string()));
        }

        let mut tx = self.pool.begin().await?;
        if let Some(parent_id) = data.parent_container_id {
            hierarchy::ensure_container_exists(&mut tx, parent_id).await?;
        }
        let container = db::containers::insert(&mut tx, &data).await?;
        tx.commit().await?;
        Ok(container)
    }

    pub async fn get_container_detail(&self, container_id: Uuid) -> AppResult<ContainerDetail> {
        let mut conn = self.pool.acquire().await?;
        let container = db::containers::get_by_id(&mut conn, container_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Container not found".to_string()))?;
        let items = db::items::list_in_container(&mut conn, container_id).await?;
        let children = db::containers::list_children(&mut conn, container_id).await?;
        Ok(ContainerDetail {
            container,
            items,
            children,
        })
    }

    pub async fn update_container(
        &self,
        container_id: Uuid,
        patch: ContainerPatch,
    ) -> AppResult<ContainerModel> {
        let mut tx = self.pool.begin().await?;
        let mut container = db::containers::get_by_id(&mut tx, container_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Container not found".to_string()))?;

        let new_parent = patch.parent_container_id.clone();
        patch.apply(&mut container);
        if let Some(Some(parent_id)) = new_parent {
            hierarchy::ensure_valid_parent_container(&mut tx, container_id, parent_id).await?;
        }

        let container = db::containers::update(&mut tx, &container).await?;
        tx.commit().await?;
        Ok(container)
    }

    pub async fn delete_container(&self, container_id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        if db::containers::get_by_id(&mut tx, container_id).await?.is_none() {
            return Err(AppError::NotFound("Container not found".to_string()));
        }
        hierarchy::ensure_container_deletable(&mut tx, container_id).await?;
        db::containers::delete(&mut tx, container_id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// QR lookup: container resolved by scan code, with its direct items.
    pub async fn scan_lookup(
        &self,
        qr_code_id: &str,
    ) -> AppResult<(ContainerModel, Vec<ItemModel>)> {
        let mut conn = self.pool.acquire().await?;
        let container = db::containers::get_by_qr_code(&mut conn, qr_code_id)
            .await?
            .ok_or_else(|| AppError::NotFound("QR code not recognized".to_string()))?;
        let items = db::items::list_in_container(&mut conn, container.id).await?;
        Ok((container, items))
    }

    // ---- items ----

    pub async fn list_items(&self, query: &ItemListQuery) -> AppResult<PaginatedItems> {
        let mut conn = self.pool.acquire().await?;
        let (items, total) = db::items::list(&mut conn, query).await?;
        Ok(PaginatedItems {
            items,
            total,
            page: query.page.max(1),
            page_size: query.page_size.clamp(1, 100),
        })
    }

    pub async fn get_item(&self, item_id: Uuid) -> AppResult<ItemModel> {
        let mut conn = self.pool.acquire().await?;
        db::items::get_by_id(&mut conn, item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item not found".to_string()))
    }

    pub async fn create_item(&self, data: ItemCreate) -> AppResult<ItemModel> {
        if data.name.trim().is_empty() {
            return Err(AppError::InvalidInput("name is required".to_string()));
        }
        if data.category.trim().is_empty() {
            return Err(AppError::InvalidInput("category is required".to_string()));
        }

        let mut item = ItemModel {
            id: Uuid::new_v4(),
            item_type: data.item_type,
            name: data.name,
            sku: data.sku,
            category: data.category,
            container_id: data.container_id,
            parent_item_id: data.parent_item_id,
            location_note: data.location_note,
            quantity: data.quantity.unwrap_or(Decimal::ONE),
            unit: data.unit.unwrap_or_else(|| "pcs".to_string()),
            min_stock: data.min_stock,
            unit_price: data.unit_price,
            purchase_date: data.purchase_date,
            status: data.status.unwrap_or(ItemStatus::InStock),
            assigned_to: data.assigned_to,
            attributes: data.attributes.unwrap_or_else(|| serde_json::json!({})),
            restock_url: data.restock_url,
            barcode: data.barcode,
            image_url: data.image_url,
            // placeholders; the store sets both on insert
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        item.enforce_type_rules();
        item.validate()?;

        let mut tx = self.pool.begin().await?;
        if let Some(container_id) = item.container_id {
            hierarchy::ensure_container_exists(&mut tx, container_id).await?;
        }
        if let Some(parent_id) = item.parent_item_id {
            hierarchy::ensure_valid_parent_item(&mut tx, item.id, parent_id).await?;
        }
        let item = db::items::insert(&mut tx, &item).await?;
        tx.commit().await?;
        Ok(item)
    }

    pub async fn update_item(&self, item_id: Uuid, patch: ItemPatch) -> AppResult<ItemModel> {
        let mut tx = self.pool.begin().await?;
        // full-row merge write, so lock the row against concurrent mutations
        let mut item = db::items::get_by_id_locked(&mut tx, item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item not found".to_string()))?;

        let new_container = patch.container_id.clone();
        let new_parent = patch.parent_item_id.clone();
        patch.apply(&mut item);
        item.enforce_type_rules();
        item.validate()?;

        if let Some(Some(container_id)) = new_container {
            hierarchy::ensure_container_exists(&mut tx, container_id).await?;
        }
        if let Some(Some(parent_id)) = new_parent {
            hierarchy::ensure_valid_parent_item(&mut tx, item_id, parent_id).await?;
        }

        let item = db::items::update(&mut tx, &item).await?;
        tx.commit().await?;
        Ok(item)
    }

    pub async fn delete_item(&self, item_id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        if db::items::get_by_id(&mut tx, item_id).await?.is_none() {
            return Err(AppError::NotFound("Item not found".to_string()));
        }
        hierarchy::ensure_item_deletable(&mut tx, item_id).await?;
        db::items::delete(&mut tx, item_id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Adds a signed delta to a consumable's quantity. Assets are not
    /// quantity-adjustable and stock can never go negative. The read takes a
    /// row lock so concurrent adjustments serialize instead of losing deltas.
    pub async fn adjust_quantity(
        &self,
        item_id: Uuid,
        payload: AdjustPayload,
    ) -> AppResult<ItemModel> {
        let mut tx = self.pool.begin().await?;
        let item = db::items::get_by_id_locked(&mut tx, item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item not found".to_string()))?;

        if item.item_type == crate::models::ItemType::Asset {
            return Err(AppError::InvalidInput(
                "Cannot adjust quantity for asset type items.".to_string(),
            ));
        }
        let new_quantity = item.quantity + payload.delta;
        if new_quantity < Decimal::ZERO {
            return Err(AppError::InvalidInput(format!(
                "Insufficient stock. Current: {}, delta: {}",
                item.quantity, payload.delta
            )));
        }

        let item = db::items::update_quantity(&mut tx, item_id, new_quantity).await?;
        tx.commit().await?;
        Ok(item)
    }

    /// Writes only the status and holder columns, so a concurrent mutation of
    /// another field on the same item is not overwritten.
    pub async fn change_status(
        &self,
        item_id: Uuid,
        payload: StatusPayload,
    ) -> AppResult<ItemModel> {
        let holder = payload.resolve_holder()?;

        let mut tx = self.pool.begin().await?;
        if db::items::get_by_id(&mut tx, item_id).await?.is_none() {
            return Err(AppError::NotFound("Item not found".to_string()));
        }
        let item =
            db::items::update_status(&mut tx, item_id, payload.status, holder.as_deref()).await?;
        tx.commit().await?;
        Ok(item)
    }

    /// Reassigns container and/or parent item. An omitted target is an
    /// explicit detach. Writes only the placement columns.
    pub async fn move_item(&self, item_id: Uuid, payload: MovePayload) -> AppResult<ItemModel> {
        let mut tx = self.pool.begin().await?;
        if db::items::get_by_id(&mut tx, item_id).await?.is_none() {
            return Err(AppError::NotFound("Item not found".to_string()));
        }

        if let Some(container_id) = payload.container_id {
            hierarchy::ensure_container_exists(&mut tx, container_id).await?;
        }
        if let Some(parent_id) = payload.parent_item_id {
            hierarchy::ensure_valid_parent_item(&mut tx, item_id, parent_id).await?;
        }

        let item = db::items::update_placement(
            &mut tx,
            item_id,
            payload.container_id,
            payload.parent_item_id,
        )
        .await?;
        tx.commit().await?;
        Ok(item)
    }

    pub async fn set_image_url(
        &self,
        item_id: Uuid,
        image_url: Option<String>,
    ) -> AppResult<ItemModel> {
        let mut tx = self.pool.begin().await?;
        if db::items::get_by_id(&mut tx, item_id).await?.is_none() {
            return Err(AppError::NotFound("Item not found".to_string()));
        }
        let item = db::items::update_image_url(&mut tx, item_id, image_url.as_deref()).await?;
        tx.commit().await?;
        Ok(item)
    }

    // ---- reports ----

    pub async fn low_stock_report(&self) -> AppResult<Vec<ItemModel>> {
        let mut conn = self.pool.acquire().await?;
        db::items::list_low_stock(&mut conn).await
    }

    pub async fn status_report(&self, status: ItemStatus) -> AppResult<Vec<ItemModel>> {
        let mut conn = self.pool.acquire().await?;
        db::items::list_by_status(&mut conn, status).await
    }

    pub async fn summary_report(&self) -> AppResult<SummaryReport> {
        let mut conn = self.pool.acquire().await?;
        db::items::summary(&mut conn).await
    }
}

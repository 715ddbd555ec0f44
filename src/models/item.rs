use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::double_option;

/// Closed item kind. An asset is a singular durable object tracked by status
/// and assignment; a consumable carries a fractional quantity and an optional
/// minimum-stock threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum ItemType {
    Consumable,
    Asset,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Consumable => "consumable",
            ItemType::Asset => "asset",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum ItemStatus {
    InStock,
    InService,
    Idle,
    Loaned,
    Damaged,
    Retired,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::InStock => "in_stock",
            ItemStatus::InService => "in_service",
            ItemStatus::Idle => "idle",
            ItemStatus::Loaned => "loaned",
            ItemStatus::Damaged => "damaged",
            ItemStatus::Retired => "retired",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ItemModel {
    pub id: Uuid,
    pub item_type: ItemType,
    pub name: String,
    pub sku: Option<String>,
    pub category: String,
    pub container_id: Option<Uuid>,
    pub parent_item_id: Option<Uuid>,
    pub location_note: Option<String>,
    pub quantity: Decimal,
    pub unit: String,
    pub min_stock: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub purchase_date: Option<NaiveDate>,
    pub status: ItemStatus,
    pub assigned_to: Option<String>,
    pub attributes: serde_json::Value,
    pub restock_url: Option<String>,
    pub barcode: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ItemModel {
    /// Normalizes type-dependent fields. Assets are singular durable objects:
    /// quantity is pinned at 1 and a minimum-stock threshold is meaningless.
    pub fn enforce_type_rules(&mut self) {
        if self.item_type == ItemType::Asset {
            self.quantity = Decimal::ONE;
            self.min_stock = None;
        }
    }

    /// Checks invariants that hold for every stored item, regardless of which
    /// entry point produced the state.
    pub fn validate(&self) -> AppResult<()> {
        if self.parent_item_id == Some(self.id) {
            return Err(AppError::InvalidInput(
                "Item cannot be its own parent".to_string(),
            ));
        }
        if self.status == ItemStatus::Loaned
            && self.assigned_to.as_deref().unwrap_or("").trim().is_empty()
        {
            return Err(AppError::InvalidInput(
                "assigned_to is required when status is 'loaned'".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemCreate {
    pub item_type: ItemType,
    pub name: String,
    pub sku: Option<String>,
    pub category: String,
    pub container_id: Option<Uuid>,
    pub parent_item_id: Option<Uuid>,
    pub location_note: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit: Option<String>,
    pub min_stock: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub purchase_date: Option<NaiveDate>,
    pub status: Option<ItemStatus>,
    pub assigned_to: Option<String>,
    pub attributes: Option<serde_json::Value>,
    pub restock_url: Option<String>,
    pub barcode: Option<String>,
    pub image_url: Option<String>,
}

/// Merge-patch payload. Plain `Option` fields are non-nullable (absent =
/// unchanged); `Option<Option<_>>` fields distinguish absent (unchanged) from
/// null (clear).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit: Option<String>,
    pub status: Option<ItemStatus>,
    pub attributes: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "double_option")]
    pub sku: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub container_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_item_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub location_note: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub min_stock: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    pub unit_price: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    pub purchase_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub restock_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub barcode: Option<Option<String>>,
}

impl ItemPatch {
    /// Applies the patch to an existing item: only fields present in the
    /// payload are overwritten.
    pub fn apply(self, item: &mut ItemModel) {
        if let Some(v) = self.name {
            item.name = v;
        }
        if let Some(v) = self.category {
            item.category = v;
        }
        if let Some(v) = self.quantity {
            item.quantity = v;
        }
        if let Some(v) = self.unit {
            item.unit = v;
        }
        if let Some(v) = self.status {
            item.status = v;
        }
        if let Some(v) = self.attributes {
            item.attributes = v;
        }
        if let Some(v) = self.sku {
            item.sku = v;
        }
        if let Some(v) = self.container_id {
            item.container_id = v;
        }
        if let Some(v) = self.parent_item_id {
            item.parent_item_id = v;
        }
        if let Some(v) = self.location_note {
            item.location_note = v;
        }
        if let Some(v) = self.min_stock {
            item.min_stock = v;
        }
        if let Some(v) = self.unit_price {
            item.unit_price = v;
        }
        if let Some(v) = self.purchase_date {
            item.purchase_date = v;
        }
        if let Some(v) = self.assigned_to {
            item.assigned_to = v;
        }
        if let Some(v) = self.restock_url {
            item.restock_url = v;
        }
        if let Some(v) = self.barcode {
            item.barcode = v;
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdjustPayload {
    pub delta: Decimal,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusPayload {
    pub status: ItemStatus,
    pub assigned_to: Option<String>,
}

impl StatusPayload {
    /// Holder to store alongside the new status. The payload value always
    /// wins: an omitted holder clears the field, so returning a loan drops
    /// the previous borrower. `loaned` requires a non-blank holder.
    pub fn resolve_holder(&self) -> AppResult<Option<String>> {
        if self.status == ItemStatus::Loaned
            && self.assigned_to.as_deref().unwrap_or("").trim().is_empty()
        {
            return Err(AppError::InvalidInput(
                "assigned_to is required when status is 'loaned'.".to_string(),
            ));
        }
        Ok(self.assigned_to.clone())
    }
}

/// Move target. An omitted field is an explicit detach, not a no-op.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovePayload {
    pub container_id: Option<Uuid>,
    pub parent_item_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemListQuery {
    pub item_type: Option<ItemType>,
    /// Comma-separated category names.
    pub category: Option<String>,
    /// Comma-separated status values.
    pub status: Option<String>,
    pub container_id: Option<Uuid>,
    #[serde(default)]
    pub low_stock: bool,
    pub search: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

#[derive(Debug, Serialize)]
pub struct PaginatedItems {
    pub items: Vec<ItemModel>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub total_items: i64,
    pub total_value: f64,
    pub by_category: std::collections::HashMap<String, i64>,
    pub by_type: std::collections::HashMap<String, i64>,
    pub by_status: std::collections::HashMap<String, i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item() -> ItemModel {
        ItemModel {
            id: Uuid::new_v4(),
            item_type: ItemType::Consumable,
            name: "M3 screws".to_string(),
            sku: Some("SCR-M3".to_string()),
            category: "hardware".to_string(),
            container_id: None,
            parent_item_id: None,
            location_note: None,
            quantity: Decimal::new(250, 1),
            unit: "pcs".to_string(),
            min_stock: Some(Decimal::TEN),
            unit_price: None,
            purchase_date: None,
            status: ItemStatus::InStock,
            assigned_to: None,
            attributes: serde_json::json!({}),
            restock_url: None,
            barcode: None,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn asset_normalization_pins_quantity_and_clears_min_stock() {
        let mut item = sample_item();
        item.item_type = ItemType::Asset;
        item.quantity = Decimal::new(70, 0);
        item.enforce_type_rules();
        assert_eq!(item.quantity, Decimal::ONE);
        assert_eq!(item.min_stock, None);
    }

    #[test]
    fn consumable_normalization_is_a_no_op() {
        let mut item = sample_item();
        item.enforce_type_rules();
        assert_eq!(item.quantity, Decimal::new(250, 1));
        assert_eq!(item.min_stock, Some(Decimal::TEN));
    }

    #[test]
    fn self_parent_is_rejected() {
        let mut item = sample_item();
        item.parent_item_id = Some(item.id);
        assert!(matches!(item.validate(), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn loaned_without_holder_is_rejected() {
        let mut item = sample_item();
        item.status = ItemStatus::Loaned;
        item.assigned_to = Some("   ".to_string());
        assert!(matches!(item.validate(), Err(AppError::InvalidInput(_))));

        item.assigned_to = Some("alice".to_string());
        assert!(item.validate().is_ok());
    }

    #[test]
    fn patch_distinguishes_absent_from_null() {
        let patch: ItemPatch =
            serde_json::from_str(r#"{"name": "renamed", "min_stock": null}"#).unwrap();
        let mut item = sample_item();
        patch.apply(&mut item);

        assert_eq!(item.name, "renamed");
        // explicit null clears
        assert_eq!(item.min_stock, None);
        // absent leaves untouched
        assert_eq!(item.sku.as_deref(), Some("SCR-M3"));
        assert_eq!(item.quantity, Decimal::new(250, 1));
    }

    #[test]
    fn patch_can_detach_container_reference() {
        let mut item = sample_item();
        item.container_id = Some(Uuid::new_v4());
        let patch: ItemPatch = serde_json::from_str(r#"{"container_id": null}"#).unwrap();
        patch.apply(&mut item);
        assert_eq!(item.container_id, None);
    }

    #[test]
    fn returning_a_loan_clears_the_holder() {
        let payload = StatusPayload {
            status: ItemStatus::InStock,
            assigned_to: None,
        };
        assert_eq!(payload.resolve_holder().unwrap(), None);
    }

    #[test]
    fn loan_requires_a_holder() {
        let payload = StatusPayload {
            status: ItemStatus::Loaned,
            assigned_to: Some("  ".to_string()),
        };
        assert!(matches!(
            payload.resolve_holder(),
            Err(AppError::InvalidInput(_))
        ));

        let payload = StatusPayload {
            status: ItemStatus::Loaned,
            assigned_to: Some("alice".to_string()),
        };
        assert_eq!(payload.resolve_holder().unwrap().as_deref(), Some("alice"));
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ItemStatus::InService).unwrap(),
            r#""in_service""#
        );
        let status: ItemStatus = serde_json::from_str(r#""loaned""#).unwrap();
        assert_eq!(status, ItemStatus::Loaned);
        assert_eq!(status.as_str(), "loaned");
    }

    #[test]
    fn item_type_round_trips() {
        let t: ItemType = serde_json::from_str(r#""consumable""#).unwrap();
        assert_eq!(t, ItemType::Consumable);
        assert_eq!(serde_json::to_string(&ItemType::Asset).unwrap(), r#""asset""#);
    }
}

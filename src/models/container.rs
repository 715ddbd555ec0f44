use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::double_option;
use crate::models::item::ItemModel;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ContainerModel {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub qr_code_id: String,
    pub parent_container_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContainerCreate {
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub qr_code_id: String,
    pub parent_container_id: Option<Uuid>,
}

/// Merge-patch payload for containers; nullable fields use the double-option
/// shape so an explicit null detaches or clears.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContainerPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_container_id: Option<Option<Uuid>>,
}

impl ContainerPatch {
    pub fn apply(self, container: &mut ContainerModel) {
        if let Some(v) = self.name {
            container.name = v;
        }
        if let Some(v) = self.description {
            container.description = v;
        }
        if let Some(v) = self.location {
            container.location = v;
        }
        if let Some(v) = self.parent_container_id {
            container.parent_container_id = v;
        }
    }
}

/// Container plus its direct contents, for the detail view.
#[derive(Debug, Serialize)]
pub struct ContainerDetail {
    #[serde(flatten)]
    pub container: ContainerModel,
    pub items: Vec<ItemModel>,
    pub children: Vec<ContainerModel>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_container() -> ContainerModel {
        ContainerModel {
            id: Uuid::new_v4(),
            name: "Shelf A".to_string(),
            description: Some("top shelf".to_string()),
            location: Some("garage".to_string()),
            qr_code_id: "BOX-0001".to_string(),
            parent_container_id: Some(Uuid::new_v4()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn patch_merges_only_present_fields() {
        let mut container = sample_container();
        let patch: ContainerPatch =
            serde_json::from_str(r#"{"name": "Shelf B", "location": null}"#).unwrap();
        patch.apply(&mut container);

        assert_eq!(container.name, "Shelf B");
        assert_eq!(container.location, None);
        assert_eq!(container.description.as_deref(), Some("top shelf"));
        assert!(container.parent_container_id.is_some());
    }

    #[test]
    fn null_parent_detaches() {
        let mut container = sample_container();
        let patch: ContainerPatch =
            serde_json::from_str(r#"{"parent_container_id": null}"#).unwrap();
        patch.apply(&mut container);
        assert_eq!(container.parent_container_id, None);
    }
}

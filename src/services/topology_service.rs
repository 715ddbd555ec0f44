use std::collections::HashMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{ItemStatus, ItemType};

/// Depth bound on the descendant traversal. Guarantees termination even if
/// the stored parent pointers contain an undetected cycle or a pathologically
/// deep chain.
pub const MAX_TOPOLOGY_DEPTH: i32 = 20;

/// One row of the flattened descendant traversal.
#[derive(Debug, Clone, FromRow)]
pub struct TopologyRow {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub status: ItemStatus,
    pub parent_item_id: Option<Uuid>,
    pub item_type: ItemType,
    pub quantity: Decimal,
    pub unit: String,
    pub attributes: serde_json::Value,
    pub depth: i32,
}

/// Tree node for display. Quantity is surfaced as floating point at this
/// boundary only; the stored representation stays exact decimal.
#[derive(Debug, Serialize)]
pub struct TopologyNode {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub status: ItemStatus,
    pub item_type: ItemType,
    pub quantity: f64,
    pub unit: String,
    pub attributes: serde_json::Value,
    pub depth: i32,
    pub children: Vec<TopologyNode>,
}

impl From<TopologyRow> for TopologyNode {
    fn from(row: TopologyRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            category: row.category,
            status: row.status,
            item_type: row.item_type,
            quantity: row.quantity.to_f64().unwrap_or(0.0),
            unit: row.unit,
            attributes: row.attributes,
            depth: row.depth,
            children: Vec::new(),
        }
    }
}

/// Resolves the full descendant subtree of an item via the parent-item chain.
#[derive(Clone)]
pub struct TopologyService {
    pool: PgPool,
}

impl TopologyService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Flattened traversal: the recursive query walks
    /// `child.parent_item_id = parent.id` edges inside the database, carrying
    /// a depth counter and stopping at the depth cap. Children sort by name
    /// at the query level so tree assembly needs no re-sorting.
    async fn fetch_rows(&self, item_id: Uuid) -> AppResult<Vec<TopologyRow>> {
        let rows = sqlx::query_as::<_, TopologyRow>(
            "WITH RECURSIVE topology AS ( \
                 SELECT id, name, category, status, parent_item_id, \
                        item_type, quantity, unit, attributes, 0 AS depth \
                 FROM items WHERE id = $1 \
                 UNION ALL \
                 SELECT i.id, i.name, i.category, i.status, i.parent_item_id, \
                        i.item_type, i.quantity, i.unit, i.attributes, t.depth + 1 \
                 FROM items i \
                 JOIN topology t ON i.parent_item_id = t.id \
                 WHERE t.depth < $2 \
             ) \
             SELECT * FROM topology ORDER BY depth, name",
        )
        .bind(item_id)
        .bind(MAX_TOPOLOGY_DEPTH)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_topology_tree(&self, item_id: Uuid) -> AppResult<TopologyNode> {
        let rows = self.fetch_rows(item_id).await?;
        assemble_tree(rows).ok_or_else(|| AppError::NotFound("Item not found".to_string()))
    }
}

/// Assembles the flattened rows (ordered by depth, then name) into a rooted
/// tree. Each row becomes a node; every non-root row is appended to its
/// parent's children. Row groups are consumed at most once, so assembly
/// terminates even if a capped cycle produced duplicate rows.
pub fn assemble_tree(rows: Vec<TopologyRow>) -> Option<TopologyNode> {
    let mut root_row: Option<TopologyRow> = None;
    let mut children_of: HashMap<Uuid, Vec<TopologyRow>> = HashMap::new();

    for row in rows {
        if row.depth == 0 && root_row.is_none() {
            root_row = Some(row);
        } else if let Some(parent_id) = row.parent_item_id {
            children_of.entry(parent_id).or_default().push(row);
        }
    }

    root_row.map(|row| build_node(row, &mut children_of))
}

fn build_node(
    row: TopologyRow,
    children_of: &mut HashMap<Uuid, Vec<TopologyRow>>,
) -> TopologyNode {
    let child_rows = children_of.remove(&row.id).unwrap_or_default();
    let mut node = TopologyNode::from(row);
    node.children = child_rows
        .into_iter()
        .map(|child| build_node(child, children_of))
        .collect();
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: Uuid, name: &str, parent: Option<Uuid>, depth: i32) -> TopologyRow {
        TopologyRow {
            id,
            name: name.to_string(),
            category: "hardware".to_string(),
            status: ItemStatus::InStock,
            parent_item_id: parent,
            item_type: ItemType::Asset,
            quantity: Decimal::ONE,
            unit: "pcs".to_string(),
            attributes: serde_json::json!({}),
            depth,
        }
    }

    #[test]
    fn empty_rows_yield_no_tree() {
        assert!(assemble_tree(Vec::new()).is_none());
    }

    #[test]
    fn nests_children_with_correct_depths() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let d = Uuid::new_v4();

        // rows arrive ordered by (depth, name), as the query produces them
        let rows = vec![
            row(a, "assembly", None, 0),
            row(b, "bracket", Some(a), 1),
            row(c, "chassis", Some(a), 1),
            row(d, "damper", Some(c), 2),
        ];

        let tree = assemble_tree(rows).unwrap();
        assert_eq!(tree.id, a);
        assert_eq!(tree.depth, 0);
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.children[0].id, b);
        assert_eq!(tree.children[0].depth, 1);
        assert_eq!(tree.children[1].id, c);
        assert_eq!(tree.children[1].children.len(), 1);
        assert_eq!(tree.children[1].children[0].id, d);
        assert_eq!(tree.children[1].children[0].depth, 2);
    }

    #[test]
    fn children_keep_query_name_order() {
        let a = Uuid::new_v4();
        let rows = vec![
            row(a, "root", None, 0),
            row(Uuid::new_v4(), "alpha", Some(a), 1),
            row(Uuid::new_v4(), "beta", Some(a), 1),
            row(Uuid::new_v4(), "gamma", Some(a), 1),
        ];

        let tree = assemble_tree(rows).unwrap();
        let names: Vec<&str> = tree.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn deep_chain_stays_within_cap() {
        let mut rows = Vec::new();
        let mut ids = vec![Uuid::new_v4()];
        rows.push(row(ids[0], "n0", None, 0));
        for depth in 1..=MAX_TOPOLOGY_DEPTH {
            let id = Uuid::new_v4();
            rows.push(row(id, &format!("n{}", depth), Some(*ids.last().unwrap()), depth));
            ids.push(id);
        }

        let tree = assemble_tree(rows).unwrap();
        let mut node = &tree;
        let mut max_depth = 0;
        while let Some(child) = node.children.first() {
            node = child;
            max_depth = node.depth;
        }
        assert_eq!(max_depth, MAX_TOPOLOGY_DEPTH);
        assert!(max_depth <= 20);
    }

    #[test]
    fn capped_cycle_rows_still_terminate() {
        // A cycle a -> b -> a capped by the traversal produces repeated rows;
        // assembly must consume each group once and stop.
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let rows = vec![
            row(a, "a", Some(b), 0),
            row(b, "b", Some(a), 1),
            row(a, "a", Some(b), 2),
            row(b, "b", Some(a), 3),
        ];

        let tree = assemble_tree(rows).unwrap();
        assert_eq!(tree.id, a);
        // every duplicated row still lands in the tree exactly once
        fn count(node: &TopologyNode) -> usize {
            1 + node.children.iter().map(count).sum::<usize>()
        }
        assert_eq!(count(&tree), 4);
    }

    #[test]
    fn quantity_becomes_float_at_the_boundary() {
        let mut r = row(Uuid::new_v4(), "oil", None, 0);
        r.quantity = Decimal::new(25, 1); // 2.5
        let node = TopologyNode::from(r);
        assert!((node.quantity - 2.5).abs() < f64::EPSILON);
    }
}

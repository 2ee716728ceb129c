use async_trait::async_trait;
use uuid::Uuid;

use super::error::Result;
use super::pg::{param_refs, row_to_item, rows_to_items, DynParams, PgStore, INVENTORY_COLUMNS};
use super::{like_pattern, non_negative, InventoryRepository};
use crate::models::{InventoryFilter, InventoryItem, InventoryItemUpdate, NewInventoryItem};

#[async_trait]
impl InventoryRepository for PgStore {
    async fn create(&self, item: &NewInventoryItem) -> Result<InventoryItem> {
        let conn = self.pool().get().await?;
        let query = format!(
            "INSERT INTO inventory (id, name, category, description, brand, default_price, active)
             VALUES ($1, $2, $3, $4, $5, $6::float8, $7)
             RETURNING {}",
            INVENTORY_COLUMNS
        );

        let row = conn
            .query_one(
                &query,
                &[
                    &Uuid::new_v4(),
                    &item.name,
                    &item.category,
                    &item.description,
                    &item.brand,
                    &item.default_price,
                    &item.active,
                ],
            )
            .await?;

        row_to_item(&row)
    }

    async fn get(&self, id: Uuid) -> Result<Option<InventoryItem>> {
        let conn = self.pool().get().await?;
        let query = format!("SELECT {} FROM inventory WHERE id = $1", INVENTORY_COLUMNS);

        match conn.query_opt(&query, &[&id]).await? {
            Some(row) => Ok(Some(row_to_item(&row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, filter: &InventoryFilter) -> Result<Vec<InventoryItem>> {
        let mut conditions = Vec::new();
        let mut params: DynParams = Vec::new();

        if let Some(active) = filter.active {
            params.push(Box::new(active));
            conditions.push(format!("active = ${}", params.len()));
        }
        if let Some(category) = &filter.category {
            params.push(Box::new(like_pattern(category)));
            conditions.push(format!("category ILIKE ${}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        params.push(Box::new(non_negative(filter.limit)));
        let limit_idx = params.len();
        params.push(Box::new(non_negative(filter.offset)));
        let offset_idx = params.len();

        let query = format!(
            "SELECT {} FROM inventory {} ORDER BY created_at DESC LIMIT ${} OFFSET ${}",
            INVENTORY_COLUMNS, where_clause, limit_idx, offset_idx
        );

        let conn = self.pool().get().await?;
        let rows = conn.query(&query, &param_refs(&params)).await?;
        rows_to_items(&rows)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &InventoryItemUpdate,
    ) -> Result<Option<InventoryItem>> {
        if changes.is_empty() {
            return InventoryRepository::get(self, id).await;
        }

        let mut assignments = Vec::new();
        let mut params: DynParams = vec![Box::new(id)];

        if let Some(name) = &changes.name {
            params.push(Box::new(name.clone()));
            assignments.push(format!("name = ${}", params.len()));
        }
        if let Some(category) = &changes.category {
            params.push(Box::new(category.clone()));
            assignments.push(format!("category = ${}", params.len()));
        }
        if let Some(description) = &changes.description {
            params.push(Box::new(description.clone()));
            assignments.push(format!("description = ${}", params.len()));
        }
        if let Some(brand) = &changes.brand {
            params.push(Box::new(brand.clone()));
            assignments.push(format!("brand = ${}", params.len()));
        }
        if let Some(price) = changes.default_price {
            params.push(Box::new(price));
            assignments.push(format!("default_price = ${}::float8", params.len()));
        }
        if let Some(active) = changes.active {
            params.push(Box::new(active));
            assignments.push(format!("active = ${}", params.len()));
        }
        assignments.push("updated_at = NOW()".to_string());

        let query = format!(
            "UPDATE inventory SET {} WHERE id = $1 RETURNING {}",
            assignments.join(", "),
            INVENTORY_COLUMNS
        );

        let conn = self.pool().get().await?;
        match conn.query_opt(&query, &param_refs(&params)).await? {
            Some(row) => Ok(Some(row_to_item(&row)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let conn = self.pool().get().await?;
        let affected = conn
            .execute("DELETE FROM inventory WHERE id = $1", &[&id])
            .await?;
        Ok(affected > 0)
    }

    async fn search(
        &self,
        term: &str,
        category: Option<&str>,
        active: bool,
        limit: i64,
    ) -> Result<Vec<InventoryItem>> {
        let mut params: DynParams = vec![Box::new(active), Box::new(like_pattern(term))];
        let mut category_clause = String::new();

        if let Some(category) = category {
            params.push(Box::new(like_pattern(category)));
            category_clause = format!("AND category ILIKE ${}", params.len());
        }

        params.push(Box::new(non_negative(limit)));
        let query = format!(
            "SELECT {} FROM inventory
             WHERE active = $1
               AND (name ILIKE $2 OR description ILIKE $2 OR category ILIKE $2 OR brand ILIKE $2)
               {}
             ORDER BY created_at DESC
             LIMIT ${}",
            INVENTORY_COLUMNS,
            category_clause,
            params.len()
        );

        let conn = self.pool().get().await?;
        let rows = conn.query(&query, &param_refs(&params)).await?;
        rows_to_items(&rows)
    }

    async fn list_by_category(&self, category: &str) -> Result<Vec<InventoryItem>> {
        let conn = self.pool().get().await?;
        let query = format!(
            "SELECT {} FROM inventory WHERE active = TRUE AND category ILIKE $1 ORDER BY name ASC",
            INVENTORY_COLUMNS
        );

        let rows = conn.query(&query, &[&like_pattern(category)]).await?;
        rows_to_items(&rows)
    }

    async fn count(&self, active: Option<bool>) -> Result<i64> {
        let conn = self.pool().get().await?;
        let row = match active {
            Some(active) => {
                conn.query_one(
                    "SELECT COUNT(*) AS total FROM inventory WHERE active = $1",
                    &[&active],
                )
                .await?
            }
            None => {
                conn.query_one("SELECT COUNT(*) AS total FROM inventory", &[])
                    .await?
            }
        };
        Ok(row.try_get("total")?)
    }
}

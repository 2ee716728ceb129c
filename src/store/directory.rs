use async_trait::async_trait;

use super::error::Result;
use super::pg::PgStore;
use super::DirectoryRepository;
use crate::models::{Resource, Supplier};

#[async_trait]
impl DirectoryRepository for PgStore {
    async fn resources_for(&self, supervisor_id: &str) -> Result<Vec<Resource>> {
        let conn = self.pool().get().await?;
        let rows = conn
            .query(
                "SELECT name FROM supplychain_resource WHERE supervisor_id = $1 ORDER BY name ASC",
                &[&supervisor_id],
            )
            .await?;

        rows.iter()
            .map(|row| -> Result<Resource> {
                Ok(Resource {
                    name: row.try_get("name")?,
                })
            })
            .collect()
    }

    async fn suppliers_for(&self, supervisor_id: &str) -> Result<Vec<Supplier>> {
        let conn = self.pool().get().await?;
        let rows = conn
            .query(
                "SELECT id, supplier_name, supplier_email FROM supplychain_supplier
                 WHERE supervisor_id = $1
                 ORDER BY supplier_name ASC",
                &[&supervisor_id],
            )
            .await?;

        rows.iter().map(row_to_supplier).collect()
    }

    async fn supplier(&self, id: i64) -> Result<Option<Supplier>> {
        let conn = self.pool().get().await?;
        let row = conn
            .query_opt(
                "SELECT id, supplier_name, supplier_email FROM supplychain_supplier WHERE id = $1",
                &[&id],
            )
            .await?;

        row.as_ref().map(row_to_supplier).transpose()
    }
}

fn row_to_supplier(row: &tokio_postgres::Row) -> Result<Supplier> {
    Ok(Supplier {
        id: row.try_get("id")?,
        supplier_name: row.try_get("supplier_name")?,
        supplier_email: row.try_get("supplier_email")?,
    })
}

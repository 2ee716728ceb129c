use deadpool_postgres::Pool;
use tokio_postgres::types::ToSql;
use tokio_postgres::Row;

use super::error::{Result, StoreError};
use crate::models::{InventoryItem, Material, Offer, OfferRecord, PriceDetail};

/// Query parameters assembled at runtime
pub(crate) type DynParams = Vec<Box<dyn ToSql + Sync + Send>>;

pub(crate) fn param_refs(params: &DynParams) -> Vec<&(dyn ToSql + Sync)> {
    params
        .iter()
        .map(|p| p.as_ref() as &(dyn ToSql + Sync))
        .collect()
}

pub(crate) const OFFER_COLUMNS: &str = "id, user_id, customer_name, phone_number, address, \
     customer_email, task_description, bill_of_materials, time, resource, status, price, \
     project_start, materials_ordered, created_at, updated_at";

// NUMERIC is read back as float8
pub(crate) const INVENTORY_COLUMNS: &str = "id, name, category, description, brand, \
     default_price::float8 AS default_price, active, created_at, updated_at";

/// PostgreSQL-backed repositories
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}

pub(crate) fn row_to_offer(row: &Row) -> Result<OfferRecord> {
    let materials: serde_json::Value = row.try_get("bill_of_materials")?;
    let price: serde_json::Value = row.try_get("price")?;
    let status: String = row.try_get("status")?;

    let bill_of_materials: Vec<Material> = serde_json::from_value(materials)?;
    let price: PriceDetail = serde_json::from_value(price)?;
    let status = status.parse().map_err(StoreError::Decode)?;

    Ok(OfferRecord {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        offer: Offer {
            customer_name: row.try_get("customer_name")?,
            phone_number: row.try_get("phone_number")?,
            address: row.try_get("address")?,
            customer_email: row.try_get("customer_email")?,
            task_description: row.try_get("task_description")?,
            bill_of_materials,
            time: row.try_get("time")?,
            resource: row.try_get("resource")?,
            status,
            price,
            project_start: row.try_get("project_start")?,
            materials_ordered: row.try_get("materials_ordered")?,
        },
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub(crate) fn rows_to_offers(rows: &[Row]) -> Result<Vec<OfferRecord>> {
    rows.iter().map(row_to_offer).collect()
}

pub(crate) fn row_to_item(row: &Row) -> Result<InventoryItem> {
    Ok(InventoryItem {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        category: row.try_get("category")?,
        description: row.try_get("description")?,
        brand: row.try_get("brand")?,
        default_price: row.try_get("default_price")?,
        active: row.try_get("active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub(crate) fn rows_to_items(rows: &[Row]) -> Result<Vec<InventoryItem>> {
    rows.iter().map(row_to_item).collect()
}

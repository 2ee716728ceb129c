use deadpool_postgres::Pool;

use super::error::Result;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS offers (
    id UUID PRIMARY KEY,
    user_id TEXT NOT NULL,
    customer_name TEXT NOT NULL,
    phone_number TEXT NOT NULL,
    address TEXT NOT NULL,
    customer_email TEXT NOT NULL DEFAULT '',
    task_description TEXT NOT NULL,
    bill_of_materials JSONB NOT NULL DEFAULT '[]'::jsonb,
    time TEXT NOT NULL,
    resource TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'Pending',
    price JSONB NOT NULL,
    project_start DATE NOT NULL,
    materials_ordered BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

ALTER TABLE offers ADD COLUMN IF NOT EXISTS customer_email TEXT NOT NULL DEFAULT '';
ALTER TABLE offers ADD COLUMN IF NOT EXISTS materials_ordered BOOLEAN NOT NULL DEFAULT FALSE;

CREATE INDEX IF NOT EXISTS idx_offers_customer_name ON offers (customer_name);
CREATE INDEX IF NOT EXISTS idx_offers_phone_number ON offers (phone_number);
CREATE INDEX IF NOT EXISTS idx_offers_user_id ON offers (user_id);
CREATE INDEX IF NOT EXISTS idx_offers_created_at ON offers (created_at DESC);

CREATE TABLE IF NOT EXISTS inventory (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    description TEXT,
    brand TEXT,
    default_price NUMERIC(12, 2) NOT NULL,
    active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_inventory_name ON inventory (name);
CREATE INDEX IF NOT EXISTS idx_inventory_category ON inventory (category);
CREATE INDEX IF NOT EXISTS idx_inventory_brand ON inventory (brand);
CREATE INDEX IF NOT EXISTS idx_inventory_active ON inventory (active);
CREATE INDEX IF NOT EXISTS idx_inventory_created_at ON inventory (created_at DESC);

CREATE TABLE IF NOT EXISTS supplychain_resource (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    supervisor_id TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS supplychain_supplier (
    id BIGSERIAL PRIMARY KEY,
    supplier_name TEXT NOT NULL,
    supplier_email TEXT NOT NULL,
    supervisor_id TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_resource_supervisor ON supplychain_resource (supervisor_id);
CREATE INDEX IF NOT EXISTS idx_supplier_supervisor ON supplychain_supplier (supervisor_id);
"#;

/// Create tables and indexes. Safe to run on every startup.
pub async fn migrate(pool: &Pool) -> Result<()> {
    let conn = pool.get().await?;
    conn.batch_execute(SCHEMA).await?;
    tracing::info!("database schema is up to date");
    Ok(())
}

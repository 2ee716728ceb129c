//! Persistence for offers, inventory and the supply chain directory
//!
//! Each concern is a repository trait. [`PgStore`] implements all of them on
//! top of a deadpool-postgres pool; [`MemoryStore`] implements them in
//! process for tests and local runs. Handlers only see the trait objects
//! bundled in [`Store`].

mod connection;
mod directory;
mod error;
mod inventory;
mod memory;
mod offers;
mod pg;
mod schema;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{
    InventoryFilter, InventoryItem, InventoryItemUpdate, NewInventoryItem, Offer, OfferRecord,
    OfferStatus, Resource, Supplier,
};

pub use connection::StoreConfig;
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use pg::PgStore;
pub use schema::migrate;

#[async_trait]
pub trait OfferRepository: Send + Sync {
    /// Insert an offer; a fresh id is generated when `id` is `None`
    async fn insert(&self, offer: &Offer, user_id: &str, id: Option<Uuid>) -> Result<OfferRecord>;

    async fn get(&self, id: Uuid) -> Result<Option<OfferRecord>>;

    /// Newest first
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<OfferRecord>>;

    /// Case-insensitive substring match on customer name, newest first
    async fn list_by_customer(&self, name: &str) -> Result<Vec<OfferRecord>>;

    /// Offers of one user, optionally restricted to a creation month and/or year
    async fn list_by_user(
        &self,
        user_id: &str,
        month: Option<u32>,
        year: Option<i32>,
    ) -> Result<Vec<OfferRecord>>;

    /// Offers whose project starts within `start..=end`, latest start first
    async fn list_by_project_start(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<OfferRecord>>;

    /// Substring search over customer name, phone, address and task
    async fn search(&self, user_id: &str, term: &str, limit: i64) -> Result<Vec<OfferRecord>>;

    /// Replace every field of an offer. Returns false when it does not exist.
    async fn update(&self, id: Uuid, offer: &Offer, user_id: &str) -> Result<bool>;

    async fn set_status(&self, id: Uuid, status: OfferStatus) -> Result<Option<OfferStatus>>;

    /// Flip the materials_ordered flag and return the new value
    async fn toggle_materials_ordered(&self, id: Uuid) -> Result<Option<bool>>;

    async fn delete(&self, id: Uuid) -> Result<bool>;

    async fn count(&self) -> Result<i64>;
}

#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn create(&self, item: &NewInventoryItem) -> Result<InventoryItem>;

    async fn get(&self, id: Uuid) -> Result<Option<InventoryItem>>;

    async fn list(&self, filter: &InventoryFilter) -> Result<Vec<InventoryItem>>;

    /// Apply only the provided fields
    async fn update(&self, id: Uuid, changes: &InventoryItemUpdate)
        -> Result<Option<InventoryItem>>;

    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Substring search over name, description, category and brand
    async fn search(
        &self,
        term: &str,
        category: Option<&str>,
        active: bool,
        limit: i64,
    ) -> Result<Vec<InventoryItem>>;

    /// Active items of a category, by name
    async fn list_by_category(&self, category: &str) -> Result<Vec<InventoryItem>>;

    async fn count(&self, active: Option<bool>) -> Result<i64>;
}

/// Workers and suppliers, keyed by the supervising user
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    async fn resources_for(&self, supervisor_id: &str) -> Result<Vec<Resource>>;

    async fn suppliers_for(&self, supervisor_id: &str) -> Result<Vec<Supplier>>;

    async fn supplier(&self, id: i64) -> Result<Option<Supplier>>;
}

/// Repository handles shared by the HTTP layer
#[derive(Clone)]
pub struct Store {
    pub offers: Arc<dyn OfferRepository>,
    pub inventory: Arc<dyn InventoryRepository>,
    pub directory: Arc<dyn DirectoryRepository>,
}

impl Store {
    /// Use one backend for every repository
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: OfferRepository + InventoryRepository + DirectoryRepository + 'static,
    {
        Self {
            offers: backend.clone(),
            inventory: backend.clone(),
            directory: backend,
        }
    }

    pub fn postgres(pool: deadpool_postgres::Pool) -> Self {
        Self::from_backend(Arc::new(PgStore::new(pool)))
    }
}

/// Negative page sizes and offsets count as zero
pub(crate) fn non_negative(value: i64) -> i64 {
    value.max(0)
}

/// Build an ILIKE pattern matching `term` anywhere, with `%`, `_` and `\` taken literally
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

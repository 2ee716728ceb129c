use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::{Result, StoreError};
use super::{non_negative, DirectoryRepository, InventoryRepository, OfferRepository};
use crate::models::{
    InventoryFilter, InventoryItem, InventoryItemUpdate, NewInventoryItem, Offer, OfferRecord,
    OfferStatus, Resource, Supplier,
};

/// In-process repositories
///
/// Records are kept in insertion order, so "newest first" is reverse order.
#[derive(Default)]
pub struct MemoryStore {
    offers: RwLock<Vec<OfferRecord>>,
    inventory: RwLock<Vec<InventoryItem>>,
    resources: RwLock<Vec<(String, Resource)>>,
    suppliers: RwLock<Vec<(String, Supplier)>>,
}

impl MemoryStore {
    /// Register a worker under a supervisor
    pub async fn add_resource(&self, supervisor_id: &str, name: &str) {
        self.resources.write().await.push((
            supervisor_id.to_string(),
            Resource {
                name: name.to_string(),
            },
        ));
    }

    /// Register a supplier under a supervisor; ids start at 1
    pub async fn add_supplier(&self, supervisor_id: &str, name: &str, email: &str) -> Supplier {
        let mut suppliers = self.suppliers.write().await;
        let supplier = Supplier {
            id: suppliers.len() as i64 + 1,
            supplier_name: name.to_string(),
            supplier_email: email.to_string(),
        };
        suppliers.push((supervisor_id.to_string(), supplier.clone()));
        supplier
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn item_matches(item: &InventoryItem, term: &str) -> bool {
    contains_ci(&item.name, term)
        || contains_ci(&item.category, term)
        || item.description.as_deref().is_some_and(|d| contains_ci(d, term))
        || item.brand.as_deref().is_some_and(|b| contains_ci(b, term))
}

fn take(limit: i64) -> usize {
    non_negative(limit) as usize
}

#[async_trait]
impl OfferRepository for MemoryStore {
    async fn insert(&self, offer: &Offer, user_id: &str, id: Option<Uuid>) -> Result<OfferRecord> {
        let id = id.unwrap_or_else(Uuid::new_v4);
        let mut offers = self.offers.write().await;

        if offers.iter().any(|r| r.id == id) {
            return Err(StoreError::Database(format!("duplicate offer id {}", id)));
        }

        let now = Utc::now();
        let record = OfferRecord {
            id,
            user_id: user_id.to_string(),
            offer: offer.clone(),
            created_at: now,
            updated_at: now,
        };
        offers.push(record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<OfferRecord>> {
        let offers = self.offers.read().await;
        Ok(offers.iter().find(|r| r.id == id).cloned())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<OfferRecord>> {
        let offers = self.offers.read().await;
        Ok(offers
            .iter()
            .rev()
            .skip(non_negative(offset) as usize)
            .take(take(limit))
            .cloned()
            .collect())
    }

    async fn list_by_customer(&self, name: &str) -> Result<Vec<OfferRecord>> {
        let offers = self.offers.read().await;
        Ok(offers
            .iter()
            .rev()
            .filter(|r| contains_ci(&r.offer.customer_name, name))
            .cloned()
            .collect())
    }

    async fn list_by_user(
        &self,
        user_id: &str,
        month: Option<u32>,
        year: Option<i32>,
    ) -> Result<Vec<OfferRecord>> {
        let offers = self.offers.read().await;
        Ok(offers
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .filter(|r| month.map_or(true, |m| r.created_at.month() == m))
            .filter(|r| year.map_or(true, |y| r.created_at.year() == y))
            .cloned()
            .collect())
    }

    async fn list_by_project_start(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<OfferRecord>> {
        let offers = self.offers.read().await;
        let mut found: Vec<OfferRecord> = offers
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .filter(|r| r.offer.project_start >= start && r.offer.project_start <= end)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.offer.project_start.cmp(&a.offer.project_start));
        Ok(found)
    }

    async fn search(&self, user_id: &str, term: &str, limit: i64) -> Result<Vec<OfferRecord>> {
        let offers = self.offers.read().await;
        Ok(offers
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .filter(|r| {
                let o = &r.offer;
                contains_ci(&o.customer_name, term)
                    || contains_ci(&o.phone_number, term)
                    || contains_ci(&o.address, term)
                    || contains_ci(&o.task_description, term)
            })
            .take(take(limit))
            .cloned()
            .collect())
    }

    async fn update(&self, id: Uuid, offer: &Offer, user_id: &str) -> Result<bool> {
        let mut offers = self.offers.write().await;
        match offers.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.offer = offer.clone();
                record.user_id = user_id.to_string();
                record.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_status(&self, id: Uuid, status: OfferStatus) -> Result<Option<OfferStatus>> {
        let mut offers = self.offers.write().await;
        Ok(offers.iter_mut().find(|r| r.id == id).map(|record| {
            record.offer.status = status;
            record.updated_at = Utc::now();
            status
        }))
    }

    async fn toggle_materials_ordered(&self, id: Uuid) -> Result<Option<bool>> {
        let mut offers = self.offers.write().await;
        Ok(offers.iter_mut().find(|r| r.id == id).map(|record| {
            record.offer.materials_ordered = !record.offer.materials_ordered;
            record.updated_at = Utc::now();
            record.offer.materials_ordered
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut offers = self.offers.write().await;
        let before = offers.len();
        offers.retain(|r| r.id != id);
        Ok(offers.len() < before)
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.offers.read().await.len() as i64)
    }
}

#[async_trait]
impl InventoryRepository for MemoryStore {
    async fn create(&self, item: &NewInventoryItem) -> Result<InventoryItem> {
        let now = Utc::now();
        let created = InventoryItem {
            id: Uuid::new_v4(),
            name: item.name.clone(),
            category: item.category.clone(),
            description: item.description.clone(),
            brand: item.brand.clone(),
            default_price: item.default_price,
            active: item.active,
            created_at: now,
            updated_at: now,
        };
        self.inventory.write().await.push(created.clone());
        Ok(created)
    }

    async fn get(&self, id: Uuid) -> Result<Option<InventoryItem>> {
        let inventory = self.inventory.read().await;
        Ok(inventory.iter().find(|i| i.id == id).cloned())
    }

    async fn list(&self, filter: &InventoryFilter) -> Result<Vec<InventoryItem>> {
        let inventory = self.inventory.read().await;
        Ok(inventory
            .iter()
            .rev()
            .filter(|i| filter.active.map_or(true, |a| i.active == a))
            .filter(|i| {
                filter
                    .category
                    .as_deref()
                    .map_or(true, |c| contains_ci(&i.category, c))
            })
            .skip(non_negative(filter.offset) as usize)
            .take(take(filter.limit))
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &InventoryItemUpdate,
    ) -> Result<Option<InventoryItem>> {
        let mut inventory = self.inventory.write().await;
        let Some(item) = inventory.iter_mut().find(|i| i.id == id) else {
            return Ok(None);
        };

        if changes.is_empty() {
            return Ok(Some(item.clone()));
        }
        if let Some(name) = &changes.name {
            item.name = name.clone();
        }
        if let Some(category) = &changes.category {
            item.category = category.clone();
        }
        if let Some(description) = &changes.description {
            item.description = Some(description.clone());
        }
        if let Some(brand) = &changes.brand {
            item.brand = Some(brand.clone());
        }
        if let Some(price) = changes.default_price {
            item.default_price = price;
        }
        if let Some(active) = changes.active {
            item.active = active;
        }
        item.updated_at = Utc::now();

        Ok(Some(item.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut inventory = self.inventory.write().await;
        let before = inventory.len();
        inventory.retain(|i| i.id != id);
        Ok(inventory.len() < before)
    }

    async fn search(
        &self,
        term: &str,
        category: Option<&str>,
        active: bool,
        limit: i64,
    ) -> Result<Vec<InventoryItem>> {
        let inventory = self.inventory.read().await;
        Ok(inventory
            .iter()
            .rev()
            .filter(|i| i.active == active)
            .filter(|i| item_matches(i, term))
            .filter(|i| category.map_or(true, |c| contains_ci(&i.category, c)))
            .take(take(limit))
            .cloned()
            .collect())
    }

    async fn list_by_category(&self, category: &str) -> Result<Vec<InventoryItem>> {
        let inventory = self.inventory.read().await;
        let mut found: Vec<InventoryItem> = inventory
            .iter()
            .filter(|i| i.active && contains_ci(&i.category, category))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn count(&self, active: Option<bool>) -> Result<i64> {
        let inventory = self.inventory.read().await;
        Ok(inventory
            .iter()
            .filter(|i| active.map_or(true, |a| i.active == a))
            .count() as i64)
    }
}

#[async_trait]
impl DirectoryRepository for MemoryStore {
    async fn resources_for(&self, supervisor_id: &str) -> Result<Vec<Resource>> {
        let resources = self.resources.read().await;
        let mut found: Vec<Resource> = resources
            .iter()
            .filter(|(owner, _)| owner == supervisor_id)
            .map(|(_, r)| r.clone())
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn suppliers_for(&self, supervisor_id: &str) -> Result<Vec<Supplier>> {
        let suppliers = self.suppliers.read().await;
        let mut found: Vec<Supplier> = suppliers
            .iter()
            .filter(|(owner, _)| owner == supervisor_id)
            .map(|(_, s)| s.clone())
            .collect();
        found.sort_by(|a, b| a.supplier_name.cmp(&b.supplier_name));
        Ok(found)
    }

    async fn supplier(&self, id: i64) -> Result<Option<Supplier>> {
        let suppliers = self.suppliers.read().await;
        Ok(suppliers
            .iter()
            .find(|(_, s)| s.id == id)
            .map(|(_, s)| s.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::sample_offer;

    fn tile(name: &str, category: &str, active: bool) -> NewInventoryItem {
        NewInventoryItem {
            name: name.to_string(),
            category: category.to_string(),
            description: Some("Glazed ceramic".to_string()),
            brand: Some("Acme".to_string()),
            default_price: 19.5,
            active,
        }
    }

    #[tokio::test]
    async fn test_offer_insert_and_get() {
        let store = MemoryStore::default();
        let record = store.insert(&sample_offer(), "u1", None).await.unwrap();

        let found = OfferRepository::get(&store, record.id).await.unwrap();
        assert_eq!(found, Some(record));
        assert_eq!(OfferRepository::count(&store).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_offer_insert_with_explicit_id() {
        let store = MemoryStore::default();
        let id = Uuid::new_v4();
        let record = store.insert(&sample_offer(), "u1", Some(id)).await.unwrap();
        assert_eq!(record.id, id);

        let duplicate = store.insert(&sample_offer(), "u1", Some(id)).await;
        assert!(matches!(duplicate, Err(StoreError::Database(_))));
    }

    #[tokio::test]
    async fn test_offer_list_is_newest_first_and_paginated() {
        let store = MemoryStore::default();
        let mut ids = Vec::new();
        for name in ["A", "B", "C"] {
            let mut offer = sample_offer();
            offer.customer_name = name.to_string();
            ids.push(store.insert(&offer, "u1", None).await.unwrap().id);
        }

        let page = OfferRepository::list(&store, 2, 0).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, ids[2]);
        assert_eq!(page[1].id, ids[1]);

        let rest = OfferRepository::list(&store, 2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].id, ids[0]);
    }

    #[tokio::test]
    async fn test_offer_negative_paging_counts_as_zero() {
        let store = MemoryStore::default();
        store.insert(&sample_offer(), "u1", None).await.unwrap();

        assert!(OfferRepository::list(&store, -1, 0).await.unwrap().is_empty());
        assert_eq!(OfferRepository::list(&store, 10, -3).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_offer_customer_and_search_are_case_insensitive() {
        let store = MemoryStore::default();
        store.insert(&sample_offer(), "u1", None).await.unwrap();
        store.insert(&sample_offer(), "u2", None).await.unwrap();

        assert_eq!(store.list_by_customer("jane").await.unwrap().len(), 2);
        assert_eq!(store.list_by_customer("john").await.unwrap().len(), 0);

        let hits = OfferRepository::search(&store, "u1", "BATHROOM", 10)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].user_id, "u1");

        let by_phone = OfferRepository::search(&store, "u2", "0100", 10)
            .await
            .unwrap();
        assert_eq!(by_phone.len(), 1);
    }

    #[tokio::test]
    async fn test_offer_list_by_user_filters_month_and_year() {
        let store = MemoryStore::default();
        store.insert(&sample_offer(), "u1", None).await.unwrap();
        let now = Utc::now();

        let all = store.list_by_user("u1", None, None).await.unwrap();
        assert_eq!(all.len(), 1);

        let this_month = store
            .list_by_user("u1", Some(now.month()), Some(now.year()))
            .await
            .unwrap();
        assert_eq!(this_month.len(), 1);

        let other_year = store
            .list_by_user("u1", None, Some(now.year() - 1))
            .await
            .unwrap();
        assert!(other_year.is_empty());
    }

    #[tokio::test]
    async fn test_offer_list_by_project_start_is_inclusive() {
        let store = MemoryStore::default();
        for day in [1, 10, 20] {
            let mut offer = sample_offer();
            offer.project_start = NaiveDate::from_ymd_opt(2025, 3, day).unwrap();
            store.insert(&offer, "u1", None).await.unwrap();
        }

        let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let found = store.list_by_project_start("u1", start, end).await.unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].offer.project_start, end);
        assert_eq!(found[1].offer.project_start, start);

        let inverted = store.list_by_project_start("u1", end, start).await.unwrap();
        assert!(inverted.is_empty());
    }

    #[tokio::test]
    async fn test_offer_update_status_toggle_and_delete() {
        let store = MemoryStore::default();
        let record = store.insert(&sample_offer(), "u1", None).await.unwrap();

        let mut changed = sample_offer();
        changed.time = "5 days".to_string();
        assert!(OfferRepository::update(&store, record.id, &changed, "u1")
            .await
            .unwrap());
        assert!(!OfferRepository::update(&store, Uuid::new_v4(), &changed, "u1")
            .await
            .unwrap());

        let status = store
            .set_status(record.id, OfferStatus::Accepted)
            .await
            .unwrap();
        assert_eq!(status, Some(OfferStatus::Accepted));

        assert_eq!(
            store.toggle_materials_ordered(record.id).await.unwrap(),
            Some(true)
        );
        assert_eq!(
            store.toggle_materials_ordered(record.id).await.unwrap(),
            Some(false)
        );
        assert_eq!(store.toggle_materials_ordered(Uuid::new_v4()).await.unwrap(), None);

        let stored = OfferRepository::get(&store, record.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.offer.time, "5 days");
        assert_eq!(stored.offer.status, OfferStatus::Accepted);
        assert!(stored.updated_at >= record.updated_at);

        assert!(OfferRepository::delete(&store, record.id).await.unwrap());
        assert!(!OfferRepository::delete(&store, record.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_inventory_filters_and_search() {
        let store = MemoryStore::default();
        store.create(&tile("Wall tile", "Tiles", true)).await.unwrap();
        store.create(&tile("Floor tile", "Tiles", true)).await.unwrap();
        store.create(&tile("Old grout", "Grout", false)).await.unwrap();

        let filter = InventoryFilter {
            active: Some(true),
            ..Default::default()
        };
        assert_eq!(InventoryRepository::list(&store, &filter).await.unwrap().len(), 2);

        let filter = InventoryFilter {
            category: Some("grou".to_string()),
            ..Default::default()
        };
        assert_eq!(InventoryRepository::list(&store, &filter).await.unwrap().len(), 1);

        let hits = InventoryRepository::search(&store, "acme", None, true, 100)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].name, "Floor tile");

        let inactive = InventoryRepository::search(&store, "grout", None, false, 100)
            .await
            .unwrap();
        assert_eq!(inactive.len(), 1);

        let by_category = store.list_by_category("tiles").await.unwrap();
        let names: Vec<_> = by_category.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Floor tile", "Wall tile"]);

        assert_eq!(InventoryRepository::count(&store, None).await.unwrap(), 3);
        assert_eq!(InventoryRepository::count(&store, Some(false)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_inventory_partial_update() {
        let store = MemoryStore::default();
        let item = store.create(&tile("Wall tile", "Tiles", true)).await.unwrap();

        let changes = InventoryItemUpdate {
            default_price: Some(25.0),
            active: Some(false),
            ..Default::default()
        };
        let updated = InventoryRepository::update(&store, item.id, &changes)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.default_price, 25.0);
        assert!(!updated.active);
        assert_eq!(updated.name, "Wall tile");
        assert_eq!(updated.brand.as_deref(), Some("Acme"));

        let missing = InventoryRepository::update(&store, Uuid::new_v4(), &changes)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_directory_lookups() {
        let store = MemoryStore::default();
        store.add_resource("boss", "Zoe").await;
        store.add_resource("boss", "Adam").await;
        store.add_resource("other", "Eve").await;
        let supplier = store
            .add_supplier("boss", "Tile Co", "sales@tile.example")
            .await;

        let names: Vec<_> = store
            .resources_for("boss")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Adam", "Zoe"]);

        assert_eq!(store.suppliers_for("boss").await.unwrap(), vec![supplier.clone()]);
        assert!(store.suppliers_for("other").await.unwrap().is_empty());
        assert_eq!(store.supplier(supplier.id).await.unwrap(), Some(supplier));
        assert_eq!(store.supplier(99).await.unwrap(), None);
    }
}

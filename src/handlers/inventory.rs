// Inventory handlers

use serde_json::json;

use super::{decode_segment, lookup_id};
use crate::error::{reject, ApiError};
use crate::models::{
    InventoryCountQuery, InventoryFilter, InventoryItemUpdate, InventorySearchQuery,
    NewInventoryItem,
};
use crate::state::AppState;

const ITEM_NOT_FOUND: &str = "Inventory item not found";

const SEARCH_LIMIT: i64 = 100;

// POST /inventory
pub async fn create_inventory_handler(
    item: NewInventoryItem,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let created = state.store.inventory.create(&item).await.map_err(reject)?;

    tracing::info!(item_id = %created.id, name = %created.name, "inventory item created");
    Ok(warp::reply::json(&json!({
        "message": "Inventory item created successfully",
        "item_id": created.id,
        "item": created,
    })))
}

// GET /inventory
pub async fn list_inventory_handler(
    filter: InventoryFilter,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let items = state.store.inventory.list(&filter).await.map_err(reject)?;
    Ok(warp::reply::json(&items))
}

// GET /inventory/stats/count
pub async fn inventory_count_handler(
    query: InventoryCountQuery,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let total = state
        .store
        .inventory
        .count(query.active)
        .await
        .map_err(reject)?;
    Ok(warp::reply::json(&json!({ "total_items": total })))
}

// GET /inventory/category/{category}
pub async fn inventory_by_category_handler(
    category: String,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let items = state
        .store
        .inventory
        .list_by_category(&decode_segment(&category))
        .await
        .map_err(reject)?;
    Ok(warp::reply::json(&items))
}

// POST /inventory/search
pub async fn search_inventory_handler(
    query: InventorySearchQuery,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let items = state
        .store
        .inventory
        .search(
            &query.query,
            query.category.as_deref(),
            query.active,
            SEARCH_LIMIT,
        )
        .await
        .map_err(reject)?;
    Ok(warp::reply::json(&items))
}

// GET /inventory/{item_id}
pub async fn get_inventory_handler(
    item_id: String,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let id = lookup_id(&item_id, ITEM_NOT_FOUND)?;
    let item = state
        .store
        .inventory
        .get(id)
        .await
        .map_err(reject)?
        .ok_or_else(|| ApiError::NotFound(ITEM_NOT_FOUND.to_string()))?;
    Ok(warp::reply::json(&item))
}

// PUT /inventory/{item_id}
pub async fn update_inventory_handler(
    item_id: String,
    changes: InventoryItemUpdate,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let id = lookup_id(&item_id, ITEM_NOT_FOUND)?;
    if changes.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()).into());
    }

    let item = state
        .store
        .inventory
        .update(id, &changes)
        .await
        .map_err(reject)?
        .ok_or_else(|| ApiError::NotFound(ITEM_NOT_FOUND.to_string()))?;

    Ok(warp::reply::json(&json!({
        "message": "Inventory item updated successfully",
        "item": item,
    })))
}

// DELETE /inventory/{item_id}
pub async fn delete_inventory_handler(
    item_id: String,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let id = lookup_id(&item_id, ITEM_NOT_FOUND)?;
    if !state.store.inventory.delete(id).await.map_err(reject)? {
        return Err(ApiError::NotFound(ITEM_NOT_FOUND.to_string()).into());
    }
    Ok(warp::reply::json(&json!({ "message": "Inventory item deleted successfully" })))
}

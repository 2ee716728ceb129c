// Offer handlers: AI generation, storage and lookups

use serde_json::json;
use uuid::Uuid;

use super::{decode_segment, lookup_id};
use crate::error::{reject, ApiError};
use crate::models::{
    MaterialsOrderedQuery, OfferRecord, OfferRequest, OfferSearchQuery, OfferView,
    OffersByDateQuery, OffersByUserQuery, PageQuery, SaveOfferRequest, UpdateOfferRequest,
    UpdateStatusRequest,
};
use crate::state::AppState;

const OFFER_NOT_FOUND: &str = "offer not found";

// Ids the frontend sends when it has no real one
const PLACEHOLDER_IDS: [&str; 3] = ["string", "null", "undefined"];

fn save_id(raw: &str) -> Result<Uuid, ApiError> {
    let raw = raw.trim();
    let invalid = || ApiError::BadRequest("Invalid or missing offer_id".to_string());

    if raw.is_empty() || PLACEHOLDER_IDS.contains(&raw.to_lowercase().as_str()) {
        return Err(invalid());
    }
    Uuid::parse_str(raw).map_err(|_| invalid())
}

async fn load_offer(state: &AppState, id: Uuid) -> Result<OfferRecord, warp::Rejection> {
    state
        .store
        .offers
        .get(id)
        .await
        .map_err(reject)?
        .ok_or_else(|| ApiError::NotFound(OFFER_NOT_FOUND.to_string()).into())
}

// POST /offers/generate
pub async fn generate_offer_handler(
    request: OfferRequest,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let offer = state
        .generator
        .generate_offer(&request)
        .await
        .map_err(reject)?;

    let record = state
        .store
        .offers
        .insert(&offer, &request.user_id, None)
        .await
        .map_err(reject)?;

    tracing::info!(offer_id = %record.id, user_id = %record.user_id, "offer generated");
    Ok(warp::reply::json(&OfferView::from(record)))
}

// PUT /offers/save
pub async fn save_offer_handler(
    request: SaveOfferRequest,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let id = save_id(&request.offer_id)?;
    let offers = &state.store.offers;

    let message = if offers.get(id).await.map_err(reject)?.is_some() {
        let updated = offers
            .update(id, &request.offer, &request.user_id)
            .await
            .map_err(reject)?;
        if !updated {
            return Err(ApiError::Internal("Failed to update offer in database".to_string()).into());
        }
        "Offer updated successfully"
    } else {
        offers
            .insert(&request.offer, &request.user_id, Some(id))
            .await
            .map_err(reject)?;
        "Offer saved successfully"
    };

    let record = load_offer(&state, id).await?;
    Ok(warp::reply::json(&json!({
        "message": message,
        "offer_id": id,
        "offer": record,
    })))
}

// GET /offers
pub async fn list_offers_handler(
    query: PageQuery,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let offers = state
        .store
        .offers
        .list(query.limit, query.offset)
        .await
        .map_err(reject)?;
    Ok(warp::reply::json(&offers))
}

// GET /offers/count
pub async fn count_offers_handler(state: AppState) -> Result<impl warp::Reply, warp::Rejection> {
    let total = state.store.offers.count().await.map_err(reject)?;
    Ok(warp::reply::json(&json!({ "total_offers": total })))
}

// GET /offers/customer/{customer_name}
pub async fn offers_by_customer_handler(
    customer_name: String,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let offers = state
        .store
        .offers
        .list_by_customer(&decode_segment(&customer_name))
        .await
        .map_err(reject)?;
    Ok(warp::reply::json(&offers))
}

// GET /offers/user/{user_id}
pub async fn offers_by_user_handler(
    user_id: String,
    query: OffersByUserQuery,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    if let Some(month) = query.month {
        if !(1..=12).contains(&month) {
            return Err(ApiError::BadRequest("month must be between 1 and 12".to_string()).into());
        }
    }

    let offers = state
        .store
        .offers
        .list_by_user(&decode_segment(&user_id), query.month, query.year)
        .await
        .map_err(reject)?;
    Ok(warp::reply::json(&offers))
}

// GET /offers-date
pub async fn offers_by_date_handler(
    query: OffersByDateQuery,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let offers = state
        .store
        .offers
        .list_by_project_start(&query.user_id, query.start_date, query.end_date)
        .await
        .map_err(reject)?;
    Ok(warp::reply::json(&offers))
}

// GET /offers/search/{search_term}
pub async fn search_offers_handler(
    term: String,
    query: OfferSearchQuery,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let offers = state
        .store
        .offers
        .search(&query.user_id, &decode_segment(&term), query.limit)
        .await
        .map_err(reject)?;
    Ok(warp::reply::json(&offers))
}

// PUT /offers/update
pub async fn update_offer_handler(
    request: UpdateOfferRequest,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let id = lookup_id(&request.offer_id, OFFER_NOT_FOUND)?;
    let existing = load_offer(&state, id).await?;

    let updated = state
        .generator
        .update_offer(&request.user_message, &existing.offer)
        .await
        .map_err(reject)?;

    let saved = state
        .store
        .offers
        .update(id, &updated, &existing.user_id)
        .await
        .map_err(reject)?;
    if !saved {
        return Err(ApiError::Internal("Failed to update offer in database".to_string()).into());
    }

    tracing::info!(offer_id = %id, "offer updated by AI");
    let record = load_offer(&state, id).await?;
    Ok(warp::reply::json(&OfferView::from(record)))
}

// PUT /offers/toggle-status
pub async fn toggle_status_handler(
    request: UpdateStatusRequest,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let id = lookup_id(&request.offer_id, OFFER_NOT_FOUND)?;
    let status = state
        .store
        .offers
        .set_status(id, request.status)
        .await
        .map_err(reject)?
        .ok_or_else(|| ApiError::NotFound(OFFER_NOT_FOUND.to_string()))?;

    Ok(warp::reply::json(&json!({
        "message": "Status updated successfully",
        "offer_id": id,
        "status": status,
    })))
}

// PUT /offers/materials-ordered?offer_id=
pub async fn materials_ordered_handler(
    query: MaterialsOrderedQuery,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let id = lookup_id(&query.offer_id, OFFER_NOT_FOUND)?;
    let materials_ordered = state
        .store
        .offers
        .toggle_materials_ordered(id)
        .await
        .map_err(reject)?
        .ok_or_else(|| ApiError::NotFound(OFFER_NOT_FOUND.to_string()))?;

    Ok(warp::reply::json(&json!({
        "message": "Materials ordered status toggled successfully",
        "offer_id": id,
        "materials_ordered": materials_ordered,
    })))
}

// GET /offers/{offer_id}
pub async fn get_offer_handler(
    offer_id: String,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let id = lookup_id(&offer_id, OFFER_NOT_FOUND)?;
    let record = load_offer(&state, id).await?;
    Ok(warp::reply::json(&OfferView::from(record)))
}

// DELETE /offers/{offer_id}
pub async fn delete_offer_handler(
    offer_id: String,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let id = lookup_id(&offer_id, OFFER_NOT_FOUND)?;
    if !state.store.offers.delete(id).await.map_err(reject)? {
        return Err(ApiError::NotFound(OFFER_NOT_FOUND.to_string()).into());
    }

    tracing::info!(offer_id = %id, "offer deleted");
    Ok(warp::reply::json(&json!({ "message": "offer deleted successfully" })))
}

// Supply chain directory handlers

use super::decode_segment;
use crate::error::{reject, ApiError};
use crate::state::AppState;

// GET /resources/{user_id}
pub async fn resources_handler(
    user_id: String,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let resources = state
        .store
        .directory
        .resources_for(&decode_segment(&user_id))
        .await
        .map_err(reject)?;
    Ok(warp::reply::json(&resources))
}

// GET /suppliers/{user_id}
pub async fn suppliers_handler(
    user_id: String,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let suppliers = state
        .store
        .directory
        .suppliers_for(&decode_segment(&user_id))
        .await
        .map_err(reject)?;
    Ok(warp::reply::json(&suppliers))
}

// GET /suppliers/id/{supplier_id}
pub async fn supplier_handler(
    supplier_id: String,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let not_found = || ApiError::NotFound("Supplier not found".to_string());

    let id: i64 = supplier_id.trim().parse().map_err(|_| not_found())?;
    let supplier = state
        .store
        .directory
        .supplier(id)
        .await
        .map_err(reject)?
        .ok_or_else(not_found)?;
    Ok(warp::reply::json(&supplier))
}

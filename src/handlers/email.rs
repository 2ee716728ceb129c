// Email drafting and delivery handlers

use serde_json::json;

use super::lookup_id;
use crate::error::{reject, ApiError};
use crate::models::{EmailRequest, OfferRecord, OutgoingEmail};
use crate::state::AppState;

const OFFER_NOT_FOUND: &str = "Offer not found";

async fn offer_for_email(
    request: &EmailRequest,
    state: &AppState,
) -> Result<OfferRecord, warp::Rejection> {
    let id = lookup_id(&request.offer_id, OFFER_NOT_FOUND)?;
    state
        .store
        .offers
        .get(id)
        .await
        .map_err(reject)?
        .ok_or_else(|| ApiError::NotFound(OFFER_NOT_FOUND.to_string()).into())
}

// POST /email-offer
pub async fn email_offer_handler(
    request: EmailRequest,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let record = offer_for_email(&request, &state).await?;
    let content = state
        .composer
        .compose_offer_email(&record)
        .await
        .map_err(reject)?;
    Ok(warp::reply::json(&content))
}

// POST /email-acceptance
pub async fn email_acceptance_handler(
    request: EmailRequest,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let record = offer_for_email(&request, &state).await?;
    let content = state
        .composer
        .compose_acceptance_email(&record)
        .await
        .map_err(reject)?;
    Ok(warp::reply::json(&content))
}

// POST /email-custom
pub async fn email_custom_handler(
    request: EmailRequest,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let record = offer_for_email(&request, &state).await?;
    Ok(warp::reply::json(&state.composer.compose_custom_email(&record)))
}

// POST /send-email
pub async fn send_email_handler(
    email: OutgoingEmail,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    state.mailer.send(&email).await.map_err(reject)?;
    Ok(warp::reply::json(&json!({ "message": "Email sent successfully" })))
}

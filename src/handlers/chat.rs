// POST /offers/chat handler

use crate::error::reject;
use crate::models::ChatRequest;
use crate::state::AppState;

pub async fn chat_handler(
    request: ChatRequest,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let reply = state.chat.handle(request).await.map_err(reject)?;
    Ok(warp::reply::json(&reply))
}

// GET /health handler

use chrono::Utc;
use std::convert::Infallible;

pub async fn health_handler() -> Result<impl warp::Reply, Infallible> {
    Ok(warp::reply::json(&serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now(),
    })))
}

// Route definitions

use std::convert::Infallible;

use serde::de::DeserializeOwned;
use warp::Filter;

use crate::error::handle_rejection;
use crate::handlers;
use crate::state::AppState;

const JSON_BODY_LIMIT: u64 = 1024 * 1024;

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn json_body<T: DeserializeOwned + Send>(
) -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone {
    warp::body::content_length_limit(JSON_BODY_LIMIT).and(warp::body::json())
}

pub fn configure_routes(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allow_headers(vec!["content-type", "authorization", "accept"]);

    // GET /health
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(handlers::health_handler);

    health
        .or(offer_routes(state.clone()))
        .or(inventory_routes(state.clone()))
        .or(directory_routes(state.clone()))
        .or(email_routes(state))
        .recover(handle_rejection)
        .with(cors)
}

fn offer_routes(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let offers = warp::path("offers");

    // POST /offers/generate
    let generate = offers
        .and(warp::path("generate"))
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handlers::generate_offer_handler);

    // PUT /offers/save
    let save = offers
        .and(warp::path("save"))
        .and(warp::path::end())
        .and(warp::put())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handlers::save_offer_handler);

    // GET /offers
    let list = offers
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query())
        .and(with_state(state.clone()))
        .and_then(handlers::list_offers_handler);

    // GET /offers/count
    let count = offers
        .and(warp::path("count"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::count_offers_handler);

    // GET /offers/customer/{customer_name}
    let by_customer = offers
        .and(warp::path("customer"))
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::offers_by_customer_handler);

    // GET /offers/user/{user_id}
    let by_user = offers
        .and(warp::path("user"))
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query())
        .and(with_state(state.clone()))
        .and_then(handlers::offers_by_user_handler);

    // GET /offers-date
    let by_date = warp::path("offers-date")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query())
        .and(with_state(state.clone()))
        .and_then(handlers::offers_by_date_handler);

    // GET /offers/search/{search_term}
    let search = offers
        .and(warp::path("search"))
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query())
        .and(with_state(state.clone()))
        .and_then(handlers::search_offers_handler);

    // PUT /offers/update
    let update = offers
        .and(warp::path("update"))
        .and(warp::path::end())
        .and(warp::put())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handlers::update_offer_handler);

    // PUT /offers/toggle-status
    let toggle_status = offers
        .and(warp::path("toggle-status"))
        .and(warp::path::end())
        .and(warp::put())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handlers::toggle_status_handler);

    // PUT /offers/materials-ordered?offer_id=
    let materials_ordered = offers
        .and(warp::path("materials-ordered"))
        .and(warp::path::end())
        .and(warp::put())
        .and(warp::query())
        .and(with_state(state.clone()))
        .and_then(handlers::materials_ordered_handler);

    // POST /offers/chat
    let chat = offers
        .and(warp::path("chat"))
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handlers::chat_handler);

    // GET /offers/{offer_id}
    let get = offers
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::get_offer_handler);

    // DELETE /offers/{offer_id}
    let delete = offers
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::delete())
        .and(with_state(state))
        .and_then(handlers::delete_offer_handler);

    // Fixed paths go before /offers/{offer_id}
    generate
        .or(save)
        .or(list)
        .or(count)
        .or(by_customer)
        .or(by_user)
        .or(by_date)
        .or(search)
        .or(update)
        .or(toggle_status)
        .or(materials_ordered)
        .or(chat)
        .or(get)
        .or(delete)
}

fn inventory_routes(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let inventory = warp::path("inventory");

    // POST /inventory
    let create = inventory
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handlers::create_inventory_handler);

    // GET /inventory
    let list = inventory
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query())
        .and(with_state(state.clone()))
        .and_then(handlers::list_inventory_handler);

    // GET /inventory/stats/count
    let count = inventory
        .and(warp::path("stats"))
        .and(warp::path("count"))
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query())
        .and(with_state(state.clone()))
        .and_then(handlers::inventory_count_handler);

    // GET /inventory/category/{category}
    let by_category = inventory
        .and(warp::path("category"))
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::inventory_by_category_handler);

    // POST /inventory/search
    let search = inventory
        .and(warp::path("search"))
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handlers::search_inventory_handler);

    // GET /inventory/{item_id}
    let get = inventory
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::get_inventory_handler);

    // PUT /inventory/{item_id}
    let update = inventory
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::put())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handlers::update_inventory_handler);

    // DELETE /inventory/{item_id}
    let delete = inventory
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::delete())
        .and(with_state(state))
        .and_then(handlers::delete_inventory_handler);

    create
        .or(list)
        .or(count)
        .or(by_category)
        .or(search)
        .or(get)
        .or(update)
        .or(delete)
}

fn directory_routes(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    // GET /resources/{user_id}
    let resources = warp::path("resources")
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::resources_handler);

    // GET /suppliers/id/{supplier_id}
    let supplier = warp::path("suppliers")
        .and(warp::path("id"))
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::supplier_handler);

    // GET /suppliers/{user_id}
    let suppliers = warp::path("suppliers")
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state))
        .and_then(handlers::suppliers_handler);

    resources.or(supplier).or(suppliers)
}

fn email_routes(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    // POST /email-offer
    let offer = warp::path("email-offer")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handlers::email_offer_handler);

    // POST /email-acceptance
    let acceptance = warp::path("email-acceptance")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handlers::email_acceptance_handler);

    // POST /email-custom
    let custom = warp::path("email-custom")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handlers::email_custom_handler);

    // POST /send-email
    let send = warp::path("send-email")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with_state(state))
        .and_then(handlers::send_email_handler);

    offer.or(acceptance).or(custom).or(send)
}

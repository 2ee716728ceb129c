// Handlers module

pub mod chat;
pub mod directory;
pub mod email;
pub mod health;
pub mod inventory;
pub mod offers;

use std::borrow::Cow;

use uuid::Uuid;
use warp::Rejection;

use crate::error::ApiError;

pub use chat::chat_handler;
pub use directory::{resources_handler, supplier_handler, suppliers_handler};
pub use email::{
    email_acceptance_handler, email_custom_handler, email_offer_handler, send_email_handler,
};
pub use health::health_handler;
pub use inventory::{
    create_inventory_handler, delete_inventory_handler, get_inventory_handler,
    inventory_by_category_handler, inventory_count_handler, list_inventory_handler,
    search_inventory_handler, update_inventory_handler,
};
pub use offers::{
    count_offers_handler, delete_offer_handler, generate_offer_handler, get_offer_handler,
    list_offers_handler, materials_ordered_handler, offers_by_customer_handler,
    offers_by_date_handler, offers_by_user_handler, save_offer_handler, search_offers_handler,
    toggle_status_handler, update_offer_handler,
};

/// Parse an id used for a lookup; anything that is not a UUID cannot exist
pub(crate) fn lookup_id(raw: &str, not_found: &str) -> Result<Uuid, Rejection> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::NotFound(not_found.to_string()).into())
}

/// Percent-decode a path segment
pub(crate) fn decode_segment(raw: &str) -> String {
    urlencoding::decode(raw)
        .unwrap_or(Cow::Borrowed(raw))
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_segment() {
        assert_eq!(decode_segment("Jane%20Doe"), "Jane Doe");
        assert_eq!(decode_segment("plain"), "plain");
    }

    #[test]
    fn test_lookup_id() {
        let id = Uuid::new_v4();
        assert_eq!(lookup_id(&id.to_string(), "missing").unwrap(), id);
        assert!(lookup_id("abc", "missing").is_err());
    }
}

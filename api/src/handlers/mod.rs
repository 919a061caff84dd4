//! HTTP handlers
//!
//! Axum request handlers for the API endpoints. Every handler answers with
//! the `{status, message, data, code?}` envelope.

pub mod carts;
pub mod catalog;
pub mod extract;
pub mod notifications;
pub mod orders;
pub mod resources;
pub mod shipments;
pub mod uploads;
pub mod webhooks;

pub use carts::{
    add_cart_item, add_wishlist_item, clear_cart, get_cart, get_wishlist, remove_cart_item,
    remove_wishlist_item, update_cart_item,
};
pub use catalog::{
    get_product, list_products, product_by_slug, product_reviews, products_in_category,
    submit_review,
};
pub use notifications::{mark_notification_read, user_notifications};
pub use orders::{
    delete_order, get_order, list_orders, order_by_invoice, place_order, update_order_status,
    user_orders, validate_coupon,
};
pub use shipments::{
    bulk_create_shipments, courier_balance, create_shipment, sync_all_shipments, sync_shipment,
    track_shipment,
};
pub use uploads::{upload_banner, upload_file};
pub use webhooks::steadfast_webhook;

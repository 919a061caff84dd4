//! Application layer
//!
//! Contains use cases and service orchestration.
//! Services coordinate between domain entities, ports, and external systems.

pub mod cart_service;
pub mod catalog_service;
pub mod notification_service;
pub mod order_service;
pub mod resource_service;
pub mod shipment_service;
pub mod upload_service;

pub use cart_service::{CartService, CartView, WishlistView};
pub use catalog_service::CatalogService;
pub use notification_service::NotificationService;
pub use order_service::{CouponQuote, OrderService, PlaceOrderRequest};
pub use resource_service::{ListParams, ResourceService};
pub use shipment_service::{
    BulkShipmentResult, ShipmentService, SyncResult, SyncSummary, TrackingInfo, WebhookOutcome,
    WebhookPayload,
};
pub use upload_service::{UploadKind, UploadService};

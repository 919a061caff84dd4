//! Shokher Shop API Server
//!
//! Storefront and admin API for the Shokher Shop: catalog, carts, checkout,
//! Steadfast courier shipments and image uploads over a document store.
//! Uses hexagonal (ports & adapters) architecture for clean separation of concerns.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use sea_orm::Database;
use serde::Serialize;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::GovernorLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod adapters;
mod app;
mod auth;
mod config;
mod domain;
mod entity;
mod error;
mod handlers;
mod response;

#[cfg(test)]
mod test_utils;


use adapters::{InMemoryDocumentStore, LocalObjectStorage, PostgresDocumentStore, SteadfastClient};
use app::{
    CartService, CatalogService, NotificationService, OrderService, ShipmentService,
    UploadService,
};
use config::Config;
use domain::entities::{
    Banner, Category, Coupon, DeliveryArea, Marquee, Notification, Product, Review, User,
};
use domain::ports::{CourierClient, DocumentStore, ObjectStorage};
use handlers::resources;
use response::ApiResponse;

/// Multipart bodies may carry the largest allowed image plus form overhead
const UPLOAD_BODY_LIMIT: usize = app::upload_service::GENERAL_MAX_BYTES + 64 * 1024;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub catalog: Arc<CatalogService>,
    pub carts: Arc<CartService>,
    pub orders: Arc<OrderService>,
    pub shipments: Arc<ShipmentService>,
    pub uploads: Arc<UploadService>,
    pub notifications: Arc<NotificationService>,
    /// SHA-256 of the admin key; `None` leaves admin routes open
    pub admin_key_hash: Option<String>,
    pub config: Config,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn DocumentStore>,
        courier: Arc<dyn CourierClient>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        let notifications = Arc::new(NotificationService::new(store.clone()));
        let orders = Arc::new(OrderService::new(store.clone(), notifications.clone()));
        let shipments = Arc::new(ShipmentService::new(orders.clone(), courier));

        Self {
            catalog: Arc::new(CatalogService::new(store.clone())),
            carts: Arc::new(CartService::new(store.clone())),
            uploads: Arc::new(UploadService::new(storage)),
            admin_key_hash: config.admin_api_key.as_deref().map(auth::hash_api_key),
            store,
            orders,
            shipments,
            notifications,
            config,
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> ApiResponse<HealthResponse> {
    ApiResponse::ok(
        "Service is healthy",
        HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        },
    )
}

async fn not_found() -> error::AppError {
    error::AppError::NotFound("Route not found".to_string())
}

/// Full HTTP surface: `/health`, `/api/*` and the `/uploads` file tree
pub fn build_router(state: AppState) -> Router {
    // Checkout and review posting are rate limited per client IP.
    // Uses PeerIpKeyExtractor to get client IP from socket connection
    let mut rate_limited_routes = Router::new()
        .route("/orders", post(handlers::place_order))
        .route("/reviews", post(handlers::submit_review));
    if state.config.rate_limit_per_second > 0 {
        match GovernorConfigBuilder::default()
            .key_extractor(PeerIpKeyExtractor)
            .per_second(state.config.rate_limit_per_second)
            .burst_size(state.config.rate_limit_burst.max(1))
            .finish()
        {
            Some(config) => {
                rate_limited_routes = rate_limited_routes.layer(GovernorLayer {
                    config: Arc::new(config),
                });
            }
            None => tracing::warn!("Invalid rate limit settings; rate limiting disabled"),
        }
    }

    let api = Router::new()
        // Catalog
        .route(
            "/products",
            get(handlers::list_products).post(resources::create::<Product>),
        )
        .route(
            "/products/:id",
            get(handlers::get_product)
                .patch(resources::update::<Product>)
                .delete(resources::remove::<Product>),
        )
        .route("/products/slug/:slug", get(handlers::product_by_slug))
        .route("/products/:id/reviews", get(handlers::product_reviews))
        .route(
            "/categories",
            get(resources::list::<Category>).post(resources::create::<Category>),
        )
        .route(
            "/categories/:id",
            get(resources::get_one::<Category>)
                .patch(resources::update::<Category>)
                .delete(resources::remove::<Category>),
        )
        .route(
            "/categories/:id/products",
            get(handlers::products_in_category),
        )
        // Storefront content
        .route(
            "/banners",
            get(resources::list::<Banner>).post(resources::create::<Banner>),
        )
        .route(
            "/banners/:id",
            get(resources::get_one::<Banner>)
                .patch(resources::update::<Banner>)
                .delete(resources::remove::<Banner>),
        )
        .route(
            "/banners/upload",
            post(handlers::upload_banner).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/marquees",
            get(resources::list::<Marquee>).post(resources::create::<Marquee>),
        )
        .route(
            "/marquees/:id",
            get(resources::get_one::<Marquee>)
                .patch(resources::update::<Marquee>)
                .delete(resources::remove::<Marquee>),
        )
        .route(
            "/delivery-areas",
            get(resources::list::<DeliveryArea>).post(resources::create::<DeliveryArea>),
        )
        .route(
            "/delivery-areas/:id",
            get(resources::get_one::<DeliveryArea>)
                .patch(resources::update::<DeliveryArea>)
                .delete(resources::remove::<DeliveryArea>),
        )
        // Coupons
        .route(
            "/coupons",
            get(resources::admin_list::<Coupon>).post(resources::create::<Coupon>),
        )
        .route("/coupons/validate", post(handlers::validate_coupon))
        .route(
            "/coupons/:id",
            get(resources::admin_get::<Coupon>)
                .patch(resources::update::<Coupon>)
                .delete(resources::remove::<Coupon>),
        )
        // Reviews (moderation)
        .route("/reviews", get(resources::admin_list::<Review>))
        .route(
            "/reviews/:id",
            get(resources::admin_get::<Review>)
                .patch(resources::update::<Review>)
                .delete(resources::remove::<Review>),
        )
        // Users
        .route(
            "/users",
            get(resources::admin_list::<User>).post(resources::create::<User>),
        )
        .route(
            "/users/:id",
            get(resources::admin_get::<User>)
                .patch(resources::update::<User>)
                .delete(resources::remove::<User>),
        )
        .route("/users/:id/orders", get(handlers::user_orders))
        .route(
            "/users/:id/notifications",
            get(handlers::user_notifications),
        )
        // Notifications
        .route("/notifications", get(resources::admin_list::<Notification>))
        .route(
            "/notifications/:id",
            get(resources::admin_get::<Notification>).delete(resources::remove::<Notification>),
        )
        .route(
            "/notifications/:id/read",
            patch(handlers::mark_notification_read),
        )
        // Carts & wishlists
        .route(
            "/carts/:user_id",
            get(handlers::get_cart).delete(handlers::clear_cart),
        )
        .route("/carts/:user_id/items", post(handlers::add_cart_item))
        .route(
            "/carts/:user_id/items/:product_id",
            patch(handlers::update_cart_item).delete(handlers::remove_cart_item),
        )
        .route("/wishlists/:user_id", get(handlers::get_wishlist))
        .route(
            "/wishlists/:user_id/items",
            post(handlers::add_wishlist_item),
        )
        .route(
            "/wishlists/:user_id/items/:product_id",
            delete(handlers::remove_wishlist_item),
        )
        // Orders
        .route("/orders", get(handlers::list_orders))
        .route(
            "/orders/:id",
            get(handlers::get_order).delete(handlers::delete_order),
        )
        .route("/orders/invoice/:invoice", get(handlers::order_by_invoice))
        .route("/orders/:id/status", patch(handlers::update_order_status))
        // Shipments
        .route("/orders/:id/shipment", post(handlers::create_shipment))
        .route("/orders/:id/shipment/sync", post(handlers::sync_shipment))
        .route("/shipments/bulk", post(handlers::bulk_create_shipments))
        .route("/shipments/sync", post(handlers::sync_all_shipments))
        .route("/shipments/balance", get(handlers::courier_balance))
        .route(
            "/shipments/track/:tracking_code",
            get(handlers::track_shipment),
        )
        // Uploads
        .route(
            "/upload",
            post(handlers::upload_file).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        // Webhooks (token-checked, always 200)
        .route("/webhooks/steadfast", post(handlers::steadfast_webhook))
        // Merge rate-limited routes
        .merge(rate_limited_routes)
        .layer(middleware::map_response(response::envelope_bare_errors));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .fallback(not_found)
        // Middleware
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,shokher_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Shokher Shop API...");

    // Load configuration
    let config = Config::from_env();

    // Document store: PostgreSQL when configured, otherwise in-process
    let store: Arc<dyn DocumentStore> = match config.database_url.as_deref() {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let db = Database::connect(url)
                .await
                .context("Failed to connect to database")?;
            let store = PostgresDocumentStore::new(db);
            store
                .ensure_schema()
                .await
                .context("Failed to prepare documents table")?;
            tracing::info!("Database connected");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using the in-memory document store (data is lost on restart)");
            Arc::new(InMemoryDocumentStore::new())
        }
    };

    if !config.courier_configured() {
        tracing::warn!("Steadfast credentials not configured; shipment calls will fail");
    }
    let courier = Arc::new(SteadfastClient::new(
        config.steadfast_base_url.clone(),
        config.steadfast_api_key.clone(),
        config.steadfast_secret_key.clone(),
    ));

    let storage = Arc::new(LocalObjectStorage::new(
        &config.upload_dir,
        &config.public_base_url,
    ));

    if config.admin_api_key.is_none() {
        tracing::warn!("ADMIN_API_KEY not set; admin routes are open");
    }
    if config.steadfast_webhook_token.is_none() {
        tracing::warn!("STEADFAST_WEBHOOK_TOKEN not set; webhook requests are not authenticated");
    }

    let port = config.port;
    let state = AppState::new(config, store, courier, storage);
    let app = build_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}

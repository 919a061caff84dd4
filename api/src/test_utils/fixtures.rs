//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.
//! Each fixture function creates a valid entity that can be customized.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::mocks::{InMemoryObjectStorage, MockCourierClient};
use crate::adapters::InMemoryDocumentStore;
use crate::app::resource_service::encode;
use crate::config::Config;
use crate::domain::entities::{
    Coupon, Customer, DeliveryArea, DiscountType, Entity, Order, OrderItem, OrderStatus,
    PaymentMethod, Product, ProductStatus, Review,
};
use crate::domain::ports::DocumentStore;
use crate::AppState;

fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Write an entity straight into the store, skipping service validation
pub async fn seed<T: Entity>(store: &dyn DocumentStore, entity: &T) {
    store
        .insert(T::COLLECTION, entity.id(), encode(entity).unwrap())
        .await
        .unwrap();
}

/// Active product with ten units in stock
pub fn test_product() -> Product {
    let suffix = short_id();
    Product {
        id: Uuid::new_v4().to_string(),
        name: format!("Test Product {}", suffix),
        slug: format!("test-product-{}", suffix),
        description: "A product for tests".to_string(),
        price: 1000.0,
        discount_price: None,
        stock: 10,
        category_id: None,
        images: vec!["http://shop.test/uploads/general/product.png".to_string()],
        tags: Vec::new(),
        featured: false,
        status: ProductStatus::Active,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn test_review(product_id: &str) -> Review {
    Review {
        id: Uuid::new_v4().to_string(),
        product_id: product_id.to_string(),
        user_id: None,
        user_name: "Test Customer".to_string(),
        rating: 4,
        comment: "Good quality".to_string(),
        approved: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Active fixed-amount coupon without expiry, limit or minimum
pub fn test_coupon() -> Coupon {
    Coupon {
        id: Uuid::new_v4().to_string(),
        code: format!("TEST{}", short_id().to_uppercase()),
        discount_type: DiscountType::Fixed,
        value: 100.0,
        min_order_amount: 0.0,
        max_discount: None,
        usage_limit: None,
        used_count: 0,
        expires_at: None,
        active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn test_customer() -> Customer {
    Customer {
        name: "Test Customer".to_string(),
        phone: "01711111111".to_string(),
        email: Some("customer@example.com".to_string()),
        address: "House 1, Road 2, Dhanmondi, Dhaka".to_string(),
    }
}

pub fn test_delivery_area() -> DeliveryArea {
    DeliveryArea {
        id: Uuid::new_v4().to_string(),
        name: "Inside Dhaka".to_string(),
        charge: 60.0,
        estimated_days: Some("1-2".to_string()),
        active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Pending cash-on-delivery order for two units at 500
pub fn test_order() -> Order {
    Order {
        id: Uuid::new_v4().to_string(),
        invoice: format!("INV-TEST-{}", short_id().to_uppercase()),
        user_id: None,
        customer: test_customer(),
        items: vec![OrderItem {
            product_id: Uuid::new_v4().to_string(),
            name: "Test Product".to_string(),
            price: 500.0,
            quantity: 2,
            image: None,
        }],
        delivery_area_id: None,
        delivery_charge: 60.0,
        subtotal: 1000.0,
        discount: 0.0,
        total: 1060.0,
        coupon_code: None,
        payment_method: PaymentMethod::Cod,
        status: OrderStatus::Pending,
        note: None,
        consignment_id: None,
        tracking_code: None,
        steadfast_status: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Application state wired to in-memory adapters, with handles to them
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<InMemoryDocumentStore>,
    pub courier: Arc<MockCourierClient>,
    pub storage: Arc<InMemoryObjectStorage>,
}

pub fn test_app_with(config: Config) -> TestApp {
    let store = Arc::new(InMemoryDocumentStore::new());
    let courier = Arc::new(MockCourierClient::new());
    let storage = Arc::new(InMemoryObjectStorage::new(&config.public_base_url));
    let state = AppState::new(config, store.clone(), courier.clone(), storage.clone());
    TestApp {
        state,
        store,
        courier,
        storage,
    }
}

pub fn test_app() -> TestApp {
    test_app_with(Config::for_tests())
}

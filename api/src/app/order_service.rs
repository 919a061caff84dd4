//! Order service
//!
//! Checkout, coupon quotes and the admin status workflow. Stock is taken when
//! an order is placed and given back when it is cancelled.

use std::sync::Arc;

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::app::notification_service::NotificationService;
use crate::app::resource_service::{ListParams, ResourceService};
use crate::domain::entities::{
    round_money, Cart, Coupon, Customer, DeliveryArea, NotificationKind, Order, OrderItem,
    OrderStatus, PaymentMethod, Product, ShipmentUpdate,
};
use crate::domain::filter::Filter;
use crate::domain::ports::DocumentStore;
use crate::error::{AppError, DomainError};
use crate::response::Paginated;

const INVOICE_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub product_id: String,
    pub quantity: u32,
}

/// Checkout payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    pub customer: Customer,
    pub items: Vec<OrderLineRequest>,
    #[serde(default)]
    pub delivery_area_id: Option<String>,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub note: Option<String>,
}

/// Result of checking a coupon against a subtotal
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponQuote {
    pub code: String,
    pub subtotal: f64,
    pub discount: f64,
    pub total: f64,
}

/// `INV-YYMMDD-XXXXXX`
pub fn generate_invoice() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    format!(
        "INV-{}-{}",
        Utc::now().format("%y%m%d"),
        suffix.to_uppercase()
    )
}

pub struct OrderService {
    orders: ResourceService<Order>,
    products: ResourceService<Product>,
    coupons: ResourceService<Coupon>,
    areas: ResourceService<DeliveryArea>,
    carts: ResourceService<Cart>,
    notifications: Arc<NotificationService>,
}

impl OrderService {
    pub fn new(store: Arc<dyn DocumentStore>, notifications: Arc<NotificationService>) -> Self {
        Self {
            orders: ResourceService::new(store.clone()),
            products: ResourceService::new(store.clone()),
            coupons: ResourceService::new(store.clone()),
            areas: ResourceService::new(store.clone()),
            carts: ResourceService::new(store),
            notifications,
        }
    }

    pub async fn get(&self, id: &str) -> Result<Order, AppError> {
        self.orders.get(id).await
    }

    pub async fn by_invoice(&self, invoice: &str) -> Result<Order, AppError> {
        self.orders
            .find_by("invoice", invoice)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order {} not found", invoice)))
    }

    pub async fn list(&self, params: &ListParams) -> Result<Paginated<Order>, AppError> {
        self.orders.list(params, None).await
    }

    pub async fn list_for_user(
        &self,
        user_id: &str,
        params: &ListParams,
    ) -> Result<Paginated<Order>, AppError> {
        self.orders
            .list(params, Some(Filter::eq("userId", user_id)))
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.orders.delete(id).await
    }

    /// Look up a coupon by code and check it against `subtotal`
    async fn redeemable_coupon(&self, code: &str, subtotal: f64) -> Result<Coupon, AppError> {
        let code = code.trim().to_uppercase();
        let coupon = self
            .coupons
            .find_by("code", &code)
            .await?
            .ok_or_else(|| DomainError::Validation(format!("Invalid coupon code: {}", code)))?;
        coupon.check_redeemable(subtotal, Utc::now())?;
        Ok(coupon)
    }

    pub async fn validate_coupon(&self, code: &str, subtotal: f64) -> Result<CouponQuote, AppError> {
        if !subtotal.is_finite() || subtotal < 0.0 {
            return Err(AppError::BadRequest(
                "subtotal must be a non-negative number".to_string(),
            ));
        }
        let coupon = self.redeemable_coupon(code, subtotal).await?;
        let discount = coupon.discount_for(subtotal);
        Ok(CouponQuote {
            code: coupon.code,
            subtotal,
            discount,
            total: round_money(subtotal - discount),
        })
    }

    async fn unique_invoice(&self) -> Result<String, AppError> {
        for _ in 0..INVOICE_ATTEMPTS {
            let invoice = generate_invoice();
            if self.orders.find_by("invoice", &invoice).await?.is_none() {
                return Ok(invoice);
            }
        }
        Err(AppError::Internal(
            "could not allocate a unique invoice number".to_string(),
        ))
    }

    /// Snapshot products into order lines, checking availability
    async fn build_items(&self, lines: &[OrderLineRequest]) -> Result<Vec<OrderItem>, AppError> {
        if lines.is_empty() {
            return Err(AppError::BadRequest(
                "an order needs at least one item".to_string(),
            ));
        }

        // one line per product, in first-seen order
        let mut quantities: Vec<(String, u32)> = Vec::with_capacity(lines.len());
        for line in lines {
            if line.quantity == 0 {
                return Err(DomainError::Validation(
                    "item quantity must be at least 1".to_string(),
                )
                .into());
            }
            match quantities
                .iter_mut()
                .find(|(product_id, _)| *product_id == line.product_id)
            {
                Some((_, quantity)) => *quantity = quantity.saturating_add(line.quantity),
                None => quantities.push((line.product_id.clone(), line.quantity)),
            }
        }

        let mut items = Vec::with_capacity(quantities.len());
        for (product_id, quantity) in quantities {
            let product = self.products.get(&product_id).await?;
            if !product.is_available() {
                return Err(DomainError::Validation(format!(
                    "{} is not available",
                    product.name
                ))
                .into());
            }
            if i64::from(quantity) > product.stock {
                return Err(DomainError::Validation(format!(
                    "Only {} of {} left in stock",
                    product.stock, product.name
                ))
                .into());
            }
            items.push(OrderItem {
                product_id: product.id.clone(),
                name: product.name.clone(),
                price: product.selling_price(),
                quantity,
                image: product.images.first().cloned(),
            });
        }
        Ok(items)
    }

    async fn adjust_stock(&self, product_id: &str, delta: i64) -> Result<(), AppError> {
        let Some(product) = self.products.find(product_id).await? else {
            tracing::warn!(product_id = %product_id, "Stock adjustment for missing product skipped");
            return Ok(());
        };
        let mut fields = Map::new();
        fields.insert(
            "stock".to_string(),
            Value::from((product.stock + delta).max(0)),
        );
        self.products.patch_fields(product_id, fields).await?;
        Ok(())
    }

    async fn restore_stock(&self, order: &Order) -> Result<(), AppError> {
        for item in &order.items {
            self.adjust_stock(&item.product_id, i64::from(item.quantity))
                .await?;
        }
        Ok(())
    }

    pub async fn place_order(&self, request: PlaceOrderRequest) -> Result<Order, AppError> {
        request.customer.validate()?;
        let items = self.build_items(&request.items).await?;
        let subtotal = round_money(items.iter().map(OrderItem::line_total).sum());

        let (delivery_area_id, delivery_charge) = match request.delivery_area_id.as_deref() {
            Some(area_id) if !area_id.is_empty() => {
                let area = self.areas.get(area_id).await?;
                if !area.active {
                    return Err(DomainError::Validation(format!(
                        "Delivery to {} is not available",
                        area.name
                    ))
                    .into());
                }
                (Some(area.id), area.charge)
            }
            _ => (None, 0.0),
        };

        let coupon = match request.coupon_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => Some(self.redeemable_coupon(code, subtotal).await?),
            _ => None,
        };
        let discount = coupon.as_ref().map_or(0.0, |c| c.discount_for(subtotal));

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4().to_string(),
            invoice: self.unique_invoice().await?,
            user_id: request.user_id.filter(|id| !id.is_empty()),
            customer: request.customer,
            items,
            delivery_area_id,
            delivery_charge,
            subtotal,
            discount,
            total: round_money(subtotal - discount + delivery_charge),
            coupon_code: coupon.as_ref().map(|c| c.code.clone()),
            payment_method: request.payment_method,
            status: OrderStatus::Pending,
            note: request.note.filter(|n| !n.trim().is_empty()),
            consignment_id: None,
            tracking_code: None,
            steadfast_status: None,
            created_at: now,
            updated_at: now,
        };
        let order = self.orders.insert(order).await?;

        for item in &order.items {
            self.adjust_stock(&item.product_id, -i64::from(item.quantity))
                .await?;
        }
        if let Some(coupon) = coupon {
            let mut fields = Map::new();
            fields.insert(
                "usedCount".to_string(),
                Value::from(coupon.used_count.saturating_add(1)),
            );
            self.coupons.patch_fields(&coupon.id, fields).await?;
        }
        if let Some(user_id) = order.user_id.as_deref() {
            if let Some(mut cart) = self.carts.find(user_id).await? {
                cart.clear();
                self.carts.save(cart).await?;
            }
        }

        tracing::info!(order_id = %order.id, invoice = %order.invoice, total = order.total, "Order placed");
        self.notifications
            .notify_admin(
                NotificationKind::Order,
                "New order",
                &format!(
                    "{} placed order {} for {:.2} BDT",
                    order.customer.name, order.invoice, order.total
                ),
                Some(&order.id),
            )
            .await;

        Ok(order)
    }

    /// Admin status change along the allowed transitions
    pub async fn update_status(&self, id: &str, next: OrderStatus) -> Result<Order, AppError> {
        let mut order = self.orders.get(id).await?;
        if order.status == next {
            return Ok(order);
        }
        if !order.status.can_transition_to(next) {
            return Err(DomainError::Conflict(format!(
                "Cannot change order {} from {} to {}",
                order.invoice, order.status, next
            ))
            .into());
        }

        if next == OrderStatus::Cancelled {
            self.restore_stock(&order).await?;
        }
        let previous = order.status;
        order.status = next;
        let order = self.orders.save(order).await?;

        tracing::info!(order_id = %order.id, from = %previous, to = %next, "Order status changed");
        self.notify_status(&order).await;
        Ok(order)
    }

    /// Persist a courier reconciliation result.
    ///
    /// The courier is authoritative for delivery outcomes, so its status is
    /// applied even when it overrides a terminal local status.
    pub async fn apply_shipment_update(
        &self,
        mut order: Order,
        update: ShipmentUpdate,
    ) -> Result<Order, AppError> {
        order.steadfast_status = Some(update.steadfast_status.clone());
        if let Some(next) = update.status {
            if next == OrderStatus::Cancelled && order.status != OrderStatus::Cancelled {
                self.restore_stock(&order).await?;
            }
            tracing::info!(
                order_id = %order.id,
                consignment_id = ?order.consignment_id,
                from = %order.status,
                to = %next,
                "Courier moved order status"
            );
            order.status = next;
        }

        let order = self.orders.save(order).await?;
        if update.status.is_some() {
            self.notify_status(&order).await;
        }
        Ok(order)
    }

    /// Persist booking details after a consignment is created
    pub async fn mark_booked(
        &self,
        mut order: Order,
        consignment_id: String,
        tracking_code: Option<String>,
        courier_status: String,
    ) -> Result<Order, AppError> {
        order.consignment_id = Some(consignment_id);
        order.tracking_code = tracking_code;
        order.steadfast_status = Some(courier_status);
        order.status = OrderStatus::Shipped;
        let order = self.orders.save(order).await?;
        self.notify_status(&order).await;
        Ok(order)
    }

    pub async fn find_by_field(&self, field: &str, value: &str) -> Result<Option<Order>, AppError> {
        self.orders.find_by(field, value).await
    }

    pub async fn find_all(&self, filter: Option<Filter>) -> Result<Vec<Order>, AppError> {
        self.orders.find_all(filter).await
    }

    async fn notify_status(&self, order: &Order) {
        let Some(user_id) = order.user_id.as_deref() else {
            return;
        };
        let kind = match order.status {
            OrderStatus::Shipped | OrderStatus::Delivered => NotificationKind::Shipment,
            _ => NotificationKind::Order,
        };
        self.notifications
            .notify_user(
                user_id,
                kind,
                &format!("Order {}", order.invoice),
                &format!("Your order is now {}", order.status),
                Some(&order.id),
            )
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryDocumentStore;
    use crate::domain::entities::{DiscountType, ProductStatus};
    use crate::test_utils::{seed, test_coupon, test_customer, test_delivery_area, test_product};

    struct Fixture {
        store: Arc<InMemoryDocumentStore>,
        service: OrderService,
        notifications: Arc<NotificationService>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryDocumentStore::new());
        let notifications = Arc::new(NotificationService::new(store.clone()));
        let service = OrderService::new(store.clone(), notifications.clone());
        Fixture {
            store,
            service,
            notifications,
        }
    }

    fn request(lines: &[(&str, u32)]) -> PlaceOrderRequest {
        PlaceOrderRequest {
            user_id: None,
            customer: test_customer(),
            items: lines
                .iter()
                .map(|(product_id, quantity)| OrderLineRequest {
                    product_id: product_id.to_string(),
                    quantity: *quantity,
                })
                .collect(),
            delivery_area_id: None,
            coupon_code: None,
            payment_method: PaymentMethod::Cod,
            note: None,
        }
    }

    async fn stock_of(fx: &Fixture, product_id: &str) -> i64 {
        ResourceService::<Product>::new(fx.store.clone())
            .get(product_id)
            .await
            .unwrap()
            .stock
    }

    #[test]
    fn invoice_format() {
        let invoice = generate_invoice();
        let parts: Vec<&str> = invoice.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "INV");
        assert_eq!(parts[1].len(), 6);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 6);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn place_order_snapshots_prices_and_takes_stock() {
        let fx = fixture();
        let mut shirt = test_product();
        shirt.price = 1000.0;
        shirt.discount_price = Some(800.0);
        shirt.stock = 5;
        seed(fx.store.as_ref(), &shirt).await;
        let mut area = test_delivery_area();
        area.charge = 60.0;
        seed(fx.store.as_ref(), &area).await;

        let mut req = request(&[(&shirt.id, 1), (&shirt.id, 1)]);
        req.delivery_area_id = Some(area.id.clone());
        let order = fx.service.place_order(req).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.invoice.starts_with("INV-"));
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].price, 800.0);
        assert_eq!(order.items[0].quantity, 2);
        assert_eq!(order.subtotal, 1600.0);
        assert_eq!(order.delivery_charge, 60.0);
        assert_eq!(order.total, 1660.0);
        assert_eq!(stock_of(&fx, &shirt.id).await, 3);

        let found = fx.service.by_invoice(&order.invoice).await.unwrap();
        assert_eq!(found.id, order.id);
    }

    #[tokio::test]
    async fn place_order_rejects_unavailable_products() {
        let fx = fixture();
        let mut low = test_product();
        low.stock = 1;
        let mut archived = test_product();
        archived.status = ProductStatus::Archived;
        seed(fx.store.as_ref(), &low).await;
        seed(fx.store.as_ref(), &archived).await;

        assert!(fx.service.place_order(request(&[(&low.id, 2)])).await.is_err());
        assert!(fx
            .service
            .place_order(request(&[(&archived.id, 1)]))
            .await
            .is_err());
        assert!(matches!(
            fx.service.place_order(request(&[])).await,
            Err(AppError::BadRequest(_))
        ));
        assert_eq!(stock_of(&fx, &low.id).await, 1);
    }

    #[tokio::test]
    async fn inactive_delivery_area_is_rejected() {
        let fx = fixture();
        let product = test_product();
        seed(fx.store.as_ref(), &product).await;
        let mut area = test_delivery_area();
        area.active = false;
        seed(fx.store.as_ref(), &area).await;

        let mut req = request(&[(&product.id, 1)]);
        req.delivery_area_id = Some(area.id.clone());
        assert!(matches!(
            fx.service.place_order(req).await,
            Err(AppError::Domain(DomainError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn coupon_is_applied_and_counted() {
        let fx = fixture();
        let mut product = test_product();
        product.price = 2000.0;
        product.discount_price = None;
        seed(fx.store.as_ref(), &product).await;
        let mut coupon = test_coupon();
        coupon.code = "EID10".to_string();
        coupon.discount_type = DiscountType::Percentage;
        coupon.value = 10.0;
        coupon.max_discount = None;
        coupon.min_order_amount = 0.0;
        seed(fx.store.as_ref(), &coupon).await;

        let mut req = request(&[(&product.id, 1)]);
        req.coupon_code = Some("eid10".to_string());
        let order = fx.service.place_order(req).await.unwrap();
        assert_eq!(order.discount, 200.0);
        assert_eq!(order.total, 1800.0);
        assert_eq!(order.coupon_code.as_deref(), Some("EID10"));

        let stored = ResourceService::<Coupon>::new(fx.store.clone())
            .get(&coupon.id)
            .await
            .unwrap();
        assert_eq!(stored.used_count, coupon.used_count + 1);

        let mut req = request(&[(&product.id, 1)]);
        req.coupon_code = Some("NOPE".to_string());
        assert!(fx.service.place_order(req).await.is_err());
    }

    #[tokio::test]
    async fn validate_coupon_quotes_discount() {
        let fx = fixture();
        let mut coupon = test_coupon();
        coupon.discount_type = DiscountType::Fixed;
        coupon.value = 150.0;
        coupon.min_order_amount = 500.0;
        seed(fx.store.as_ref(), &coupon).await;

        let quote = fx.service.validate_coupon(&coupon.code, 1000.0).await.unwrap();
        assert_eq!(quote.discount, 150.0);
        assert_eq!(quote.total, 850.0);
        assert!(fx.service.validate_coupon(&coupon.code, 100.0).await.is_err());
    }

    #[tokio::test]
    async fn placing_clears_cart_and_notifies() {
        let fx = fixture();
        let product = test_product();
        seed(fx.store.as_ref(), &product).await;
        let mut cart = Cart::new("u1", Utc::now());
        cart.add(&product.id, 1).unwrap();
        seed(fx.store.as_ref(), &cart).await;

        let mut req = request(&[(&product.id, 1)]);
        req.user_id = Some("u1".to_string());
        fx.service.place_order(req).await.unwrap();

        let cart = ResourceService::<Cart>::new(fx.store.clone())
            .get("u1")
            .await
            .unwrap();
        assert!(cart.items.is_empty());

        let admin_feed = ResourceService::<crate::domain::entities::Notification>::new(
            fx.store.clone(),
        )
        .find_all(None)
        .await
        .unwrap();
        assert!(admin_feed
            .iter()
            .any(|n| n.user_id.is_none() && n.title == "New order"));
    }

    #[tokio::test]
    async fn status_transitions_and_cancel_restores_stock() {
        let fx = fixture();
        let mut product = test_product();
        product.stock = 4;
        seed(fx.store.as_ref(), &product).await;

        let mut req = request(&[(&product.id, 3)]);
        req.user_id = Some("u1".to_string());
        let order = fx.service.place_order(req).await.unwrap();
        assert_eq!(stock_of(&fx, &product.id).await, 1);

        let order = fx
            .service
            .update_status(&order.id, OrderStatus::Processing)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Processing);

        assert!(matches!(
            fx.service
                .update_status(&order.id, OrderStatus::Delivered)
                .await,
            Err(AppError::Domain(DomainError::Conflict(_)))
        ));

        let order = fx
            .service
            .update_status(&order.id, OrderStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(stock_of(&fx, &product.id).await, 4);

        assert!(fx
            .service
            .update_status(&order.id, OrderStatus::Pending)
            .await
            .is_err());

        let user_feed = fx
            .notifications
            .for_user("u1", &ListParams::default())
            .await
            .unwrap();
        assert_eq!(user_feed.total, 2);
    }

    #[tokio::test]
    async fn shipment_update_applies_courier_outcome() {
        let fx = fixture();
        let mut product = test_product();
        product.stock = 2;
        seed(fx.store.as_ref(), &product).await;
        let order = fx
            .service
            .place_order(request(&[(&product.id, 2)]))
            .await
            .unwrap();

        let order = fx
            .service
            .apply_shipment_update(
                order,
                ShipmentUpdate {
                    steadfast_status: "cancelled".to_string(),
                    status: Some(OrderStatus::Cancelled),
                },
            )
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.steadfast_status.as_deref(), Some("cancelled"));
        assert_eq!(stock_of(&fx, &product.id).await, 2);
    }
}

//! Cart and wishlist service
//!
//! Both documents are keyed by user id and created on first write. Reads of a
//! user without a document return an empty cart or wishlist.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::app::resource_service::ResourceService;
use crate::domain::entities::{round_money, Cart, Product, Wishlist};
use crate::domain::ports::DocumentStore;
use crate::error::{AppError, DomainError};

/// A cart line joined with current product data
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub quantity: u32,
    /// `None` when the product has since been deleted
    pub product: Option<Product>,
    pub unit_price: f64,
    pub line_total: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub user_id: String,
    pub items: Vec<CartLine>,
    pub item_count: u32,
    pub subtotal: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistView {
    pub user_id: String,
    pub product_ids: Vec<String>,
    pub products: Vec<Product>,
}

pub struct CartService {
    carts: ResourceService<Cart>,
    wishlists: ResourceService<Wishlist>,
    products: ResourceService<Product>,
}

impl CartService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            carts: ResourceService::new(store.clone()),
            wishlists: ResourceService::new(store.clone()),
            products: ResourceService::new(store),
        }
    }

    async fn load_cart(&self, user_id: &str) -> Result<Cart, AppError> {
        Ok(self
            .carts
            .find(user_id)
            .await?
            .unwrap_or_else(|| Cart::new(user_id, Utc::now())))
    }

    async fn load_wishlist(&self, user_id: &str) -> Result<Wishlist, AppError> {
        Ok(self
            .wishlists
            .find(user_id)
            .await?
            .unwrap_or_else(|| Wishlist::new(user_id, Utc::now())))
    }

    async fn view(&self, cart: Cart) -> Result<CartView, AppError> {
        let mut items = Vec::with_capacity(cart.items.len());
        for item in cart.items {
            let product = self.products.find(&item.product_id).await?;
            let unit_price = product.as_ref().map_or(0.0, Product::selling_price);
            items.push(CartLine {
                line_total: round_money(unit_price * f64::from(item.quantity)),
                product_id: item.product_id,
                quantity: item.quantity,
                product,
                unit_price,
            });
        }

        Ok(CartView {
            user_id: cart.id,
            item_count: items.iter().map(|line| line.quantity).sum(),
            subtotal: round_money(items.iter().map(|line| line.line_total).sum()),
            items,
        })
    }

    /// Product must exist, be active and have `quantity` units in stock
    async fn purchasable(&self, product_id: &str, quantity: u32) -> Result<Product, AppError> {
        let product = self.products.get(product_id).await?;
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
        Ok(product)
    }

    pub async fn get_cart(&self, user_id: &str) -> Result<CartView, AppError> {
        let cart = self.load_cart(user_id).await?;
        self.view(cart).await
    }

    pub async fn add_item(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: u32,
    ) -> Result<CartView, AppError> {
        let mut cart = self.load_cart(user_id).await?;
        cart.add(product_id, quantity)?;
        self.purchasable(product_id, cart.quantity_of(product_id))
            .await?;

        let cart = self.carts.save(cart).await?;
        self.view(cart).await
    }

    pub async fn update_item(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: u32,
    ) -> Result<CartView, AppError> {
        let mut cart = self.load_cart(user_id).await?;
        cart.set_quantity(product_id, quantity)?;
        self.purchasable(product_id, quantity).await?;

        let cart = self.carts.save(cart).await?;
        self.view(cart).await
    }

    pub async fn remove_item(&self, user_id: &str, product_id: &str) -> Result<CartView, AppError> {
        let mut cart = self.load_cart(user_id).await?;
        if !cart.remove(product_id) {
            return Err(AppError::NotFound(format!(
                "Product {} is not in the cart",
                product_id
            )));
        }

        let cart = self.carts.save(cart).await?;
        self.view(cart).await
    }

    pub async fn clear(&self, user_id: &str) -> Result<(), AppError> {
        let mut cart = self.load_cart(user_id).await?;
        if cart.items.is_empty() {
            return Ok(());
        }
        cart.clear();
        self.carts.save(cart).await?;
        Ok(())
    }

    async fn wishlist_view(&self, wishlist: Wishlist) -> Result<WishlistView, AppError> {
        let mut products = Vec::with_capacity(wishlist.product_ids.len());
        for id in &wishlist.product_ids {
            if let Some(product) = self.products.find(id).await? {
                products.push(product);
            }
        }
        Ok(WishlistView {
            user_id: wishlist.id,
            product_ids: wishlist.product_ids,
            products,
        })
    }

    pub async fn get_wishlist(&self, user_id: &str) -> Result<WishlistView, AppError> {
        let wishlist = self.load_wishlist(user_id).await?;
        self.wishlist_view(wishlist).await
    }

    pub async fn add_to_wishlist(
        &self,
        user_id: &str,
        product_id: &str,
    ) -> Result<WishlistView, AppError> {
        self.products.get(product_id).await?;
        let mut wishlist = self.load_wishlist(user_id).await?;
        let wishlist = if wishlist.add(product_id) {
            self.wishlists.save(wishlist).await?
        } else {
            wishlist
        };
        self.wishlist_view(wishlist).await
    }

    pub async fn remove_from_wishlist(
        &self,
        user_id: &str,
        product_id: &str,
    ) -> Result<WishlistView, AppError> {
        let mut wishlist = self.load_wishlist(user_id).await?;
        if !wishlist.remove(product_id) {
            return Err(AppError::NotFound(format!(
                "Product {} is not in the wishlist",
                product_id
            )));
        }
        let wishlist = self.wishlists.save(wishlist).await?;
        self.wishlist_view(wishlist).await
    }
}

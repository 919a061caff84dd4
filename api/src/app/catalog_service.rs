//! Catalog service
//!
//! Storefront lookups that go beyond plain CRUD: products by slug or
//! category, and customer reviews with moderation.
//!
//! Draft and archived products are only visible to admins; every product
//! read takes an `include_hidden` flag for that.

use std::sync::Arc;

use serde_json::Value;

use crate::app::resource_service::{ListParams, ResourceService};
use crate::domain::entities::{Category, Product, ProductStatus, Review};
use crate::domain::filter::Filter;
use crate::domain::ports::DocumentStore;
use crate::error::AppError;
use crate::response::Paginated;

pub struct CatalogService {
    products: ResourceService<Product>,
    categories: ResourceService<Category>,
    reviews: ResourceService<Review>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            products: ResourceService::new(store.clone()),
            categories: ResourceService::new(store.clone()),
            reviews: ResourceService::new(store),
        }
    }

    pub async fn list_products(
        &self,
        params: &ListParams,
        include_hidden: bool,
    ) -> Result<Paginated<Product>, AppError> {
        self.products
            .list(params, visibility_scope(None, include_hidden))
            .await
    }

    pub async fn product(&self, id: &str, include_hidden: bool) -> Result<Product, AppError> {
        self.products
            .find(id)
            .await?
            .filter(|p| include_hidden || p.status == ProductStatus::Active)
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))
    }

    pub async fn product_by_slug(
        &self,
        slug: &str,
        include_hidden: bool,
    ) -> Result<Product, AppError> {
        self.products
            .find_by("slug", slug)
            .await?
            .filter(|p| include_hidden || p.status == ProductStatus::Active)
            .ok_or_else(|| AppError::NotFound(format!("Product with slug '{}' not found", slug)))
    }

    pub async fn products_in_category(
        &self,
        category_id: &str,
        params: &ListParams,
        include_hidden: bool,
    ) -> Result<Paginated<Product>, AppError> {
        self.categories.get(category_id).await?;
        let scope = visibility_scope(Some(Filter::eq("categoryId", category_id)), include_hidden);
        self.products.list(params, scope).await
    }

    /// Approved reviews of a product
    pub async fn product_reviews(
        &self,
        product_id: &str,
        params: &ListParams,
    ) -> Result<Paginated<Review>, AppError> {
        self.products.get(product_id).await?;
        let scope = Filter::And(vec![
            Filter::eq("productId", product_id),
            Filter::eq("approved", "true"),
        ]);
        self.reviews.list(params, Some(scope)).await
    }

    /// Customer-submitted review; always starts unapproved
    pub async fn submit_review(&self, body: Value) -> Result<Review, AppError> {
        let Value::Object(mut fields) = body else {
            return Err(AppError::BadRequest(
                "Review body must be a JSON object".to_string(),
            ));
        };
        fields.remove("id");
        fields.insert("approved".to_string(), Value::Bool(false));

        let product_id = fields
            .get("productId")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::BadRequest("productId is required".to_string()))?
            .to_string();
        self.products.get(&product_id).await?;

        let review = self.reviews.create(Value::Object(fields)).await?;
        tracing::info!(review_id = %review.id, product_id = %product_id, "Review submitted for moderation");
        Ok(review)
    }
}

/// Add the `status=active` restriction unless hidden products are wanted
fn visibility_scope(scope: Option<Filter>, include_hidden: bool) -> Option<Filter> {
    if include_hidden {
        return scope;
    }
    let active = Filter::eq("status", ProductStatus::Active.to_string());
    Some(match scope {
        Some(scope) => Filter::And(vec![scope, active]),
        None => active,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryDocumentStore;
    use crate::test_utils::{seed, test_product, test_review};
    use serde_json::json;

    #[tokio::test]
    async fn product_by_slug() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let product = test_product();
        seed(store.as_ref(), &product).await;
        let service = CatalogService::new(store);

        let found = service.product_by_slug(&product.slug, false).await.unwrap();
        assert_eq!(found.id, product.id);
        assert!(matches!(
            service.product_by_slug("missing", true).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn hidden_products_are_admin_only() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let category = Category {
            id: "c1".to_string(),
            name: "Saree".to_string(),
            slug: "saree".to_string(),
            image: None,
            parent_id: None,
            featured: false,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        seed(store.as_ref(), &category).await;

        let mut active = test_product();
        active.category_id = Some("c1".to_string());
        let mut draft = test_product();
        draft.category_id = Some("c1".to_string());
        draft.status = ProductStatus::Draft;
        let mut archived = test_product();
        archived.status = ProductStatus::Archived;
        for product in [&active, &draft, &archived] {
            seed(store.as_ref(), product).await;
        }
        let service = CatalogService::new(store);
        let params = ListParams::default();

        let public = service.list_products(&params, false).await.unwrap();
        assert_eq!(public.total, 1);
        assert_eq!(public.items[0].id, active.id);
        assert_eq!(service.list_products(&params, true).await.unwrap().total, 3);

        assert!(matches!(
            service.product(&archived.id, false).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(service.product(&archived.id, true).await.unwrap().id, archived.id);
        assert!(matches!(
            service.product_by_slug(&draft.slug, false).await,
            Err(AppError::NotFound(_))
        ));
        assert!(service.product_by_slug(&draft.slug, true).await.is_ok());

        let in_category = service
            .products_in_category("c1", &params, false)
            .await
            .unwrap();
        assert_eq!(in_category.total, 1);
        let in_category = service
            .products_in_category("c1", &params, true)
            .await
            .unwrap();
        assert_eq!(in_category.total, 2);
    }

    #[tokio::test]
    async fn only_approved_reviews_are_public() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let product = test_product();
        seed(store.as_ref(), &product).await;

        let mut approved = test_review(&product.id);
        approved.approved = true;
        seed(store.as_ref(), &approved).await;
        let mut pending = test_review(&product.id);
        pending.approved = false;
        seed(store.as_ref(), &pending).await;

        let service = CatalogService::new(store);
        let page = service
            .product_reviews(&product.id, &ListParams::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, approved.id);
    }

    #[tokio::test]
    async fn submitted_reviews_start_unapproved() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let product = test_product();
        seed(store.as_ref(), &product).await;
        let service = CatalogService::new(store);

        let review = service
            .submit_review(json!({
                "productId": product.id,
                "userName": "Karim",
                "rating": 5,
                "comment": "Great fabric",
                "approved": true
            }))
            .await
            .unwrap();
        assert!(!review.approved);

        let missing_product = service
            .submit_review(json!({"productId": "nope", "userName": "K", "rating": 4}))
            .await;
        assert!(matches!(missing_product, Err(AppError::NotFound(_))));

        let bad_rating = service
            .submit_review(json!({"productId": product.id, "userName": "K", "rating": 9}))
            .await;
        assert!(bad_rating.is_err());
    }

    #[tokio::test]
    async fn category_listing_requires_category() {
        let service = CatalogService::new(Arc::new(InMemoryDocumentStore::new()));
        assert!(matches!(
            service
                .products_in_category("missing", &ListParams::default(), false)
                .await,
            Err(AppError::NotFound(_))
        ));
    }
}

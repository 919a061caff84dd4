//! Generic collection handlers
//!
//! One set of CRUD handlers serves every collection; routes pick the entity
//! type with a turbofish, e.g. `get(resources::list::<Banner>)`.

use axum::extract::State;
use serde_json::Value;

use crate::app::{ListParams, ResourceService};
use crate::auth::AdminAccess;
use crate::domain::entities::Entity;
use crate::error::AppError;
use crate::handlers::extract::{ApiJson, ApiPath, ApiQuery};
use crate::response::{ApiResponse, Paginated};
use crate::AppState;

fn service<T: Entity>(state: &AppState) -> ResourceService<T> {
    ResourceService::new(state.store.clone())
}

/// GET /api/{collection}
pub async fn list<T: Entity>(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<ApiResponse<Paginated<T>>, AppError> {
    let page = service::<T>(&state).list(&params, None).await?;
    Ok(ApiResponse::ok(
        format!("{} list fetched successfully", T::NAME),
        page,
    ))
}

/// GET /api/{collection}/:id
pub async fn get_one<T: Entity>(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<ApiResponse<T>, AppError> {
    let entity = service::<T>(&state).get(&id).await?;
    Ok(ApiResponse::ok(
        format!("{} fetched successfully", T::NAME),
        entity,
    ))
}

/// Admin-only listing
pub async fn admin_list<T: Entity>(
    _admin: AdminAccess,
    state: State<AppState>,
    params: ApiQuery<ListParams>,
) -> Result<ApiResponse<Paginated<T>>, AppError> {
    list::<T>(state, params).await
}

/// Admin-only lookup
pub async fn admin_get<T: Entity>(
    _admin: AdminAccess,
    state: State<AppState>,
    id: ApiPath<String>,
) -> Result<ApiResponse<T>, AppError> {
    get_one::<T>(state, id).await
}

/// POST /api/{collection}
pub async fn create<T: Entity>(
    _admin: AdminAccess,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Value>,
) -> Result<ApiResponse<T>, AppError> {
    let entity = service::<T>(&state).create(body).await?;
    tracing::info!(collection = T::COLLECTION, id = %entity.id(), "Document created");
    Ok(ApiResponse::created(
        format!("{} created successfully", T::NAME),
        entity,
    ))
}

/// PATCH /api/{collection}/:id
pub async fn update<T: Entity>(
    _admin: AdminAccess,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(patch): ApiJson<Value>,
) -> Result<ApiResponse<T>, AppError> {
    let entity = service::<T>(&state).update(&id, patch).await?;
    Ok(ApiResponse::ok(
        format!("{} updated successfully", T::NAME),
        entity,
    ))
}

/// DELETE /api/{collection}/:id
pub async fn remove<T: Entity>(
    _admin: AdminAccess,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<ApiResponse<()>, AppError> {
    service::<T>(&state).delete(&id).await?;
    tracing::info!(collection = T::COLLECTION, id = %id, "Document deleted");
    Ok(ApiResponse::message(format!(
        "{} deleted successfully",
        T::NAME
    )))
}

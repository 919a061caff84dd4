//! Notification service
//!
//! Order and shipment events fan out as notification documents. Delivery is
//! best-effort: a failed write is logged and never fails the triggering
//! operation.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::app::resource_service::{ListParams, ResourceService};
use crate::domain::entities::{Notification, NotificationKind};
use crate::domain::filter::Filter;
use crate::domain::ports::DocumentStore;
use crate::error::AppError;
use crate::response::Paginated;

pub struct NotificationService {
    notifications: ResourceService<Notification>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            notifications: ResourceService::new(store),
        }
    }

    /// Post to the admin feed (no `userId`)
    pub async fn notify_admin(
        &self,
        kind: NotificationKind,
        title: &str,
        message: &str,
        order_id: Option<&str>,
    ) {
        self.emit(None, kind, title, message, order_id).await;
    }

    pub async fn notify_user(
        &self,
        user_id: &str,
        kind: NotificationKind,
        title: &str,
        message: &str,
        order_id: Option<&str>,
    ) {
        self.emit(Some(user_id), kind, title, message, order_id)
            .await;
    }

    async fn emit(
        &self,
        user_id: Option<&str>,
        kind: NotificationKind,
        title: &str,
        message: &str,
        order_id: Option<&str>,
    ) {
        let now = Utc::now();
        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.map(str::to_string),
            title: title.to_string(),
            message: message.to_string(),
            kind,
            order_id: order_id.map(str::to_string),
            read: false,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.notifications.insert(notification).await {
            tracing::warn!(user_id = ?user_id, order_id = ?order_id, "Failed to store notification: {}", e);
        }
    }

    /// A user's notifications, newest first
    pub async fn for_user(
        &self,
        user_id: &str,
        params: &ListParams,
    ) -> Result<Paginated<Notification>, AppError> {
        self.notifications
            .list(params, Some(Filter::eq("userId", user_id)))
            .await
    }

    pub async fn mark_read(&self, id: &str) -> Result<Notification, AppError> {
        let mut fields = Map::new();
        fields.insert("read".to_string(), Value::Bool(true));
        self.notifications.patch_fields(id, fields).await
    }
}

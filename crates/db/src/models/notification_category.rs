//! Notification category model and DTOs.

use citizen_core::category::CategoryId;
use citizen_core::types::Timestamp;
use serde::{Deserialize, Serialize};

/// A document from the `notification_categories` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationCategory {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub default_opt_in: bool,
    pub active: bool,
    pub order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a category.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNotificationCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default_opt_in: bool,
    /// Defaults to `true` if omitted.
    pub active: Option<bool>,
    #[serde(default)]
    pub order: i32,
}

/// DTO for updating a category. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateNotificationCategory {
    pub name: Option<String>,
    pub description: Option<String>,
    pub default_opt_in: Option<bool>,
    pub active: Option<bool>,
    pub order: Option<i32>,
}

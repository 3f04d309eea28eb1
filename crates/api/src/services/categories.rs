//! Notification category catalog: CRUD, the cached active listing and
//! default opt-in maps.

use citizen_core::category::{validate_category_name, ActiveCatalog, CategoryId};
use citizen_core::error::CoreError;
use citizen_core::types::Timestamp;
use citizen_db::collections::NOTIFICATION_CATEGORIES;
use citizen_db::data_manager::DataManager;
use citizen_db::models::notification_category::{
    CreateNotificationCategory, NotificationCategory, UpdateNotificationCategory,
};
use serde_json::json;

use crate::error::AppResult;

/// Query name of the cached active listing. Contains `:` so it can never
/// collide with a category id.
pub const ACTIVE_QUERY: &str = "list:active";

/// Catalog inserted by [`NotificationCategoryService::seed_defaults`]:
/// `(id, name, description, default_opt_in, order)`.
pub const DEFAULT_CATEGORIES: &[(&str, &str, &str, bool, i32)] = &[
    ("events", "Eventos da Cidade", "Eventos culturais, esportivos e comunitários", true, 1),
    ("services", "Serviços Públicos", "Manutenções programadas e novos serviços públicos", true, 2),
    ("alerts", "Alertas Importantes", "Segurança, clima e emergências", true, 3),
    ("mei_opportunities", "Oportunidades MEI", "Oportunidades para microempreendedores", false, 4),
    ("courses", "Cursos e Capacitação", "Cursos gratuitos e capacitação profissional", false, 5),
    ("health", "Saúde", "Campanhas de vacinação e saúde pública", true, 6),
];

#[derive(Clone)]
pub struct NotificationCategoryService {
    dm: DataManager,
}

impl NotificationCategoryService {
    pub fn new(dm: DataManager) -> Self {
        Self { dm }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Active categories sorted by display order.
    pub async fn list_active(&self) -> AppResult<Vec<NotificationCategory>> {
        let mut categories: Vec<NotificationCategory> = self
            .dm
            .read_query(NOTIFICATION_CATEGORIES, ACTIVE_QUERY, &json!({ "active": true }))
            .await?;
        categories.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        Ok(categories)
    }

    /// The active catalog used to validate and default category opt-ins.
    pub async fn catalog(&self) -> AppResult<ActiveCatalog> {
        let categories = self.list_active().await?;
        Ok(ActiveCatalog::new(
            categories.into_iter().map(|c| (c.id, c.default_opt_in)),
        ))
    }

    /// A category by id, active or not.
    pub async fn get(&self, id: &str) -> AppResult<NotificationCategory> {
        let id = CategoryId::parse(id)?;
        self.dm
            .read_optional(NOTIFICATION_CATEGORIES, id.as_str())
            .await?
            .ok_or_else(|| not_found(&id))
    }

    // ── Admin writes ─────────────────────────────────────────────────

    pub async fn create(
        &self,
        input: CreateNotificationCategory,
        now: Timestamp,
    ) -> AppResult<NotificationCategory> {
        let id = CategoryId::try_from(input.id)?;
        validate_category_name(&input.name)?;

        let existing: Option<NotificationCategory> = self
            .dm
            .read_optional(NOTIFICATION_CATEGORIES, id.as_str())
            .await?;
        if existing.is_some() {
            return Err(CoreError::Conflict(format!(
                "Notification category '{id}' already exists"
            ))
            .into());
        }

        let category = NotificationCategory {
            id,
            name: input.name.trim().to_string(),
            description: input.description,
            default_opt_in: input.default_opt_in,
            active: input.active.unwrap_or(true),
            order: input.order,
            created_at: now,
            updated_at: now,
        };
        self.save(&category).await?;
        tracing::info!(category_id = %category.id, "Notification category created");
        Ok(category)
    }

    pub async fn update(
        &self,
        id: &str,
        input: UpdateNotificationCategory,
        now: Timestamp,
    ) -> AppResult<NotificationCategory> {
        let mut category = self.get(id).await?;

        if let Some(name) = input.name {
            validate_category_name(&name)?;
            category.name = name.trim().to_string();
        }
        if let Some(description) = input.description {
            category.description = description;
        }
        if let Some(default_opt_in) = input.default_opt_in {
            category.default_opt_in = default_opt_in;
        }
        if let Some(active) = input.active {
            category.active = active;
        }
        if let Some(order) = input.order {
            category.order = order;
        }
        category.updated_at = now;

        self.save(&category).await?;
        tracing::info!(category_id = %category.id, "Notification category updated");
        Ok(category)
    }

    /// Soft-delete: the category leaves the active catalog, existing opt-in
    /// values for it stay on documents. Deleting an inactive category
    /// succeeds without writing.
    pub async fn delete(&self, id: &str, now: Timestamp) -> AppResult<()> {
        let mut category = self.get(id).await?;
        if !category.active {
            return Ok(());
        }
        category.active = false;
        category.updated_at = now;
        self.save(&category).await?;
        tracing::info!(category_id = %category.id, "Notification category deactivated");
        Ok(())
    }

    /// Insert every default category that does not exist yet. Returns the
    /// number inserted.
    pub async fn seed_defaults(&self, now: Timestamp) -> AppResult<usize> {
        let mut inserted = 0;
        for &(id, name, description, default_opt_in, order) in DEFAULT_CATEGORIES {
            let existing: Option<NotificationCategory> =
                self.dm.read_optional(NOTIFICATION_CATEGORIES, id).await?;
            if existing.is_some() {
                continue;
            }
            self.create(
                CreateNotificationCategory {
                    id: id.to_string(),
                    name: name.to_string(),
                    description: description.to_string(),
                    default_opt_in,
                    active: Some(true),
                    order,
                },
                now,
            )
            .await?;
            inserted += 1;
        }
        Ok(inserted)
    }

    // ── Internals ────────────────────────────────────────────────────

    async fn save(&self, category: &NotificationCategory) -> AppResult<()> {
        self.dm
            .write(NOTIFICATION_CATEGORIES, category.id.as_str(), category)
            .await?;
        self.dm.invalidate(NOTIFICATION_CATEGORIES, ACTIVE_QUERY).await;
        Ok(())
    }
}

fn not_found(id: &CategoryId) -> crate::error::AppError {
    CoreError::NotFound {
        entity: "NotificationCategory",
        id: id.to_string(),
    }
    .into()
}

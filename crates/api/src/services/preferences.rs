//! Bidirectional opt-in synchronization between phone mappings and user
//! configs.
//!
//! An update names its owner (a phone number or a CPF). The owner's
//! document is loaded, lazily completed against the active catalog,
//! updated, persisted and invalidated under its per-key lock. The same
//! requested deltas (not the merged result) are then applied to each
//! counterpart under the counterpart's own lock. The owner's write is
//! authoritative: counterpart and history failures are logged, never
//! returned.

use citizen_core::category::{ActiveCatalog, CategoryId, CategoryOptIns};
use citizen_core::channels::validate_channel;
use citizen_core::cpf::normalize_cpf;
use citizen_core::error::CoreError;
use citizen_core::mapping_status::MappingStatus;
use citizen_core::phone;
use citizen_core::preferences::{
    apply_update, diff, fill_missing_categories, PreferenceSnapshot, PreferenceUpdate,
    ValidatedUpdate,
};
use citizen_core::types::Timestamp;
use citizen_db::collections::{PHONE_MAPPING, USER_CONFIG};
use citizen_db::data_manager::DataManager;
use citizen_db::models::phone_mapping::PhoneCpfMapping;
use citizen_db::models::user_config::UserConfig;
use serde::Serialize;
use serde_json::json;

use super::categories::NotificationCategoryService;
use super::history::{HistoryContext, OptInHistoryRecorder};
use super::locks::KeyLocks;
use crate::error::AppResult;

/* --------------------------------------------------------------------------
Responses
-------------------------------------------------------------------------- */

#[derive(Debug, Serialize)]
pub struct CitizenPreferences {
    pub cpf: String,
    pub opt_in: bool,
    pub category_opt_ins: CategoryOptIns,
    pub updated_at: Timestamp,
}

impl From<UserConfig> for CitizenPreferences {
    fn from(config: UserConfig) -> Self {
        Self {
            cpf: config.cpf,
            opt_in: config.opt_in,
            category_opt_ins: config.category_opt_ins,
            updated_at: config.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PhonePreferences {
    pub phone_number: String,
    pub opt_in: bool,
    pub category_opt_ins: CategoryOptIns,
    pub updated_at: Timestamp,
}

impl From<PhoneCpfMapping> for PhonePreferences {
    fn from(mapping: PhoneCpfMapping) -> Self {
        Self {
            phone_number: mapping.phone_number,
            opt_in: mapping.opt_in,
            category_opt_ins: mapping.category_opt_ins,
            updated_at: mapping.updated_at,
        }
    }
}

/// Where a change came from, recorded with its history entries.
#[derive(Debug, Clone)]
pub struct ChangeOrigin {
    pub channel: String,
    pub reason: Option<String>,
}

/* --------------------------------------------------------------------------
Service
-------------------------------------------------------------------------- */

#[derive(Clone)]
pub struct PreferenceService {
    dm: DataManager,
    categories: NotificationCategoryService,
    history: OptInHistoryRecorder,
    locks: KeyLocks,
}

impl PreferenceService {
    pub fn new(
        dm: DataManager,
        categories: NotificationCategoryService,
        history: OptInHistoryRecorder,
        locks: KeyLocks,
    ) -> Self {
        Self {
            dm,
            categories,
            history,
            locks,
        }
    }

    // ── Citizen side ─────────────────────────────────────────────────

    /// Preferences of a citizen, creating the user config on first access.
    pub async fn citizen_preferences(&self, cpf: &str, now: Timestamp) -> AppResult<UserConfig> {
        let cpf = &normalize_cpf(cpf)?;
        let catalog = self.categories.catalog().await?;
        let _guard = self.locks.lock(USER_CONFIG, cpf).await;
        self.load_user_config(cpf, &catalog, now).await
    }

    pub async fn update_citizen_preferences(
        &self,
        cpf: &str,
        update: PreferenceUpdate,
        origin: ChangeOrigin,
        now: Timestamp,
    ) -> AppResult<UserConfig> {
        let cpf = &normalize_cpf(cpf)?;
        validate_channel(&origin.channel)?;
        let catalog = self.categories.catalog().await?;
        let update = update.validate(&catalog)?;

        let (config, changes) = {
            let _guard = self.locks.lock(USER_CONFIG, cpf).await;
            let mut config = self.load_user_config(cpf, &catalog, now).await?;
            let before = PreferenceSnapshot::capture(&config);
            apply_update(&mut config, &update, now);
            self.dm.write(USER_CONFIG, cpf, &config).await?;
            let changes = diff(&before, &PreferenceSnapshot::capture(&config));
            (config, changes)
        };
        tracing::info!(cpf = %cpf, changes = changes.len(), "Citizen preferences updated");

        self.sync_to_phones(cpf, &update, &catalog, now).await;

        let ctx = HistoryContext {
            cpf: Some(cpf.to_string()),
            phone_number: None,
            channel: origin.channel,
            reason: origin.reason,
        };
        self.history.record(&ctx, &changes, now).await;
        Ok(config)
    }

    pub async fn update_citizen_category(
        &self,
        cpf: &str,
        category_id: &str,
        opt_in: bool,
        origin: ChangeOrigin,
        now: Timestamp,
    ) -> AppResult<UserConfig> {
        let id = CategoryId::parse(category_id)?;
        self.update_citizen_preferences(cpf, PreferenceUpdate::category(id, opt_in), origin, now)
            .await
    }

    // ── Phone side ───────────────────────────────────────────────────

    /// Preferences stored on a phone mapping, completing its category map.
    pub async fn phone_preferences(&self, raw_phone: &str) -> AppResult<PhoneCpfMapping> {
        let phone = phone::normalize(raw_phone)?;
        let catalog = self.categories.catalog().await?;
        let _guard = self.locks.lock(PHONE_MAPPING, &phone).await;
        let mut mapping = self.read_mapping(&phone).await?;
        if fill_missing_categories(&mut mapping, &catalog) {
            self.dm.write(PHONE_MAPPING, &phone, &mapping).await?;
            tracing::debug!(phone_number = %phone, "Filled missing categories on phone mapping");
        }
        Ok(mapping)
    }

    pub async fn update_phone_preferences(
        &self,
        raw_phone: &str,
        update: PreferenceUpdate,
        origin: ChangeOrigin,
        now: Timestamp,
    ) -> AppResult<PhoneCpfMapping> {
        let phone = phone::normalize(raw_phone)?;
        validate_channel(&origin.channel)?;
        let catalog = self.categories.catalog().await?;
        let update = update.validate(&catalog)?;

        let (mapping, changes) = {
            let _guard = self.locks.lock(PHONE_MAPPING, &phone).await;
            let mut mapping = self.read_mapping(&phone).await?;
            fill_missing_categories(&mut mapping, &catalog);
            let before = PreferenceSnapshot::capture(&mapping);
            apply_update(&mut mapping, &update, now);
            self.dm.write(PHONE_MAPPING, &phone, &mapping).await?;
            let changes = diff(&before, &PreferenceSnapshot::capture(&mapping));
            (mapping, changes)
        };
        tracing::info!(phone_number = %phone, changes = changes.len(), "Phone preferences updated");

        let cpf = mapping.linked_cpf().map(str::to_string);
        if let Some(cpf) = cpf.as_deref() {
            self.sync_to_citizen(cpf, &update, mapping.opt_in, &catalog, now)
                .await;
        }

        let ctx = HistoryContext {
            cpf,
            phone_number: Some(phone),
            channel: origin.channel,
            reason: origin.reason,
        };
        self.history.record(&ctx, &changes, now).await;
        Ok(mapping)
    }

    pub async fn update_phone_category(
        &self,
        raw_phone: &str,
        category_id: &str,
        opt_in: bool,
        origin: ChangeOrigin,
        now: Timestamp,
    ) -> AppResult<PhoneCpfMapping> {
        let id = CategoryId::parse(category_id)?;
        self.update_phone_preferences(raw_phone, PreferenceUpdate::category(id, opt_in), origin, now)
            .await
    }

    // ── Counterpart sync ─────────────────────────────────────────────

    /// Apply `update` to the user config of `cpf`, creating it if needed.
    /// A created config starts from the owner's resulting global opt-in.
    pub(crate) async fn sync_to_citizen(
        &self,
        cpf: &str,
        update: &ValidatedUpdate,
        owner_opt_in: bool,
        catalog: &ActiveCatalog,
        now: Timestamp,
    ) {
        if let Err(e) = self
            .try_sync_to_citizen(cpf, update, owner_opt_in, catalog, now)
            .await
        {
            tracing::warn!(cpf = %cpf, error = %e, "Sync to user config failed");
        }
    }

    /// Apply `update` to every non-rejected phone mapping linked to `cpf`.
    pub(crate) async fn sync_to_phones(
        &self,
        cpf: &str,
        update: &ValidatedUpdate,
        catalog: &ActiveCatalog,
        now: Timestamp,
    ) {
        let mappings: Vec<PhoneCpfMapping> =
            match self.dm.find_many(PHONE_MAPPING, &json!({ "cpf": cpf })).await {
                Ok(mappings) => mappings,
                Err(e) => {
                    tracing::warn!(cpf = %cpf, error = %e, "Could not list phone mappings for sync");
                    return;
                }
            };

        for mapping in mappings
            .into_iter()
            .filter(|m| m.status != MappingStatus::Rejected)
        {
            if let Err(e) = self
                .try_sync_to_phone(cpf, &mapping.phone_number, update, catalog, now)
                .await
            {
                tracing::warn!(
                    cpf = %cpf,
                    phone_number = %mapping.phone_number,
                    error = %e,
                    "Sync to phone mapping failed",
                );
            }
        }
    }

    async fn try_sync_to_citizen(
        &self,
        cpf: &str,
        update: &ValidatedUpdate,
        owner_opt_in: bool,
        catalog: &ActiveCatalog,
        now: Timestamp,
    ) -> AppResult<()> {
        let _guard = self.locks.lock(USER_CONFIG, cpf).await;
        let mut config = match self.dm.read_optional::<UserConfig>(USER_CONFIG, cpf).await? {
            Some(mut config) => {
                fill_missing_categories(&mut config, catalog);
                config
            }
            None => {
                let mut config =
                    UserConfig::new(cpf.to_string(), catalog.initial_opt_ins(owner_opt_in), now);
                config.first_login = false;
                config.opt_in = owner_opt_in;
                config
            }
        };
        apply_update(&mut config, update, now);
        config.synced_at = Some(now);
        self.dm.write(USER_CONFIG, cpf, &config).await?;
        tracing::debug!(cpf = %cpf, "Synced user config");
        Ok(())
    }

    async fn try_sync_to_phone(
        &self,
        cpf: &str,
        phone: &str,
        update: &ValidatedUpdate,
        catalog: &ActiveCatalog,
        now: Timestamp,
    ) -> AppResult<()> {
        let _guard = self.locks.lock(PHONE_MAPPING, phone).await;
        let Some(mut mapping) = self
            .dm
            .read_optional::<PhoneCpfMapping>(PHONE_MAPPING, phone)
            .await?
        else {
            return Ok(());
        };
        // Re-checked under the lock: the mapping may have changed since the scan.
        if mapping.status == MappingStatus::Rejected || mapping.cpf.as_deref() != Some(cpf) {
            return Ok(());
        }
        fill_missing_categories(&mut mapping, catalog);
        apply_update(&mut mapping, update, now);
        mapping.synced_at = Some(now);
        self.dm.write(PHONE_MAPPING, phone, &mapping).await?;
        tracing::debug!(cpf = %cpf, phone_number = %phone, "Synced phone mapping");
        Ok(())
    }

    // ── Internals ────────────────────────────────────────────────────

    /// Load or create the user config of `cpf`. The caller holds its lock.
    async fn load_user_config(
        &self,
        cpf: &str,
        catalog: &ActiveCatalog,
        now: Timestamp,
    ) -> AppResult<UserConfig> {
        match self.dm.read_optional::<UserConfig>(USER_CONFIG, cpf).await? {
            Some(mut config) => {
                if fill_missing_categories(&mut config, catalog) {
                    self.dm.write(USER_CONFIG, cpf, &config).await?;
                    tracing::debug!(cpf = %cpf, "Filled missing categories on user config");
                }
                Ok(config)
            }
            None => {
                let config = UserConfig::new(cpf.to_string(), catalog.initial_opt_ins(true), now);
                self.dm.write(USER_CONFIG, cpf, &config).await?;
                tracing::info!(cpf = %cpf, "Created user config");
                Ok(config)
            }
        }
    }

    async fn read_mapping(&self, phone: &str) -> AppResult<PhoneCpfMapping> {
        self.dm
            .read_optional(PHONE_MAPPING, phone)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound {
                    entity: "PhoneMapping",
                    id: phone.to_string(),
                }
                .into()
            })
    }
}

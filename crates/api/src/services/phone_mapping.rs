//! Phone ↔ CPF mapping lifecycle: registration lookups, opt-in/opt-out,
//! rejection, admin binding and quarantine.
//!
//! Every mutation runs under the phone's per-key lock and goes through
//! [`transition`] for its status change. Opt-in state changes are then
//! synchronized to the linked citizen's user config and recorded in the
//! history, in that order, both best-effort.

use citizen_core::channels::{validate_channel, validate_opt_out_reason, REASON_REGISTRATION_REJECTED};
use citizen_core::cpf::{mask_cpf, normalize_cpf};
use citizen_core::error::CoreError;
use citizen_core::identity::{first_name, mask_name, names_match, parse_birth_date};
use citizen_core::mapping_status::{quarantine_running, transition, MappingStatus, Transition};
use citizen_core::phone::{self, PhoneNumber};
use citizen_core::preferences::{
    apply_update, diff, fill_missing_categories, OptInChange, OptInScope, PreferenceSnapshot,
    PreferenceUpdate,
};
use citizen_core::types::Timestamp;
use citizen_db::collections::{CITIZENS, PHONE_MAPPING};
use citizen_db::data_manager::DataManager;
use citizen_db::models::citizen::Citizen;
use citizen_db::models::phone_mapping::{
    BindPhoneRequest, OptInRequest, OptOutRequest, PhoneCpfMapping, QuarantineEvent,
    RejectRegistrationRequest, ValidateRegistrationRequest,
};
use serde::Serialize;
use serde_json::json;

use super::categories::NotificationCategoryService;
use super::history::{HistoryContext, OptInHistoryRecorder};
use super::locks::KeyLocks;
use super::preferences::PreferenceService;
use crate::error::AppResult;
use crate::response::Pagination;

/* --------------------------------------------------------------------------
Responses
-------------------------------------------------------------------------- */

/// Public view of a phone number. Citizen data is masked and omitted while
/// the phone is quarantined.
#[derive(Debug, Serialize)]
pub struct PhoneStatus {
    pub phone_number: String,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MappingStatus>,
    pub quarantined: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quarantine_until: Option<Timestamp>,
    pub opt_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct CitizenLookup {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct RegistrationValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_cpf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_name: Option<String>,
}

/// Outcome of a lifecycle action on a phone.
#[derive(Debug, Serialize)]
pub struct PhoneAction {
    pub status: &'static str,
    pub phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opt_in: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quarantine_until: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PhoneAction {
    fn new(status: &'static str, phone_number: &str) -> Self {
        Self {
            status,
            phone_number: phone_number.to_string(),
            cpf: None,
            opt_in: None,
            quarantine_until: None,
            message: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuarantinedPhone {
    pub phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    pub quarantine_until: Timestamp,
    pub expired: bool,
}

#[derive(Debug, Serialize)]
pub struct QuarantinedPage {
    pub items: Vec<QuarantinedPhone>,
    pub pagination: Pagination,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct QuarantineStats {
    pub total_quarantined: u64,
    pub expired_quarantines: u64,
    pub active_quarantines: u64,
    pub quarantines_with_cpf: u64,
    pub quarantines_without_cpf: u64,
    pub quarantine_history_total: u64,
}

/* --------------------------------------------------------------------------
Service
-------------------------------------------------------------------------- */

#[derive(Clone)]
pub struct PhoneMappingService {
    dm: DataManager,
    categories: NotificationCategoryService,
    preferences: PreferenceService,
    history: OptInHistoryRecorder,
    locks: KeyLocks,
    quarantine_window: chrono::Duration,
}

impl PhoneMappingService {
    pub fn new(
        dm: DataManager,
        categories: NotificationCategoryService,
        preferences: PreferenceService,
        history: OptInHistoryRecorder,
        locks: KeyLocks,
        quarantine_window: chrono::Duration,
    ) -> Self {
        Self {
            dm,
            categories,
            preferences,
            history,
            locks,
            quarantine_window,
        }
    }

    // ── Lookups ──────────────────────────────────────────────────────

    pub async fn phone_status(&self, raw_phone: &str, now: Timestamp) -> AppResult<PhoneStatus> {
        let phone = phone::normalize(raw_phone)?;
        let Some(mapping) = self.find(&phone).await? else {
            return Ok(PhoneStatus {
                phone_number: phone,
                found: false,
                status: None,
                quarantined: false,
                quarantine_until: None,
                opt_in: false,
                cpf: None,
                name: None,
            });
        };

        let quarantined = quarantine_running(mapping.quarantine_until, now);
        let (cpf, name) = match mapping.cpf.as_deref().filter(|c| !c.is_empty()) {
            Some(cpf) if !quarantined => {
                let name = self
                    .citizen(cpf)
                    .await?
                    .map(|citizen| mask_name(&citizen.name));
                (Some(mask_cpf(cpf)), name)
            }
            _ => (None, None),
        };

        Ok(PhoneStatus {
            phone_number: phone,
            found: true,
            status: Some(mapping.status),
            quarantined,
            quarantine_until: mapping.quarantine_until,
            opt_in: mapping.opt_in,
            cpf,
            name,
        })
    }

    /// The citizen linked to a phone, masked beyond the first name. Nothing
    /// is revealed for quarantined or rejected phones.
    pub async fn find_citizen(&self, raw_phone: &str, now: Timestamp) -> AppResult<CitizenLookup> {
        let phone = phone::normalize(raw_phone)?;
        let Some(mapping) = self.find(&phone).await? else {
            return Ok(CitizenLookup::default());
        };
        if quarantine_running(mapping.quarantine_until, now)
            || mapping.status == MappingStatus::Rejected
        {
            return Ok(CitizenLookup::default());
        }
        let Some(cpf) = mapping.cpf.as_deref().filter(|c| !c.is_empty()) else {
            return Ok(CitizenLookup::default());
        };
        let Some(citizen) = self.citizen(cpf).await? else {
            return Ok(CitizenLookup::default());
        };

        Ok(CitizenLookup {
            found: true,
            cpf: Some(mask_cpf(cpf)),
            name: Some(mask_name(&citizen.name)),
            first_name: Some(first_name(&citizen.name)),
        })
    }

    /// Compare a claimed identity with the base citizen record. Read-only.
    pub async fn validate_registration(
        &self,
        raw_phone: &str,
        req: ValidateRegistrationRequest,
    ) -> AppResult<RegistrationValidation> {
        let phone = phone::normalize(raw_phone)?;
        if let Some(channel) = req.channel.as_deref() {
            validate_channel(channel)?;
        }
        let Some(claimed_birth) = parse_birth_date(&req.birth_date) else {
            return Err(CoreError::Validation(
                "birth_date must be YYYY-MM-DD or DD/MM/YYYY".to_string(),
            )
            .into());
        };
        let Ok(cpf) = normalize_cpf(&req.cpf) else {
            return Ok(RegistrationValidation::default());
        };
        let Some(citizen) = self.citizen(&cpf).await? else {
            return Ok(RegistrationValidation::default());
        };

        let valid =
            names_match(&req.name, &citizen.name) && citizen.birth_date == Some(claimed_birth);
        tracing::info!(phone_number = %phone, cpf = %mask_cpf(&cpf), valid, "Registration validated");

        if !valid {
            return Ok(RegistrationValidation::default());
        }
        Ok(RegistrationValidation {
            valid: true,
            matched_cpf: Some(cpf),
            matched_name: Some(citizen.name),
        })
    }

    // ── Citizen actions ──────────────────────────────────────────────

    pub async fn opt_in(
        &self,
        raw_phone: &str,
        req: OptInRequest,
        now: Timestamp,
    ) -> AppResult<PhoneAction> {
        let phone = phone::normalize(raw_phone)?;
        let cpf = normalize_cpf(&req.cpf)?;
        validate_channel(&req.channel)?;
        if req.validation_result.is_some_and(|v| !v.valid) {
            return Err(CoreError::Validation(
                "Registration validation failed; cannot opt in".to_string(),
            )
            .into());
        }
        let catalog = self.categories.catalog().await?;
        let update = PreferenceUpdate::global(true).validate(&catalog)?;

        let changes = {
            let _guard = self.locks.lock(PHONE_MAPPING, &phone).await;
            match self.find(&phone).await? {
                None => {
                    let mut mapping = PhoneCpfMapping::new(
                        phone.clone(),
                        Some(cpf.clone()),
                        MappingStatus::Active,
                        Some(req.channel.clone()),
                        now,
                    );
                    mapping.category_opt_ins = catalog.initial_opt_ins(true);
                    apply_update(&mut mapping, &update, now);
                    self.dm.write(PHONE_MAPPING, &phone, &mapping).await?;
                    tracing::info!(phone_number = %phone, "Phone mapping created on opt-in");
                    vec![created(true)]
                }
                Some(mut mapping) => {
                    let expired = mapping.status == MappingStatus::Quarantined
                        && !quarantine_running(mapping.quarantine_until, now);
                    if expired {
                        release(&mut mapping, now);
                    }
                    let status = transition(mapping.status, Transition::Activate)?;

                    if !expired
                        && mapping.cpf.as_deref() == Some(cpf.as_str())
                        && mapping.status == MappingStatus::Active
                        && mapping.opt_in
                    {
                        let mut action = PhoneAction::new("already_opted_in", &phone);
                        action.cpf = Some(cpf);
                        action.opt_in = Some(true);
                        return Ok(action);
                    }

                    fill_missing_categories(&mut mapping, &catalog);
                    let before = PreferenceSnapshot::capture(&mapping);
                    mapping.status = status;
                    mapping.cpf = Some(cpf.clone());
                    mapping.channel = Some(req.channel.clone());
                    apply_update(&mut mapping, &update, now);
                    self.dm.write(PHONE_MAPPING, &phone, &mapping).await?;
                    tracing::info!(phone_number = %phone, "Phone opted in");
                    diff(&before, &PreferenceSnapshot::capture(&mapping))
                }
            }
        };

        self.preferences
            .sync_to_citizen(&cpf, &update, true, &catalog, now)
            .await;
        let ctx = HistoryContext {
            cpf: Some(cpf.clone()),
            phone_number: Some(phone.clone()),
            channel: req.channel,
            reason: None,
        };
        self.history.record(&ctx, &changes, now).await;

        let mut action = PhoneAction::new("opted_in", &phone);
        action.cpf = Some(cpf);
        action.opt_in = Some(true);
        Ok(action)
    }

    /// Opt a phone out. Allowed in any state; an unknown phone gets a
    /// CPF-less pending mapping so the choice is remembered.
    pub async fn opt_out(
        &self,
        raw_phone: &str,
        req: OptOutRequest,
        now: Timestamp,
    ) -> AppResult<PhoneAction> {
        let phone = phone::normalize(raw_phone)?;
        validate_channel(&req.channel)?;
        if let Some(reason) = req.reason.as_deref() {
            validate_opt_out_reason(reason)?;
        }
        let catalog = self.categories.catalog().await?;
        let update = PreferenceUpdate::global(false).validate(&catalog)?;

        let (cpf, changes) = {
            let _guard = self.locks.lock(PHONE_MAPPING, &phone).await;
            match self.find(&phone).await? {
                None => {
                    let mut mapping = PhoneCpfMapping::new(
                        phone.clone(),
                        None,
                        MappingStatus::Pending,
                        Some(req.channel.clone()),
                        now,
                    );
                    mapping.category_opt_ins = catalog.initial_opt_ins(false);
                    self.dm.write(PHONE_MAPPING, &phone, &mapping).await?;
                    tracing::info!(phone_number = %phone, "Opt-out recorded for unknown phone");
                    (None, vec![created(false)])
                }
                Some(mut mapping) => {
                    fill_missing_categories(&mut mapping, &catalog);
                    let before = PreferenceSnapshot::capture(&mapping);
                    mapping.channel = Some(req.channel.clone());
                    apply_update(&mut mapping, &update, now);
                    self.dm.write(PHONE_MAPPING, &phone, &mapping).await?;
                    tracing::info!(phone_number = %phone, "Phone opted out");
                    let cpf = mapping.linked_cpf().map(str::to_string);
                    (cpf, diff(&before, &PreferenceSnapshot::capture(&mapping)))
                }
            }
        };

        if let Some(cpf) = cpf.as_deref() {
            self.preferences
                .sync_to_citizen(cpf, &update, false, &catalog, now)
                .await;
        }
        let ctx = HistoryContext {
            cpf,
            phone_number: Some(phone.clone()),
            channel: req.channel,
            reason: req.reason,
        };
        self.history.record(&ctx, &changes, now).await;

        let mut action = PhoneAction::new("opted_out", &phone);
        action.opt_in = Some(false);
        Ok(action)
    }

    /// The citizen says the registration is not theirs. Terminal for the
    /// mapping; the CPF side is left alone.
    pub async fn reject_registration(
        &self,
        raw_phone: &str,
        req: RejectRegistrationRequest,
        now: Timestamp,
    ) -> AppResult<PhoneAction> {
        let phone = phone::normalize(raw_phone)?;
        let cpf = normalize_cpf(&req.cpf)?;
        validate_channel(&req.channel)?;

        let changes = {
            let _guard = self.locks.lock(PHONE_MAPPING, &phone).await;
            let Some(mut mapping) = self.find(&phone).await? else {
                return Ok(PhoneAction::new("not_found", &phone));
            };
            let status = transition(mapping.status, Transition::Reject)?;
            let before = PreferenceSnapshot::capture(&mapping);
            mapping.status = status;
            mapping.opt_in = false;
            mapping.channel = Some(req.channel.clone());
            mapping.updated_at = now;
            self.dm.write(PHONE_MAPPING, &phone, &mapping).await?;
            tracing::info!(phone_number = %phone, "Phone registration rejected");
            diff(&before, &PreferenceSnapshot::capture(&mapping))
        };

        let ctx = HistoryContext {
            cpf: Some(cpf),
            phone_number: Some(phone.clone()),
            channel: req.channel,
            reason: Some(REASON_REGISTRATION_REJECTED.to_string()),
        };
        self.history.record(&ctx, &changes, now).await;

        let mut action = PhoneAction::new("rejected", &phone);
        action.opt_in = Some(false);
        Ok(action)
    }

    // ── Admin actions ────────────────────────────────────────────────

    /// Link a phone to a CPF. A rejected or unknown phone starts over as a
    /// fresh pending mapping; otherwise status and consent are kept.
    pub async fn bind(
        &self,
        raw_phone: &str,
        req: BindPhoneRequest,
        now: Timestamp,
    ) -> AppResult<PhoneAction> {
        let phone = phone::normalize(raw_phone)?;
        let cpf = normalize_cpf(&req.cpf)?;
        validate_channel(&req.channel)?;
        let catalog = self.categories.catalog().await?;

        let _guard = self.locks.lock(PHONE_MAPPING, &phone).await;
        let mapping = match self.find(&phone).await? {
            Some(mut mapping) if mapping.status != MappingStatus::Rejected => {
                fill_missing_categories(&mut mapping, &catalog);
                mapping.cpf = Some(cpf.clone());
                mapping.channel = Some(req.channel);
                mapping.updated_at = now;
                mapping
            }
            _ => {
                let mut mapping = PhoneCpfMapping::new(
                    phone.clone(),
                    Some(cpf.clone()),
                    MappingStatus::Pending,
                    Some(req.channel),
                    now,
                );
                mapping.category_opt_ins = catalog.initial_opt_ins(false);
                mapping
            }
        };
        self.dm.write(PHONE_MAPPING, &phone, &mapping).await?;
        tracing::info!(phone_number = %phone, cpf = %mask_cpf(&cpf), status = %mapping.status, "Phone bound to CPF");

        let mut action = PhoneAction::new("bound", &phone);
        action.cpf = Some(cpf);
        action.opt_in = Some(mapping.opt_in);
        action.message = Some("Phone bound to CPF; opt-in still required".to_string());
        Ok(action)
    }

    /// Quarantine a phone for the configured window, or extend a running
    /// quarantine. An unknown phone gets a CPF-less quarantined mapping.
    pub async fn quarantine(&self, raw_phone: &str, now: Timestamp) -> AppResult<PhoneAction> {
        let phone = phone::normalize(raw_phone)?;
        let until = now + self.quarantine_window;

        let _guard = self.locks.lock(PHONE_MAPPING, &phone).await;
        let (mut mapping, extended) = match self.find(&phone).await? {
            Some(mapping) => {
                let extended = mapping.status == MappingStatus::Quarantined;
                (mapping, extended)
            }
            None => (
                PhoneCpfMapping::new(phone.clone(), None, MappingStatus::Pending, None, now),
                false,
            ),
        };
        mapping.status = transition(mapping.status, Transition::Quarantine)?;
        mapping.quarantine_until = Some(until);
        mapping.quarantine_history.push(QuarantineEvent {
            quarantined_at: now,
            quarantine_until: until,
            released_at: None,
        });
        mapping.updated_at = now;
        self.dm.write(PHONE_MAPPING, &phone, &mapping).await?;
        tracing::info!(phone_number = %phone, quarantine_until = %until, extended, "Phone quarantined");

        let mut action = PhoneAction::new("quarantined", &phone);
        action.quarantine_until = Some(until);
        action.message = Some(if extended {
            "Phone number quarantine extended".to_string()
        } else {
            "Phone number quarantined".to_string()
        });
        Ok(action)
    }

    /// End a quarantine. Releasing a phone that is not quarantined succeeds
    /// without changing it.
    pub async fn release_quarantine(
        &self,
        raw_phone: &str,
        now: Timestamp,
    ) -> AppResult<PhoneAction> {
        let phone = phone::normalize(raw_phone)?;

        let _guard = self.locks.lock(PHONE_MAPPING, &phone).await;
        let mut mapping = self.find(&phone).await?.ok_or_else(|| CoreError::NotFound {
            entity: "PhoneMapping",
            id: phone.clone(),
        })?;

        if mapping.status == MappingStatus::Quarantined {
            release(&mut mapping, now);
            self.dm.write(PHONE_MAPPING, &phone, &mapping).await?;
            tracing::info!(phone_number = %phone, status = %mapping.status, "Phone quarantine released");
        }

        let mut action = PhoneAction::new("released", &phone);
        action.message = Some("Phone number released from quarantine".to_string());
        Ok(action)
    }

    /// Quarantined phones ordered by end of quarantine. `expired` selects
    /// expired (`true`) or running (`false`) quarantines; `None` lists both.
    pub async fn quarantined_phones(
        &self,
        page: u32,
        per_page: u32,
        expired: Option<bool>,
        now: Timestamp,
    ) -> AppResult<QuarantinedPage> {
        let mut items: Vec<QuarantinedPhone> = self
            .quarantined_mappings()
            .await?
            .into_iter()
            .filter_map(|m| {
                let until = m.quarantine_until?;
                let is_expired = until <= now;
                if expired.is_some_and(|want| want != is_expired) {
                    return None;
                }
                Some(QuarantinedPhone {
                    phone_number: display_phone(&m.phone_number),
                    cpf: m.cpf.as_deref().filter(|c| !c.is_empty()).map(mask_cpf),
                    quarantine_until: until,
                    expired: is_expired,
                })
            })
            .collect();
        items.sort_by_key(|p| p.quarantine_until);

        let total = items.len() as u64;
        let skip = (page.saturating_sub(1) as usize).saturating_mul(per_page as usize);
        let items = items.into_iter().skip(skip).take(per_page as usize).collect();

        Ok(QuarantinedPage {
            items,
            pagination: Pagination::new(page, per_page, total),
        })
    }

    pub async fn quarantine_stats(&self, now: Timestamp) -> AppResult<QuarantineStats> {
        let mappings: Vec<PhoneCpfMapping> = self.dm.find_many(PHONE_MAPPING, &json!({})).await?;

        let mut stats = QuarantineStats::default();
        for mapping in &mappings {
            stats.quarantine_history_total += mapping.quarantine_history.len() as u64;
            if mapping.status != MappingStatus::Quarantined {
                continue;
            }
            let Some(until) = mapping.quarantine_until else {
                continue;
            };
            stats.total_quarantined += 1;
            if until > now {
                stats.active_quarantines += 1;
            } else {
                stats.expired_quarantines += 1;
            }
            if mapping.has_cpf() {
                stats.quarantines_with_cpf += 1;
            } else {
                stats.quarantines_without_cpf += 1;
            }
        }
        Ok(stats)
    }

    // ── Internals ────────────────────────────────────────────────────

    async fn find(&self, phone: &str) -> AppResult<Option<PhoneCpfMapping>> {
        Ok(self.dm.read_optional(PHONE_MAPPING, phone).await?)
    }

    async fn citizen(&self, cpf: &str) -> AppResult<Option<Citizen>> {
        Ok(self.dm.read_optional(CITIZENS, cpf).await?)
    }

    async fn quarantined_mappings(&self) -> AppResult<Vec<PhoneCpfMapping>> {
        Ok(self
            .dm
            .find_many(PHONE_MAPPING, &json!({ "status": MappingStatus::Quarantined }))
            .await?)
    }
}

/// Leave quarantine: stamp the open event, clear the window and return to
/// active (or pending without a CPF).
fn release(mapping: &mut PhoneCpfMapping, now: Timestamp) {
    let has_cpf = mapping.has_cpf();
    if let Some(event) = mapping
        .quarantine_history
        .last_mut()
        .filter(|e| e.released_at.is_none())
    {
        event.released_at = Some(now);
    }
    mapping.quarantine_until = None;
    mapping.status =
        transition(mapping.status, Transition::Release { has_cpf }).unwrap_or(mapping.status);
    mapping.updated_at = now;
}

/// History entry for the global value a mapping was created with.
fn created(opt_in: bool) -> OptInChange {
    OptInChange {
        scope: OptInScope::Global,
        category: None,
        old_value: None,
        new_value: opt_in,
    }
}

fn display_phone(storage_key: &str) -> String {
    PhoneNumber::parse(&format!("+{storage_key}"))
        .map(|p| p.e164())
        .unwrap_or_else(|_| storage_key.to_string())
}

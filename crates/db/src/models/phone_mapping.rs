//! Phone ↔ CPF mapping model.

use citizen_core::category::CategoryOptIns;
use citizen_core::mapping_status::MappingStatus;
use citizen_core::preferences::OptInDocument;
use citizen_core::types::Timestamp;
use serde::{Deserialize, Serialize};

/// A document from the `phone_mapping` collection, keyed by the canonical
/// phone number.
///
/// `quarantine_until` is set exactly while `status` is `quarantined`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneCpfMapping {
    pub phone_number: String,
    #[serde(default)]
    pub cpf: Option<String>,
    pub status: MappingStatus,
    #[serde(default)]
    pub opt_in: bool,
    #[serde(default)]
    pub category_opt_ins: CategoryOptIns,
    #[serde(default)]
    pub quarantine_until: Option<Timestamp>,
    #[serde(default)]
    pub quarantine_history: Vec<QuarantineEvent>,
    /// Channel of the last state change.
    #[serde(default)]
    pub channel: Option<String>,
    /// Last time this document was written by a sync from the CPF side.
    #[serde(default)]
    pub synced_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One quarantine period of a phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarantineEvent {
    pub quarantined_at: Timestamp,
    pub quarantine_until: Timestamp,
    #[serde(default)]
    pub released_at: Option<Timestamp>,
}

impl PhoneCpfMapping {
    /// A new mapping with opt-out state and no categories.
    pub fn new(
        phone_number: String,
        cpf: Option<String>,
        status: MappingStatus,
        channel: Option<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            phone_number,
            cpf,
            status,
            opt_in: false,
            category_opt_ins: CategoryOptIns::new(),
            quarantine_until: None,
            quarantine_history: Vec::new(),
            channel,
            synced_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_cpf(&self) -> bool {
        self.cpf.as_deref().is_some_and(|c| !c.is_empty())
    }

    /// The CPF whose preferences follow this phone. A rejected mapping keeps
    /// its `cpf` for the record but is linked to nobody.
    pub fn linked_cpf(&self) -> Option<&str> {
        if self.status == MappingStatus::Rejected {
            return None;
        }
        self.cpf.as_deref().filter(|c| !c.is_empty())
    }
}

impl OptInDocument for PhoneCpfMapping {
    fn opt_in(&self) -> bool {
        self.opt_in
    }

    fn set_opt_in(&mut self, value: bool) {
        self.opt_in = value;
    }

    fn category_opt_ins(&self) -> &CategoryOptIns {
        &self.category_opt_ins
    }

    fn category_opt_ins_mut(&mut self) -> &mut CategoryOptIns {
        &mut self.category_opt_ins
    }

    fn touch(&mut self, now: Timestamp) {
        self.updated_at = now;
    }
}

/// DTO for an admin binding a phone to a CPF.
#[derive(Debug, Clone, Deserialize)]
pub struct BindPhoneRequest {
    pub cpf: String,
    pub channel: String,
}

/// DTO for a citizen opting in through a phone.
#[derive(Debug, Clone, Deserialize)]
pub struct OptInRequest {
    pub cpf: String,
    pub channel: String,
    /// Required when opting in a phone with no linked CPF.
    #[serde(default)]
    pub validation_result: Option<ValidationResult>,
}

/// Outcome of a prior registration validation, echoed back on opt-in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
}

/// DTO for opting a phone out.
#[derive(Debug, Clone, Deserialize)]
pub struct OptOutRequest {
    pub channel: String,
    pub reason: Option<String>,
}

/// DTO for rejecting a registration.
#[derive(Debug, Clone, Deserialize)]
pub struct RejectRegistrationRequest {
    pub cpf: String,
    pub channel: String,
}

/// DTO for validating a claimed identity against the base record.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateRegistrationRequest {
    pub name: String,
    pub cpf: String,
    pub birth_date: String,
    #[serde(default)]
    pub channel: Option<String>,
}

//! Opt-in audit trail model.

use citizen_core::category::CategoryId;
use citizen_core::preferences::{OptInAction, OptInScope};
use citizen_core::types::Timestamp;
use serde::{Deserialize, Serialize};

/// A document from the `opt_in_history` collection. Written once, never
/// updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptInHistory {
    /// Absent for phones that were never linked to a citizen.
    pub cpf: Option<String>,
    pub phone_number: Option<String>,
    pub scope: OptInScope,
    pub category: Option<CategoryId>,
    pub action: OptInAction,
    pub old_value: Option<bool>,
    pub new_value: bool,
    pub channel: String,
    pub reason: Option<String>,
    pub timestamp: Timestamp,
}

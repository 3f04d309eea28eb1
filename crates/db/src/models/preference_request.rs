//! Preference update DTOs shared by the phone and citizen endpoints.

use citizen_core::category::CategoryOptIns;
use citizen_core::preferences::PreferenceUpdate;
use serde::Deserialize;

/// DTO for replacing some of a document's opt-in values.
///
/// `category_opt_ins` is merged into the stored map, never replacing it.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePreferencesRequest {
    pub opt_in: Option<bool>,
    #[serde(default)]
    pub category_opt_ins: CategoryOptIns,
    pub channel: String,
    pub reason: Option<String>,
}

impl UpdatePreferencesRequest {
    pub fn update(&self) -> PreferenceUpdate {
        PreferenceUpdate {
            opt_in: self.opt_in,
            category_opt_ins: self.category_opt_ins.clone(),
        }
    }
}

/// DTO for toggling a single category.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCategoryPreferenceRequest {
    pub opt_in: bool,
    pub channel: String,
    pub reason: Option<String>,
}

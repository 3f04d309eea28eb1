//! Per-citizen configuration model.

use citizen_core::category::CategoryOptIns;
use citizen_core::preferences::OptInDocument;
use citizen_core::types::Timestamp;
use serde::{Deserialize, Serialize};

/// A document from the `user_config` collection, keyed by CPF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    pub cpf: String,
    #[serde(default)]
    pub first_login: bool,
    #[serde(default)]
    pub opt_in: bool,
    #[serde(default)]
    pub category_opt_ins: CategoryOptIns,
    #[serde(default)]
    pub avatar_id: Option<String>,
    /// Last time this document was written by a sync from the phone side.
    #[serde(default)]
    pub synced_at: Option<Timestamp>,
    pub updated_at: Timestamp,
}

impl UserConfig {
    /// Configuration for a citizen seen for the first time: opted in, on
    /// their first login.
    pub fn new(cpf: String, category_opt_ins: CategoryOptIns, now: Timestamp) -> Self {
        Self {
            cpf,
            first_login: true,
            opt_in: true,
            category_opt_ins,
            avatar_id: None,
            synced_at: None,
            updated_at: now,
        }
    }
}

impl OptInDocument for UserConfig {
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

//! Base citizen record model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A document from the `citizens` collection. Owned by the upstream
/// registry; this service only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citizen {
    pub cpf: String,
    pub name: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
}

//! Notification category identifiers and the active catalog view.
//!
//! Category opt-ins are keyed by [`CategoryId`] rather than raw strings, so an
//! id coming off the wire is checked for shape once at deserialization and
//! for membership once against an [`ActiveCatalog`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum length of a category slug.
pub const MAX_CATEGORY_ID_LEN: usize = 64;

/// Maximum length of a category display name.
pub const MAX_CATEGORY_NAME_LEN: usize = 120;

/// Slug identifying a notification category, e.g. `mei_opportunities`.
///
/// Lowercase ASCII letters, digits, `_` and `-`, starting with a letter or
/// digit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CategoryId(String);

impl CategoryId {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        Self::try_from(raw.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CategoryId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() || value.len() > MAX_CATEGORY_ID_LEN {
            return Err(CoreError::Validation(format!(
                "Category id must be 1-{MAX_CATEGORY_ID_LEN} characters"
            )));
        }
        let first_ok = value
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
        let rest_ok = value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
        if !first_ok || !rest_ok {
            return Err(CoreError::Validation(format!(
                "Invalid category id '{value}'. Use lowercase letters, digits, '_' or '-'"
            )));
        }
        Ok(Self(value))
    }
}

impl From<CategoryId> for String {
    fn from(id: CategoryId) -> Self {
        id.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-category consent map stored on phone mappings and user configs.
pub type CategoryOptIns = BTreeMap<CategoryId, bool>;

/// Validate a category display name.
pub fn validate_category_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Category name must not be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_CATEGORY_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Category name must be at most {MAX_CATEGORY_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Snapshot of the active categories and their default opt-in values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveCatalog {
    defaults: BTreeMap<CategoryId, bool>,
}

impl ActiveCatalog {
    pub fn new(entries: impl IntoIterator<Item = (CategoryId, bool)>) -> Self {
        Self {
            defaults: entries.into_iter().collect(),
        }
    }

    pub fn contains(&self, id: &CategoryId) -> bool {
        self.defaults.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &CategoryId> {
        self.defaults.keys()
    }

    pub fn len(&self) -> usize {
        self.defaults.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defaults.is_empty()
    }

    /// Category map for a freshly created document: an entry is opted in
    /// only when both the global consent and the category default are.
    pub fn initial_opt_ins(&self, global_opt_in: bool) -> CategoryOptIns {
        self.defaults
            .iter()
            .map(|(id, default)| (id.clone(), global_opt_in && *default))
            .collect()
    }
}

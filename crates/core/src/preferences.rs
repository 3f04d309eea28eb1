//! Opt-in preference merge, lazy category fill and change diffing.
//!
//! Both the phone-keyed mapping and the CPF-keyed user config carry the same
//! consent shape (a global flag plus a per-category map). The functions here
//! operate on either through [`OptInDocument`], so both sides of a sync apply
//! exactly the same rules.

use serde::{Deserialize, Serialize};

use crate::category::{ActiveCatalog, CategoryId, CategoryOptIns};
use crate::error::CoreError;
use crate::types::Timestamp;

/// A document carrying opt-in state.
pub trait OptInDocument {
    fn opt_in(&self) -> bool;
    fn set_opt_in(&mut self, value: bool);
    fn category_opt_ins(&self) -> &CategoryOptIns;
    fn category_opt_ins_mut(&mut self) -> &mut CategoryOptIns;
    /// Stamp the document as modified at `now`.
    fn touch(&mut self, now: Timestamp);
}

/* --------------------------------------------------------------------------
Requested changes
-------------------------------------------------------------------------- */

/// A requested preference change. Absent fields are left untouched and the
/// category map is merged into, never replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PreferenceUpdate {
    pub opt_in: Option<bool>,
    #[serde(default)]
    pub category_opt_ins: CategoryOptIns,
}

impl PreferenceUpdate {
    pub fn global(opt_in: bool) -> Self {
        Self {
            opt_in: Some(opt_in),
            category_opt_ins: CategoryOptIns::new(),
        }
    }

    pub fn category(id: CategoryId, opt_in: bool) -> Self {
        Self {
            opt_in: None,
            category_opt_ins: CategoryOptIns::from([(id, opt_in)]),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.opt_in.is_none() && self.category_opt_ins.is_empty()
    }

    /// Check every category id against the active catalog. A single unknown
    /// id rejects the whole update.
    pub fn validate(self, catalog: &ActiveCatalog) -> Result<ValidatedUpdate, CoreError> {
        if self.is_empty() {
            return Err(CoreError::Validation(
                "At least one of opt_in or category_opt_ins is required".to_string(),
            ));
        }
        let unknown: Vec<&str> = self
            .category_opt_ins
            .keys()
            .filter(|id| !catalog.contains(id))
            .map(CategoryId::as_str)
            .collect();
        if !unknown.is_empty() {
            return Err(CoreError::Unprocessable(format!(
                "Unknown or inactive notification categories: {}",
                unknown.join(", ")
            )));
        }
        Ok(ValidatedUpdate(self))
    }
}

/// A [`PreferenceUpdate`] whose category ids were checked against the
/// active catalog. Only validated updates can be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUpdate(PreferenceUpdate);

impl ValidatedUpdate {
    pub fn opt_in(&self) -> Option<bool> {
        self.0.opt_in
    }

    pub fn category_opt_ins(&self) -> &CategoryOptIns {
        &self.0.category_opt_ins
    }
}

/* --------------------------------------------------------------------------
Mutation
-------------------------------------------------------------------------- */

/// Add an entry for every active category missing from the document,
/// valued at the document's global opt-in. Existing entries, including
/// those of categories deactivated since, are kept.
///
/// Returns `true` when the map changed and the document must be persisted.
pub fn fill_missing_categories<D: OptInDocument + ?Sized>(
    doc: &mut D,
    catalog: &ActiveCatalog,
) -> bool {
    let global = doc.opt_in();
    let map = doc.category_opt_ins_mut();
    let mut changed = false;
    for id in catalog.ids() {
        if !map.contains_key(id) {
            map.insert(id.clone(), global);
            changed = true;
        }
    }
    changed
}

/// Apply a validated update in place.
pub fn apply_update<D: OptInDocument + ?Sized>(doc: &mut D, update: &ValidatedUpdate, now: Timestamp) {
    if let Some(opt_in) = update.opt_in() {
        doc.set_opt_in(opt_in);
    }
    let map = doc.category_opt_ins_mut();
    for (id, value) in update.category_opt_ins() {
        map.insert(id.clone(), *value);
    }
    doc.touch(now);
}

/* --------------------------------------------------------------------------
Diffing
-------------------------------------------------------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptInScope {
    Global,
    Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptInAction {
    OptIn,
    OptOut,
    CategoryOptIn,
    CategoryOptOut,
}

impl OptInAction {
    pub fn derive(scope: OptInScope, new_value: bool) -> Self {
        match (scope, new_value) {
            (OptInScope::Global, true) => Self::OptIn,
            (OptInScope::Global, false) => Self::OptOut,
            (OptInScope::Category, true) => Self::CategoryOptIn,
            (OptInScope::Category, false) => Self::CategoryOptOut,
        }
    }
}

/// Opt-in values captured before a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceSnapshot {
    pub opt_in: bool,
    pub category_opt_ins: CategoryOptIns,
}

impl PreferenceSnapshot {
    pub fn capture<D: OptInDocument + ?Sized>(doc: &D) -> Self {
        Self {
            opt_in: doc.opt_in(),
            category_opt_ins: doc.category_opt_ins().clone(),
        }
    }
}

/// One value that changed between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptInChange {
    pub scope: OptInScope,
    pub category: Option<CategoryId>,
    /// `None` when the category had no entry before.
    pub old_value: Option<bool>,
    pub new_value: bool,
}

impl OptInChange {
    pub fn action(&self) -> OptInAction {
        OptInAction::derive(self.scope, self.new_value)
    }
}

/// Values that differ between `before` and `after`. Entries that only
/// exist in `before` are ignored: categories are never removed from a
/// document.
pub fn diff(before: &PreferenceSnapshot, after: &PreferenceSnapshot) -> Vec<OptInChange> {
    let mut changes = Vec::new();
    if before.opt_in != after.opt_in {
        changes.push(OptInChange {
            scope: OptInScope::Global,
            category: None,
            old_value: Some(before.opt_in),
            new_value: after.opt_in,
        });
    }
    for (id, &new_value) in &after.category_opt_ins {
        let old_value = before.category_opt_ins.get(id).copied();
        if old_value != Some(new_value) {
            changes.push(OptInChange {
                scope: OptInScope::Category,
                category: Some(id.clone()),
                old_value,
                new_value,
            });
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;

    #[derive(Default)]
    struct Doc {
        opt_in: bool,
        categories: CategoryOptIns,
        touched: Option<Timestamp>,
    }

    impl OptInDocument for Doc {
        fn opt_in(&self) -> bool {
            self.opt_in
        }
        fn set_opt_in(&mut self, value: bool) {
            self.opt_in = value;
        }
        fn category_opt_ins(&self) -> &CategoryOptIns {
            &self.categories
        }
        fn category_opt_ins_mut(&mut self) -> &mut CategoryOptIns {
            &mut self.categories
        }
        fn touch(&mut self, now: Timestamp) {
            self.touched = Some(now);
        }
    }

    fn id(raw: &str) -> CategoryId {
        CategoryId::parse(raw).unwrap()
    }

    fn catalog() -> ActiveCatalog {
        ActiveCatalog::new([(id("events"), true), (id("health"), true), (id("courses"), false)])
    }

    #[test]
    fn unknown_category_rejects_whole_update() {
        let mut update = PreferenceUpdate::global(false);
        update.category_opt_ins.insert(id("events"), false);
        update.category_opt_ins.insert(id("lottery"), true);

        assert_matches!(update.validate(&catalog()), Err(CoreError::Unprocessable(msg)) if msg.contains("lottery"));
    }

    #[test]
    fn empty_update_is_invalid() {
        assert_matches!(
            PreferenceUpdate::default().validate(&catalog()),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn fill_uses_global_value_and_keeps_stale_entries() {
        let mut doc = Doc {
            opt_in: false,
            ..Default::default()
        };
        doc.categories.insert(id("retired"), true);

        assert!(fill_missing_categories(&mut doc, &catalog()));
        assert_eq!(doc.categories.len(), 4);
        assert!(!doc.categories[&id("events")]);
        assert!(doc.categories[&id("retired")]);

        assert!(!fill_missing_categories(&mut doc, &catalog()));
    }

    #[test]
    fn apply_merges_categories() {
        let mut doc = Doc {
            opt_in: true,
            categories: catalog().initial_opt_ins(true),
            touched: None,
        };
        let update = PreferenceUpdate::category(id("courses"), true)
            .validate(&catalog())
            .unwrap();

        apply_update(&mut doc, &update, Utc::now());

        assert!(doc.opt_in);
        assert_eq!(doc.categories.len(), 3);
        assert!(doc.categories[&id("courses")]);
        assert!(doc.categories[&id("events")]);
        assert!(doc.touched.is_some());
    }

    #[test]
    fn diff_reports_only_changed_values() {
        let mut doc = Doc {
            opt_in: true,
            categories: catalog().initial_opt_ins(true),
            touched: None,
        };
        let before = PreferenceSnapshot::capture(&doc);

        let mut update = PreferenceUpdate::global(false);
        update.category_opt_ins.insert(id("events"), true);
        update.category_opt_ins.insert(id("health"), false);
        apply_update(&mut doc, &update.validate(&catalog()).unwrap(), Utc::now());

        let changes = diff(&before, &PreferenceSnapshot::capture(&doc));
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].action(), OptInAction::OptOut);
        assert_eq!(changes[1].category, Some(id("health")));
        assert_eq!(changes[1].old_value, Some(true));
        assert_eq!(changes[1].action(), OptInAction::CategoryOptOut);
    }

    #[test]
    fn identical_update_produces_no_changes() {
        let mut doc = Doc {
            opt_in: true,
            categories: catalog().initial_opt_ins(true),
            touched: None,
        };
        let before = PreferenceSnapshot::capture(&doc);
        let update = PreferenceUpdate {
            opt_in: Some(true),
            category_opt_ins: doc.categories.clone(),
        };
        apply_update(&mut doc, &update.validate(&catalog()).unwrap(), Utc::now());

        assert!(diff(&before, &PreferenceSnapshot::capture(&doc)).is_empty());
    }

    #[test]
    fn action_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(OptInAction::CategoryOptIn).unwrap(),
            serde_json::json!("category_opt_in")
        );
    }
}

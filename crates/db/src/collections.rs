//! Logical collection names.
//!
//! Each name is also the PostgreSQL table that stores the collection and the
//! cache namespace for its documents (`{collection}:{key}`).

/// Phone ↔ CPF mappings, keyed by canonical phone number.
pub const PHONE_MAPPING: &str = "phone_mapping";

/// Per-citizen configuration, keyed by CPF.
pub const USER_CONFIG: &str = "user_config";

/// Notification category catalog, keyed by category id.
pub const NOTIFICATION_CATEGORIES: &str = "notification_categories";

/// Append-only opt-in audit trail (no key).
pub const OPT_IN_HISTORY: &str = "opt_in_history";

/// Base citizen records, keyed by CPF. Read-only for this service.
pub const CITIZENS: &str = "citizens";

const KNOWN_COLLECTIONS: &[&str] = &[
    PHONE_MAPPING,
    USER_CONFIG,
    NOTIFICATION_CATEGORIES,
    OPT_IN_HISTORY,
    CITIZENS,
];

/// Returns `true` if `name` is one of the known collections.
pub fn is_known_collection(name: &str) -> bool {
    KNOWN_COLLECTIONS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitelist_rejects_unknown_names() {
        assert!(is_known_collection(PHONE_MAPPING));
        assert!(!is_known_collection("users; DROP TABLE citizens"));
    }
}

//! Phone mapping lifecycle state machine.
//!
//! ```text
//! from \ event   activate     quarantine    release            reject
//! pending        active       quarantined   pending            rejected
//! active         active       quarantined   active             rejected
//! quarantined    Forbidden    quarantined   active | pending*  Conflict
//! rejected       Conflict     Conflict      rejected           rejected
//!
//! * pending when the mapping has no linked CPF
//! ```
//!
//! There is no transition out of `rejected`: an admin re-bind replaces the
//! mapping instead.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingStatus {
    Pending,
    Active,
    Quarantined,
    Rejected,
}

impl MappingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Quarantined => "quarantined",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for MappingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle events applied to a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Citizen opt-in.
    Activate,
    /// Admin quarantine, or extension of a running one.
    Quarantine,
    /// Admin release. A mapping without a linked CPF returns to `pending`.
    Release { has_cpf: bool },
    /// Registration rejected.
    Reject,
}

/// Compute the status that results from applying `event` to `from`.
///
/// Idempotent cases (release of a non-quarantined mapping, re-rejecting,
/// re-quarantining) return the natural target instead of an error.
pub fn transition(from: MappingStatus, event: Transition) -> Result<MappingStatus, CoreError> {
    use MappingStatus::*;

    match (from, event) {
        (Pending | Active, Transition::Activate) => Ok(Active),
        (Quarantined, Transition::Activate) => Err(CoreError::Forbidden(
            "Phone number is quarantined".to_string(),
        )),
        (Rejected, Transition::Activate) => Err(CoreError::Conflict(
            "Phone registration was rejected; an admin must bind it again".to_string(),
        )),

        (Pending | Active | Quarantined, Transition::Quarantine) => Ok(Quarantined),
        (Rejected, Transition::Quarantine) => Err(CoreError::Conflict(
            "Cannot quarantine a rejected phone registration".to_string(),
        )),

        (Quarantined, Transition::Release { has_cpf: true }) => Ok(Active),
        (Quarantined, Transition::Release { has_cpf: false }) => Ok(Pending),
        (other, Transition::Release { .. }) => Ok(other),

        (Pending | Active | Rejected, Transition::Reject) => Ok(Rejected),
        (Quarantined, Transition::Reject) => Err(CoreError::Conflict(
            "Cannot reject a quarantined phone; release it first".to_string(),
        )),
    }
}

/// Whether a quarantine ending at `until` is still running at `now`.
pub fn quarantine_running(until: Option<Timestamp>, now: Timestamp) -> bool {
    until.is_some_and(|u| u > now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};
    use MappingStatus::*;

    #[test]
    fn activation_paths() {
        assert_eq!(transition(Pending, Transition::Activate).unwrap(), Active);
        assert_eq!(transition(Active, Transition::Activate).unwrap(), Active);
        assert_matches!(transition(Quarantined, Transition::Activate), Err(CoreError::Forbidden(_)));
        assert_matches!(transition(Rejected, Transition::Activate), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn quarantine_is_reentrant() {
        assert_eq!(transition(Active, Transition::Quarantine).unwrap(), Quarantined);
        assert_eq!(transition(Quarantined, Transition::Quarantine).unwrap(), Quarantined);
        assert_matches!(transition(Rejected, Transition::Quarantine), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn release_is_idempotent() {
        let with_cpf = Transition::Release { has_cpf: true };
        assert_eq!(transition(Quarantined, with_cpf).unwrap(), Active);
        assert_eq!(
            transition(Quarantined, Transition::Release { has_cpf: false }).unwrap(),
            Pending
        );
        for status in [Pending, Active, Rejected] {
            assert_eq!(transition(status, with_cpf).unwrap(), status);
        }
    }

    #[test]
    fn rejected_is_terminal_for_reject() {
        assert_eq!(transition(Pending, Transition::Reject).unwrap(), Rejected);
        assert_eq!(transition(Active, Transition::Reject).unwrap(), Rejected);
        assert_eq!(transition(Rejected, Transition::Reject).unwrap(), Rejected);
        assert_matches!(transition(Quarantined, Transition::Reject), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Quarantined).unwrap(), serde_json::json!("quarantined"));
        assert_eq!(Rejected.to_string(), "rejected");
    }

    #[test]
    fn running_vs_expired() {
        let now = Utc::now();
        assert!(quarantine_running(Some(now + Duration::hours(1)), now));
        assert!(!quarantine_running(Some(now), now));
        assert!(!quarantine_running(None, now));
    }
}

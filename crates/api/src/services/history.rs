//! Append-only opt-in audit trail.

use citizen_core::preferences::OptInChange;
use citizen_core::types::Timestamp;
use citizen_db::collections::OPT_IN_HISTORY;
use citizen_db::data_manager::DataManager;
use citizen_db::models::opt_in_history::OptInHistory;
use serde_json::json;

use crate::error::AppResult;

/// Who and what a batch of history records is about.
#[derive(Debug, Clone)]
pub struct HistoryContext {
    pub cpf: Option<String>,
    pub phone_number: Option<String>,
    pub channel: String,
    pub reason: Option<String>,
}

#[derive(Clone)]
pub struct OptInHistoryRecorder {
    dm: DataManager,
}

impl OptInHistoryRecorder {
    pub fn new(dm: DataManager) -> Self {
        Self { dm }
    }

    /// Append one record per change. Append failures are logged, never
    /// returned.
    pub async fn record(&self, ctx: &HistoryContext, changes: &[OptInChange], now: Timestamp) {
        for change in changes {
            let entry = OptInHistory {
                cpf: ctx.cpf.clone(),
                phone_number: ctx.phone_number.clone(),
                scope: change.scope,
                category: change.category.clone(),
                action: change.action(),
                old_value: change.old_value,
                new_value: change.new_value,
                channel: ctx.channel.clone(),
                reason: ctx.reason.clone(),
                timestamp: now,
            };
            if let Err(e) = self.dm.append(OPT_IN_HISTORY, &entry).await {
                tracing::error!(
                    cpf = ?ctx.cpf,
                    phone_number = ?ctx.phone_number,
                    action = ?entry.action,
                    error = %e,
                    "Failed to record opt-in history",
                );
            }
        }
    }

    /// History of a citizen, oldest first.
    pub async fn list_for_cpf(&self, cpf: &str) -> AppResult<Vec<OptInHistory>> {
        let mut entries: Vec<OptInHistory> = self
            .dm
            .find_many(OPT_IN_HISTORY, &json!({ "cpf": cpf }))
            .await?;
        entries.sort_by_key(|e| e.timestamp);
        Ok(entries)
    }
}

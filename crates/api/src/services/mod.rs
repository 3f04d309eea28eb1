//! Orchestration between the domain rules in `citizen_core` and the
//! documents behind [`citizen_db::data_manager::DataManager`].
//!
//! Handlers stay thin: they extract, authorize and call one service method.

pub mod categories;
pub mod history;
pub mod locks;
pub mod phone_mapping;
pub mod preferences;

//! Document models and DTOs.
//!
//! Each submodule contains:
//! - A `Serialize` + `Deserialize` document struct matching the stored JSON body
//! - Request DTOs (`Deserialize`) where the document is written through the API

pub mod citizen;
pub mod notification_category;
pub mod opt_in_history;
pub mod phone_mapping;
pub mod preference_request;
pub mod user_config;

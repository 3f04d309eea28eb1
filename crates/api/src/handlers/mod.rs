pub mod category;
pub mod citizen;
pub mod config;
pub mod phone;
pub mod quarantine;

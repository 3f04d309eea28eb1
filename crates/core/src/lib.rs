//! Domain logic for the citizen opt-in backend.
//!
//! Everything in this crate is pure: no database, cache or HTTP
//! dependencies. Persistence lives in `citizen_db`, orchestration and
//! transport in `citizen_api`.

pub mod category;
pub mod channels;
pub mod cpf;
pub mod error;
pub mod identity;
pub mod mapping_status;
pub mod phone;
pub mod preferences;
pub mod roles;
pub mod types;

//! Well-known role name constants.
//!
//! These must match the role names carried in the identity provider's
//! access-token `roles` claim.

pub const ROLE_ADMIN: &str = "admin";

//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use citizen_core::cpf::normalize_cpf;
use citizen_core::error::CoreError;
use citizen_core::roles::ROLE_ADMIN;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated citizen extracted from a JWT Bearer token in the
/// `Authorization` header.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(cpf = %user.cpf, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The citizen's CPF (from `claims.preferred_username`), digits only when
    /// the claim is a valid CPF.
    pub cpf: String,
    /// Role names carried by the token.
    pub roles: Vec<String>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == ROLE_ADMIN)
    }

    /// Allow access to data owned by `cpf`: the citizen themself or an admin.
    pub fn ensure_cpf_access(&self, cpf: &str) -> Result<(), AppError> {
        if self.is_admin() || self.cpf == cpf {
            return Ok(());
        }
        Err(AppError::Core(CoreError::Forbidden(
            "Access to another citizen's data is not allowed".into(),
        )))
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        if claims.preferred_username.is_empty() {
            return Err(AppError::Core(CoreError::Unauthorized(
                "Token carries no CPF".into(),
            )));
        }

        let cpf = normalize_cpf(&claims.preferred_username).unwrap_or(claims.preferred_username);

        Ok(AuthUser {
            cpf,
            roles: claims.roles,
        })
    }
}

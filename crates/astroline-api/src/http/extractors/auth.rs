//! Bearer token authentication extractor.
//!
//! Reads `Authorization: Bearer <jwt>`, verifies the HS256 signature and
//! expiry, and turns the `sub` claim into the caller's [`OwnerId`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use astroline_types::chat::OwnerId;

use crate::http::error::AppError;
use crate::state::AppState;

/// Claims read from caller tokens.
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// Verifies HS256 bearer tokens against a shared secret.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Verify `token` and return the owner it identifies.
    pub fn verify(&self, token: &str) -> Result<OwnerId, AppError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "bearer token rejected");
            AppError::Unauthorized("Invalid or expired token".to_string())
        })?;

        let sub = data.claims.sub.trim();
        if sub.is_empty() {
            return Err(AppError::Unauthorized("Token has no subject".to_string()));
        }
        Ok(OwnerId::new(sub))
    }
}

/// The authenticated caller. Extracting this validates the bearer token.
pub struct CurrentUser(pub OwnerId);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer(parts)?;
        let owner = state.auth.verify(&token)?;
        Ok(CurrentUser(owner))
    }
}

/// Extract the bearer token from the `Authorization` header.
fn extract_bearer(parts: &Parts) -> Result<String, AppError> {
    let auth = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

    let auth_str = auth
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header encoding".to_string()))?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(AppError::Unauthorized("Missing bearer token".to_string())),
    }
}

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

use crate::{error::AppError, state::AppState};

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Proof that the request carried the configured admin token
///
/// With no token configured, admin routes reject every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminAccess;

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminAccess {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.admin_token.as_deref() else {
            return Err(AppError::Unauthorized(
                "Catalog import over HTTP is disabled".to_string(),
            ));
        };

        let presented = parts
            .headers
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized(format!("Missing {} header", ADMIN_TOKEN_HEADER)))?;

        if tokens_match(presented.trim().as_bytes(), expected.as_bytes()) {
            Ok(AdminAccess)
        } else {
            tracing::warn!("Rejected request with an invalid admin token");
            Err(AppError::Unauthorized("Invalid admin token".to_string()))
        }
    }
}

/// Compares without exiting at the first differing byte
fn tokens_match(presented: &[u8], expected: &[u8]) -> bool {
    presented.len() == expected.len()
        && presented
            .iter()
            .zip(expected)
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn state(token: Option<&str>) -> Arc<AppState> {
        Arc::new(AppState {
            admin_token: token.map(str::to_string),
            ..AppState::in_memory()
        })
    }

    async fn extract(state: &Arc<AppState>, header: Option<&str>) -> Result<AdminAccess, AppError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(ADMIN_TOKEN_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        AdminAccess::from_request_parts(&mut parts, state).await
    }

    #[tokio::test]
    async fn test_matching_token() {
        let state = state(Some("s3cret"));
        assert_eq!(extract(&state, Some("s3cret")).await.unwrap(), AdminAccess);
    }

    #[tokio::test]
    async fn test_wrong_or_missing_token_is_unauthorized() {
        let state = state(Some("s3cret"));
        assert!(matches!(extract(&state, Some("s3cre")).await, Err(AppError::Unauthorized(_))));
        assert!(matches!(extract(&state, Some("S3CRET")).await, Err(AppError::Unauthorized(_))));
        assert!(matches!(extract(&state, None).await, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_unconfigured_token_rejects_everything() {
        let state = state(None);
        assert!(matches!(extract(&state, Some("")).await, Err(AppError::Unauthorized(_))));
        assert!(matches!(extract(&state, None).await, Err(AppError::Unauthorized(_))));
    }
}

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, services::identity::IdentityError, state::AppState};

/// Resolves the caller through the identity provider and stores the
/// `AuthenticatedUser` as a request extension.
pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match state.identity.current_user(request.headers()).await {
        Ok(Some(user)) => {
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        Ok(None) | Err(IdentityError::InvalidToken) => {
            Err(AppError::Unauthorized("Authentication required".to_string()))
        }
        Err(IdentityError::Unavailable(reason)) => {
            tracing::error!(reason = %reason, "Identity provider unavailable");
            Err(AppError::ServiceUnavailable(
                "Identity provider temporarily unavailable".to_string(),
            ))
        }
    }
}

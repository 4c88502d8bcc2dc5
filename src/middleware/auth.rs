use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::supabase::{AuthUser, SupabaseAuthClient, SupabaseError};

/// Everything the auth middleware needs, carved out of the app state so
/// the middleware can be exercised without a database pool.
#[derive(Clone)]
pub struct AuthContext {
    pub supabase: SupabaseAuthClient,
    pub test_mode: bool,
    pub test_user_id: String,
}

/// Validates the bearer token against the auth provider and attaches
/// the resolved [`AuthUser`] as a request extension. In test mode the
/// fixed test identity is injected and no upstream call is made.
pub async fn require_user(
    State(ctx): State<AuthContext>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if ctx.test_mode {
        req.extensions_mut().insert(AuthUser {
            id: ctx.test_user_id.clone(),
            email: Some("test@example.com".to_string()),
        });
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header["Bearer ".len()..],
        _ => {
            return Err(AppError::Unauthorized(
                "Missing or invalid authorization header".to_string(),
            ));
        }
    };

    let user = ctx.supabase.get_user(token).await.map_err(|err| match err {
        SupabaseError::InvalidToken => AppError::Unauthorized("Invalid token".to_string()),
        other => {
            tracing::error!(error = %other, "Authentication error");
            AppError::Unauthorized("Authentication failed".to_string())
        }
    })?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

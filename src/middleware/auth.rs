// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::{Claims, Role},
};

// O usuário do token. Não consulta o banco: as claims já foram verificadas.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub role: Role,
}

impl From<&Claims> for AuthenticatedUser {
    fn from(claims: &Claims) -> Self {
        Self {
            id: claims.sub,
            role: claims.role,
        }
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}

// O middleware em si: valida o Bearer e publica Claims + AuthenticatedUser
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return Err(AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store));
    };

    let claims = app_state
        .auth_service
        .validate_token(bearer.token())
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    request.extensions_mut().insert(AuthenticatedUser::from(&claims));
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

// Só administradores passam (ex.: POST /users)
pub async fn admin_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !user.role.can_admin() {
        tracing::warn!("Usuário {} ({}) sem permissão de admin", user.id, user.role.as_str());
        return Err(AppError::AdminRequired.to_api_error(&locale, &app_state.i18n_store));
    }
    Ok(next.run(request).await)
}

// src/middleware/tenancy.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::{auth::Claims, tenancy::TenantId},
};

// O nome do nosso cabeçalho HTTP customizado
pub const TENANT_ID_HEADER: &str = "x-tenant-id";

// O tenant da requisição, derivado do token verificado.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext(pub TenantId);

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .copied()
            .ok_or(AppError::InvalidToken)
    }
}

/// O X-Tenant-ID é opcional; quando vem, precisa ser um inteiro igual ao tenant do token.
pub fn resolve_tenant(claims: &Claims, headers: &HeaderMap) -> Result<TenantId, AppError> {
    let tenant_id = TenantId::from_claims(claims);

    let Some(value) = headers.get(TENANT_ID_HEADER) else {
        return Ok(tenant_id);
    };

    let requested: i64 = value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .ok_or(AppError::InvalidTenantHeader)?;

    if requested != tenant_id.get() {
        tracing::warn!(
            "X-Tenant-ID {} diferente do tenant {} do usuário {}",
            requested,
            tenant_id,
            claims.sub
        );
        return Err(AppError::TenantMismatch);
    }

    Ok(tenant_id)
}

// Guard de tenant: roda depois do auth_guard e publica o TenantContext
pub async fn tenant_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = request
        .extensions()
        .get::<Claims>()
        .cloned()
        .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))?;

    let tenant_id = resolve_tenant(&claims, request.headers())
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    request.extensions_mut().insert(TenantContext(tenant_id));
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Role;
    use axum::http::HeaderValue;

    fn claims(tenant_id: i64) -> Claims {
        Claims {
            sub: 1,
            email: "a@b.com".into(),
            tenant_id,
            role: Role::User,
            exp: 0,
            iat: 0,
        }
    }

    #[test]
    fn no_header_uses_token_tenant() {
        let tenant = resolve_tenant(&claims(5), &HeaderMap::new()).unwrap();
        assert_eq!(tenant.get(), 5);
    }

    #[test]
    fn matching_header_is_accepted() {
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_ID_HEADER, HeaderValue::from_static("5"));
        assert_eq!(resolve_tenant(&claims(5), &headers).unwrap().get(), 5);
    }

    #[test]
    fn mismatching_header_is_forbidden() {
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_ID_HEADER, HeaderValue::from_static("6"));
        assert!(matches!(resolve_tenant(&claims(5), &headers), Err(AppError::TenantMismatch)));
    }

    #[test]
    fn non_numeric_header_is_a_bad_request() {
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_ID_HEADER, HeaderValue::from_static("abc"));
        assert!(matches!(
            resolve_tenant(&claims(5), &headers),
            Err(AppError::InvalidTenantHeader)
        ));
    }
}

// src/handlers/dashboard.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::dashboard::{DashboardMetrics, ReportResponse},
};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// Rótulo do período (padrão "monthly")
    pub period: Option<String>,
    /// YYYY-MM-DD; padrão: um mês atrás
    pub start_date: Option<String>,
    /// YYYY-MM-DD; padrão: hoje
    pub end_date: Option<String>,
}

// GET /api/dashboard/metrics
#[utoipa::path(
    get,
    path = "/api/dashboard/metrics",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Totais de produtos, notas, faturamento e estoque baixo", body = DashboardMetrics),
        (status = 401, description = "Não autorizado"),
        (status = 403, description = "X-Tenant-ID diferente do token")
    ),
    params(
        ("x-tenant-id" = Option<i64>, Header, description = "ID do tenant (opcional)")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_metrics(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let metrics = app_state
        .dashboard_service
        .get_metrics(&app_state.db_pool, tenant.0)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(metrics)))
}

// GET /api/dashboard/reports
#[utoipa::path(
    get,
    path = "/api/dashboard/reports",
    tag = "Dashboard",
    params(ReportQuery),
    responses(
        (status = 200, description = "Soma e contagem das vendas no intervalo", body = ReportResponse)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_report(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .dashboard_service
        .get_report(
            &app_state.db_pool,
            tenant.0,
            query.period.as_deref(),
            query.start_date.as_deref(),
            query.end_date.as_deref(),
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(report)))
}

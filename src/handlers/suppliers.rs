// src/handlers/suppliers.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        pagination::PaginationQuery,
    },
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::supplier::{NewSupplier, Supplier, SupplierListResponse, SupplierPatch},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSupplierPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,

    #[validate(email(message = "E-mail inválido."))]
    pub email: Option<String>,

    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
}

impl From<CreateSupplierPayload> for NewSupplier {
    fn from(p: CreateSupplierPayload) -> Self {
        NewSupplier {
            name: p.name,
            email: p.email,
            phone: p.phone,
            address: p.address,
            tax_id: p.tax_id,
        }
    }
}

// Todos opcionais: o que não vier mantém o valor atual
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSupplierPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
}

impl From<UpdateSupplierPayload> for SupplierPatch {
    fn from(p: UpdateSupplierPayload) -> Self {
        SupplierPatch {
            name: p.name,
            email: p.email,
            phone: p.phone,
            address: p.address,
            tax_id: p.tax_id,
        }
    }
}

// GET /api/suppliers
#[utoipa::path(
    get,
    path = "/api/suppliers",
    tag = "Suppliers",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Fornecedores do tenant em ordem alfabética", body = SupplierListResponse)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_suppliers(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let suppliers = app_state
        .supplier_service
        .list_suppliers(&app_state.db_pool, tenant.0, pagination.normalize())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(suppliers)))
}

// POST /api/suppliers
#[utoipa::path(
    post,
    path = "/api/suppliers",
    tag = "Suppliers",
    request_body = CreateSupplierPayload,
    responses(
        (status = 201, description = "Fornecedor criado", body = Supplier),
        (status = 400, description = "Nome em branco"),
        (status = 409, description = "CUIT/Tax ID já cadastrado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn create_supplier(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<CreateSupplierPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let supplier = app_state
        .supplier_service
        .create_supplier(&app_state.db_pool, tenant.0, payload.into())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(supplier)))
}

// PUT /api/suppliers/{id}
#[utoipa::path(
    put,
    path = "/api/suppliers/{id}",
    tag = "Suppliers",
    request_body = UpdateSupplierPayload,
    params(("id" = i64, Path, description = "ID do fornecedor")),
    responses(
        (status = 200, description = "Fornecedor atualizado", body = Supplier),
        (status = 403, description = "Fornecedor de outro tenant"),
        (status = 404, description = "Fornecedor não encontrado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn update_supplier(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateSupplierPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let supplier = app_state
        .supplier_service
        .update_supplier(&app_state.db_pool, tenant.0, id, payload.into())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(supplier)))
}

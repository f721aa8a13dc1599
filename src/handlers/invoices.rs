// src/handlers/invoices.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        pagination::PaginationQuery,
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::TenantContext},
    models::{
        invoice::{InvoiceDetail, InvoiceListResponse, SaleLine},
        product::Product,
    },
};

// ---
// Payload: CreateInvoicePayload
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemPayload {
    pub product_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoicePayload {
    // Lista vazia é recusada no serviço (EmptyItemList)
    pub items: Vec<SaleItemPayload>,
}

impl CreateInvoicePayload {
    fn lines(&self) -> Vec<SaleLine> {
        self.items
            .iter()
            .map(|item| SaleLine {
                product_id: item.product_id,
                quantity: item.quantity,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Trecho do nome/SKU, ou o id exato do produto
    pub q: Option<String>,
}

// POST /api/invoices
#[utoipa::path(
    post,
    path = "/api/invoices",
    tag = "Invoices",
    request_body = CreateInvoicePayload,
    responses(
        (status = 201, description = "Nota de venda criada e estoque baixado", body = InvoiceDetail),
        (status = 400, description = "Lista vazia ou quantidade inválida"),
        (status = 403, description = "Produto de outro tenant"),
        (status = 404, description = "Produto não encontrado"),
        (status = 409, description = "Estoque insuficiente")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn create_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<CreateInvoicePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let invoice = app_state
        .invoice_service
        .create_invoice(&app_state.db_pool, tenant.0, user.id, &payload.lines())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(invoice)))
}

// GET /api/invoices
#[utoipa::path(
    get,
    path = "/api/invoices",
    tag = "Invoices",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Notas do tenant, mais recentes primeiro", body = InvoiceListResponse)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_invoices(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let invoices = app_state
        .invoice_service
        .list_invoices(&app_state.db_pool, tenant.0, pagination.normalize())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(invoices)))
}

// GET /api/invoices/{id}
#[utoipa::path(
    get,
    path = "/api/invoices/{id}",
    tag = "Invoices",
    params(("id" = i64, Path, description = "ID da nota")),
    responses(
        (status = 200, description = "Nota com itens", body = InvoiceDetail),
        (status = 404, description = "Nota não encontrada no tenant")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let invoice = app_state
        .invoice_service
        .get_invoice(&app_state.db_pool, tenant.0, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(invoice)))
}

// GET /api/invoices/products/search?q=
#[utoipa::path(
    get,
    path = "/api/invoices/products/search",
    tag = "Invoices",
    params(SearchQuery),
    responses(
        (status = 200, description = "Até 20 produtos do tenant", body = Vec<Product>)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn search_products(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let products = app_state
        .invoice_service
        .search_products(&app_state.db_pool, tenant.0, query.q.as_deref().unwrap_or_default())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(products)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_items_keep_request_order() {
        let payload: CreateInvoicePayload = serde_json::from_value(serde_json::json!({
            "items": [
                { "productId": 2, "quantity": 1 },
                { "productId": 1, "quantity": 3 }
            ]
        }))
        .unwrap();

        assert_eq!(
            payload.lines(),
            vec![
                SaleLine { product_id: 2, quantity: 1 },
                SaleLine { product_id: 1, quantity: 3 },
            ]
        );
    }
}

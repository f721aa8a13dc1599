// src/handlers/purchases.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        pagination::PaginationQuery,
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::TenantContext},
    models::purchase::{
        NewPayment, NewProductSpec, NewPurchase, PaymentReceipt, PurchaseDetail, PurchaseLine,
        PurchaseListResponse, PurchaseProductRef,
    },
};

// ---
// Payload: CreatePurchasePayload
// ---
// `productId` > 0 aponta um produto existente; < 0 pede a criação de um produto novo
// com os dados `productName`/`productSku`/`productPrice` da própria linha.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseItemPayload {
    pub product_id: i64,
    pub quantity: i32,
    pub unit_cost: Decimal,
    pub product_name: Option<String>,
    pub product_sku: Option<String>,
    pub product_price: Option<Decimal>,
}

impl PurchaseItemPayload {
    /// `line` é 1-based, só para a mensagem de erro.
    fn into_line(self, line: usize) -> Result<PurchaseLine, AppError> {
        let product = match self.product_id {
            0 => return Err(AppError::InvalidProductReference { line }),
            id if id > 0 => PurchaseProductRef::Existing(id),
            sentinel => {
                let name = self
                    .product_name
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty())
                    .ok_or(AppError::NewProductNameRequired { line })?;

                let sku = self
                    .product_sku
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| format!("SKU-{}", sentinel.unsigned_abs()));

                let price = self
                    .product_price
                    .filter(|p| *p > Decimal::ZERO)
                    .unwrap_or(self.unit_cost);

                PurchaseProductRef::New(NewProductSpec { name, sku, price })
            }
        };

        Ok(PurchaseLine {
            product,
            quantity: self.quantity,
            unit_cost: self.unit_cost,
        })
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePurchasePayload {
    pub supplier_id: i64,

    #[validate(length(min = 1, message = "O número da nota é obrigatório."))]
    pub invoice_number: String,

    pub payment_method: Option<String>,

    /// YYYY-MM-DD
    pub due_date: Option<String>,

    pub items: Vec<PurchaseItemPayload>,
}

impl CreatePurchasePayload {
    // Conversão de borda: nenhum id sentinela passa daqui
    fn into_new_purchase(self) -> Result<NewPurchase, AppError> {
        let due_date = self
            .due_date
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(|d| {
                NaiveDate::parse_from_str(d, "%Y-%m-%d")
                    .map_err(|_| AppError::field("dueDate", "date_format"))
            })
            .transpose()?;

        let lines = self
            .items
            .into_iter()
            .enumerate()
            .map(|(index, item)| item.into_line(index + 1))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NewPurchase {
            supplier_id: self.supplier_id,
            invoice_number: self.invoice_number.trim().to_string(),
            payment_method: self
                .payment_method
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty()),
            due_date,
            lines,
        })
    }
}

// ---
// Payload: RegisterPaymentPayload
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPaymentPayload {
    // > 0, checado no serviço
    pub amount: Decimal,

    #[validate(length(min = 1, message = "A forma de pagamento é obrigatória."))]
    pub payment_method: String,

    /// RFC 3339 ou YYYY-MM-DD; ausente = agora
    pub payment_date: Option<String>,

    pub reference: Option<String>,
    pub notes: Option<String>,
}

impl RegisterPaymentPayload {
    fn into_new_payment(self) -> Result<NewPayment, AppError> {
        let payment_date = self
            .payment_date
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(parse_payment_date)
            .transpose()?;

        let clean = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        Ok(NewPayment {
            amount: self.amount,
            payment_method: self.payment_method.trim().to_string(),
            payment_date,
            reference: clean(self.reference),
            notes: clean(self.notes),
        })
    }
}

fn parse_payment_date(raw: &str) -> Result<DateTime<Utc>, AppError> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|day| day.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| AppError::field("paymentDate", "date_format"))
}

// POST /api/purchases
#[utoipa::path(
    post,
    path = "/api/purchases",
    tag = "Purchases",
    request_body = CreatePurchasePayload,
    responses(
        (status = 201, description = "Compra registrada e estoque incrementado", body = PurchaseDetail),
        (status = 400, description = "Dados inválidos ou produto novo sem nome"),
        (status = 403, description = "Produto de outro tenant"),
        (status = 404, description = "Fornecedor ou produto não encontrado"),
        (status = 409, description = "Número de nota já usado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn create_purchase(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<CreatePurchasePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let purchase = payload
        .into_new_purchase()
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    let created = app_state
        .purchase_service
        .create_purchase(&app_state.db_pool, tenant.0, user.id, &purchase)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/purchases
#[utoipa::path(
    get,
    path = "/api/purchases",
    tag = "Purchases",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Compras do tenant, mais recentes primeiro", body = PurchaseListResponse)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_purchases(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let purchases = app_state
        .purchase_service
        .list_purchases(&app_state.db_pool, tenant.0, pagination.normalize())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(purchases)))
}

// GET /api/purchases/{id}
#[utoipa::path(
    get,
    path = "/api/purchases/{id}",
    tag = "Purchases",
    params(("id" = i64, Path, description = "ID da compra")),
    responses(
        (status = 200, description = "Compra com itens", body = PurchaseDetail),
        (status = 404, description = "Compra não encontrada no tenant")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_purchase(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let purchase = app_state
        .purchase_service
        .get_purchase(&app_state.db_pool, tenant.0, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(purchase)))
}

// POST /api/purchases/{id}/payments
#[utoipa::path(
    post,
    path = "/api/purchases/{id}/payments",
    tag = "Purchases",
    request_body = RegisterPaymentPayload,
    params(("id" = i64, Path, description = "ID da compra")),
    responses(
        (status = 201, description = "Pagamento registrado", body = PaymentReceipt),
        (status = 400, description = "Valor inválido ou acima do saldo"),
        (status = 404, description = "Compra não encontrada no tenant"),
        (status = 409, description = "Compra cancelada")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn register_payment(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<i64>,
    Json(payload): Json<RegisterPaymentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let payment = payload
        .into_new_payment()
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    let receipt = app_state
        .purchase_service
        .register_payment(&app_state.db_pool, tenant.0, user.id, id, &payment)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

// src/handlers/stock.rs

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::{
    common::{
        error::{ApiError, AppError},
        pagination::PaginationQuery,
    },
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::product::{Product, ProductDraft, ProductListResponse, ProductPatch, UploadResult},
};

// ---
// Validação Customizada
// ---
pub(crate) fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("not_negative");
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payload: ProductPayload (criação)
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,

    pub description: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    pub price: Decimal,

    #[validate(range(min = 0, message = "O estoque não pode ser negativo."))]
    #[serde(default)]
    pub stock: i32,

    pub sku: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    pub purchase_price: Option<Decimal>,

    // Se não vier, o preço de varejo é o próprio `price`
    #[validate(custom(function = "validate_not_negative"))]
    pub retail_price: Option<Decimal>,

    #[validate(custom(function = "validate_not_negative"))]
    pub wholesale_price: Option<Decimal>,

    #[validate(range(min = 1, message = "A quantidade mínima de atacado deve ser ao menos 1."))]
    pub min_wholesale_quantity: Option<i32>,
}

impl ProductPayload {
    fn into_draft(self) -> ProductDraft {
        let blank_to_none = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        ProductDraft {
            name: self.name.trim().to_string(),
            description: blank_to_none(self.description),
            retail_price: self.retail_price.unwrap_or(self.price),
            price: self.price,
            purchase_price: self.purchase_price.unwrap_or(Decimal::ZERO),
            wholesale_price: self.wholesale_price,
            min_wholesale_quantity: self.min_wholesale_quantity,
            stock: self.stock,
            sku: blank_to_none(self.sku),
        }
    }
}

// ---
// Payload: ProductUpdatePayload (edição)
// ---
// Só nome e preço são obrigatórios. Campos ausentes mantêm o valor gravado.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdatePayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,

    pub description: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    pub price: Decimal,

    #[validate(range(min = 0, message = "O estoque não pode ser negativo."))]
    pub stock: Option<i32>,

    pub sku: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    pub purchase_price: Option<Decimal>,

    #[validate(custom(function = "validate_not_negative"))]
    pub retail_price: Option<Decimal>,

    #[validate(custom(function = "validate_not_negative"))]
    pub wholesale_price: Option<Decimal>,

    #[validate(range(min = 1, message = "A quantidade mínima de atacado deve ser ao menos 1."))]
    pub min_wholesale_quantity: Option<i32>,
}

impl ProductUpdatePayload {
    fn into_patch(self) -> ProductPatch {
        ProductPatch {
            name: self.name,
            description: self.description,
            price: self.price,
            stock: self.stock,
            sku: self.sku,
            purchase_price: self.purchase_price,
            retail_price: self.retail_price,
            wholesale_price: self.wholesale_price,
            min_wholesale_quantity: self.min_wholesale_quantity,
        }
    }
}

// GET /api/stock
#[utoipa::path(
    get,
    path = "/api/stock",
    tag = "Stock",
    params(
        PaginationQuery,
        ("x-tenant-id" = Option<i64>, Header, description = "ID do tenant (opcional, deve bater com o token)")
    ),
    responses(
        (status = 200, description = "Produtos do tenant, mais recentes primeiro", body = ProductListResponse),
        (status = 401, description = "Não autorizado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let products = app_state
        .product_service
        .list_products(&app_state.db_pool, tenant.0, pagination.normalize())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(products)))
}

// POST /api/stock
#[utoipa::path(
    post,
    path = "/api/stock",
    tag = "Stock",
    request_body = ProductPayload,
    responses(
        (status = 201, description = "Produto criado", body = Product),
        (status = 400, description = "Dados inválidos")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<ProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .product_service
        .create_product(&app_state.db_pool, tenant.0, payload.into_draft())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(product)))
}

// PUT /api/stock/{id}
#[utoipa::path(
    put,
    path = "/api/stock/{id}",
    tag = "Stock",
    request_body = ProductUpdatePayload,
    params(("id" = i64, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto atualizado", body = Product),
        (status = 404, description = "Produto não encontrado no tenant")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<i64>,
    Json(payload): Json<ProductUpdatePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .product_service
        .update_product(&app_state.db_pool, tenant.0, id, payload.into_patch())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(product)))
}

// DELETE /api/stock/{id}
#[utoipa::path(
    delete,
    path = "/api/stock/{id}",
    tag = "Stock",
    params(("id" = i64, Path, description = "ID do produto")),
    responses(
        (status = 204, description = "Produto removido"),
        (status = 404, description = "Produto não encontrado no tenant"),
        (status = 409, description = "Produto usado em notas")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .product_service
        .delete_product(&app_state.db_pool, tenant.0, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/stock/upload (multipart, campo "file")
#[utoipa::path(
    post,
    path = "/api/stock/upload",
    tag = "Stock",
    request_body(content = String, content_type = "multipart/form-data", description = "CSV no campo 'file': name,description,price,stock,sku"),
    responses(
        (status = 200, description = "Resumo da importação", body = UploadResult),
        (status = 400, description = "Arquivo ausente")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn upload_products(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    // 1. Procura o campo "file"
    let mut content = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| to_api(AppError::MissingUploadFile))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|_| to_api(AppError::MissingUploadFile))?;
            content = Some(bytes);
            break;
        }
    }
    let content = content.ok_or_else(|| to_api(AppError::MissingUploadFile))?;

    // 2. Importa
    let result = app_state
        .product_service
        .upload_products(&app_state.db_pool, tenant.0, &content)
        .await
        .map_err(to_api)?;

    Ok((StatusCode::OK, Json(result)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: serde_json::Value) -> ProductPayload {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn retail_price_defaults_to_price() {
        let draft = payload(serde_json::json!({ "name": "Yerba", "price": 4.5, "stock": 3 })).into_draft();
        assert_eq!(draft.retail_price, draft.price);
        assert_eq!(draft.purchase_price, Decimal::ZERO);
    }

    #[test]
    fn negative_values_fail_validation() {
        let p = payload(serde_json::json!({ "name": "Yerba", "price": -1, "stock": -2 }));
        let errors = p.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("price"));
        assert!(fields.contains_key("stock"));
    }

    #[test]
    fn edit_without_prices_keeps_the_stored_ones() {
        let update: ProductUpdatePayload = serde_json::from_value(serde_json::json!({
            "name": "Widget", "price": 9.0, "stock": 5, "sku": "SKU-1"
        }))
        .unwrap();
        assert!(update.validate().is_ok());

        let mut stored = crate::models::product::sample_product(3, 1, 40, Decimal::new(800, 2));
        stored.purchase_price = Decimal::new(200, 2);
        stored.retail_price = Decimal::new(1000, 2);
        stored.wholesale_price = Some(Decimal::new(750, 2));
        stored.min_wholesale_quantity = Some(10);

        let draft = update.into_patch().apply_to(&stored);
        assert_eq!(draft.price, Decimal::new(90, 1));
        assert_eq!(draft.stock, 5);
        assert_eq!(draft.sku.as_deref(), Some("SKU-1"));
        assert_eq!(draft.purchase_price, Decimal::new(200, 2));
        assert_eq!(draft.retail_price, Decimal::new(1000, 2));
        assert_eq!(draft.wholesale_price, Some(Decimal::new(750, 2)));
        assert_eq!(draft.min_wholesale_quantity, Some(10));
    }

    #[test]
    fn blank_sku_is_stored_as_null() {
        let draft = payload(serde_json::json!({ "name": "Yerba", "price": 1, "sku": "  " })).into_draft();
        assert_eq!(draft.sku, None);
    }
}

// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use thiserror::Error;

use crate::common::i18n::{I18nStore, DEFAULT_LOCALE};
use crate::middleware::i18n::Locale;

// Nosso tipo de erro de domínio. Cada variante pertence a exatamente um "tipo"
// (validação, autenticação, permissão, não encontrado, conflito, interno).
#[derive(Debug, Error)]
pub enum AppError {
    // --- 400 ---
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("A nota precisa de pelo menos um item")]
    EmptyItemList,

    #[error("Quantidade inválida para o produto {product_id}")]
    InvalidQuantity { product_id: i64 },

    #[error("Referência de produto inválida na linha {line}")]
    InvalidProductReference { line: usize },

    #[error("Produto novo sem nome na linha {line}")]
    NewProductNameRequired { line: usize },

    #[error("O pagamento excede o saldo da compra {purchase_id}")]
    PaymentExceedsBalance { purchase_id: i64 },

    #[error("Papel inválido: {0}")]
    InvalidRole(String),

    #[error("Cabeçalho X-Tenant-ID inválido")]
    InvalidTenantHeader,

    #[error("Arquivo de upload ausente")]
    MissingUploadFile,

    // --- 401 ---
    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    // --- 403 ---
    #[error("Acesso negado ao produto {0}")]
    ProductAccessDenied(i64),

    #[error("Acesso negado ao fornecedor {0}")]
    SupplierAccessDenied(i64),

    #[error("Tenant do cabeçalho não corresponde ao token")]
    TenantMismatch,

    #[error("Operação restrita a administradores")]
    AdminRequired,

    // --- 404 ---
    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Produto {0} não encontrado")]
    ProductNotFound(i64),

    #[error("Nota {0} não encontrada")]
    InvoiceNotFound(i64),

    #[error("Fornecedor {0} não encontrado")]
    SupplierNotFound(i64),

    #[error("Compra {0} não encontrada")]
    PurchaseNotFound(i64),

    // --- 409 ---
    #[error("Estoque insuficiente para o produto {product_id}")]
    InsufficientStock {
        product_id: i64,
        available: i32,
        requested: i32,
    },

    #[error("Número de nota já existe: {0}")]
    InvoiceNumberAlreadyExists(String),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("CUIT/Tax ID já existe: {0}")]
    TaxIdAlreadyExists(String),

    #[error("Produto {0} está em uso por notas")]
    ProductInUse(i64),

    #[error("Compra {0} está cancelada")]
    PurchaseCancelled(i64),

    // --- 500 ---
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Erro de validação de um único campo, no mesmo formato do `validator`.
    pub fn field(field: &'static str, code: &'static str) -> Self {
        let mut errors = validator::ValidationErrors::new();
        errors.add(field, validator::ValidationError::new(code));
        AppError::ValidationError(errors)
    }

    pub fn status(&self) -> StatusCode {
        use AppError::*;
        match self {
            ValidationError(_)
            | EmptyItemList
            | InvalidQuantity { .. }
            | InvalidProductReference { .. }
            | NewProductNameRequired { .. }
            | PaymentExceedsBalance { .. }
            | InvalidRole(_)
            | InvalidTenantHeader
            | MissingUploadFile => StatusCode::BAD_REQUEST,

            InvalidCredentials | InvalidToken => StatusCode::UNAUTHORIZED,

            ProductAccessDenied(_) | SupplierAccessDenied(_) | TenantMismatch | AdminRequired => {
                StatusCode::FORBIDDEN
            }

            UserNotFound
            | ProductNotFound(_)
            | InvoiceNotFound(_)
            | SupplierNotFound(_)
            | PurchaseNotFound(_) => StatusCode::NOT_FOUND,

            InsufficientStock { .. }
            | InvoiceNumberAlreadyExists(_)
            | EmailAlreadyExists
            | TaxIdAlreadyExists(_)
            | ProductInUse(_)
            | PurchaseCancelled(_) => StatusCode::CONFLICT,

            DatabaseError(_) | InternalServerError(_) | BcryptError(_) | JwtError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    // Chave de tradução + parâmetros para interpolar na mensagem
    fn message_key(&self) -> (&'static str, Vec<(&'static str, String)>) {
        use AppError::*;
        match self {
            ValidationError(_) => ("validation.failed", vec![]),
            EmptyItemList => ("invoice.empty_items", vec![]),
            InvalidQuantity { product_id } => {
                ("invoice.invalid_quantity", vec![("product_id", product_id.to_string())])
            }
            InvalidProductReference { line } => {
                ("purchase.invalid_product_ref", vec![("line", line.to_string())])
            }
            NewProductNameRequired { line } => {
                ("purchase.new_product_name", vec![("line", line.to_string())])
            }
            PaymentExceedsBalance { purchase_id } => {
                ("payment.exceeds_balance", vec![("purchase_id", purchase_id.to_string())])
            }
            InvalidRole(role) => ("user.invalid_role", vec![("role", role.clone())]),
            InvalidTenantHeader => ("tenant.invalid_header", vec![]),
            MissingUploadFile => ("stock.missing_file", vec![]),
            InvalidCredentials => ("auth.invalid_credentials", vec![]),
            InvalidToken => ("auth.invalid_token", vec![]),
            ProductAccessDenied(id) => ("product.forbidden", vec![("id", id.to_string())]),
            SupplierAccessDenied(id) => ("supplier.forbidden", vec![("id", id.to_string())]),
            TenantMismatch => ("tenant.mismatch", vec![]),
            AdminRequired => ("auth.admin_required", vec![]),
            UserNotFound => ("user.not_found", vec![]),
            ProductNotFound(id) => ("product.not_found", vec![("id", id.to_string())]),
            InvoiceNotFound(id) => ("invoice.not_found", vec![("id", id.to_string())]),
            SupplierNotFound(id) => ("supplier.not_found", vec![("id", id.to_string())]),
            PurchaseNotFound(id) => ("purchase.not_found", vec![("id", id.to_string())]),
            InsufficientStock {
                product_id,
                available,
                requested,
            } => (
                "invoice.insufficient_stock",
                vec![
                    ("product_id", product_id.to_string()),
                    ("available", available.to_string()),
                    ("requested", requested.to_string()),
                ],
            ),
            InvoiceNumberAlreadyExists(number) => {
                ("purchase.duplicate_number", vec![("number", number.clone())])
            }
            EmailAlreadyExists => ("user.email_exists", vec![]),
            TaxIdAlreadyExists(tax_id) => ("supplier.tax_id_exists", vec![("tax_id", tax_id.clone())]),
            ProductInUse(id) => ("product.in_use", vec![("id", id.to_string())]),
            PurchaseCancelled(id) => ("purchase.cancelled", vec![("id", id.to_string())]),
            DatabaseError(_) | InternalServerError(_) | BcryptError(_) | JwtError(_) => {
                ("internal.unexpected", vec![])
            }
        }
    }

    /// Converte o erro de domínio na resposta HTTP, traduzida para o idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // O `tracing` loga a mensagem detalhada que `thiserror` nos deu.
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let (key, args) = self.message_key();
        let error = store.translate(&locale.0, key, &args);

        let details = match self {
            AppError::ValidationError(errors) => Some(validation_details(errors, locale, store)),
            _ => None,
        };

        ApiError { status, error, details }
    }
}

// Monta { campo: [mensagens] } a partir dos erros do `validator`.
// O `code` do erro é a chave de tradução; a `message` do payload é o fallback.
fn validation_details(
    errors: &validator::ValidationErrors,
    locale: &Locale,
    store: &I18nStore,
) -> Value {
    let mut details: HashMap<String, Vec<String>> = HashMap::new();

    for (field, field_errors) in errors.field_errors() {
        let messages = field_errors
            .iter()
            .map(|e| {
                let key = format!("validation.{}", e.code);
                let args: Vec<(&'static str, String)> = e
                    .params
                    .get("min")
                    .map(|min| vec![("min", min.to_string())])
                    .unwrap_or_default();

                match store.lookup(&locale.0, &key) {
                    Some(_) => store.translate(&locale.0, &key, &args),
                    None => e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                }
            })
            .collect();
        details.insert(field.to_string(), messages);
    }

    json!(details)
}

// A resposta de erro que os handlers devolvem.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

// Usado onde ainda não temos o idioma do cliente (ex.: falhas no bootstrap do guard).
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let locale = Locale(DEFAULT_LOCALE.to_string());
        self.to_api_error(&locale, &I18nStore::new()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_error_kind_maps_to_its_status() {
        assert_eq!(AppError::EmptyItemList.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::ProductAccessDenied(1).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::InvoiceNotFound(9).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::InsufficientStock { product_id: 1, available: 2, requested: 3 }.status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::InvoiceNumberAlreadyExists("F-1".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn api_error_is_localized() {
        let store = I18nStore::new();
        let err = AppError::ProductNotFound(42);

        let es = err.to_api_error(&Locale("es".into()), &store);
        let en = err.to_api_error(&Locale("en".into()), &store);

        assert_eq!(es.status, StatusCode::NOT_FOUND);
        assert!(es.error.contains("42"));
        assert!(en.error.contains("42"));
        assert_ne!(es.error, en.error);
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let store = I18nStore::new();
        let err = AppError::InternalServerError(anyhow::anyhow!("senha do banco: hunter2"));
        let api = err.to_api_error(&Locale("en".into()), &store);

        assert!(!api.error.contains("hunter2"));
        assert!(api.details.is_none());
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let mut errors = validator::ValidationErrors::new();
        let mut field_error = validator::ValidationError::new("required");
        field_error.message = Some("campo obrigatório".into());
        errors.add("email", field_error);

        let api = AppError::ValidationError(errors)
            .to_api_error(&Locale("es".into()), &I18nStore::new());

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.expect("details");
        assert!(details["email"].as_array().is_some_and(|m| !m.is_empty()));
    }
}

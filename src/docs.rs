// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Users ---
        handlers::auth::create_user,

        // --- Stock ---
        handlers::stock::list_products,
        handlers::stock::create_product,
        handlers::stock::update_product,
        handlers::stock::delete_product,
        handlers::stock::upload_products,

        // --- Invoices ---
        handlers::invoices::create_invoice,
        handlers::invoices::list_invoices,
        handlers::invoices::get_invoice,
        handlers::invoices::search_products,

        // --- Purchases ---
        handlers::purchases::create_purchase,
        handlers::purchases::list_purchases,
        handlers::purchases::get_purchase,
        handlers::purchases::register_payment,

        // --- Suppliers ---
        handlers::suppliers::list_suppliers,
        handlers::suppliers::create_supplier,
        handlers::suppliers::update_supplier,

        // --- Dashboard ---
        handlers::dashboard::get_metrics,
        handlers::dashboard::get_report,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::auth::CreateUserPayload,

            // --- Stock ---
            models::product::Product,
            models::product::ProductListResponse,
            models::product::UploadResult,
            handlers::stock::ProductPayload,
            handlers::stock::ProductUpdatePayload,

            // --- Invoices ---
            models::invoice::InvoiceStatus,
            models::invoice::Invoice,
            models::invoice::InvoiceItemDetail,
            models::invoice::InvoiceDetail,
            models::invoice::InvoiceListResponse,
            handlers::invoices::SaleItemPayload,
            handlers::invoices::CreateInvoicePayload,

            // --- Purchases ---
            models::purchase::PurchaseStatus,
            models::purchase::PurchaseInvoice,
            models::purchase::PurchaseItemDetail,
            models::purchase::PurchaseDetail,
            models::purchase::PurchaseListResponse,
            models::purchase::SupplierPayment,
            models::purchase::PaymentReceipt,
            handlers::purchases::PurchaseItemPayload,
            handlers::purchases::CreatePurchasePayload,
            handlers::purchases::RegisterPaymentPayload,

            // --- Suppliers ---
            models::supplier::Supplier,
            models::supplier::SupplierListResponse,
            handlers::suppliers::CreateSupplierPayload,
            handlers::suppliers::UpdateSupplierPayload,

            // --- Dashboard ---
            models::dashboard::DashboardMetrics,
            models::dashboard::ReportPoint,
            models::dashboard::ReportResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Login e sessão"),
        (name = "Users", description = "Cadastro de usuários (admin)"),
        (name = "Stock", description = "Produtos e importação CSV"),
        (name = "Invoices", description = "Notas de venda"),
        (name = "Purchases", description = "Notas de compra e pagamentos a fornecedores"),
        (name = "Suppliers", description = "Fornecedores"),
        (name = "Dashboard", description = "Indicadores e relatórios de vendas")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_group_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/login",
            "/api/users",
            "/api/stock/upload",
            "/api/invoices/products/search",
            "/api/purchases/{id}/payments",
            "/api/suppliers/{id}",
            "/api/dashboard/reports",
        ] {
            assert!(doc.paths.paths.contains_key(path), "faltou {path}");
        }
    }
}

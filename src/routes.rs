// src/routes.rs

use axum::{
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::{AppState, Config},
    docs::ApiDoc,
    handlers,
    middleware::{
        auth::{admin_guard, auth_guard},
        tenancy::tenant_guard,
    },
};

pub fn create_router(app_state: AppState, config: &Config) -> Router {
    // Rotas públicas
    let public_routes = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/auth/login", post(handlers::auth::login));

    // Só precisa de token válido
    let session_routes = Router::new()
        .route("/api/auth/me", get(handlers::auth::get_me))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Token + papel admin (o último layer roda primeiro)
    let admin_routes = Router::new()
        .route("/api/users", post(handlers::auth::create_user))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            admin_guard,
        ))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Token + tenant: tudo que lê ou grava dados do tenant
    let tenant_routes = Router::new()
        .route(
            "/api/stock",
            get(handlers::stock::list_products).post(handlers::stock::create_product),
        )
        .route("/api/stock/upload", post(handlers::stock::upload_products))
        .route(
            "/api/stock/{id}",
            put(handlers::stock::update_product).delete(handlers::stock::delete_product),
        )
        .route(
            "/api/invoices",
            get(handlers::invoices::list_invoices).post(handlers::invoices::create_invoice),
        )
        .route(
            "/api/invoices/products/search",
            get(handlers::invoices::search_products),
        )
        .route("/api/invoices/{id}", get(handlers::invoices::get_invoice))
        .route(
            "/api/purchases",
            get(handlers::purchases::list_purchases).post(handlers::purchases::create_purchase),
        )
        .route("/api/purchases/{id}", get(handlers::purchases::get_purchase))
        .route(
            "/api/purchases/{id}/payments",
            post(handlers::purchases::register_payment),
        )
        .route(
            "/api/suppliers",
            get(handlers::suppliers::list_suppliers).post(handlers::suppliers::create_supplier),
        )
        .route("/api/suppliers/{id}", put(handlers::suppliers::update_supplier))
        .route("/api/dashboard/metrics", get(handlers::dashboard::get_metrics))
        .route("/api/dashboard/reports", get(handlers::dashboard::get_report))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public_routes)
        .merge(session_routes)
        .merge(admin_routes)
        .merge(tenant_routes)
        .with_state(app_state)
        .layer(cors_layer(&config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
}

// Lista vazia = qualquer origem
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Origem CORS ignorada: {}", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

// src/config.rs

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, str::FromStr, time::Duration};

use crate::{
    common::i18n::I18nStore,
    db::{
        DashboardRepository, InvoiceRepository, ProductRepository, PurchaseRepository,
        SupplierRepository, TenantRepository, UserRepository,
    },
    services::{
        auth::AuthService, dashboard_service::DashboardService, invoice_service::InvoiceService,
        product_service::ProductService, purchase_service::PurchaseService,
        supplier_service::SupplierService,
    },
};

// --- Configuração lida do ambiente (.env) ---
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_host: String,
    pub server_port: u16,
    pub database_max_connections: u32,
    pub database_acquire_timeout_secs: u64,
    pub jwt_expiration_hours: i64,
    // Vazio = qualquer origem ("*")
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: parsed_or("SERVER_PORT", 8080)?,
            database_max_connections: parsed_or("DATABASE_MAX_CONNECTIONS", 5)?,
            database_acquire_timeout_secs: parsed_or("DATABASE_ACQUIRE_TIMEOUT_SECS", 3)?,
            jwt_expiration_hours: parsed_or("JWT_EXPIRATION_HOURS", 24)?,
            cors_allowed_origins: parse_origins(&env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default()),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn required(name: &str) -> anyhow::Result<String> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("{name} deve ser definida"))
}

fn parsed_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{name} inválida ({raw}): {e}")),
        _ => Ok(default),
    }
}

// "*" ou vazio = qualquer origem; senão lista separada por vírgulas
fn parse_origins(raw: &str) -> Vec<String> {
    if raw.trim() == "*" {
        return Vec::new();
    }
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub i18n_store: I18nStore,
    pub auth_service: AuthService,
    pub product_service: ProductService,
    pub invoice_service: InvoiceService,
    pub purchase_service: PurchaseService,
    pub supplier_service: SupplierService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(config.database_acquire_timeout_secs))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::with_pool(db_pool, config))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_pool(db_pool: PgPool, config: &Config) -> Self {
        let product_repo = ProductRepository::new();
        let supplier_repo = SupplierRepository::new();

        let auth_service = AuthService::new(
            UserRepository::new(db_pool.clone()),
            TenantRepository::new(),
            config.jwt_secret.clone(),
            config.jwt_expiration_hours,
            db_pool.clone(),
        );

        Self {
            i18n_store: I18nStore::new(),
            auth_service,
            product_service: ProductService::new(product_repo.clone()),
            invoice_service: InvoiceService::new(InvoiceRepository::new(), product_repo.clone()),
            purchase_service: PurchaseService::new(
                PurchaseRepository::new(),
                product_repo,
                supplier_repo.clone(),
            ),
            supplier_service: SupplierService::new(supplier_repo),
            dashboard_service: DashboardService::new(DashboardRepository::new()),
            db_pool,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_or_empty_origins_allow_any() {
        assert!(parse_origins("*").is_empty());
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        assert_eq!(
            parse_origins("http://localhost:3000, https://app.example.com ,"),
            vec!["http://localhost:3000", "https://app.example.com"]
        );
    }
}

// src/db/testing.rs

// Apoio aos testes que rodam contra um Postgres de verdade.
// Sem DATABASE_URL os testes retornam cedo e passam.

use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::{
    db::{ProductRepository, SupplierRepository, TenantRepository, UserRepository},
    models::{
        auth::Role,
        product::{Product, ProductDraft},
        supplier::{NewSupplier, Supplier},
        tenancy::TenantId,
    },
};

pub(crate) async fn pool_or_skip() -> Option<PgPool> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL ausente; pulando testes com banco.");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("conexão com o banco de testes");
    sqlx::migrate!().run(&pool).await.expect("migrações do banco de testes");
    Some(pool)
}

/// Sufixo único por teste: slugs, e-mails e números de nota não colidem entre execuções.
pub(crate) fn unique_tag() -> String {
    Uuid::new_v4().simple().to_string()
}

// Um tenant novo com um usuário caixa
pub(crate) struct Shop {
    pub tenant: TenantId,
    pub user_id: i64,
}

pub(crate) async fn seed_shop(pool: &PgPool) -> Shop {
    let tag = unique_tag();
    let tenant = TenantRepository::new()
        .create_tenant(pool, "Loja de testes", &format!("loja-{tag}"), None)
        .await
        .expect("tenant");
    let user = UserRepository::new(pool.clone())
        .create_user(pool, tenant.tenant_id(), &format!("caixa-{tag}@testes.local"), "x", "Caixa", Role::User)
        .await
        .expect("usuário");

    Shop { tenant: tenant.tenant_id(), user_id: user.id }
}

pub(crate) async fn seed_product(pool: &PgPool, tenant: TenantId, stock: i32, price: Decimal) -> Product {
    let draft = ProductDraft {
        name: format!("Produto {}", unique_tag()),
        description: None,
        price,
        purchase_price: Decimal::ZERO,
        retail_price: price,
        wholesale_price: None,
        min_wholesale_quantity: None,
        stock,
        sku: None,
    };
    ProductRepository::new().create(pool, tenant, &draft).await.expect("produto")
}

pub(crate) async fn seed_supplier(pool: &PgPool, tenant: TenantId) -> Supplier {
    let supplier = NewSupplier { name: "Distribuidora de testes".into(), ..Default::default() };
    SupplierRepository::new().create(pool, tenant, &supplier).await.expect("fornecedor")
}

pub(crate) async fn stock_of(pool: &PgPool, product_id: i64) -> i32 {
    sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_one(pool)
        .await
        .expect("estoque")
}

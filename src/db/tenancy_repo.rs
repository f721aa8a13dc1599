// src/db/tenancy_repo.rs

use sqlx::{Executor, Postgres};

use crate::{common::error::AppError, models::tenancy::Tenant};

#[derive(Clone, Default)]
pub struct TenantRepository;

impl TenantRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn slug_exists<'e, E>(&self, executor: E, slug: &str) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tenants WHERE slug = $1)")
                .bind(slug)
                .fetch_one(executor)
                .await?;
        Ok(exists)
    }

    /// Cria um novo tenant (loja). Roda dentro da transação de criação de usuário.
    pub async fn create_tenant<'e, E>(
        &self,
        executor: E,
        name: &str,
        slug: &str,
        domain: Option<&str>,
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (name, slug, domain)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(domain)
        .fetch_one(executor)
        .await?;
        Ok(tenant)
    }
}

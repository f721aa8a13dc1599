// src/db/supplier_repo.rs

use sqlx::{Executor, Postgres};

use crate::{
    common::{error::AppError, pagination::Page},
    models::{
        supplier::{NewSupplier, Supplier},
        tenancy::TenantId,
    },
};

#[derive(Clone, Default)]
pub struct SupplierRepository;

// Violação do índice único de tax_id vira conflito de domínio
fn map_tax_id_violation(e: sqlx::Error, tax_id: Option<&str>) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::TaxIdAlreadyExists(tax_id.unwrap_or_default().to_string());
        }
    }
    e.into()
}

impl SupplierRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        supplier: &NewSupplier,
    ) -> Result<Supplier, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Supplier>(
            r#"
            INSERT INTO suppliers (tenant_id, name, email, phone, address, tax_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(tenant_id.get())
        .bind(&supplier.name)
        .bind(&supplier.email)
        .bind(&supplier.phone)
        .bind(&supplier.address)
        .bind(&supplier.tax_id)
        .fetch_one(executor)
        .await
        .map_err(|e| map_tax_id_violation(e, supplier.tax_id.as_deref()))
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        page: Page,
    ) -> Result<Vec<Supplier>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let suppliers = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT * FROM suppliers
            WHERE tenant_id = $1
            ORDER BY name ASC, id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(tenant_id.get())
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(executor)
        .await?;
        Ok(suppliers)
    }

    pub async fn count<'e, E>(&self, executor: E, tenant_id: TenantId) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM suppliers WHERE tenant_id = $1")
            .bind(tenant_id.get())
            .fetch_one(executor)
            .await?;
        Ok(total)
    }

    /// Busca sem filtro de tenant: quem chama decide entre 404 e 403.
    pub async fn find_any<'e, E>(&self, executor: E, id: i64) -> Result<Option<Supplier>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let supplier = sqlx::query_as::<_, Supplier>("SELECT * FROM suppliers WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(supplier)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        id: i64,
    ) -> Result<Option<Supplier>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let supplier = sqlx::query_as::<_, Supplier>(
            "SELECT * FROM suppliers WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id.get())
        .fetch_optional(executor)
        .await?;
        Ok(supplier)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        id: i64,
        supplier: &NewSupplier,
    ) -> Result<Supplier, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Supplier>(
            r#"
            UPDATE suppliers
            SET name = $3, email = $4, phone = $5, address = $6, tax_id = $7, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id.get())
        .bind(&supplier.name)
        .bind(&supplier.email)
        .bind(&supplier.phone)
        .bind(&supplier.address)
        .bind(&supplier.tax_id)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_tax_id_violation(e, supplier.tax_id.as_deref()))?
        .ok_or(AppError::SupplierNotFound(id))
    }
}

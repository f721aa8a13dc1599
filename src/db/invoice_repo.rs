// src/db/invoice_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};

use crate::{
    common::{error::AppError, pagination::Page},
    models::{
        invoice::{Invoice, InvoiceItemDetail, PricedLine},
        tenancy::TenantId,
    },
};

#[derive(Clone, Default)]
pub struct InvoiceRepository;

impl InvoiceRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert_header<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        user_id: i64,
        total: Decimal,
    ) -> Result<Invoice, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (tenant_id, user_id, total, status)
            VALUES ($1, $2, $3, 'pending')
            RETURNING *
            "#,
        )
        .bind(tenant_id.get())
        .bind(user_id)
        .bind(total)
        .fetch_one(executor)
        .await?;
        Ok(invoice)
    }

    pub async fn insert_item<'e, E>(
        &self,
        executor: E,
        invoice_id: i64,
        line: &PricedLine,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO invoice_items (invoice_id, product_id, quantity, unit_price, subtotal)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(invoice_id)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(line.unit_price)
        .bind(line.subtotal)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        page: Page,
    ) -> Result<Vec<Invoice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT * FROM invoices
            WHERE tenant_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(tenant_id.get())
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(executor)
        .await?;
        Ok(invoices)
    }

    pub async fn count<'e, E>(&self, executor: E, tenant_id: TenantId) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices WHERE tenant_id = $1")
            .bind(tenant_id.get())
            .fetch_one(executor)
            .await?;
        Ok(total)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        id: i64,
    ) -> Result<Option<Invoice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoice = sqlx::query_as::<_, Invoice>(
            "SELECT * FROM invoices WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id.get())
        .fetch_optional(executor)
        .await?;
        Ok(invoice)
    }

    // Itens com o nome do produto resolvido
    pub async fn items_for<'e, E>(
        &self,
        executor: E,
        invoice_id: i64,
    ) -> Result<Vec<InvoiceItemDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, InvoiceItemDetail>(
            r#"
            SELECT ii.id, ii.invoice_id, ii.product_id, p.name AS product_name,
                   ii.quantity, ii.unit_price, ii.subtotal
            FROM invoice_items ii
            JOIN products p ON p.id = ii.product_id
            WHERE ii.invoice_id = $1
            ORDER BY ii.id
            "#,
        )
        .bind(invoice_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }
}

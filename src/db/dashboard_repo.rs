// src/db/dashboard_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};

use crate::{
    common::error::AppError,
    models::{
        dashboard::{DashboardMetrics, SalesAggregate},
        tenancy::TenantId,
    },
};

// Limite do "estoque baixo" nos cards
pub const LOW_STOCK_THRESHOLD: i32 = 10;

#[derive(Clone, Default)]
pub struct DashboardRepository;

#[derive(sqlx::FromRow)]
struct MetricsRow {
    total_products: i64,
    total_invoices: i64,
    revenue: Decimal,
    low_stock_items: i64,
}

impl DashboardRepository {
    pub fn new() -> Self {
        Self
    }

    // 1. Soma e contagem das notas de venda em [from, until)
    pub async fn sales_between<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<SalesAggregate, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let aggregate = sqlx::query_as::<_, SalesAggregate>(
            r#"
            SELECT COALESCE(SUM(total), 0) AS value, COUNT(*) AS count
            FROM invoices
            WHERE tenant_id = $1
              AND created_at >= $2
              AND created_at < $3
            "#,
        )
        .bind(tenant_id.get())
        .bind(from)
        .bind(until)
        .fetch_one(executor)
        .await?;
        Ok(aggregate)
    }

    // 2. Contadores dos cards, num único SELECT (snapshot consistente)
    pub async fn metrics<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
    ) -> Result<DashboardMetrics, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, MetricsRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM products WHERE tenant_id = $1) AS total_products,
                (SELECT COUNT(*) FROM invoices WHERE tenant_id = $1) AS total_invoices,
                (SELECT COALESCE(SUM(total), 0) FROM invoices WHERE tenant_id = $1) AS revenue,
                (SELECT COUNT(*) FROM products WHERE tenant_id = $1 AND stock < $2) AS low_stock_items
            "#,
        )
        .bind(tenant_id.get())
        .bind(LOW_STOCK_THRESHOLD)
        .fetch_one(executor)
        .await?;

        Ok(DashboardMetrics {
            total_products: row.total_products,
            total_invoices: row.total_invoices,
            revenue: row.revenue,
            low_stock_items: row.low_stock_items,
        })
    }
}

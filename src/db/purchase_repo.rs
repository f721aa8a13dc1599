// src/db/purchase_repo.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};

use crate::{
    common::{error::AppError, pagination::Page},
    models::{
        purchase::{PurchaseInvoice, PurchaseItemDetail, PurchaseStatus, SupplierPayment},
        tenancy::TenantId,
    },
};

#[derive(Clone, Default)]
pub struct PurchaseRepository;

pub struct PurchaseHeader<'a> {
    pub supplier_id: i64,
    pub user_id: i64,
    pub invoice_number: &'a str,
    pub total: Decimal,
    pub payment_method: Option<&'a str>,
    pub due_date: Option<NaiveDate>,
}

pub struct PaymentRow<'a> {
    pub purchase_invoice_id: i64,
    pub supplier_id: i64,
    pub user_id: i64,
    pub amount: Decimal,
    pub payment_date: DateTime<Utc>,
    pub payment_method: &'a str,
    pub reference: Option<&'a str>,
    pub notes: Option<&'a str>,
}

impl PurchaseRepository {
    pub fn new() -> Self {
        Self
    }

    // O número da nota é único no sistema inteiro (não só no tenant)
    pub async fn invoice_number_exists<'e, E>(
        &self,
        executor: E,
        invoice_number: &str,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM purchase_invoices WHERE invoice_number = $1)",
        )
        .bind(invoice_number)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    pub async fn insert_header<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        header: &PurchaseHeader<'_>,
    ) -> Result<PurchaseInvoice, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, PurchaseInvoice>(
            r#"
            INSERT INTO purchase_invoices (
                tenant_id, supplier_id, user_id, invoice_number, total,
                status, payment_method, due_date, paid_amount
            )
            VALUES ($1, $2, $3, $4, $5, 'pending', $6, $7, 0)
            RETURNING *
            "#,
        )
        .bind(tenant_id.get())
        .bind(header.supplier_id)
        .bind(header.user_id)
        .bind(header.invoice_number)
        .bind(header.total)
        .bind(header.payment_method)
        .bind(header.due_date)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            // Corrida entre duas compras com o mesmo número: o índice único decide
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::InvoiceNumberAlreadyExists(header.invoice_number.to_string());
                }
            }
            e.into()
        })
    }

    pub async fn insert_item<'e, E>(
        &self,
        executor: E,
        purchase_invoice_id: i64,
        product_id: i64,
        quantity: i32,
        unit_cost: Decimal,
        subtotal: Decimal,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO purchase_invoice_items
                (purchase_invoice_id, product_id, quantity, unit_cost, subtotal)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(purchase_invoice_id)
        .bind(product_id)
        .bind(quantity)
        .bind(unit_cost)
        .bind(subtotal)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        page: Page,
    ) -> Result<Vec<PurchaseInvoice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let purchases = sqlx::query_as::<_, PurchaseInvoice>(
            r#"
            SELECT * FROM purchase_invoices
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
        Ok(purchases)
    }

    pub async fn count<'e, E>(&self, executor: E, tenant_id: TenantId) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM purchase_invoices WHERE tenant_id = $1")
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
    ) -> Result<Option<PurchaseInvoice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let purchase = sqlx::query_as::<_, PurchaseInvoice>(
            "SELECT * FROM purchase_invoices WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id.get())
        .fetch_optional(executor)
        .await?;
        Ok(purchase)
    }

    // Mesma busca, travando a linha para o registro de pagamento
    pub async fn find_for_update<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        id: i64,
    ) -> Result<Option<PurchaseInvoice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let purchase = sqlx::query_as::<_, PurchaseInvoice>(
            "SELECT * FROM purchase_invoices WHERE id = $1 AND tenant_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(tenant_id.get())
        .fetch_optional(executor)
        .await?;
        Ok(purchase)
    }

    pub async fn items_for<'e, E>(
        &self,
        executor: E,
        purchase_invoice_id: i64,
    ) -> Result<Vec<PurchaseItemDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, PurchaseItemDetail>(
            r#"
            SELECT pii.id, pii.purchase_invoice_id, pii.product_id, p.name AS product_name,
                   pii.quantity, pii.unit_cost, pii.subtotal
            FROM purchase_invoice_items pii
            JOIN products p ON p.id = pii.product_id
            WHERE pii.purchase_invoice_id = $1
            ORDER BY pii.id
            "#,
        )
        .bind(purchase_invoice_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn update_payment_state<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        id: i64,
        paid_amount: Decimal,
        status: PurchaseStatus,
    ) -> Result<PurchaseInvoice, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let purchase = sqlx::query_as::<_, PurchaseInvoice>(
            r#"
            UPDATE purchase_invoices
            SET paid_amount = $3, status = $4, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id.get())
        .bind(paid_amount)
        .bind(status)
        .fetch_one(executor)
        .await?;
        Ok(purchase)
    }

    pub async fn insert_payment<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        payment: &PaymentRow<'_>,
    ) -> Result<SupplierPayment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, SupplierPayment>(
            r#"
            INSERT INTO supplier_payments (
                tenant_id, purchase_invoice_id, supplier_id, user_id, amount,
                payment_date, payment_method, reference, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(tenant_id.get())
        .bind(payment.purchase_invoice_id)
        .bind(payment.supplier_id)
        .bind(payment.user_id)
        .bind(payment.amount)
        .bind(payment.payment_date)
        .bind(payment.payment_method)
        .bind(payment.reference)
        .bind(payment.notes)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }
}

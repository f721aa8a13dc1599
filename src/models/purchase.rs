// src/models/purchase.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "purchase_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Pending,
    Partial,
    Paid,
    Cancelled,
}

impl PurchaseStatus {
    // Status depois de um pagamento: quitado ou parcial.
    pub fn after_payment(paid_amount: Decimal, total: Decimal) -> Self {
        if paid_amount >= total {
            PurchaseStatus::Paid
        } else {
            PurchaseStatus::Partial
        }
    }
}

// --- Nota de compra (fornecedor) ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseInvoice {
    pub id: i64,
    pub tenant_id: i64,
    pub supplier_id: i64,
    pub user_id: i64,
    pub invoice_number: String,
    pub total: Decimal,
    pub status: PurchaseStatus,
    pub payment_method: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub paid_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseItemDetail {
    pub id: i64,
    pub purchase_invoice_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub unit_cost: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseDetail {
    pub id: i64,
    pub tenant_id: i64,
    pub supplier_id: i64,
    pub user_id: i64,
    pub invoice_number: String,
    pub total: Decimal,
    pub status: PurchaseStatus,
    pub payment_method: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub paid_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<PurchaseItemDetail>,
}

impl PurchaseDetail {
    pub fn from_parts(purchase: PurchaseInvoice, items: Vec<PurchaseItemDetail>) -> Self {
        Self {
            id: purchase.id,
            tenant_id: purchase.tenant_id,
            supplier_id: purchase.supplier_id,
            user_id: purchase.user_id,
            invoice_number: purchase.invoice_number,
            total: purchase.total,
            status: purchase.status,
            payment_method: purchase.payment_method,
            due_date: purchase.due_date,
            paid_amount: purchase.paid_amount,
            created_at: purchase.created_at,
            updated_at: purchase.updated_at,
            items,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseListResponse {
    pub purchases: Vec<PurchaseInvoice>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// ---
// Linhas da compra, já convertidas na borda HTTP
// ---

// Produto que ainda não existe e será criado pela compra
#[derive(Debug, Clone, PartialEq)]
pub struct NewProductSpec {
    pub name: String,
    pub sku: String,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PurchaseProductRef {
    Existing(i64),
    New(NewProductSpec),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseLine {
    pub product: PurchaseProductRef,
    pub quantity: i32,
    pub unit_cost: Decimal,
}

impl PurchaseLine {
    pub fn subtotal(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_cost
    }
}

#[derive(Debug, Clone)]
pub struct NewPurchase {
    pub supplier_id: i64,
    pub invoice_number: String,
    pub payment_method: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub lines: Vec<PurchaseLine>,
}

// --- Pagamento ao fornecedor ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPayment {
    pub id: i64,
    pub tenant_id: i64,
    pub purchase_invoice_id: i64,
    pub supplier_id: i64,
    pub user_id: i64,
    pub amount: Decimal,
    pub payment_date: DateTime<Utc>,
    pub payment_method: String,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub amount: Decimal,
    pub payment_method: String,
    pub payment_date: Option<DateTime<Utc>>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

// Resposta do registro de pagamento: o pagamento + a compra atualizada
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub payment: SupplierPayment,
    pub purchase: PurchaseInvoice,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_after_payment() {
        let total = Decimal::new(10000, 2);
        assert_eq!(
            PurchaseStatus::after_payment(Decimal::new(4000, 2), total),
            PurchaseStatus::Partial
        );
        assert_eq!(PurchaseStatus::after_payment(total, total), PurchaseStatus::Paid);
    }

    #[test]
    fn line_subtotal_is_quantity_times_cost() {
        let line = PurchaseLine {
            product: PurchaseProductRef::Existing(3),
            quantity: 5,
            unit_cost: Decimal::new(200, 2),
        };
        assert_eq!(line.subtotal(), Decimal::new(1000, 2));
    }
}

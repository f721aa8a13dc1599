// src/services/purchase_service.rs

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{Acquire, PgPool, Postgres};

use crate::{
    common::{error::AppError, pagination::Page},
    db::{
        purchase_repo::{PaymentRow, PurchaseHeader},
        ProductRepository, PurchaseRepository, SupplierRepository,
    },
    models::{
        product::ProductDraft,
        purchase::{
            NewPayment, NewPurchase, PaymentReceipt, PurchaseDetail, PurchaseListResponse,
            PurchaseProductRef, PurchaseStatus,
        },
        tenancy::TenantId,
    },
};

#[derive(Clone)]
pub struct PurchaseService {
    purchase_repo: PurchaseRepository,
    product_repo: ProductRepository,
    supplier_repo: SupplierRepository,
}

impl PurchaseService {
    pub fn new(
        purchase_repo: PurchaseRepository,
        product_repo: ProductRepository,
        supplier_repo: SupplierRepository,
    ) -> Self {
        Self { purchase_repo, product_repo, supplier_repo }
    }

    // --- CREATE PURCHASE (ENTRADA) ---
    // Fornecedor, produtos novos, itens, cabeçalho e entrada de estoque numa única
    // transação. Qualquer erro desfaz tudo, inclusive os produtos criados.
    pub async fn create_purchase<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        user_id: i64,
        purchase: &NewPurchase,
    ) -> Result<PurchaseDetail, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        validate_purchase(purchase)?;

        let mut tx = executor.begin().await?;

        // 1. Fornecedor precisa ser do tenant
        self.supplier_repo
            .find_by_id(&mut *tx, tenant_id, purchase.supplier_id)
            .await?
            .ok_or(AppError::SupplierNotFound(purchase.supplier_id))?;

        // 2. Número da nota único
        if self.purchase_repo
            .invoice_number_exists(&mut *tx, &purchase.invoice_number)
            .await?
        {
            tracing::warn!("Número de nota repetido: {}", purchase.invoice_number);
            return Err(AppError::InvoiceNumberAlreadyExists(purchase.invoice_number.clone()));
        }

        // 3. Resolve cada linha para um produto do tenant (criando os novos)
        let mut resolved = Vec::with_capacity(purchase.lines.len());
        let mut total = Decimal::ZERO;

        for line in &purchase.lines {
            let product_id = match &line.product {
                PurchaseProductRef::New(spec) => {
                    let draft = ProductDraft {
                        name: spec.name.clone(),
                        description: None,
                        price: spec.price,
                        purchase_price: line.unit_cost,
                        retail_price: spec.price,
                        wholesale_price: None,
                        min_wholesale_quantity: None,
                        stock: 0,
                        sku: Some(spec.sku.clone()),
                    };
                    let product = self.product_repo.create(&mut *tx, tenant_id, &draft).await?;
                    tracing::info!("🆕 Produto {} criado pela compra {}", product.id, purchase.invoice_number);
                    product.id
                }
                PurchaseProductRef::Existing(id) => {
                    let locked = self.product_repo.lock_for_update(&mut *tx, &[*id]).await?;
                    let product = locked.first().ok_or(AppError::ProductNotFound(*id))?;
                    if product.tenant_id != tenant_id.get() {
                        return Err(AppError::ProductAccessDenied(*id));
                    }
                    product.id
                }
            };

            let subtotal = line.subtotal();
            total += subtotal;

            let incremented = self.product_repo
                .increment_stock(&mut *tx, tenant_id, product_id, line.quantity)
                .await?;
            if !incremented {
                return Err(AppError::ProductNotFound(product_id));
            }

            resolved.push((product_id, line, subtotal));
        }

        // 4. Cabeçalho + itens
        let header = self.purchase_repo
            .insert_header(
                &mut *tx,
                tenant_id,
                &PurchaseHeader {
                    supplier_id: purchase.supplier_id,
                    user_id,
                    invoice_number: &purchase.invoice_number,
                    total,
                    payment_method: purchase.payment_method.as_deref(),
                    due_date: purchase.due_date,
                },
            )
            .await?;

        for (product_id, line, subtotal) in resolved {
            self.purchase_repo
                .insert_item(&mut *tx, header.id, product_id, line.quantity, line.unit_cost, subtotal)
                .await?;
        }

        let items = self.purchase_repo.items_for(&mut *tx, header.id).await?;

        tx.commit().await?;

        tracing::info!(
            "✅ Compra {} ({}) registrada no tenant {}, total {}",
            header.id,
            header.invoice_number,
            tenant_id,
            header.total
        );

        Ok(PurchaseDetail::from_parts(header, items))
    }

    pub async fn list_purchases(
        &self,
        pool: &PgPool,
        tenant_id: TenantId,
        page: Page,
    ) -> Result<PurchaseListResponse, AppError> {
        let purchases = self.purchase_repo.list(pool, tenant_id, page).await?;
        let total = self.purchase_repo.count(pool, tenant_id).await?;

        Ok(PurchaseListResponse {
            purchases,
            total,
            page: page.page,
            limit: page.limit,
        })
    }

    pub async fn get_purchase(
        &self,
        pool: &PgPool,
        tenant_id: TenantId,
        id: i64,
    ) -> Result<PurchaseDetail, AppError> {
        let purchase = self.purchase_repo
            .find_by_id(pool, tenant_id, id)
            .await?
            .ok_or(AppError::PurchaseNotFound(id))?;

        let items = self.purchase_repo.items_for(pool, purchase.id).await?;
        Ok(PurchaseDetail::from_parts(purchase, items))
    }

    // --- REGISTER PAYMENT (BAIXA DO TÍTULO) ---
    pub async fn register_payment<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        user_id: i64,
        purchase_id: i64,
        payment: &NewPayment,
    ) -> Result<PaymentReceipt, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        if payment.amount <= Decimal::ZERO {
            return Err(AppError::field("amount", "positive"));
        }
        if payment.payment_method.trim().is_empty() {
            return Err(AppError::field("paymentMethod", "required"));
        }

        let mut tx = executor.begin().await?;

        // 1. Trava a compra
        let purchase = self.purchase_repo
            .find_for_update(&mut *tx, tenant_id, purchase_id)
            .await?
            .ok_or(AppError::PurchaseNotFound(purchase_id))?;

        // 2. Regras de saldo
        let paid_amount = apply_payment(purchase.status, purchase.paid_amount, purchase.total, payment.amount)
            .map_err(|e| match e {
                PaymentRejection::Cancelled => AppError::PurchaseCancelled(purchase_id),
                PaymentRejection::ExceedsBalance => AppError::PaymentExceedsBalance { purchase_id },
            })?;
        let status = PurchaseStatus::after_payment(paid_amount, purchase.total);

        // 3. Pagamento + compra atualizada
        let saved = self.purchase_repo
            .insert_payment(
                &mut *tx,
                tenant_id,
                &PaymentRow {
                    purchase_invoice_id: purchase.id,
                    supplier_id: purchase.supplier_id,
                    user_id,
                    amount: payment.amount,
                    payment_date: payment.payment_date.unwrap_or_else(Utc::now),
                    payment_method: &payment.payment_method,
                    reference: payment.reference.as_deref(),
                    notes: payment.notes.as_deref(),
                },
            )
            .await?;

        let updated = self.purchase_repo
            .update_payment_state(&mut *tx, tenant_id, purchase.id, paid_amount, status)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "💸 Pagamento {} na compra {}: pago {} de {} ({:?})",
            saved.amount,
            updated.id,
            updated.paid_amount,
            updated.total,
            updated.status
        );

        Ok(PaymentReceipt { payment: saved, purchase: updated })
    }
}

// Checagens que não dependem do banco, feitas antes de abrir a transação
fn validate_purchase(purchase: &NewPurchase) -> Result<(), AppError> {
    if purchase.invoice_number.trim().is_empty() {
        return Err(AppError::field("invoiceNumber", "required"));
    }
    if purchase.lines.is_empty() {
        return Err(AppError::EmptyItemList);
    }
    for line in &purchase.lines {
        if line.unit_cost.is_sign_negative() {
            return Err(AppError::field("unitCost", "not_negative"));
        }
        if line.quantity < 1 {
            let product_id = match &line.product {
                PurchaseProductRef::Existing(id) => *id,
                PurchaseProductRef::New(_) => 0,
            };
            return Err(AppError::InvalidQuantity { product_id });
        }
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum PaymentRejection {
    Cancelled,
    ExceedsBalance,
}

// Novo valor pago, ou o motivo da recusa
fn apply_payment(
    status: PurchaseStatus,
    paid_amount: Decimal,
    total: Decimal,
    amount: Decimal,
) -> Result<Decimal, PaymentRejection> {
    if status == PurchaseStatus::Cancelled {
        return Err(PaymentRejection::Cancelled);
    }
    let new_paid = paid_amount + amount;
    if new_paid > total {
        return Err(PaymentRejection::ExceedsBalance);
    }
    Ok(new_paid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::purchase::PurchaseLine;

    fn purchase(lines: Vec<PurchaseLine>) -> NewPurchase {
        NewPurchase {
            supplier_id: 1,
            invoice_number: "FC-0001".into(),
            payment_method: None,
            due_date: None,
            lines,
        }
    }

    #[test]
    fn empty_purchase_is_rejected() {
        assert!(matches!(validate_purchase(&purchase(vec![])), Err(AppError::EmptyItemList)));
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let line = PurchaseLine {
            product: PurchaseProductRef::Existing(4),
            quantity: 0,
            unit_cost: Decimal::ONE,
        };
        assert!(matches!(
            validate_purchase(&purchase(vec![line])),
            Err(AppError::InvalidQuantity { product_id: 4 })
        ));
    }

    #[test]
    fn partial_then_full_payment() {
        let total = Decimal::new(10000, 2);
        let paid = apply_payment(PurchaseStatus::Pending, Decimal::ZERO, total, Decimal::new(4000, 2)).unwrap();
        assert_eq!(paid, Decimal::new(4000, 2));
        assert_eq!(PurchaseStatus::after_payment(paid, total), PurchaseStatus::Partial);

        let paid = apply_payment(PurchaseStatus::Partial, paid, total, Decimal::new(6000, 2)).unwrap();
        assert_eq!(paid, total);
        assert_eq!(PurchaseStatus::after_payment(paid, total), PurchaseStatus::Paid);
    }

    #[test]
    fn overpayment_is_rejected() {
        let total = Decimal::new(10000, 2);
        assert_eq!(
            apply_payment(PurchaseStatus::Partial, Decimal::new(9000, 2), total, Decimal::new(2000, 2)),
            Err(PaymentRejection::ExceedsBalance)
        );
    }

    #[test]
    fn cancelled_purchase_takes_no_payments() {
        assert_eq!(
            apply_payment(PurchaseStatus::Cancelled, Decimal::ZERO, Decimal::TEN, Decimal::ONE),
            Err(PaymentRejection::Cancelled)
        );
    }
}

// Contra o Postgres real: entrada de estoque, conflitos e isolamento entre tenants
#[cfg(test)]
mod db_tests {
    use super::*;
    use crate::db::testing::{pool_or_skip, seed_product, seed_shop, seed_supplier, stock_of, unique_tag};
    use crate::models::{
        product::Product,
        purchase::{NewProductSpec, PurchaseLine},
    };
    use axum::http::StatusCode;

    fn service() -> PurchaseService {
        PurchaseService::new(PurchaseRepository::new(), ProductRepository::new(), SupplierRepository::new())
    }

    fn purchase(supplier_id: i64, invoice_number: &str, lines: Vec<PurchaseLine>) -> NewPurchase {
        NewPurchase {
            supplier_id,
            invoice_number: invoice_number.to_string(),
            payment_method: Some("transferencia".into()),
            due_date: None,
            lines,
        }
    }

    fn existing(id: i64, quantity: i32, unit_cost: Decimal) -> PurchaseLine {
        PurchaseLine { product: PurchaseProductRef::Existing(id), quantity, unit_cost }
    }

    fn widget(sku: &str) -> PurchaseLine {
        PurchaseLine {
            product: PurchaseProductRef::New(NewProductSpec {
                name: "Widget".into(),
                sku: sku.to_string(),
                price: Decimal::new(20, 1),
            }),
            quantity: 5,
            unit_cost: Decimal::new(20, 1),
        }
    }

    async fn products_with_sku(pool: &PgPool, sku: &str) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE sku = $1")
            .bind(sku)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn purchase_adds_the_quantity_to_stock() {
        let Some(pool) = pool_or_skip().await else { return };
        let shop = seed_shop(&pool).await;
        let supplier = seed_supplier(&pool, shop.tenant).await;
        let product = seed_product(&pool, shop.tenant, 4, Decimal::ONE).await;

        let detail = service()
            .create_purchase(
                &pool,
                shop.tenant,
                shop.user_id,
                &purchase(supplier.id, &format!("FC-{}", unique_tag()), vec![existing(product.id, 6, Decimal::new(150, 2))]),
            )
            .await
            .unwrap();

        assert_eq!(detail.total, Decimal::new(900, 2));
        assert_eq!(detail.status, PurchaseStatus::Pending);
        assert_eq!(detail.items.len(), 1);
        assert_eq!(stock_of(&pool, product.id).await, 10);
    }

    #[tokio::test]
    async fn new_widget_is_created_with_the_purchased_stock() {
        let Some(pool) = pool_or_skip().await else { return };
        let shop = seed_shop(&pool).await;
        let supplier = seed_supplier(&pool, shop.tenant).await;
        let sku = format!("WID-{}", unique_tag());

        let detail = service()
            .create_purchase(
                &pool,
                shop.tenant,
                shop.user_id,
                &purchase(supplier.id, &format!("FC-{}", unique_tag()), vec![widget(&sku)]),
            )
            .await
            .unwrap();

        assert_eq!(detail.total, Decimal::new(100, 1));
        let item = &detail.items[0];
        assert_eq!(item.product_name, "Widget");
        assert_eq!(item.quantity, 5);

        let created = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(item.product_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(created.tenant_id, shop.tenant.get());
        assert_eq!(created.stock, 5);
        assert_eq!(created.price, Decimal::new(20, 1));
        assert_eq!(created.purchase_price, Decimal::new(20, 1));
        assert_eq!(created.sku.as_deref(), Some(sku.as_str()));
    }

    #[tokio::test]
    async fn reused_invoice_number_is_a_conflict() {
        let Some(pool) = pool_or_skip().await else { return };
        let shop = seed_shop(&pool).await;
        let supplier = seed_supplier(&pool, shop.tenant).await;
        let product = seed_product(&pool, shop.tenant, 0, Decimal::ONE).await;
        let number = format!("FC-{}", unique_tag());

        service()
            .create_purchase(&pool, shop.tenant, shop.user_id, &purchase(supplier.id, &number, vec![existing(product.id, 2, Decimal::ONE)]))
            .await
            .unwrap();

        let err = service()
            .create_purchase(&pool, shop.tenant, shop.user_id, &purchase(supplier.id, &number, vec![existing(product.id, 2, Decimal::ONE)]))
            .await
            .unwrap_err();
        assert!(matches!(&err, AppError::InvoiceNumberAlreadyExists(n) if *n == number));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(stock_of(&pool, product.id).await, 2);

        // Mesmo sem a checagem prévia, o índice único barra a duplicata
        let err = PurchaseRepository::new()
            .insert_header(
                &pool,
                shop.tenant,
                &PurchaseHeader {
                    supplier_id: supplier.id,
                    user_id: shop.user_id,
                    invoice_number: &number,
                    total: Decimal::ONE,
                    payment_method: None,
                    due_date: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvoiceNumberAlreadyExists(_)));
    }

    #[tokio::test]
    async fn other_tenant_product_is_forbidden_and_nothing_is_kept() {
        let Some(pool) = pool_or_skip().await else { return };
        let shop = seed_shop(&pool).await;
        let neighbour = seed_shop(&pool).await;
        let supplier = seed_supplier(&pool, shop.tenant).await;
        let foreign = seed_product(&pool, neighbour.tenant, 3, Decimal::ONE).await;
        let sku = format!("WID-{}", unique_tag());

        // O Widget da primeira linha é criado e depois desfeito junto com o resto
        let err = service()
            .create_purchase(
                &pool,
                shop.tenant,
                shop.user_id,
                &purchase(
                    supplier.id,
                    &format!("FC-{}", unique_tag()),
                    vec![widget(&sku), existing(foreign.id, 1, Decimal::ONE)],
                ),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ProductAccessDenied(id) if id == foreign.id));
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(stock_of(&pool, foreign.id).await, 3);
        assert_eq!(products_with_sku(&pool, &sku).await, 0);
    }

    #[tokio::test]
    async fn other_tenant_supplier_is_not_found() {
        let Some(pool) = pool_or_skip().await else { return };
        let shop = seed_shop(&pool).await;
        let neighbour = seed_shop(&pool).await;
        let foreign_supplier = seed_supplier(&pool, neighbour.tenant).await;
        let product = seed_product(&pool, shop.tenant, 1, Decimal::ONE).await;

        let err = service()
            .create_purchase(
                &pool,
                shop.tenant,
                shop.user_id,
                &purchase(foreign_supplier.id, &format!("FC-{}", unique_tag()), vec![existing(product.id, 1, Decimal::ONE)]),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::SupplierNotFound(id) if id == foreign_supplier.id));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(stock_of(&pool, product.id).await, 1);
    }

    #[tokio::test]
    async fn payments_settle_the_purchase_and_overpayment_is_refused() {
        let Some(pool) = pool_or_skip().await else { return };
        let shop = seed_shop(&pool).await;
        let supplier = seed_supplier(&pool, shop.tenant).await;
        let product = seed_product(&pool, shop.tenant, 0, Decimal::ONE).await;

        let detail = service()
            .create_purchase(
                &pool,
                shop.tenant,
                shop.user_id,
                &purchase(supplier.id, &format!("FC-{}", unique_tag()), vec![existing(product.id, 10, Decimal::TEN)]),
            )
            .await
            .unwrap();

        let pay = |amount: Decimal| NewPayment {
            amount,
            payment_method: "efectivo".into(),
            payment_date: None,
            reference: None,
            notes: None,
        };

        let receipt = service()
            .register_payment(&pool, shop.tenant, shop.user_id, detail.id, &pay(Decimal::new(40, 0)))
            .await
            .unwrap();
        assert_eq!(receipt.purchase.status, PurchaseStatus::Partial);
        assert_eq!(receipt.purchase.paid_amount, Decimal::new(40, 0));

        let err = service()
            .register_payment(&pool, shop.tenant, shop.user_id, detail.id, &pay(Decimal::new(61, 0)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PaymentExceedsBalance { .. }));

        let receipt = service()
            .register_payment(&pool, shop.tenant, shop.user_id, detail.id, &pay(Decimal::new(60, 0)))
            .await
            .unwrap();
        assert_eq!(receipt.purchase.status, PurchaseStatus::Paid);
        assert_eq!(receipt.purchase.paid_amount, detail.total);
    }
}

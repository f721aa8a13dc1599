// src/services/invoice_service.rs

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgPool, Postgres};
use std::collections::HashMap;

use crate::{
    common::{error::AppError, pagination::Page},
    db::{InvoiceRepository, ProductRepository},
    models::{
        invoice::{InvoiceDetail, InvoiceListResponse, PricedLine, SaleLine, SalePlan},
        product::Product,
        tenancy::TenantId,
    },
};

const SEARCH_LIMIT: i64 = 20;

#[derive(Clone)]
pub struct InvoiceService {
    invoice_repo: InvoiceRepository,
    product_repo: ProductRepository,
}

impl InvoiceService {
    pub fn new(invoice_repo: InvoiceRepository, product_repo: ProductRepository) -> Self {
        Self { invoice_repo, product_repo }
    }

    // --- CREATE INVOICE (VENDA) ---
    // Tudo numa transação: trava os produtos, valida, grava cabeçalho e itens e baixa
    // o estoque. Qualquer erro desfaz tudo.
    pub async fn create_invoice<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        user_id: i64,
        lines: &[SaleLine],
    ) -> Result<InvoiceDetail, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        if lines.is_empty() {
            return Err(AppError::EmptyItemList);
        }

        let mut tx = executor.begin().await?;

        // 1. Trava os produtos em ordem de id (evita deadlock entre vendas concorrentes)
        let mut ids: Vec<i64> = lines.iter().map(|l| l.product_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let products: HashMap<i64, Product> = self.product_repo
            .lock_for_update(&mut *tx, &ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        // 2. Valida e precifica (sem I/O)
        let plan = plan_sale(tenant_id, lines, &products).inspect_err(|e| {
            tracing::warn!("Venda recusada no tenant {}: {}", tenant_id, e);
        })?;

        // 3. Cabeçalho
        let invoice = self.invoice_repo
            .insert_header(&mut *tx, tenant_id, user_id, plan.total)
            .await?;

        // 4. Itens + baixa condicional do estoque
        for line in &plan.lines {
            let decremented = self.product_repo
                .decrement_stock_if_sufficient(&mut *tx, tenant_id, line.product_id, line.quantity)
                .await?;

            if !decremented {
                return Err(self.shortage(&mut *tx, line).await?);
            }

            self.invoice_repo.insert_item(&mut *tx, invoice.id, line).await?;
        }

        let items = self.invoice_repo.items_for(&mut *tx, invoice.id).await?;

        tx.commit().await?;

        tracing::info!(
            "✅ Nota {} criada no tenant {} ({} itens, total {})",
            invoice.id,
            tenant_id,
            items.len(),
            invoice.total
        );

        Ok(InvoiceDetail::from_parts(invoice, items))
    }

    // Baixa recusada: relê o saldo real para a mensagem de erro
    async fn shortage<'e, E>(&self, executor: E, line: &PricedLine) -> Result<AppError, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let available = self.product_repo
            .lock_for_update(executor, &[line.product_id])
            .await?
            .first()
            .map(|p| p.stock)
            .unwrap_or(0);

        tracing::warn!(
            "Baixa recusada para o produto {}: saldo {}, pedido {}",
            line.product_id,
            available,
            line.quantity
        );
        Ok(AppError::InsufficientStock {
            product_id: line.product_id,
            available,
            requested: line.quantity,
        })
    }

    pub async fn list_invoices(
        &self,
        pool: &PgPool,
        tenant_id: TenantId,
        page: Page,
    ) -> Result<InvoiceListResponse, AppError> {
        let invoices = self.invoice_repo.list(pool, tenant_id, page).await?;
        let total = self.invoice_repo.count(pool, tenant_id).await?;

        Ok(InvoiceListResponse {
            invoices,
            total,
            page: page.page,
            limit: page.limit,
        })
    }

    pub async fn get_invoice(
        &self,
        pool: &PgPool,
        tenant_id: TenantId,
        id: i64,
    ) -> Result<InvoiceDetail, AppError> {
        let invoice = self.invoice_repo
            .find_by_id(pool, tenant_id, id)
            .await?
            .ok_or(AppError::InvoiceNotFound(id))?;

        let items = self.invoice_repo.items_for(pool, invoice.id).await?;
        Ok(InvoiceDetail::from_parts(invoice, items))
    }

    /// Busca para o formulário de venda: nome/SKU contém `q`, ou id igual quando numérico.
    pub async fn search_products<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        query: &str,
    ) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let exact_id = query.parse::<i64>().ok();
        self.product_repo
            .search(executor, tenant_id, query, exact_id, SEARCH_LIMIT)
            .await
    }
}

// ---
// Planejamento da venda
// ---
// Valida cada linha na ordem do pedido: produto existe, é do tenant, quantidade
// positiva e há saldo (descontando linhas anteriores do mesmo produto).
pub(crate) fn plan_sale(
    tenant_id: TenantId,
    lines: &[SaleLine],
    products: &HashMap<i64, Product>,
) -> Result<SalePlan, AppError> {
    if lines.is_empty() {
        return Err(AppError::EmptyItemList);
    }

    let mut consumed: HashMap<i64, i64> = HashMap::new();
    let mut priced = Vec::with_capacity(lines.len());
    let mut total = Decimal::ZERO;

    for line in lines {
        let product = products
            .get(&line.product_id)
            .ok_or(AppError::ProductNotFound(line.product_id))?;

        if product.tenant_id != tenant_id.get() {
            return Err(AppError::ProductAccessDenied(line.product_id));
        }

        if line.quantity <= 0 {
            return Err(AppError::InvalidQuantity { product_id: line.product_id });
        }

        let already = consumed.entry(product.id).or_insert(0);
        let available = i64::from(product.stock) - *already;
        if available < i64::from(line.quantity) {
            return Err(AppError::InsufficientStock {
                product_id: product.id,
                available: available.max(0) as i32,
                requested: line.quantity,
            });
        }
        *already += i64::from(line.quantity);

        let unit_price = product.unit_sale_price();
        let subtotal = unit_price * Decimal::from(line.quantity);
        total += subtotal;

        priced.push(PricedLine {
            product_id: product.id,
            quantity: line.quantity,
            unit_price,
            subtotal,
        });
    }

    Ok(SalePlan { lines: priced, total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::product::sample_product;

    fn catalog(products: Vec<Product>) -> HashMap<i64, Product> {
        products.into_iter().map(|p| (p.id, p)).collect()
    }

    fn line(product_id: i64, quantity: i32) -> SaleLine {
        SaleLine { product_id, quantity }
    }

    #[test]
    fn single_line_sale_is_priced() {
        let tenant = TenantId::for_tests(1);
        let products = catalog(vec![sample_product(1, 1, 10, Decimal::new(50, 1))]);

        let plan = plan_sale(tenant, &[line(1, 3)], &products).unwrap();

        assert_eq!(plan.total, Decimal::new(150, 1));
        assert_eq!(plan.lines.len(), 1);
        assert_eq!(plan.lines[0].subtotal, Decimal::new(150, 1));
        assert_eq!(plan.lines[0].unit_price, Decimal::new(50, 1));
    }

    #[test]
    fn quantity_above_stock_is_a_conflict() {
        let tenant = TenantId::for_tests(1);
        let products = catalog(vec![sample_product(1, 1, 2, Decimal::ONE)]);

        let err = plan_sale(tenant, &[line(1, 3)], &products).unwrap_err();
        assert!(matches!(
            err,
            AppError::InsufficientStock { product_id: 1, available: 2, requested: 3 }
        ));
    }

    #[test]
    fn repeated_product_lines_share_the_stock() {
        let tenant = TenantId::for_tests(1);
        let products = catalog(vec![sample_product(1, 1, 5, Decimal::ONE)]);

        assert!(plan_sale(tenant, &[line(1, 3), line(1, 2)], &products).is_ok());

        let err = plan_sale(tenant, &[line(1, 3), line(1, 3)], &products).unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { available: 2, .. }));
    }

    #[test]
    fn other_tenant_product_is_forbidden() {
        let tenant = TenantId::for_tests(1);
        let products = catalog(vec![sample_product(9, 2, 100, Decimal::ONE)]);

        let err = plan_sale(tenant, &[line(9, 1)], &products).unwrap_err();
        assert!(matches!(err, AppError::ProductAccessDenied(9)));
    }

    #[test]
    fn missing_product_is_not_found() {
        let tenant = TenantId::for_tests(1);
        let err = plan_sale(tenant, &[line(42, 1)], &HashMap::new()).unwrap_err();
        assert!(matches!(err, AppError::ProductNotFound(42)));
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let tenant = TenantId::for_tests(1);
        let products = catalog(vec![sample_product(1, 1, 10, Decimal::ONE)]);

        let err = plan_sale(tenant, &[line(1, 0)], &products).unwrap_err();
        assert!(matches!(err, AppError::InvalidQuantity { product_id: 1 }));
    }

    #[test]
    fn tenant_is_checked_before_quantity() {
        let tenant = TenantId::for_tests(1);
        let products = catalog(vec![sample_product(2, 2, 10, Decimal::ONE)]);

        // Produto de outro tenant com quantidade inválida: o tenant é verificado primeiro
        let err = plan_sale(tenant, &[line(2, -1)], &products).unwrap_err();
        assert!(matches!(err, AppError::ProductAccessDenied(2)));
    }

    #[test]
    fn retail_price_is_preferred() {
        let tenant = TenantId::for_tests(1);
        let mut product = sample_product(1, 1, 10, Decimal::new(500, 2));
        product.retail_price = Decimal::new(800, 2);

        let plan = plan_sale(tenant, &[line(1, 2)], &catalog(vec![product])).unwrap();
        assert_eq!(plan.total, Decimal::new(1600, 2));
    }

    #[test]
    fn empty_request_is_rejected() {
        let tenant = TenantId::for_tests(1);
        assert!(matches!(
            plan_sale(tenant, &[], &HashMap::new()),
            Err(AppError::EmptyItemList)
        ));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Total é a soma dos subtotais e cada subtotal é quantidade × preço unitário.
            #[test]
            fn totals_reconcile(
                prices in prop::collection::vec(0i64..100_000, 1..6),
                quantities in prop::collection::vec((0usize..6, 1i32..50), 1..10),
            ) {
                let tenant = TenantId::for_tests(1);
                let products = catalog(
                    prices
                        .iter()
                        .enumerate()
                        .map(|(i, cents)| sample_product(i as i64 + 1, 1, 10_000, Decimal::new(*cents, 2)))
                        .collect(),
                );
                let lines: Vec<SaleLine> = quantities
                    .iter()
                    .map(|(idx, q)| line((*idx % prices.len()) as i64 + 1, *q))
                    .collect();

                let plan = plan_sale(tenant, &lines, &products).unwrap();

                let sum: Decimal = plan.lines.iter().map(|l| l.subtotal).sum();
                prop_assert_eq!(plan.total, sum);
                for l in &plan.lines {
                    prop_assert_eq!(l.subtotal, l.unit_price * Decimal::from(l.quantity));
                }
            }

            /// Um plano aceito nunca consome mais do que o estoque de cada produto.
            #[test]
            fn accepted_plans_never_oversell(
                stock in 0i32..20,
                quantities in prop::collection::vec(1i32..8, 1..6),
            ) {
                let tenant = TenantId::for_tests(1);
                let products = catalog(vec![sample_product(1, 1, stock, Decimal::ONE)]);
                let lines: Vec<SaleLine> = quantities.iter().map(|q| line(1, *q)).collect();
                let requested: i32 = quantities.iter().sum();

                match plan_sale(tenant, &lines, &products) {
                    Ok(plan) => {
                        let sold: i32 = plan.lines.iter().map(|l| l.quantity).sum();
                        prop_assert!(sold <= stock);
                        prop_assert_eq!(sold, requested);
                    }
                    Err(AppError::InsufficientStock { .. }) => prop_assert!(requested > stock),
                    Err(other) => prop_assert!(false, "erro inesperado: {}", other),
                }
            }
        }
    }
}

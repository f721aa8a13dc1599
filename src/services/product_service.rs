// src/services/product_service.rs

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgPool, Postgres};

use crate::{
    common::{error::AppError, pagination::Page},
    db::ProductRepository,
    models::{
        product::{Product, ProductDraft, ProductListResponse, ProductPatch, UploadResult},
        tenancy::TenantId,
    },
};

#[derive(Clone)]
pub struct ProductService {
    product_repo: ProductRepository,
}

impl ProductService {
    pub fn new(product_repo: ProductRepository) -> Self {
        Self { product_repo }
    }

    pub async fn list_products(
        &self,
        pool: &PgPool,
        tenant_id: TenantId,
        page: Page,
    ) -> Result<ProductListResponse, AppError> {
        let products = self.product_repo.list(pool, tenant_id, page).await?;
        let total = self.product_repo.count(pool, tenant_id).await?;

        Ok(ProductListResponse {
            products,
            total,
            page: page.page,
            limit: page.limit,
        })
    }

    pub async fn create_product<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        draft: ProductDraft,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = self.product_repo.create(executor, tenant_id, &draft).await?;
        tracing::info!("✅ Produto {} criado no tenant {}", product.id, tenant_id);
        Ok(product)
    }

    // Lê, mescla e grava na mesma transação: campos ausentes mantêm o valor atual
    pub async fn update_product<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        id: i64,
        patch: ProductPatch,
    ) -> Result<Product, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self.product_repo
            .find_for_update(&mut *tx, tenant_id, id)
            .await?
            .ok_or(AppError::ProductNotFound(id))?;

        let draft = patch.apply_to(&current);
        let product = self.product_repo
            .update(&mut *tx, tenant_id, id, &draft)
            .await?
            .ok_or(AppError::ProductNotFound(id))?;

        tx.commit().await?;

        tracing::info!("✏️ Produto {} atualizado no tenant {}", product.id, tenant_id);
        Ok(product)
    }

    pub async fn delete_product<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        id: i64,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.product_repo.delete(executor, tenant_id, id).await? {
            return Err(AppError::ProductNotFound(id));
        }
        tracing::info!("🗑️ Produto {} removido do tenant {}", id, tenant_id);
        Ok(())
    }

    /// Importa produtos de um CSV. Cada linha é independente: erros são coletados
    /// e o processamento continua.
    pub async fn upload_products(
        &self,
        pool: &PgPool,
        tenant_id: TenantId,
        content: &[u8],
    ) -> Result<UploadResult, AppError> {
        let rows = match parse_product_csv(content) {
            Some(rows) => rows,
            None => {
                return Ok(UploadResult {
                    imported: 0,
                    errors: vec!["Invalid CSV format".to_string()],
                })
            }
        };

        let mut result = UploadResult::default();
        for row in rows {
            match row {
                Ok(draft) => match self.product_repo.create(pool, tenant_id, &draft).await {
                    Ok(_) => result.imported += 1,
                    Err(e) => {
                        tracing::warn!("Falha ao importar produto '{}': {}", draft.name, e);
                        result.errors.push(format!("Failed to create product: {}", draft.name));
                    }
                },
                Err(msg) => result.errors.push(msg),
            }
        }

        tracing::info!(
            "📦 Importação CSV no tenant {}: {} importados, {} erros",
            tenant_id,
            result.imported,
            result.errors.len()
        );
        Ok(result)
    }
}

// ---
// Parser do CSV (sem I/O)
// ---
// Colunas: name, description, price, stock, sku. Linhas com `#` são comentários.
// `None` = cabeçalho ausente ou com menos de 3 colunas.
pub(crate) fn parse_product_csv(content: &[u8]) -> Option<Vec<Result<ProductDraft, String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(content);

    let mut records = reader.records();

    // 1. Cabeçalho
    match records.next() {
        Some(Ok(header)) if header.len() >= 3 => {}
        _ => return None,
    }

    // 2. Registros
    let rows = records
        .enumerate()
        .map(|(index, record)| {
            let record = record.map_err(|e| format!("Line {}: {e}", index + 2))?;
            // Posição real no arquivo (comentários contam como linha)
            let line = record
                .position()
                .map(|p| p.line())
                .unwrap_or(index as u64 + 2);
            parse_record(&record).map_err(|e| format!("Line {line}: {e}"))
        })
        .collect();

    Some(rows)
}

fn parse_record(record: &csv::StringRecord) -> Result<ProductDraft, String> {
    if record.len() < 3 {
        return Err("Invalid record format".to_string());
    }

    let name = record.get(0).unwrap_or_default().to_string();
    if name.is_empty() {
        return Err("Invalid name: empty".to_string());
    }

    let description = record.get(1).filter(|d| !d.is_empty()).map(str::to_string);

    let raw_price = record.get(2).unwrap_or_default();
    let price: Decimal = raw_price
        .parse()
        .ok()
        .filter(|p: &Decimal| !p.is_sign_negative())
        .ok_or_else(|| format!("Invalid price: {raw_price}"))?;

    // Estoque ilegível ou negativo vira 0
    let stock = record
        .get(3)
        .and_then(|s| s.parse::<i32>().ok())
        .filter(|s| *s >= 0)
        .unwrap_or(0);

    let sku = record.get(4).filter(|s| !s.is_empty()).map(str::to_string);

    Ok(ProductDraft {
        name,
        description,
        price,
        purchase_price: Decimal::ZERO,
        retail_price: price,
        wholesale_price: None,
        min_wholesale_quantity: None,
        stock,
        sku,
    })
}


#[cfg(test)]
mod db_tests {
    use super::*;
    use crate::db::testing::{pool_or_skip, seed_product, seed_shop};

    fn edit(name: &str, price: Decimal) -> ProductPatch {
        ProductPatch {
            name: name.into(),
            description: None,
            price,
            stock: Some(5),
            sku: Some("SKU-1".into()),
            purchase_price: None,
            retail_price: None,
            wholesale_price: None,
            min_wholesale_quantity: None,
        }
    }

    #[tokio::test]
    async fn edit_keeps_the_prices_it_does_not_mention() {
        let Some(pool) = pool_or_skip().await else { return };
        let shop = seed_shop(&pool).await;
        let product = seed_product(&pool, shop.tenant, 20, Decimal::new(800, 2)).await;
        sqlx::query(
            "UPDATE products SET purchase_price = 3.50, retail_price = 11.00, \
             wholesale_price = 7.25, min_wholesale_quantity = 6 WHERE id = $1",
        )
        .bind(product.id)
        .execute(&pool)
        .await
        .unwrap();

        let updated = ProductService::new(ProductRepository::new())
            .update_product(&pool, shop.tenant, product.id, edit("Widget", Decimal::new(900, 2)))
            .await
            .unwrap();

        assert_eq!(updated.name, "Widget");
        assert_eq!(updated.price, Decimal::new(900, 2));
        assert_eq!(updated.stock, 5);
        assert_eq!(updated.sku.as_deref(), Some("SKU-1"));
        assert_eq!(updated.purchase_price, Decimal::new(350, 2));
        assert_eq!(updated.retail_price, Decimal::new(1100, 2));
        assert_eq!(updated.wholesale_price, Some(Decimal::new(725, 2)));
        assert_eq!(updated.min_wholesale_quantity, Some(6));
    }

    #[tokio::test]
    async fn other_tenant_product_cannot_be_edited() {
        let Some(pool) = pool_or_skip().await else { return };
        let shop = seed_shop(&pool).await;
        let neighbour = seed_shop(&pool).await;
        let foreign = seed_product(&pool, neighbour.tenant, 2, Decimal::ONE).await;

        let err = ProductService::new(ProductRepository::new())
            .update_product(&pool, shop.tenant, foreign.id, edit("Roubado", Decimal::ONE))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ProductNotFound(id) if id == foreign.id));
    }
}

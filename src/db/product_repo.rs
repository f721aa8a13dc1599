// src/db/product_repo.rs

use sqlx::{Executor, Postgres};

use crate::{
    common::{error::AppError, pagination::Page},
    models::{
        product::{Product, ProductDraft},
        tenancy::TenantId,
    },
};

#[derive(Clone, Default)]
pub struct ProductRepository;

impl ProductRepository {
    pub fn new() -> Self {
        Self
    }

    // ---
    // Funções de "Leitura"
    // ---

    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        page: Page,
    ) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
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
        Ok(products)
    }

    pub async fn count<'e, E>(&self, executor: E, tenant_id: TenantId) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE tenant_id = $1")
            .bind(tenant_id.get())
            .fetch_one(executor)
            .await?;
        Ok(total)
    }

    /// Trava as linhas dos produtos pedidos (em ordem de id) para a transação corrente.
    /// Não filtra por tenant: o fluxo distingue "não existe" de "é de outro tenant".
    pub async fn lock_for_update<'e, E>(
        &self,
        executor: E,
        ids: &[i64],
    ) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(ids)
        .fetch_all(executor)
        .await?;
        Ok(products)
    }

    /// Produto do tenant, travado até o fim da transação (edição com merge).
    pub async fn find_for_update<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        id: i64,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = $1 AND tenant_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(tenant_id.get())
        .fetch_optional(executor)
        .await?;
        Ok(product)
    }

    /// Busca por nome/SKU (contém, sem diferenciar maiúsculas) ou id exato.
    pub async fn search<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        query: &str,
        exact_id: Option<i64>,
        limit: i64,
    ) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pattern = format!("%{}%", escape_like(query));
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE tenant_id = $1
              AND (name ILIKE $2 ESCAPE '\' OR sku ILIKE $2 ESCAPE '\' OR id = $3)
            ORDER BY name ASC
            LIMIT $4
            "#,
        )
        .bind(tenant_id.get())
        .bind(pattern)
        .bind(exact_id)
        .bind(limit)
        .fetch_all(executor)
        .await?;
        Ok(products)
    }

    // ---
    // Funções de "Escrita" (Transacionais)
    // ---

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        draft: &ProductDraft,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                tenant_id, name, description, price, purchase_price, retail_price,
                wholesale_price, min_wholesale_quantity, stock, sku
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(tenant_id.get())
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(draft.purchase_price)
        .bind(draft.retail_price)
        .bind(draft.wholesale_price)
        .bind(draft.min_wholesale_quantity)
        .bind(draft.stock)
        .bind(&draft.sku)
        .fetch_one(executor)
        .await?;
        Ok(product)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        id: i64,
        draft: &ProductDraft,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = $3, description = $4, price = $5, purchase_price = $6,
                retail_price = $7, wholesale_price = $8, min_wholesale_quantity = $9,
                stock = $10, sku = $11, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id.get())
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(draft.purchase_price)
        .bind(draft.retail_price)
        .bind(draft.wholesale_price)
        .bind(draft.min_wholesale_quantity)
        .bind(draft.stock)
        .bind(&draft.sku)
        .fetch_optional(executor)
        .await?;
        Ok(product)
    }

    /// Retorna `false` quando o produto não existe no tenant.
    pub async fn delete<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        id: i64,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM products WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id.get())
            .execute(executor)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_foreign_key_violation() {
                        return AppError::ProductInUse(id);
                    }
                }
                AppError::from(e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    /// Baixa condicional: só decrementa se houver saldo. `false` = nada foi alterado.
    pub async fn decrement_stock_if_sufficient<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        id: i64,
        quantity: i32,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - $3, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND stock >= $3
            "#,
        )
        .bind(id)
        .bind(tenant_id.get())
        .bind(quantity)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn increment_stock<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        id: i64,
        quantity: i32,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + $3, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(id)
        .bind(tenant_id.get())
        .bind(quantity)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

// `%` e `_` digitados pelo usuário são literais na busca
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("plain"), "plain");
    }
}

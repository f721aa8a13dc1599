// src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

// --- Produto (catálogo + saldo de estoque) ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub tenant_id: i64,
    pub name: String,
    pub description: Option<String>,
    // Preço "legado", usado quando não há preço de varejo
    pub price: Decimal,
    pub purchase_price: Decimal,
    pub retail_price: Decimal,
    pub wholesale_price: Option<Decimal>,
    pub min_wholesale_quantity: Option<i32>,
    pub stock: i32,
    pub sku: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Preço de venda unitário: varejo quando > 0, senão o preço legado.
    pub fn unit_sale_price(&self) -> Decimal {
        if self.retail_price > Decimal::ZERO {
            self.retail_price
        } else {
            self.price
        }
    }
}

// Dados para inserir/atualizar um produto, já validados pelo handler/serviço.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub purchase_price: Decimal,
    pub retail_price: Decimal,
    pub wholesale_price: Option<Decimal>,
    pub min_wholesale_quantity: Option<i32>,
    pub stock: i32,
    pub sku: Option<String>,
}

// Edição de produto: nome e preço sempre vêm; o resto, quando ausente, fica como está.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPatch {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: Option<i32>,
    pub sku: Option<String>,
    pub purchase_price: Option<Decimal>,
    pub retail_price: Option<Decimal>,
    pub wholesale_price: Option<Decimal>,
    pub min_wholesale_quantity: Option<i32>,
}

impl ProductPatch {
    /// Mescla com o produto gravado. Descrição e SKU em branco não apagam o valor atual.
    pub fn apply_to(&self, current: &Product) -> ProductDraft {
        fn keep_unless_blank(patch: &Option<String>, current: &Option<String>) -> Option<String> {
            match patch.as_deref().map(str::trim) {
                Some(v) if !v.is_empty() => Some(v.to_string()),
                _ => current.clone(),
            }
        }

        ProductDraft {
            name: self.name.trim().to_string(),
            description: keep_unless_blank(&self.description, &current.description),
            price: self.price,
            purchase_price: self.purchase_price.unwrap_or(current.purchase_price),
            retail_price: self.retail_price.unwrap_or(current.retail_price),
            wholesale_price: self.wholesale_price.or(current.wholesale_price),
            min_wholesale_quantity: self.min_wholesale_quantity.or(current.min_wholesale_quantity),
            stock: self.stock.unwrap_or(current.stock),
            sku: keep_unless_blank(&self.sku, &current.sku),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// Resultado da importação por planilha: linhas importadas + erros por linha
#[derive(Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub imported: usize,
    pub errors: Vec<String>,
}

#[cfg(test)]
pub(crate) fn sample_product(id: i64, tenant_id: i64, stock: i32, price: Decimal) -> Product {
    let now = Utc::now();
    Product {
        id,
        tenant_id,
        name: format!("Produto {id}"),
        description: None,
        price,
        purchase_price: Decimal::ZERO,
        retail_price: Decimal::ZERO,
        wholesale_price: None,
        min_wholesale_quantity: None,
        stock,
        sku: None,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retail_price_wins_when_positive() {
        let mut p = sample_product(1, 1, 10, Decimal::new(500, 2));
        p.retail_price = Decimal::new(750, 2);
        assert_eq!(p.unit_sale_price(), Decimal::new(750, 2));
    }

    #[test]
    fn legacy_price_is_used_without_retail() {
        let p = sample_product(1, 1, 10, Decimal::new(500, 2));
        assert_eq!(p.unit_sale_price(), Decimal::new(500, 2));
    }

    fn priced_product() -> Product {
        let mut p = sample_product(7, 1, 12, Decimal::new(900, 2));
        p.description = Some("Caja x12".into());
        p.sku = Some("SKU-OLD".into());
        p.purchase_price = Decimal::new(350, 2);
        p.retail_price = Decimal::new(1100, 2);
        p.wholesale_price = Some(Decimal::new(800, 2));
        p.min_wholesale_quantity = Some(6);
        p
    }

    fn patch(name: &str, price: Decimal) -> ProductPatch {
        ProductPatch {
            name: name.into(),
            description: None,
            price,
            stock: None,
            sku: None,
            purchase_price: None,
            retail_price: None,
            wholesale_price: None,
            min_wholesale_quantity: None,
        }
    }

    #[test]
    fn update_without_prices_keeps_stored_values() {
        let current = priced_product();
        let draft = patch("Widget", Decimal::new(950, 2)).apply_to(&current);

        assert_eq!(draft.name, "Widget");
        assert_eq!(draft.price, Decimal::new(950, 2));
        assert_eq!(draft.purchase_price, Decimal::new(350, 2));
        assert_eq!(draft.retail_price, Decimal::new(1100, 2));
        assert_eq!(draft.wholesale_price, Some(Decimal::new(800, 2)));
        assert_eq!(draft.min_wholesale_quantity, Some(6));
        assert_eq!(draft.stock, 12);
        assert_eq!(draft.description.as_deref(), Some("Caja x12"));
        assert_eq!(draft.sku.as_deref(), Some("SKU-OLD"));
    }

    #[test]
    fn given_fields_replace_stored_values() {
        let mut changes = patch("Widget", Decimal::ONE);
        changes.stock = Some(0);
        changes.sku = Some(" SKU-NEW ".into());
        changes.description = Some("   ".into());
        changes.retail_price = Some(Decimal::new(150, 2));
        changes.purchase_price = Some(Decimal::ZERO);

        let draft = changes.apply_to(&priced_product());
        assert_eq!(draft.stock, 0);
        assert_eq!(draft.sku.as_deref(), Some("SKU-NEW"));
        assert_eq!(draft.description.as_deref(), Some("Caja x12"));
        assert_eq!(draft.retail_price, Decimal::new(150, 2));
        assert_eq!(draft.purchase_price, Decimal::ZERO);
        assert_eq!(draft.wholesale_price, Some(Decimal::new(800, 2)));
    }
}

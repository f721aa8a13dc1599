// src/services/supplier_service.rs

use sqlx::{Acquire, Executor, PgPool, Postgres};

use crate::{
    common::{error::AppError, pagination::Page},
    db::SupplierRepository,
    models::{
        supplier::{NewSupplier, Supplier, SupplierListResponse, SupplierPatch},
        tenancy::TenantId,
    },
};

#[derive(Clone)]
pub struct SupplierService {
    supplier_repo: SupplierRepository,
}

impl SupplierService {
    pub fn new(supplier_repo: SupplierRepository) -> Self {
        Self { supplier_repo }
    }

    pub async fn create_supplier<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        supplier: NewSupplier,
    ) -> Result<Supplier, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let supplier = normalize(supplier);
        if supplier.name.is_empty() {
            return Err(AppError::field("name", "required"));
        }

        let created = self.supplier_repo.create(executor, tenant_id, &supplier).await?;
        tracing::info!("✅ Fornecedor {} criado no tenant {}", created.id, tenant_id);
        Ok(created)
    }

    pub async fn list_suppliers(
        &self,
        pool: &PgPool,
        tenant_id: TenantId,
        page: Page,
    ) -> Result<SupplierListResponse, AppError> {
        let suppliers = self.supplier_repo.list(pool, tenant_id, page).await?;
        let total = self.supplier_repo.count(pool, tenant_id).await?;

        Ok(SupplierListResponse {
            suppliers,
            total,
            page: page.page,
            limit: page.limit,
        })
    }

    /// Atualização parcial. Inexistente → 404; de outro tenant → 403.
    pub async fn update_supplier<'e, E>(
        &self,
        executor: E,
        tenant_id: TenantId,
        id: i64,
        patch: SupplierPatch,
    ) -> Result<Supplier, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self.supplier_repo
            .find_any(&mut *tx, id)
            .await?
            .ok_or(AppError::SupplierNotFound(id))?;

        if current.tenant_id != tenant_id.get() {
            tracing::warn!("Tenant {} tentou alterar o fornecedor {}", tenant_id, id);
            return Err(AppError::SupplierAccessDenied(id));
        }

        let merged = patch.apply_to(&current);
        let updated = self.supplier_repo.update(&mut *tx, tenant_id, id, &merged).await?;

        tx.commit().await?;
        Ok(updated)
    }
}

// Campos opcionais em branco viram NULL
fn normalize(supplier: NewSupplier) -> NewSupplier {
    fn clean(value: Option<String>) -> Option<String> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    NewSupplier {
        name: supplier.name.trim().to_string(),
        email: clean(supplier.email),
        phone: clean(supplier.phone),
        address: clean(supplier.address),
        tax_id: clean(supplier.tax_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_optional_fields_become_null() {
        let supplier = normalize(NewSupplier {
            name: "  Sur  ".into(),
            email: Some("".into()),
            phone: Some(" 555 ".into()),
            address: None,
            tax_id: Some("   ".into()),
        });

        assert_eq!(supplier.name, "Sur");
        assert_eq!(supplier.email, None);
        assert_eq!(supplier.phone.as_deref(), Some("555"));
        assert_eq!(supplier.tax_id, None);
    }
}

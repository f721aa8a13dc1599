// src/models/supplier.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: i64,
    pub tenant_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewSupplier {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
}

// Atualização parcial: `None` mantém o valor, `Some("")` limpa o campo opcional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupplierPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
}

impl SupplierPatch {
    /// Aplica o patch sobre o fornecedor atual. Nome vazio mantém o antigo.
    pub fn apply_to(&self, current: &Supplier) -> NewSupplier {
        fn merge(patch: &Option<String>, current: &Option<String>) -> Option<String> {
            match patch {
                None => current.clone(),
                Some(v) if v.trim().is_empty() => None,
                Some(v) => Some(v.trim().to_string()),
            }
        }

        let name = match &self.name {
            Some(n) if !n.trim().is_empty() => n.trim().to_string(),
            _ => current.name.clone(),
        };

        NewSupplier {
            name,
            email: merge(&self.email, &current.email),
            phone: merge(&self.phone, &current.phone),
            address: merge(&self.address, &current.address),
            tax_id: merge(&self.tax_id, &current.tax_id),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierListResponse {
    pub suppliers: Vec<Supplier>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current() -> Supplier {
        let now = Utc::now();
        Supplier {
            id: 1,
            tenant_id: 1,
            name: "Distribuidora Sur".into(),
            email: Some("ventas@sur.com".into()),
            phone: Some("555-1234".into()),
            address: None,
            tax_id: Some("30-1".into()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn absent_fields_keep_current_values() {
        let merged = SupplierPatch::default().apply_to(&current());
        assert_eq!(merged.name, "Distribuidora Sur");
        assert_eq!(merged.email.as_deref(), Some("ventas@sur.com"));
        assert_eq!(merged.tax_id.as_deref(), Some("30-1"));
    }

    #[test]
    fn empty_strings_clear_optional_fields() {
        let patch = SupplierPatch {
            email: Some(String::new()),
            phone: Some("  ".into()),
            ..Default::default()
        };
        let merged = patch.apply_to(&current());
        assert_eq!(merged.email, None);
        assert_eq!(merged.phone, None);
    }

    #[test]
    fn empty_name_keeps_old_name() {
        let patch = SupplierPatch {
            name: Some(String::new()),
            address: Some("Calle 1".into()),
            ..Default::default()
        };
        let merged = patch.apply_to(&current());
        assert_eq!(merged.name, "Distribuidora Sur");
        assert_eq!(merged.address.as_deref(), Some("Calle 1"));
    }
}

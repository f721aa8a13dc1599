// src/models/tenancy.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use std::fmt;
use utoipa::ToSchema;

use crate::models::auth::Claims;

// ---
// 1. Tenant (O "Estabelecimento")
// ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub domain: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    // Um tenant recém-criado já é uma credencial válida para escrever nele.
    pub fn tenant_id(&self) -> TenantId {
        TenantId(self.id)
    }
}

// ---
// 2. TenantId (A "credencial" de tenant)
// ---
// O campo é privado: só sai de um token verificado, de um Tenant lido do banco
// ou dos testes. Repositórios de tabelas por tenant exigem este tipo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TenantId(i64);

impl TenantId {
    pub(crate) fn from_claims(claims: &Claims) -> Self {
        TenantId(claims.tenant_id)
    }

    pub fn get(self) -> i64 {
        self.0
    }

    #[cfg(test)]
    pub fn for_tests(id: i64) -> Self {
        TenantId(id)
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

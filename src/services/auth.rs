// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{TenantRepository, UserRepository},
    models::auth::{AuthResponse, Claims, Role, User},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    tenant_repo: TenantRepository,
    jwt_secret: String,
    jwt_expiration_hours: i64,
    pool: PgPool,
}

// Dados já validados pelo handler para criar um usuário
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub name: &'a str,
    pub role: &'a str,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        tenant_repo: TenantRepository,
        jwt_secret: String,
        jwt_expiration_hours: i64,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, tenant_repo, jwt_secret, jwt_expiration_hours, pool }
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        if email.trim().is_empty() {
            return Err(AppError::field("email", "required"));
        }
        if password.is_empty() {
            return Err(AppError::field("password", "required"));
        }

        let user = self.user_repo
            .find_by_email(email.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))?
        ?;

        if !is_password_valid {
            tracing::warn!("Login recusado para {}", user.email);
            return Err(AppError::InvalidCredentials);
        }

        let token = self.create_token(&user)?;
        tracing::info!("✅ Login de {} (tenant {})", user.email, user.tenant_id);

        Ok(AuthResponse {
            token,
            tenant_id: user.tenant_id,
            user,
        })
    }

    pub async fn me(&self, user_id: i64) -> Result<User, AppError> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    /// Cria o usuário e um tenant novo só para ele, na mesma transação.
    pub async fn create_user(&self, new_user: NewUser<'_>) -> Result<User, AppError> {
        let role: Role = new_user.role.parse()?;
        let email = new_user.email.trim().to_lowercase();

        // 1. Hashing (fora da transação, pois não toca no banco)
        let password_clone = new_user.password.to_owned();
        let hashed_password = tokio::task::spawn_blocking(move || {
            hash(&password_clone, bcrypt::DEFAULT_COST)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))?
        ?;

        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        // 2. E-mail duplicado
        if self.user_repo.email_exists(&mut *tx, &email).await? {
            return Err(AppError::EmailAlreadyExists);
        }

        // 3. Tenant ("<nome> - <email>", domínio do e-mail, slug único)
        let tenant_name = format!("{} - {}", new_user.name.trim(), email);
        let domain = email_domain(&email);
        let mut slug = build_tenant_slug(&email, Utc::now());
        if self.tenant_repo.slug_exists(&mut *tx, &slug).await? {
            let suffix = uuid::Uuid::new_v4().simple().to_string();
            slug = format!("{}-{}", slug, &suffix[..8]);
        }

        let tenant = self.tenant_repo
            .create_tenant(&mut *tx, &tenant_name, &slug, domain)
            .await?;

        // 4. Usuário ligado ao novo tenant
        let user = self.user_repo
            .create_user(
                &mut *tx,
                tenant.tenant_id(),
                &email,
                &hashed_password,
                new_user.name.trim(),
                role,
            )
            .await?;

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        tracing::info!(
            "✅ Usuário {} criado com o tenant {} (slug: {})",
            user.email,
            tenant.id,
            tenant.slug
        );
        Ok(user)
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(token_data.claims)
    }

    pub fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::hours(self.jwt_expiration_hours);

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            tenant_id: user.tenant_id,
            role: user.role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

fn email_domain(email: &str) -> Option<&str> {
    email.split_once('@').map(|(_, domain)| domain).filter(|d| !d.is_empty())
}

// "Joao.Silva@Acme.com" -> "joao-silva-acme-com-20250102-030405"
fn build_tenant_slug(email: &str, now: DateTime<Utc>) -> String {
    let lowered = email.to_lowercase();
    let (local, domain) = lowered.split_once('@').unwrap_or((lowered.as_str(), ""));

    let clean = |s: &str| s.replace(['.', '_', ' '], "-");
    let timestamp = now.format("%Y%m%d-%H%M%S");

    if domain.is_empty() {
        format!("{}-{}", clean(local), timestamp)
    } else {
        format!("{}-{}-{}", clean(local), clean(domain), timestamp)
    }
}

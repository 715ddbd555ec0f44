use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::error::{AppError, AppResult};
use crate::models::{LoginRequest, Role, TokenResponse, UserCreate, UserModel, UserResponse};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
    jwt_secret: String,
    token_ttl_minutes: i64,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt_secret: String, token_ttl_minutes: i64) -> Self {
        Self {
            pool,
            jwt_secret,
            token_ttl_minutes,
        }
    }

    fn hash_password(password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    fn verify_password(password: &str, hashed: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hashed) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    fn issue_jwt(&self, user: &UserModel) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + chrono::Duration::minutes(self.token_ttl_minutes);
        let claims = Claims {
            sub: user.id.to_string(),
            role: user.role.as_str().to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("JWT error: {}", e)))
    }

    /// Resolves a bearer token to its claims, or nothing if invalid/expired.
    pub fn decode_token(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .ok()
        .map(|data| data.claims)
    }

    pub async fn register(&self, data: UserCreate) -> AppResult<UserResponse> {
        if data.username.trim().len() < 3 {
            return Err(AppError::InvalidInput(
                "username must be at least 3 characters".to_string(),
            ));
        }
        if data.password.len() < 6 {
            return Err(AppError::InvalidInput(
                "password must be at least 6 characters".to_string(),
            ));
        }
        if !data.email.contains('@') {
            return Err(AppError::InvalidInput("invalid email address".to_string()));
        }

        let hashed = Self::hash_password(&data.password)?;
        let mut conn = self.pool.acquire().await?;
        let user = db::users::insert(
            &mut conn,
            data.username.trim(),
            data.email.trim(),
            &hashed,
            data.role.unwrap_or(Role::Operator),
        )
        .await?;
        Ok(user.into())
    }

    pub async fn login(&self, data: LoginRequest) -> AppResult<TokenResponse> {
        let mut conn = self.pool.acquire().await?;
        let user = db::users::get_by_username(&mut conn, &data.username).await?;

        let Some(user) = user else {
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        };
        if !Self::verify_password(&data.password, &user.hashed_password) {
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }
        if !user.is_active {
            return Err(AppError::Forbidden("Account disabled".to_string()));
        }

        let token = self.issue_jwt(&user)?;
        Ok(TokenResponse::bearer(token))
    }

    pub async fn get_user(&self, user_id: Uuid) -> AppResult<UserModel> {
        let mut conn = self.pool.acquire().await?;
        db::users::get_by_id(&mut conn, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Creates the default admin account if no user named "admin" exists.
    pub async fn seed_default_admin(&self) -> AppResult<()> {
        let mut conn = self.pool.acquire().await?;
        if db::users::get_by_username(&mut conn, "admin").await?.is_some() {
            return Ok(());
        }
        let hashed = Self::hash_password("admin123")?;
        db::users::insert(&mut conn, "admin", "admin@nexus.local", &hashed, Role::Admin).await?;
        tracing::warn!("seeded default admin account; change its password");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = AuthService::hash_password("hunter42").unwrap();
        assert!(AuthService::verify_password("hunter42", &hash));
        assert!(!AuthService::verify_password("hunter43", &hash));
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        assert!(!AuthService::verify_password("hunter42", "not-a-phc-string"));
    }

    #[test]
    fn jwt_claims_round_trip() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            role: "operator".to_string(),
            exp: now + 3600,
            iat: now,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(decoded.claims.sub, claims.sub);
        assert_eq!(decoded.claims.role, "operator");
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            role: "viewer".to_string(),
            exp: now - 3600,
            iat: now - 7200,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let result = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::default(),
        );
        assert!(result.is_err());
    }
}

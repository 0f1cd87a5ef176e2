use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::{
    db::admin_store::AdminStore,
    error::{AppError, Result},
    models::admin::{AdminClaims, LoginRequest, LoginResponse},
};

/// Hash a plain-text password with Argon2 and a random salt
pub fn hash_password(password: &str) -> Result<String> {
    if password.is_empty() {
        return Err(AppError::Validation("Password cannot be empty.".into()));
    }

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Check a plain-text password against a stored Argon2 hash
pub fn verify_password(password_hash: &str, password: &str) -> Result<bool> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| AppError::Internal(format!("Invalid stored password hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::Internal(format!("Password verification failed: {}", e))),
    }
}

/// Admin login and token validation
#[derive(Clone)]
pub struct AuthService {
    admins: AdminStore,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_lifetime: Duration,
}

impl AuthService {
    pub fn new(admins: AdminStore, jwt_secret: &str, expiration_hours: i64) -> Self {
        Self {
            admins,
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            token_lifetime: Duration::hours(expiration_hours),
        }
    }

    /// Verify credentials and issue a signed token
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        let invalid = || AppError::Auth("Invalid username or password.".into());

        let admin = self
            .admins
            .find_by_username(request.username.trim())
            .await?
            .ok_or_else(invalid)?;

        if request.password.is_empty() || !verify_password(&admin.password_hash, &request.password)? {
            tracing::warn!(username = %admin.username, "Rejected admin login");
            return Err(invalid());
        }

        let expires_at = Utc::now() + self.token_lifetime;
        let claims = AdminClaims {
            sub: admin.id,
            username: admin.username.clone(),
            role: admin.role.clone(),
            exp: expires_at.timestamp().max(0) as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token encoding failed: {}", e)))?;

        tracing::info!(username = %admin.username, "Admin logged in");
        Ok(LoginResponse {
            token,
            username: admin.username,
            role: admin.role,
            expires_at,
        })
    }

    /// Decode and validate a bearer token
    pub fn verify_token(&self, token: &str) -> Result<AdminClaims> {
        decode::<AdminClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AppError::Auth("Invalid or expired token.".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("s3cret").unwrap();
        assert!(verify_password(&hash, "s3cret").unwrap());
        assert!(!verify_password(&hash, "wrong").unwrap());
    }

    #[test]
    fn test_empty_password_is_rejected() {
        assert!(matches!(hash_password(""), Err(AppError::Validation(_))));
    }
}

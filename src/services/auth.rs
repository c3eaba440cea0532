//! Credential checks and bearer tokens.
//!
//! Users authenticate with HTTP Basic credentials (bcrypt-hashed passwords)
//! or with a signed JWT obtained from `POST /token/`.

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::{
    config::JwtConfig,
    error::{AppError, AppResult},
    models::User,
};

const INVALID_CREDENTIALS: &str = "Invalid username/password.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Splits a `Basic` authorization value into username and password.
pub fn parse_basic(value: &str) -> Option<(String, String)> {
    let encoded = value.strip_prefix("Basic ")?.trim();
    let decoded = general_purpose::STANDARD.decode(encoded).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let (username, password) = credentials.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

pub fn parse_bearer(value: &str) -> Option<&str> {
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub async fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("password hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

async fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    // bcrypt is deliberately slow; keep it off the async workers
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("password check task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("password check failed: {e}")))
}

/// Looks up an active user by username and checks the password.
pub async fn authenticate(pool: &PgPool, username: &str, password: &str) -> AppResult<User> {
    let user = User::find_active_by_username(pool, username)
        .await?
        .ok_or_else(|| AppError::Unauthenticated(INVALID_CREDENTIALS.to_string()))?;

    if !verify_password(password, &user.password_hash).await? {
        tracing::info!(username, "password mismatch");
        return Err(AppError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
    }
    Ok(user)
}

pub fn issue_token(config: &JwtConfig, user: &User) -> AppResult<IssuedToken> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(config.expires_in_hours);
    let claims = Claims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))?;

    Ok(IssuedToken { token, expires_at })
}

pub fn decode_token(config: &JwtConfig, token: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthenticated(format!("Invalid token: {e}")))
}

/// Resolves a bearer token to the active user it was issued for.
pub async fn user_from_token(pool: &PgPool, config: &JwtConfig, token: &str) -> AppResult<User> {
    let claims = decode_token(config, token)?;
    let user_id: i64 = claims
        .sub
        .parse()
        .map_err(|_| AppError::Unauthenticated("Invalid token subject.".to_string()))?;

    User::find_active_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::Unauthenticated("User inactive or deleted.".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
            expires_in_hours: 1,
        }
    }

    fn user() -> User {
        User {
            id: 42,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: String::new(),
            is_active: true,
            date_joined: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn parses_basic_credentials() {
        let value = format!("Basic {}", general_purpose::STANDARD.encode("alice:s3cr:et"));
        assert_eq!(
            parse_basic(&value),
            Some(("alice".to_string(), "s3cr:et".to_string()))
        );
    }

    #[test]
    fn rejects_malformed_basic_credentials() {
        assert_eq!(parse_basic("Basic !!!not-base64"), None);
        assert_eq!(parse_basic(&format!("Basic {}", general_purpose::STANDARD.encode("no-colon"))), None);
        assert_eq!(parse_basic("Bearer abc"), None);
    }

    #[test]
    fn parses_bearer_token() {
        assert_eq!(parse_bearer("Bearer abc.def"), Some("abc.def"));
        assert_eq!(parse_bearer("Bearer   "), None);
        assert_eq!(parse_bearer("Basic abc"), None);
    }

    #[test]
    fn issued_token_carries_user_identity() {
        let config = jwt("secret");
        let issued = issue_token(&config, &user()).unwrap();
        let claims = decode_token(&config, &issued.token).unwrap();

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issued = issue_token(&jwt("one"), &user()).unwrap();
        let err = decode_token(&jwt("two"), &issued.token).unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = jwt("secret");
        let past = Utc::now() - Duration::hours(3);
        let claims = Claims {
            sub: "42".to_string(),
            username: "alice".to_string(),
            iat: past.timestamp(),
            exp: (past + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        assert!(matches!(
            decode_token(&config, &token),
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn verifies_bcrypt_hashes() {
        let hash = hash_password("correct horse", 4).await.unwrap();
        assert!(verify_password("correct horse", &hash).await.unwrap());
        assert!(!verify_password("battery staple", &hash).await.unwrap());
    }
}

//! Credential hashing and session tokens.
//!
//! Passwords are stored as bcrypt hashes and never compared in plaintext.
//! Sessions are stateless HS256 JWTs signed with the configured secret; the
//! server validates signature and expiry on every authenticated request.

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::models::{SessionClaims, User};

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password, DEFAULT_COST)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password, hash)
}

pub fn create_session_token(
    user: &User,
    secret: &[u8],
    ttl_secs: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let exp = (Utc::now() + Duration::seconds(ttl_secs)).timestamp() as usize;
    let claims = SessionClaims {
        sub: user.id,
        name: user.username.clone(),
        exp,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
}

pub fn validate_session_token(
    token: &str,
    secret: &[u8],
) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
    let token_data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn demo_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            credential_hash: String::new(),
        }
    }

    #[test]
    fn password_hash_round_trip() {
        let hashed = hash_password("hunter2").expect("hash");
        assert!(verify_password("hunter2", &hashed).expect("verify"));
        assert!(!verify_password("hunter3", &hashed).expect("verify"));
    }

    #[test]
    fn token_round_trip_carries_identity() {
        let user = demo_user();
        let token = create_session_token(&user, b"secret", 60).expect("token");
        let claims = validate_session_token(&token, b"secret").expect("claims");
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.name, "alice");
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = create_session_token(&demo_user(), b"secret", 60).expect("token");
        assert!(validate_session_token(&token, b"not-the-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        // jsonwebtoken applies a 60s default leeway; go well past it.
        let token = create_session_token(&demo_user(), b"secret", -120).expect("token");
        assert!(validate_session_token(&token, b"secret").is_err());
    }
}

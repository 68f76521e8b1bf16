use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// Bcrypt hash; the plaintext credential is never stored.
    pub credential_hash: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
}

/// JWT claims carried by a session token.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SessionClaims {
    pub sub: Uuid,    // user id
    pub name: String, // username at issue time
    pub exp: usize,
}

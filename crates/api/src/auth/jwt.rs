//! JWT access-token generation/validation and refresh-token helpers.
//!
//! Access tokens are RS256-signed JWTs containing a [`Claims`] payload.
//! The private key never leaves this service; any holder of the public key
//! can verify tokens. Refresh tokens are opaque UUIDs; only their SHA-256
//! hash is stored server-side so a database leak does not compromise
//! active sessions.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// JWT claims embedded in every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the principal's username.
    pub sub: String,
    /// Stored-form role names (e.g. `["ROLE_ADMIN"]`).
    pub roles: Vec<String>,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
}

/// Configuration for JWT signing and lifetimes.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Path to the RSA private key (PKCS#8 PEM).
    pub private_key_path: String,
    /// Path to the RSA public key (PEM).
    pub public_key_path: String,
    /// Access token lifetime in milliseconds (default: 15 minutes).
    pub access_ttl_ms: i64,
    /// Refresh token lifetime in milliseconds (default: 7 days).
    pub refresh_ttl_ms: i64,
}

/// Default access token expiry: 15 minutes.
const DEFAULT_ACCESS_TTL_MS: i64 = 900_000;
/// Default refresh token expiry: 7 days.
const DEFAULT_REFRESH_TTL_MS: i64 = 604_800_000;

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                | Required | Default                   |
    /// |------------------------|----------|---------------------------|
    /// | `JWT_PRIVATE_KEY_PATH` | no       | `config/jwt_private.pem`  |
    /// | `JWT_PUBLIC_KEY_PATH`  | no       | `config/jwt_public.pem`   |
    /// | `JWT_ACCESS_TTL_MS`    | no       | `900000`                  |
    /// | `JWT_REFRESH_TTL_MS`   | no       | `604800000`               |
    pub fn from_env() -> Self {
        let private_key_path = std::env::var("JWT_PRIVATE_KEY_PATH")
            .unwrap_or_else(|_| "config/jwt_private.pem".into());
        let public_key_path = std::env::var("JWT_PUBLIC_KEY_PATH")
            .unwrap_or_else(|_| "config/jwt_public.pem".into());

        let access_ttl_ms: i64 = std::env::var("JWT_ACCESS_TTL_MS")
            .unwrap_or_else(|_| DEFAULT_ACCESS_TTL_MS.to_string())
            .parse()
            .expect("JWT_ACCESS_TTL_MS must be a valid i64");

        let refresh_ttl_ms: i64 = std::env::var("JWT_REFRESH_TTL_MS")
            .unwrap_or_else(|_| DEFAULT_REFRESH_TTL_MS.to_string())
            .parse()
            .expect("JWT_REFRESH_TTL_MS must be a valid i64");

        Self {
            private_key_path,
            public_key_path,
            access_ttl_ms,
            refresh_ttl_ms,
        }
    }
}

/// Loaded signing material plus token lifetimes.
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    pub access_ttl_ms: i64,
    pub refresh_ttl_ms: i64,
}

impl JwtKeys {
    /// Load the RSA key pair from the paths in `config`.
    ///
    /// # Panics
    ///
    /// Panics when a key file is missing or not valid PEM. Keys are loaded
    /// once at startup; misconfiguration should fail fast.
    pub fn load(config: &JwtConfig) -> Self {
        let private_pem = std::fs::read(&config.private_key_path).unwrap_or_else(|e| {
            panic!(
                "Failed to read JWT private key at {}: {e}",
                config.private_key_path
            )
        });
        let public_pem = std::fs::read(&config.public_key_path).unwrap_or_else(|e| {
            panic!(
                "Failed to read JWT public key at {}: {e}",
                config.public_key_path
            )
        });
        Self::from_pems(&private_pem, &public_pem, config.access_ttl_ms, config.refresh_ttl_ms)
    }

    /// Build keys from in-memory PEM documents.
    pub fn from_pems(
        private_pem: &[u8],
        public_pem: &[u8],
        access_ttl_ms: i64,
        refresh_ttl_ms: i64,
    ) -> Self {
        let encoding = EncodingKey::from_rsa_pem(private_pem)
            .expect("JWT private key must be a valid RSA PEM");
        let decoding = DecodingKey::from_rsa_pem(public_pem)
            .expect("JWT public key must be a valid RSA PEM");
        Self {
            encoding,
            decoding,
            access_ttl_ms,
            refresh_ttl_ms,
        }
    }
}

/// Generate an RS256 access token for the given principal.
pub fn generate_access_token(
    keys: &JwtKeys,
    username: &str,
    roles: &[String],
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let exp = now + keys.access_ttl_ms / 1000;

    let claims = Claims {
        sub: username.to_string(),
        roles: roles.to_vec(),
        exp,
        iat: now,
    };

    encode(&Header::new(Algorithm::RS256), &claims, &keys.encoding)
}

/// Validate and decode an access token, returning the embedded [`Claims`].
///
/// Checks the RSA signature and expiry.
pub fn validate_token(
    keys: &JwtKeys,
    token: &str,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(token, &keys.decoding, &Validation::new(Algorithm::RS256))?;
    Ok(token_data.claims)
}

/// Generate a cryptographically random refresh token.
///
/// Returns `(plaintext_token, sha256_hex_hash)`. The plaintext goes to the
/// client; only the hash is persisted.
pub fn generate_refresh_token() -> (String, String) {
    let plaintext = Uuid::new_v4().to_string();
    let hash = hash_refresh_token(&plaintext);
    (plaintext, hash)
}

/// Compute the SHA-256 hex digest of a refresh token.
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

use crate::models::{PublicUser, Role};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Signed token payload. Stateless: nothing here is persisted server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    pub roles: Vec<Role>,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Failed to read key file {path}: {source}")]
    KeyFile {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid signing key: {0}")]
    InvalidKey(jsonwebtoken::errors::Error),
    #[error("Token rejected: {0}")]
    Rejected(#[from] jsonwebtoken::errors::Error),
}

/// Issues and verifies RS256 bearer tokens from an asymmetric key pair.
/// The private key signs, the public key verifies; only the public side is
/// needed by consumers that never mint tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub const DEFAULT_TTL_SECS: i64 = 3600;

    pub fn from_pem(private_pem: &[u8], public_pem: &[u8]) -> Result<Self, TokenError> {
        Ok(Self {
            encoding_key: EncodingKey::from_rsa_pem(private_pem)
                .map_err(TokenError::InvalidKey)?,
            decoding_key: DecodingKey::from_rsa_pem(public_pem)
                .map_err(TokenError::InvalidKey)?,
            ttl: Duration::seconds(Self::DEFAULT_TTL_SECS),
        })
    }

    pub fn from_key_files(
        private_path: impl AsRef<Path>,
        public_path: impl AsRef<Path>,
    ) -> Result<Self, TokenError> {
        let read = |path: &Path| {
            std::fs::read(path).map_err(|source| TokenError::KeyFile {
                path: path.display().to_string(),
                source,
            })
        };
        let private_pem = read(private_path.as_ref())?;
        let public_pem = read(public_path.as_ref())?;
        Self::from_pem(&private_pem, &public_pem)
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn sign(&self, user: &PublicUser) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            roles: user.roles.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        Ok(encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let validation = Validation::new(Algorithm::RS256);
        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}

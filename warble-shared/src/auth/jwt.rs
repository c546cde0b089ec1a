//! Bearer token issuance and validation
//!
//! Tokens are HS256-signed JWTs carrying the account ID as `sub`. A session
//! is a pair: a short-lived access token sent on every request and a
//! long-lived refresh token that can only be traded for a new access token.
//!
//! Lifetimes come from configuration ([`TokenIssuer::new`]); the defaults are
//! 24 hours for access tokens and 30 days for refresh tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Value of the `iss` claim on every token
pub const ISSUER: &str = "warble";

/// Shortest HMAC secret accepted by [`TokenIssuer::new`]
pub const MIN_SECRET_LEN: usize = 32;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Secret is too short to sign with
    #[error("JWT secret must be at least 32 characters")]
    WeakSecret,

    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signature, issuer, or format check failed
    #[error("Invalid token: {0}")]
    Invalid(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// A refresh token was used where an access token was expected, or the reverse
    #[error("Expected {expected} token")]
    WrongType { expected: TokenType },
}

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account ID
    pub sub: Uuid,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,
    pub token_type: TokenType,
}

impl Claims {
    fn new(account_id: Uuid, token_type: TokenType, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: account_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            nbf: now.timestamp(),
            token_type,
        }
    }
}

/// Session credential returned by signup, login and refresh
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenPair {
    /// Always `"bearer"`
    pub token_type: String,
    pub access_token: String,
    /// Absent when only the access token was reissued
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Signs and validates tokens with one shared secret
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Creates an issuer
    ///
    /// # Errors
    ///
    /// Returns [`JwtError::WeakSecret`] if `secret` is shorter than
    /// [`MIN_SECRET_LEN`].
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Result<Self, JwtError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(JwtError::WeakSecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        })
    }

    /// Creates an issuer with the default 24 hour / 30 day lifetimes
    pub fn with_default_ttls(secret: &str) -> Result<Self, JwtError> {
        Self::new(secret, Duration::hours(24), Duration::days(30))
    }

    /// Issues a fresh access + refresh pair for an account
    pub fn issue_pair(&self, account_id: Uuid) -> Result<TokenPair, JwtError> {
        Ok(TokenPair {
            token_type: "bearer".to_string(),
            access_token: self.sign(&Claims::new(account_id, TokenType::Access, self.access_ttl))?,
            refresh_token: Some(self.sign(&Claims::new(
                account_id,
                TokenType::Refresh,
                self.refresh_ttl,
            ))?),
        })
    }

    /// Trades a valid refresh token for a new access token
    pub fn refresh(&self, refresh_token: &str) -> Result<TokenPair, JwtError> {
        let claims = self.validate(refresh_token, TokenType::Refresh)?;

        Ok(TokenPair {
            token_type: "bearer".to_string(),
            access_token: self.sign(&Claims::new(claims.sub, TokenType::Access, self.access_ttl))?,
            refresh_token: None,
        })
    }

    /// Validates an access token and returns its claims
    pub fn validate_access(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate(token, TokenType::Access)
    }

    fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| JwtError::CreateError(e.to_string()))
    }

    fn validate(&self, token: &str, expected: TokenType) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.validate_exp = true;
        validation.validate_nbf = true;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid(e.to_string()),
            })?
            .claims;

        if claims.token_type != expected {
            return Err(JwtError::WrongType { expected });
        }

        Ok(claims)
    }
}

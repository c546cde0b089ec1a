//! Authentication primitives
//!
//! - [`password`]: Argon2id hashing and verification
//! - [`jwt`]: access/refresh token issuance and validation
//! - [`middleware`]: bearer-token extraction for axum routers

pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{Claims, JwtError, TokenIssuer, TokenPair, TokenType};
pub use middleware::{bearer_auth, AuthContext, AuthError};
pub use password::{hash_password, verify_password, PasswordError};

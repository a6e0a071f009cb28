//! Shared security primitives for the blog platform.
//!
//! - [`jwt`]: RS256 access/refresh token issuing and validation
//! - [`password`]: Argon2id password hashing and verification

pub mod jwt;
pub mod password;

pub use jwt::{Claims, JwtKeys, TokenResponse, TokenTtl, TokenType};
pub use password::{hash_password, verify_password, PasswordError};

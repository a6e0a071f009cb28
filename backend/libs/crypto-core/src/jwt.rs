/// JWT issuing and validation for the blog platform
///
/// Tokens are signed with RS256 (RSA with SHA-256). Keys are parsed once at
/// startup into a [`JwtKeys`] value which the service hands to its request
/// pipeline; nothing here lives in global state.
///
/// ## Security Design
///
/// - **RS256 ONLY**: No symmetric algorithms (HS256) to prevent confusion attacks
/// - **No hardcoded keys**: Keys come from the caller (environment in production)
/// - **Typed tokens**: every token carries `token_type` so a refresh token can
///   never be replayed as an access token
/// - **Revocable**: every token carries a unique `jti` for blacklisting
///
/// ## Usage
///
/// ```rust,no_run
/// use crypto_core::jwt::JwtKeys;
///
/// let private_key = std::env::var("JWT_PRIVATE_KEY_PEM").unwrap();
/// let public_key = std::env::var("JWT_PUBLIC_KEY_PEM").unwrap();
/// let keys = JwtKeys::from_rsa_pem(&private_key, &public_key).unwrap();
///
/// let pair = keys.generate_token_pair(1, "alice").unwrap();
/// let claims = keys.validate_access_token(&pair.access_token).unwrap();
/// assert_eq!(claims.user_id().unwrap(), 1);
/// ```
use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 3600;
const DEFAULT_REFRESH_TOKEN_TTL_SECS: i64 = 30 * 24 * 3600;

/// JWT algorithm - MUST be RS256
const JWT_ALGORITHM: Algorithm = Algorithm::RS256;

// ============================================================================
// Data Structures
// ============================================================================

/// Distinguishes short-lived access tokens from long-lived refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT Claims structure - standard claims plus platform fields
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (numeric user ID rendered as a string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Unique token identifier, used for blacklisting
    pub jti: String,
    /// Access or refresh
    pub token_type: TokenType,
    /// Username at the time of issue
    pub username: String,
}

impl Claims {
    /// Parse the subject back into a user ID.
    pub fn user_id(&self) -> Result<i64> {
        self.sub
            .parse::<i64>()
            .map_err(|e| anyhow!("Invalid user ID format in token: {e}"))
    }

    /// Parse the token identifier.
    pub fn token_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.jti).map_err(|e| anyhow!("Invalid jti in token: {e}"))
    }
}

/// Token pair response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Token lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTtl {
    pub access_secs: i64,
    pub refresh_secs: i64,
}

impl Default for TokenTtl {
    fn default() -> Self {
        Self {
            access_secs: DEFAULT_ACCESS_TOKEN_TTL_SECS,
            refresh_secs: DEFAULT_REFRESH_TOKEN_TTL_SECS,
        }
    }
}

// ============================================================================
// Key Storage
// ============================================================================

/// Parsed signing and verification keys.
///
/// A validation-only instance (no private key) can verify tokens but every
/// `generate_*` call fails.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: Option<EncodingKey>,
    decoding: DecodingKey,
    ttl: TokenTtl,
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys")
            .field("encoding", &self.encoding.as_ref().map(|_| "[REDACTED]"))
            .field("decoding", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl JwtKeys {
    /// Parse an RSA key pair from PEM-formatted strings
    ///
    /// ## Errors
    ///
    /// Returns error if either PEM is malformed or is not an RSA key.
    pub fn from_rsa_pem(private_key_pem: &str, public_key_pem: &str) -> Result<Self> {
        let encoding = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| anyhow!("Failed to parse RSA private key: {e}"))?;
        let decoding = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| anyhow!("Failed to parse RSA public key: {e}"))?;

        Ok(Self {
            encoding: Some(encoding),
            decoding,
            ttl: TokenTtl::default(),
        })
    }

    /// Keys for services that only validate tokens.
    pub fn validation_only(public_key_pem: &str) -> Result<Self> {
        let decoding = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| anyhow!("Failed to parse RSA public key: {e}"))?;

        Ok(Self {
            encoding: None,
            decoding,
            ttl: TokenTtl::default(),
        })
    }

    /// Override the default token lifetimes.
    pub fn with_ttl(mut self, ttl: TokenTtl) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> TokenTtl {
        self.ttl
    }

    fn encoding_key(&self) -> Result<&EncodingKey> {
        self.encoding
            .as_ref()
            .ok_or_else(|| anyhow!("JWT private key not configured; this instance can only validate tokens"))
    }

    // ========================================================================
    // Token Generation
    // ========================================================================

    fn generate(&self, user_id: i64, username: &str, token_type: TokenType) -> Result<String> {
        let now = Utc::now();
        let lifetime = match token_type {
            TokenType::Access => self.ttl.access_secs,
            TokenType::Refresh => self.ttl.refresh_secs,
        };
        let expiry = now + Duration::seconds(lifetime);

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type,
            username: username.to_string(),
        };

        self.encode_claims(&claims)
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(JWT_ALGORITHM), claims, self.encoding_key()?)
            .map_err(|e| anyhow!("Failed to generate token: {e}"))
    }

    /// Generate a short-lived access token used for API authentication.
    pub fn generate_access_token(&self, user_id: i64, username: &str) -> Result<String> {
        self.generate(user_id, username, TokenType::Access)
    }

    /// Generate a long-lived refresh token used to obtain new access tokens.
    pub fn generate_refresh_token(&self, user_id: i64, username: &str) -> Result<String> {
        self.generate(user_id, username, TokenType::Refresh)
    }

    /// Generate both access and refresh tokens
    pub fn generate_token_pair(&self, user_id: i64, username: &str) -> Result<TokenResponse> {
        let access_token = self.generate_access_token(user_id, username)?;
        let refresh_token = self.generate_refresh_token(user_id, username)?;

        Ok(TokenResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.ttl.access_secs,
        })
    }

    // ========================================================================
    // Token Validation
    // ========================================================================

    /// Validate signature and expiry and decode the claims
    ///
    /// ## Errors
    ///
    /// Returns error if the signature is invalid, the token is expired or the
    /// token is malformed.
    pub fn validate_token(&self, token: &str) -> Result<TokenData<Claims>> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;

        decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| anyhow!("Token validation failed: {e}"))
    }

    /// Validate a token and require it to be an access token.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims> {
        self.validate_typed(token, TokenType::Access)
    }

    /// Validate a token and require it to be a refresh token.
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims> {
        self.validate_typed(token, TokenType::Refresh)
    }

    fn validate_typed(&self, token: &str, expected: TokenType) -> Result<Claims> {
        let claims = self.validate_token(token)?.claims;
        if claims.token_type != expected {
            return Err(anyhow!(
                "Token validation failed: expected {:?} token, got {:?}",
                expected,
                claims.token_type
            ));
        }
        Ok(claims)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // FOR TESTING ONLY - never use these keys in production
    const TEST_PRIVATE_KEY: &str = include_str!("../testdata/test_private_key.pem");
    const TEST_PUBLIC_KEY: &str = include_str!("../testdata/test_public_key.pem");

    fn test_keys() -> JwtKeys {
        JwtKeys::from_rsa_pem(TEST_PRIVATE_KEY, TEST_PUBLIC_KEY).expect("test keys should parse")
    }

    #[test]
    fn test_generate_access_token() {
        let keys = test_keys();
        let token = keys
            .generate_access_token(42, "testuser")
            .expect("Failed to generate token");

        assert_eq!(token.matches('.').count(), 2);
    }

    #[test]
    fn test_validate_valid_token() {
        let keys = test_keys();
        let token = keys.generate_access_token(42, "testuser").unwrap();

        let claims = keys.validate_access_token(&token).expect("token should validate");
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.username, "testuser");
        assert_eq!(claims.token_type, TokenType::Access);
        assert!(claims.token_id().is_ok());
    }

    #[test]
    fn test_validate_invalid_token() {
        let keys = test_keys();
        assert!(keys.validate_token("invalid.token.here").is_err());
    }

    #[test]
    fn test_validate_tampered_token() {
        let keys = test_keys();
        let token = keys.generate_access_token(42, "testuser").unwrap();

        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_payload = "eyJzdWIiOiIxIn0";
        parts[1] = forged_payload;
        let tampered = parts.join(".");

        assert!(keys.validate_token(&tampered).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = test_keys();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "42".to_string(),
            iat: now - 7200,
            exp: now - 3600,
            jti: Uuid::new_v4().to_string(),
            token_type: TokenType::Access,
            username: "testuser".to_string(),
        };
        let token = keys.encode_claims(&claims).unwrap();

        assert!(keys.validate_token(&token).is_err());
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let keys = test_keys();
        let refresh = keys.generate_refresh_token(42, "testuser").unwrap();

        assert!(keys.validate_access_token(&refresh).is_err());
        assert!(keys.validate_refresh_token(&refresh).is_ok());
    }

    #[test]
    fn test_token_pair_generation() {
        let keys = test_keys();
        let tokens = keys.generate_token_pair(7, "alice").unwrap();

        assert_eq!(tokens.token_type, "Bearer");
        assert_eq!(tokens.expires_in, DEFAULT_ACCESS_TOKEN_TTL_SECS);

        let access = keys.validate_access_token(&tokens.access_token).unwrap();
        let refresh = keys.validate_refresh_token(&tokens.refresh_token).unwrap();
        assert!(refresh.exp > access.exp);
        assert_ne!(access.jti, refresh.jti);
    }

    #[test]
    fn test_custom_ttl() {
        let keys = test_keys().with_ttl(TokenTtl {
            access_secs: 60,
            refresh_secs: 120,
        });
        let claims = keys
            .validate_access_token(&keys.generate_access_token(1, "a").unwrap())
            .unwrap();

        assert_eq!(claims.exp - claims.iat, 60);
    }

    #[test]
    fn test_validation_only_keys_cannot_sign() {
        let signer = test_keys();
        let verifier = JwtKeys::validation_only(TEST_PUBLIC_KEY).unwrap();

        let token = signer.generate_access_token(3, "bob").unwrap();
        assert!(verifier.validate_access_token(&token).is_ok());
        assert!(verifier.generate_access_token(3, "bob").is_err());
    }
}

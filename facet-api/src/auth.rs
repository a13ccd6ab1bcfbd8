//! Authentication Module
//!
//! Bearer-token authentication for the Facet API. Tokens are JWTs (HS256
//! by default) issued by the register/login endpoints and validated by
//! the auth middleware on every protected route. Passwords are stored as
//! argon2id hashes.

use crate::error::{ApiError, ApiResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// CLOCK ABSTRACTION (FOR DETERMINISTIC TESTS)
// ============================================================================

/// Clock abstraction for JWT time validation.
///
/// Owning time validation ourselves (instead of letting `jsonwebtoken` do
/// it) keeps token tests fully deterministic and avoids the
/// `SystemTime::now()` panic path on machines with broken clocks.
pub trait JwtClock: Send + Sync {
    /// Get current time as Unix epoch seconds.
    fn now_epoch_secs(&self) -> i64;
}

/// Production clock using system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl JwtClock for SystemClock {
    fn now_epoch_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Fixed clock for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl JwtClock for FixedClock {
    fn now_epoch_secs(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
pub mod test_clocks {
    use super::FixedClock;

    /// 2024-01-01 00:00:00 UTC
    pub fn valid() -> FixedClock {
        FixedClock(1704067200)
    }

    /// 2030-01-01 00:00:00 UTC - far future, past any token expiry
    pub fn future() -> FixedClock {
        FixedClock(1893456000)
    }
}

// ============================================================================
// JWT SECRET (TYPE-SAFE)
// ============================================================================

/// Type-safe JWT secret that prevents accidental logging.
#[derive(Clone)]
pub struct JwtSecret(SecretString);

impl JwtSecret {
    /// Create a new JWT secret with validation.
    ///
    /// # Errors
    /// Returns error if the secret is empty.
    pub fn new(secret: String) -> ApiResult<Self> {
        if secret.is_empty() {
            return Err(ApiError::internal_error("JWT secret must not be empty"));
        }
        Ok(Self(SecretString::new(secret.into())))
    }

    /// Expose the secret value (only for cryptographic operations).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Get the length of the secret without exposing it.
    pub fn len(&self) -> usize {
        self.0.expose_secret().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }

    /// Check if the secret is the insecure default.
    pub fn is_insecure_default(&self) -> bool {
        self.0.expose_secret() == INSECURE_DEFAULT_SECRET
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JwtSecret([REDACTED, {} chars])", self.len())
    }
}

const INSECURE_DEFAULT_SECRET: &str = "INSECURE_DEFAULT_SECRET_CHANGE_IN_PRODUCTION";

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Authentication configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// JWT secret key for signing and verification
    pub jwt_secret: JwtSecret,

    /// JWT algorithm (default: HS256)
    pub jwt_algorithm: Algorithm,

    /// JWT token expiration in seconds (default: 1 hour)
    pub jwt_expiration_secs: i64,

    /// JWT clock skew tolerance in seconds (default: 60).
    /// Allows tokens slightly in the future/past to absorb clock drift.
    pub jwt_clock_skew_secs: i64,

    /// Clock for JWT time validation (injected for testing)
    pub clock: Arc<dyn JwtClock>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret)
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("jwt_expiration_secs", &self.jwt_expiration_secs)
            .field("jwt_clock_skew_secs", &self.jwt_clock_skew_secs)
            .field("clock", &"<JwtClock>")
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: JwtSecret::new(INSECURE_DEFAULT_SECRET.to_string())
                .unwrap_or_else(|_| unreachable!("default secret is non-empty")),
            jwt_algorithm: Algorithm::HS256,
            jwt_expiration_secs: 3600,
            jwt_clock_skew_secs: 60,
            clock: Arc::new(SystemClock),
        }
    }
}

impl AuthConfig {
    /// Create AuthConfig from environment variables.
    ///
    /// Environment variables:
    /// - `FACET_JWT_SECRET`: Signing secret (falls back to an insecure default)
    /// - `FACET_JWT_EXPIRATION_SECS`: Token lifetime (default: 3600)
    /// - `FACET_JWT_CLOCK_SKEW_SECS`: Skew tolerance (default: 60)
    pub fn from_env() -> Self {
        let secret = std::env::var("FACET_JWT_SECRET")
            .unwrap_or_else(|_| INSECURE_DEFAULT_SECRET.to_string());

        let jwt_expiration_secs = std::env::var("FACET_JWT_EXPIRATION_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3600);

        let jwt_clock_skew_secs = std::env::var("FACET_JWT_CLOCK_SKEW_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);

        Self {
            jwt_secret: JwtSecret::new(secret).unwrap_or_else(|_| {
                JwtSecret::new(INSECURE_DEFAULT_SECRET.to_string())
                    .unwrap_or_else(|_| unreachable!("default secret is non-empty"))
            }),
            jwt_algorithm: Algorithm::HS256,
            jwt_expiration_secs,
            jwt_clock_skew_secs,
            clock: Arc::new(SystemClock),
        }
    }

    /// Validate that this configuration is safe for production.
    pub fn validate_for_production(&self) -> ApiResult<()> {
        if self.jwt_secret.is_insecure_default() {
            return Err(ApiError::internal_error(
                "FACET_JWT_SECRET is the insecure default; set a real secret before deploying",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// CLAIMS
// ============================================================================

/// JWT claims for Facet tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// User's email address
    pub email: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create new claims for a user using a clock.
    pub fn new(user_id: Uuid, email: String, expiration_secs: i64, clock: &dyn JwtClock) -> Self {
        let now = clock.now_epoch_secs();

        Self {
            sub: user_id.to_string(),
            email,
            iat: now,
            exp: now + expiration_secs,
        }
    }

    /// Get the subject as a user id.
    pub fn user_id(&self) -> ApiResult<Uuid> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| ApiError::invalid_token("Token subject is not a valid user id"))
    }
}

// ============================================================================
// AUTHENTICATION CONTEXT
// ============================================================================

/// Authentication context extracted from a validated request.
///
/// Injected into Axum request extensions after successful authentication.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthContext {
    /// Authenticated user's id
    pub user_id: Uuid,
    /// Authenticated user's email
    pub email: String,
}

// ============================================================================
// JWT OPERATIONS
// ============================================================================

/// Generate a JWT token for a user.
///
/// Returns the encoded token string.
pub fn generate_jwt_token(config: &AuthConfig, user_id: Uuid, email: String) -> ApiResult<String> {
    let claims = Claims::new(user_id, email, config.jwt_expiration_secs, &*config.clock);

    let encoding_key = EncodingKey::from_secret(config.jwt_secret.expose().as_bytes());
    let header = Header::new(config.jwt_algorithm);

    encode(&header, &claims, &encoding_key)
        .map_err(|e| ApiError::internal_error(format!("Failed to generate token: {}", e)))
}

/// Validate a JWT token and return its claims.
///
/// Signature validation is delegated to `jsonwebtoken`; time validation
/// uses our own clock so it stays deterministic under test.
pub fn validate_jwt_token(config: &AuthConfig, token: &str) -> ApiResult<Claims> {
    let decoding_key = DecodingKey::from_secret(config.jwt_secret.expose().as_bytes());

    // Decode with signature validation ONLY (skip exp/nbf validation)
    let mut validation = Validation::new(config.jwt_algorithm);
    validation.validate_exp = false; // We'll do this ourselves with our clock
    validation.validate_nbf = false;
    // Keep required_spec_claims with "exp" to ensure it's present
    validation.required_spec_claims = std::collections::HashSet::from(["exp".to_string()]);

    let token_data =
        decode::<Claims>(token, &decoding_key, &validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::InvalidToken => {
                ApiError::invalid_token("Token is invalid")
            }
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                ApiError::invalid_token("Token signature is invalid")
            }
            _ => ApiError::invalid_token(format!("Token validation failed: {}", e)),
        })?;

    let claims = token_data.claims;

    let now = config.clock.now_epoch_secs();
    if now < 0 {
        tracing::error!(
            timestamp = now,
            "System clock returned pre-epoch time - server time is broken"
        );
        return Err(ApiError::internal_error("Server time configuration error"));
    }

    if claims.exp + config.jwt_clock_skew_secs < now {
        return Err(ApiError::token_expired());
    }

    Ok(claims)
}

/// Extract the bearer token from an Authorization header value.
pub fn extract_bearer_token(header_value: &str) -> ApiResult<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::invalid_token("Authorization header must use Bearer scheme"))
}

// ============================================================================
// PASSWORD HASHING
// ============================================================================

/// Hash a password with argon2id and a random salt.
///
/// The resulting PHC string embeds algorithm parameters and salt.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal_error(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a stored argon2id hash.
///
/// Returns `Ok(true)` on match, `Ok(false)` on mismatch. A malformed
/// stored hash is a server-side error, not a failed login.
pub fn verify_password(password: &str, stored_hash: &str) -> ApiResult<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| ApiError::internal_error(format!("Stored password hash is invalid: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(ApiError::internal_error(format!(
            "Password verification failed: {}",
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn config_with_clock(clock: FixedClock) -> AuthConfig {
        AuthConfig {
            jwt_secret: JwtSecret::new("test-secret".to_string()).unwrap(),
            clock: Arc::new(clock),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_jwt_round_trip() {
        let config = config_with_clock(test_clocks::valid());
        let user_id = Uuid::now_v7();

        let token =
            generate_jwt_token(&config, user_id, "john@example.com".to_string()).unwrap();
        let claims = validate_jwt_token(&config, &token).unwrap();

        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.email, "john@example.com");
        assert_eq!(claims.exp, claims.iat + config.jwt_expiration_secs);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let issue_config = config_with_clock(test_clocks::valid());
        let token = generate_jwt_token(&issue_config, Uuid::now_v7(), "a@b.co".to_string())
            .unwrap();

        // Validate with a clock far past the token's expiry.
        let late_config = config_with_clock(test_clocks::future());
        let err = validate_jwt_token(&late_config, &token).unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenExpired);
    }

    #[test]
    fn test_clock_skew_tolerance() {
        let issue_config = config_with_clock(test_clocks::valid());
        let token = generate_jwt_token(&issue_config, Uuid::now_v7(), "a@b.co".to_string())
            .unwrap();

        // 30s past expiry is inside the 60s skew window.
        let skewed = config_with_clock(FixedClock(
            test_clocks::valid().0 + issue_config.jwt_expiration_secs + 30,
        ));
        assert!(validate_jwt_token(&skewed, &token).is_ok());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let config = config_with_clock(test_clocks::valid());
        let token = generate_jwt_token(&config, Uuid::now_v7(), "a@b.co".to_string()).unwrap();

        let other = AuthConfig {
            jwt_secret: JwtSecret::new("different-secret".to_string()).unwrap(),
            clock: Arc::new(test_clocks::valid()),
            ..AuthConfig::default()
        };
        let err = validate_jwt_token(&other, &token).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidToken);
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let config = config_with_clock(test_clocks::valid());
        assert!(validate_jwt_token(&config, "not-a-jwt").is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc").unwrap(), "abc");
        assert!(extract_bearer_token("Basic abc").is_err());
        assert!(extract_bearer_token("Bearer ").is_err());
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("123456").unwrap();
        assert_ne!(hash, "123456");
        assert!(verify_password("123456", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_malformed_stored_hash_is_server_error() {
        let err = verify_password("123456", "not-a-phc-string").unwrap_err();
        assert_eq!(err.code, ErrorCode::InternalError);
    }

    #[test]
    fn test_jwt_secret_debug_is_redacted() {
        let secret = JwtSecret::new("super-secret".to_string()).unwrap();
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_validate_for_production_rejects_default_secret() {
        let config = AuthConfig::default();
        assert!(config.validate_for_production().is_err());

        let config = AuthConfig {
            jwt_secret: JwtSecret::new("real-secret".to_string()).unwrap(),
            ..AuthConfig::default()
        };
        assert!(config.validate_for_production().is_ok());
    }
}

//! JWT token creation and validation service
//!
//! Provides secure JWT token generation and validation using the jsonwebtoken crate.

use crate::claims::Claims;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use meridian_core::error::AppError;
use meridian_core::models::{User, UserRole};
use tracing::{debug, error, warn};
use uuid::Uuid;

/// JWT Service for token creation and validation
///
/// Handles JWT token lifecycle including creation, validation, and expiration checks.
#[derive(Clone)]
pub struct JwtService {
    /// Secret key for signing tokens (kept for potential future use)
    #[allow(dead_code)]
    secret: String,

    /// Default token expiration time in seconds
    expiration_secs: i64,

    /// Encoding key (cached)
    encoding_key: EncodingKey,

    /// Decoding key (cached)
    decoding_key: DecodingKey,
}

impl JwtService {
    /// Create a new JWT service
    ///
    /// # Arguments
    ///
    /// * `secret` - The secret key used to sign tokens
    /// * `expiration_secs` - Default token expiration time in seconds
    ///
    /// # Examples
    ///
    /// ```
    /// use meridian_auth::JwtService;
    ///
    /// let jwt_service = JwtService::new("my-secret-key", 3600);
    /// ```
    pub fn new(secret: &str, expiration_secs: i64) -> Self {
        Self {
            secret: secret.to_string(),
            expiration_secs,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Create a JWT token from claims
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidToken` if token creation fails
    ///
    /// # Examples
    ///
    /// ```
    /// use meridian_auth::{Claims, JwtService};
    /// use meridian_core::models::UserRole;
    /// use uuid::Uuid;
    ///
    /// let jwt_service = JwtService::new("secret", 3600);
    /// let claims = Claims::new(Uuid::new_v4(), UserRole::Admin);
    /// let token = jwt_service.create_token(&claims)?;
    /// # Ok::<(), meridian_core::error::AppError>(())
    /// ```
    pub fn create_token(&self, claims: &Claims) -> Result<String, AppError> {
        // Create mutable claims to set expiration
        let mut token_claims = claims.clone();

        // Set expiration if not already set
        if token_claims.exp == 0 {
            let exp = Utc::now() + Duration::seconds(self.expiration_secs);
            token_claims.exp = exp.timestamp();
        }

        debug!(
            user_id = %token_claims.sub,
            role = ?token_claims.role,
            exp = %token_claims.exp,
            "Creating JWT token"
        );

        encode(&Header::default(), &token_claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "Failed to create JWT token");
            AppError::InvalidToken(format!("Token creation failed: {}", e))
        })
    }

    /// Create a token for an employee id and role
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidToken` if token creation fails
    pub fn create_token_for_user(&self, user_id: Uuid, role: UserRole) -> Result<String, AppError> {
        let claims = Claims::new(user_id, role);
        self.create_token(&claims)
    }

    /// Create a token from a persisted employee record
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidToken` if token creation fails
    pub fn create_token_for(&self, user: &User) -> Result<String, AppError> {
        self.create_token_for_user(user.id, user.role)
    }

    /// Validate a JWT token and extract claims
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `AppError::TokenExpired` if the token has expired
    /// - `AppError::InvalidToken` if the token is invalid
    ///
    /// # Examples
    ///
    /// ```
    /// use meridian_auth::{Claims, JwtService};
    /// use meridian_core::models::UserRole;
    /// use uuid::Uuid;
    ///
    /// let jwt_service = JwtService::new("secret", 3600);
    /// let user_id = Uuid::new_v4();
    /// let claims = Claims::new(user_id, UserRole::Ra);
    /// let token = jwt_service.create_token(&claims)?;
    /// let decoded = jwt_service.validate_token(&token)?;
    /// assert_eq!(decoded.sub, user_id);
    /// # Ok::<(), meridian_core::error::AppError>(())
    /// ```
    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::default();

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            // Check if error is due to expiration
            if e.to_string().contains("ExpiredSignature") {
                warn!("Token expired");
                return AppError::TokenExpired;
            }

            warn!(error = %e, "Invalid token");
            AppError::InvalidToken(format!("Token validation failed: {}", e))
        })?;

        let claims = token_data.claims;

        // Additional expiration check (should be caught by validation, but be defensive)
        if claims.is_expired() {
            warn!(user_id = %claims.sub, "Token expired (manual check)");
            return Err(AppError::TokenExpired);
        }

        debug!(
            user_id = %claims.sub,
            role = ?claims.role,
            "Token validated successfully"
        );

        Ok(claims)
    }

    /// Get the expiration time for tokens created by this service
    pub fn expiration_secs(&self) -> i64 {
        self.expiration_secs
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("expiration_secs", &self.expiration_secs)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-12345";

    #[test]
    fn test_create_and_validate_token() {
        let jwt_service = JwtService::new(TEST_SECRET, 3600);
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, UserRole::Admin);

        let token = jwt_service.create_token(&claims).unwrap();
        assert!(!token.is_empty());

        let decoded = jwt_service.validate_token(&token).unwrap();
        assert_eq!(decoded.sub, user_id);
        assert_eq!(decoded.role, UserRole::Admin);
    }

    #[test]
    fn test_create_token_for_user() {
        let jwt_service = JwtService::new(TEST_SECRET, 3600);
        let user_id = Uuid::new_v4();

        let token = jwt_service
            .create_token_for_user(user_id, UserRole::Finance)
            .unwrap();

        let claims = jwt_service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, UserRole::Finance);
    }

    #[test]
    fn test_expired_token() {
        let jwt_service = JwtService::new(TEST_SECRET, 1);

        let claims = Claims::with_expiration(Uuid::new_v4(), UserRole::Ra, -120);
        let token = jwt_service.create_token(&claims).unwrap();

        let result = jwt_service.validate_token(&token);
        assert!(matches!(result, Err(AppError::TokenExpired)));
    }

    #[test]
    fn test_invalid_token() {
        let jwt_service = JwtService::new(TEST_SECRET, 3600);

        let result = jwt_service.validate_token("invalid.token.here");
        assert!(matches!(result, Err(AppError::InvalidToken(_))));
    }

    #[test]
    fn test_token_with_different_secret() {
        let jwt_service1 = JwtService::new("secret1", 3600);
        let jwt_service2 = JwtService::new("secret2", 3600);

        let claims = Claims::new(Uuid::new_v4(), UserRole::Pm);
        let token = jwt_service1.create_token(&claims).unwrap();

        // Token created with secret1 should not validate with secret2
        let result = jwt_service2.validate_token(&token);
        assert!(matches!(result, Err(AppError::InvalidToken(_))));
    }

    #[test]
    fn test_token_expiration_setting() {
        let jwt_service = JwtService::new(TEST_SECRET, 7200);
        let claims = Claims::new(Uuid::new_v4(), UserRole::Ra);

        let token = jwt_service.create_token(&claims).unwrap();
        let decoded = jwt_service.validate_token(&token).unwrap();

        let now = Utc::now().timestamp();
        assert!(decoded.exp > now);
        assert!(decoded.exp <= now + 7200);
    }

    #[test]
    fn test_expiration_secs_getter() {
        let jwt_service = JwtService::new(TEST_SECRET, 1800);
        assert_eq!(jwt_service.expiration_secs(), 1800);
    }

    #[test]
    fn test_debug_impl_hides_secret() {
        let jwt_service = JwtService::new(TEST_SECRET, 3600);
        let debug_str = format!("{:?}", jwt_service);

        assert!(debug_str.contains("JwtService"));
        assert!(debug_str.contains("3600"));
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains(TEST_SECRET));
    }
}

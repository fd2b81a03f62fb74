//! Actix-web authentication middleware and request extractors
//!
//! Provides extractors for authenticated employees with role-based access control.

use crate::jwt::JwtService;
use crate::Claims;
use actix_web::{dev::Payload, error::ErrorUnauthorized, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use meridian_core::error::AppError;
use meridian_core::models::UserRole;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Extract JWT token from request
///
/// Checks for token in the following order:
/// 1. Authorization header (Bearer token)
/// 2. Cookie named "token"
fn extract_token_from_request(req: &HttpRequest) -> Option<String> {
    // Try Authorization header first
    if let Some(auth_header) = req.headers().get("Authorization") {
        if let Ok(auth_str) = auth_header.to_str() {
            if auth_str.starts_with("Bearer ") {
                return Some(auth_str[7..].to_string());
            }
        }
    }

    // Try cookie
    if let Some(cookie) = req.cookie("token") {
        return Some(cookie.value().to_string());
    }

    None
}

/// Authenticated employee extractor
///
/// Extracts and validates the JWT token from the request, providing the caller's
/// identity and role. Can be used as a request extractor in Actix-web handlers.
///
/// # Examples
///
/// ```no_run
/// use actix_web::HttpResponse;
/// use meridian_auth::middleware::AuthenticatedUser;
///
/// async fn protected_handler(user: AuthenticatedUser) -> HttpResponse {
///     HttpResponse::Ok().json(serde_json::json!({
///         "user_id": user.user_id,
///         "role": user.role
///     }))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Id of the authenticated employee
    pub user_id: Uuid,

    /// Role of the authenticated employee
    pub role: UserRole,

    /// Full claims from the JWT token
    pub claims: Claims,
}

impl AuthenticatedUser {
    /// Check if the employee belongs to back office (admin or finance)
    pub fn is_back_office(&self) -> bool {
        self.role.is_back_office()
    }

    /// Check if the employee has admin privileges
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // Extract JWT service from app data
        let jwt_service = match req.app_data::<web::Data<Arc<JwtService>>>() {
            Some(service) => service.get_ref().clone(),
            None => {
                warn!("JwtService not found in app data");
                return ready(Err(ErrorUnauthorized(AppError::Unauthorized(
                    "Authentication service not configured".to_string(),
                ))));
            }
        };

        // Extract token from request
        let token = match extract_token_from_request(req) {
            Some(t) => t,
            None => {
                debug!("No authentication token found in request");
                return ready(Err(ErrorUnauthorized(AppError::Unauthorized(
                    "No authentication token provided".to_string(),
                ))));
            }
        };

        // Validate token and extract claims
        match jwt_service.validate_token(&token) {
            Ok(claims) => {
                debug!(
                    user_id = %claims.sub,
                    role = ?claims.role,
                    "User authenticated successfully"
                );

                ready(Ok(AuthenticatedUser {
                    user_id: claims.sub,
                    role: claims.role,
                    claims,
                }))
            }
            Err(e) => {
                warn!(error = %e, "Token validation failed");
                ready(Err(ErrorUnauthorized(e)))
            }
        }
    }
}

/// Back-office employee extractor
///
/// Requires the caller to have the admin or finance role.
/// Returns `Forbidden` error if the caller doesn't have sufficient privileges.
///
/// # Examples
///
/// ```no_run
/// use actix_web::HttpResponse;
/// use meridian_auth::middleware::BackOfficeUser;
///
/// async fn finance_handler(user: BackOfficeUser) -> HttpResponse {
///     HttpResponse::Ok().json(serde_json::json!({
///         "message": "Back-office access granted",
///         "user_id": user.0.user_id
///     }))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct BackOfficeUser(pub AuthenticatedUser);

impl std::ops::Deref for BackOfficeUser {
    type Target = AuthenticatedUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for BackOfficeUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let auth_user = match AuthenticatedUser::from_request(req, payload).into_inner() {
            Ok(user) => user,
            Err(e) => return ready(Err(e)),
        };

        if !auth_user.is_back_office() {
            warn!(
                user_id = %auth_user.user_id,
                role = ?auth_user.role,
                "User attempted back-office access without privileges"
            );
            return ready(Err(ErrorUnauthorized(AppError::Forbidden)));
        }

        debug!(
            user_id = %auth_user.user_id,
            role = ?auth_user.role,
            "Back-office access granted"
        );

        ready(Ok(BackOfficeUser(auth_user)))
    }
}

/// Admin employee extractor
///
/// Requires the caller to have the admin role.
/// Returns `Forbidden` error if the caller doesn't have admin privileges.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

impl std::ops::Deref for AdminUser {
    type Target = AuthenticatedUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for AdminUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let auth_user = match AuthenticatedUser::from_request(req, payload).into_inner() {
            Ok(user) => user,
            Err(e) => return ready(Err(e)),
        };

        if !auth_user.is_admin() {
            warn!(
                user_id = %auth_user.user_id,
                role = ?auth_user.role,
                "User attempted admin access without privileges"
            );
            return ready(Err(ErrorUnauthorized(AppError::Forbidden)));
        }

        debug!(
            user_id = %auth_user.user_id,
            role = ?auth_user.role,
            "Admin access granted"
        );

        ready(Ok(AdminUser(auth_user)))
    }
}

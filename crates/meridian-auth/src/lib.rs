//! Authentication and authorization for Meridian
//!
//! This crate provides JWT-based authentication and Actix-web extractors
//! for role-based access control over the CRM API.
//!
//! # Features
//!
//! - JWT token creation and validation
//! - Request extractors for authenticated employees
//! - Role-based access control (RA / PM / back office)
//!
//! # Examples
//!
//! ## Creating a JWT token
//!
//! ```no_run
//! use meridian_auth::{Claims, JwtService};
//! use meridian_core::models::UserRole;
//! use uuid::Uuid;
//!
//! let jwt_service = JwtService::new("your-secret-key", 3600);
//! let claims = Claims::new(Uuid::new_v4(), UserRole::Admin);
//! let token = jwt_service.create_token(&claims)?;
//! # Ok::<(), meridian_core::error::AppError>(())
//! ```
//!
//! ## Using extractors in Actix-web
//!
//! ```no_run
//! use actix_web::HttpResponse;
//! use meridian_auth::middleware::{AuthenticatedUser, BackOfficeUser};
//!
//! async fn protected_route(user: AuthenticatedUser) -> HttpResponse {
//!     HttpResponse::Ok().json(serde_json::json!({
//!         "user_id": user.user_id,
//!         "role": user.role
//!     }))
//! }
//!
//! async fn revenue_route(_user: BackOfficeUser) -> HttpResponse {
//!     HttpResponse::Ok().json(serde_json::json!({
//!         "message": "Back-office access granted"
//!     }))
//! }
//! ```

pub mod claims;
pub mod jwt;
pub mod middleware;

pub use claims::Claims;
pub use jwt::JwtService;
pub use middleware::{AdminUser, AuthenticatedUser, BackOfficeUser};

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::models::UserRole;
    use uuid::Uuid;

    #[test]
    fn test_token_round_trip() {
        let jwt_service = JwtService::new("test-secret-key-12345", 3600);

        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, UserRole::Pm);
        let token = jwt_service.create_token(&claims).unwrap();
        let decoded_claims = jwt_service.validate_token(&token).unwrap();

        assert_eq!(decoded_claims.sub, user_id);
        assert_eq!(decoded_claims.role, UserRole::Pm);
    }
}

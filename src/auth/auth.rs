use crate::config::Config;
use crate::error::ApiError;
use crate::model::role::Role;
use crate::models::Claims;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};
use jsonwebtoken::decode;
use jsonwebtoken::{DecodingKey, Validation};

/// The resolved `(user, role, department)` triple every guarded operation
/// runs under. Extracted from the bearer token on each request.
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
    pub department: Option<String>,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ApiError::authentication("Missing token").into())),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Config missing",
                )));
            }
        };

        let data = match decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        ) {
            Ok(d) => d,
            Err(_) => return ready(Err(ApiError::authentication("Invalid token").into())),
        };

        let role = match data.claims.role.parse::<Role>() {
            Ok(r) => r,
            Err(_) => return ready(Err(ApiError::authentication("Invalid role").into())),
        };

        ready(Ok(AuthUser {
            user_id: data.claims.user_id,
            email: data.claims.sub,
            role,
            department: data.claims.department,
        }))
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::authorization("forbidden"))
        }
    }

    pub fn require_hod(&self) -> Result<(), ApiError> {
        if self.role == Role::Hod {
            Ok(())
        } else {
            Err(ApiError::authorization("forbidden"))
        }
    }

    /// HOD callers must always carry a department.
    pub fn own_department(&self) -> Result<&str, ApiError> {
        self.department
            .as_deref()
            .ok_or_else(|| ApiError::authorization("no department"))
    }
}

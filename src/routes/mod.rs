//! actix-web handlers of the `/api` scope.

use std::future::{Ready, ready};

use actix_web::dev::Payload;
use actix_web::http::StatusCode;
use actix_web::{FromRequest, HttpRequest, HttpResponse, web};

use crate::domain::types::RecordId;
use crate::domain::user::AUDIT_USER_HEADER;
use crate::dto::ErrorResponse;
use crate::services::ServiceError;

pub mod dashboard;
pub mod users;

/// The acting user named by the audit header, if any.
///
/// Missing or malformed header values yield `AuditUser(None)`; the request is
/// never rejected because of it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditUser(pub Option<RecordId>);

impl FromRequest for AuditUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let id = req
            .headers()
            .get(AUDIT_USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| match RecordId::parse(value) {
                Ok(id) => Some(id),
                Err(_) => {
                    log::debug!("Ignoring malformed audit user `{value}`");
                    None
                }
            });
        ready(Ok(AuditUser(id)))
    }
}

/// Maps a service failure to its status code and `{success: false}` body.
///
/// Store failures are logged and answered with a generic message.
pub fn error_response(err: ServiceError, context: &str) -> HttpResponse {
    let (status, message) = match err {
        ServiceError::Form(message)
        | ServiceError::Conflict(message)
        | ServiceError::TypeConstraint(message) => (StatusCode::BAD_REQUEST, message),
        ServiceError::NotFound => (StatusCode::NOT_FOUND, "User not found".to_string()),
        ServiceError::Repository(cause) => {
            log::error!("{context}: {cause}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
        }
    };
    HttpResponse::build(status).json(ErrorResponse::new(message))
}

/// Registers every API route; mounted under `/api` by [`crate::run`].
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default().error_handler(|err, _| {
        let response = HttpResponse::BadRequest().json(ErrorResponse::new(err.to_string()));
        actix_web::error::InternalError::from_response(err, response).into()
    });

    cfg.app_data(json_config)
        .service(
            web::scope("/user")
                .service(users::get_users)
                .service(users::get_user)
                .service(users::get_users_config)
                .service(users::add_user)
                .service(users::update_user)
                .service(users::delete_user),
        )
        .service(web::scope("/dashboard").service(dashboard::get_data));
}

use actix_web::{HttpRequest, HttpResponse, Responder, delete, get, post, put, web};

use crate::dto::SuccessResponse;
use crate::forms::users::{AddUserForm, UpdateUserForm};
use crate::list::ListDefaults;
use crate::models::config::ServerConfig;
use crate::repository::DieselRepository;
use crate::routes::{AuditUser, error_response};
use crate::services::users as users_service;

#[get("/getusers")]
pub async fn get_users(
    req: HttpRequest,
    repo: web::Data<DieselRepository>,
    server_config: web::Data<ServerConfig>,
) -> impl Responder {
    let defaults = ListDefaults::with_limit(server_config.default_page_size);
    match users_service::list_users(repo.get_ref(), req.query_string(), &defaults) {
        Ok(page) => HttpResponse::Ok().json(page),
        Err(err) => error_response(err, "Failed to list users"),
    }
}

#[get("/getUser/{user_id}")]
pub async fn get_user(
    user_id: web::Path<String>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match users_service::get_user(repo.get_ref(), &user_id) {
        Ok(user) => HttpResponse::Ok().json(user),
        Err(err) => error_response(err, "Failed to load user"),
    }
}

#[get("/getUsersConfig")]
pub async fn get_users_config() -> impl Responder {
    HttpResponse::Ok().json(users_service::users_config())
}

#[post("/adduser")]
pub async fn add_user(
    AuditUser(audit_user): AuditUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<AddUserForm>,
) -> impl Responder {
    match users_service::add_user(repo.get_ref(), audit_user, form) {
        Ok(_) => HttpResponse::Ok().json(SuccessResponse::OK),
        Err(err) => error_response(err, "Failed to add user"),
    }
}

#[put("/update/{user_id}")]
pub async fn update_user(
    user_id: web::Path<String>,
    AuditUser(audit_user): AuditUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<UpdateUserForm>,
) -> impl Responder {
    match users_service::update_user(repo.get_ref(), audit_user, &user_id, form) {
        Ok(_) => HttpResponse::Ok().json(SuccessResponse::OK),
        Err(err) => error_response(err, "Failed to update user"),
    }
}

#[delete("/delete/{user_id}")]
pub async fn delete_user(
    user_id: web::Path<String>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match users_service::delete_user(repo.get_ref(), &user_id) {
        Ok(()) => HttpResponse::Ok().json(SuccessResponse::OK),
        Err(err) => error_response(err, "Failed to delete user"),
    }
}

use actix_web::{HttpResponse, Responder, get, web};

use crate::dto::dashboard::DashboardResponse;
use crate::repository::DieselRepository;
use crate::routes::error_response;
use crate::services::dashboard as dashboard_service;

#[get("/getdata")]
pub async fn get_data(repo: web::Data<DieselRepository>) -> impl Responder {
    match dashboard_service::load_dashboard(repo.get_ref()) {
        Ok(data) => HttpResponse::Ok().json(DashboardResponse {
            success: true,
            data,
        }),
        Err(err) => error_response(err, "Failed to load dashboard"),
    }
}

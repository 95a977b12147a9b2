use actix_web::HttpResponse;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "Service is up")))]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"status": "ok"}))
}

pub async fn ready() -> HttpResponse {
    HttpResponse::Ok().finish()
}

pub async fn live() -> HttpResponse {
    HttpResponse::Ok().finish()
}

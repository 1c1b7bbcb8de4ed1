use actix_web::{HttpResponse, Responder, get, web};
use pulse::Engine;

/// Health check route
/// This route returns no content, the response status is enough.
#[get("/")]
pub async fn health_route() -> impl Responder {
    HttpResponse::Ok()
}

/// Current monitoring snapshot as JSON
#[get("/status")]
pub async fn status_route(engine: web::Data<Engine>) -> impl Responder {
    HttpResponse::Ok().json(engine.snapshot().await)
}

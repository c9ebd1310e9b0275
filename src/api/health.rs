use actix_web::{HttpResponse, Responder, get, web};
use serde_json::json;

use super::models::AppState;

#[get("/health/")]
pub async fn health_check(data: web::Data<AppState>) -> impl Responder {
    let tip = data.node.newest_block();
    HttpResponse::Ok().json(json!({ "status": "ok", "height": tip.index }))
}

use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AddressResponse, AppState};

#[get("/me/address/")]
pub async fn get_my_address(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(AddressResponse {
        address: state.node.wallet().public_address().to_string(),
    })
}

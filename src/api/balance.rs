use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, BalanceResponse};

fn balance_response(state: &AppState, address: String) -> BalanceResponse {
    let utxo = state.node.unspent_outputs();
    let utxos = utxo.owned_by(&address).count();
    BalanceResponse {
        balance: crate::wallet::get_balance(&address, &utxo),
        address,
        utxos,
    }
}

#[get("/address/{address}/")]
pub async fn get_balance(state: web::Data<AppState>, path: web::Path<(String,)>) -> impl Responder {
    let address = path.into_inner().0;
    HttpResponse::Ok().json(balance_response(&state, address))
}

#[get("/me/balance/")]
pub async fn get_my_balance(state: web::Data<AppState>) -> impl Responder {
    let address = state.node.wallet().public_address().to_string();
    HttpResponse::Ok().json(balance_response(&state, address))
}

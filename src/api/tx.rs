use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, info, warn};
use std::time::Instant;

use super::models::{AppState, MempoolResponse, SendRequest};
use crate::transaction::Transaction;

/// Look up a mined transaction by id.
#[get("/transactions/{id}/")]
pub async fn get_transaction(
    state: web::Data<AppState>,
    path: web::Path<(String,)>,
) -> impl Responder {
    let id = path.into_inner().0;
    match state.node.find_transaction(&id) {
        Some(tx) => HttpResponse::Ok().json(tx),
        None => HttpResponse::NotFound().body("transaction not found"),
    }
}

/// Pay from the node wallet; the new tx lands in the mempool.
#[post("/transactions/")]
pub async fn post_transaction(
    state: web::Data<AppState>,
    body: web::Json<SendRequest>,
) -> impl Responder {
    let t0 = Instant::now();
    let to = body.address.trim();
    if to.is_empty() {
        return HttpResponse::BadRequest().body("address required");
    }

    match state.node.send_transaction(to, body.amount) {
        Ok(tx) => {
            info!(
                "POST /transactions/ - txid={} OK ({} ms)",
                tx.id,
                t0.elapsed().as_millis()
            );
            HttpResponse::Ok().json(tx)
        }
        Err(e) => {
            warn!("POST /transactions/ - rejected: {e}");
            HttpResponse::BadRequest().body(e.to_string())
        }
    }
}

/// A transaction relayed by a peer.
#[post("/mempool/")]
pub async fn post_mempool(
    state: web::Data<AppState>,
    body: web::Json<Transaction>,
) -> impl Responder {
    let tx = body.into_inner();
    debug!(
        "POST /mempool/ - received txid={}: inputs={}, outputs={}",
        tx.id,
        tx.tx_ins.len(),
        tx.tx_outs.len()
    );
    match state.node.submit_transaction(tx) {
        Ok(()) => HttpResponse::Ok().json(state.node.mempool()),
        Err(e) => HttpResponse::BadRequest().body(e.to_string()),
    }
}

#[get("/mempool/")]
pub async fn get_mempool(state: web::Data<AppState>) -> impl Responder {
    let transactions = state.node.mempool();
    HttpResponse::Ok().json(MempoolResponse {
        size: transactions.len(),
        transactions,
    })
}

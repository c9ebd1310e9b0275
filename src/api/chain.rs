use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, info};

use super::models::{AppState, ChainResponse, ReplaceResponse};
use crate::blockchain::Block;

/// Get the full blockchain.
#[get("/blocks/")]
pub async fn get_blocks(state: web::Data<AppState>) -> impl Responder {
    let chain = state.node.blocks();
    HttpResponse::Ok().json(ChainResponse {
        length: chain.len(),
        chain,
    })
}

#[get("/blocks/{hash}/")]
pub async fn get_block(state: web::Data<AppState>, path: web::Path<(String,)>) -> impl Responder {
    let hash = path.into_inner().0;
    match state.node.block_by_hash(&hash) {
        Some(block) => HttpResponse::Ok().json(block),
        None => HttpResponse::NotFound().body("block not found"),
    }
}

/// A single block relayed by a peer, appended on top of our tip.
#[post("/blocks/incoming/")]
pub async fn post_incoming_block(
    state: web::Data<AppState>,
    body: web::Json<Block>,
) -> impl Responder {
    let block = body.into_inner();
    debug!("POST /blocks/incoming/ - block #{} ({})", block.index, block.hash);
    match state.node.append_block(block) {
        Ok(()) => HttpResponse::Ok().json(state.node.newest_block()),
        Err(e) => HttpResponse::BadRequest().body(e.to_string()),
    }
}

/// A whole chain relayed by a peer; fork choice decides whether it wins.
#[post("/chain/")]
pub async fn post_chain(state: web::Data<AppState>, body: web::Json<Vec<Block>>) -> impl Responder {
    let candidate = body.into_inner();
    let offered = candidate.len();
    match state.node.replace_chain(candidate) {
        Ok(()) => {
            info!("POST /chain/ - adopted peer chain of {offered} blocks");
            HttpResponse::Ok().json(ReplaceResponse {
                replaced: true,
                length: offered,
            })
        }
        Err(e) => HttpResponse::BadRequest().body(e.to_string()),
    }
}

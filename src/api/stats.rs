use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, StatsResponse};
use crate::blockchain::{BLOCK_GENERATION_INTERVAL, DIFFICULTY_ADJUSTMENT_INTERVAL};

#[get("/stats/")]
pub async fn get_stats(state: web::Data<AppState>) -> impl Responder {
    let stats = state.node.stats();

    let last_interval_secs = match state.node.blocks().as_slice() {
        [.., prev, tip] => Some((tip.timestamp - prev.timestamp).max(0)),
        _ => None,
    };

    HttpResponse::Ok().json(StatsResponse {
        height: stats.height,
        next_difficulty: stats.next_difficulty,
        cumulative_work: stats.cumulative_work.to_string(),
        block_generation_interval_secs: BLOCK_GENERATION_INTERVAL,
        adjust_interval_blocks: DIFFICULTY_ADJUSTMENT_INTERVAL,
        last_interval_secs,
        mempool_size: stats.mempool_size,
        utxo_size: stats.utxo_size,
    })
}

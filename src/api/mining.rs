use actix_web::{HttpResponse, Responder, post, web};
use log::{error, warn};

use super::models::{AppState, MineResponse};
use crate::error::MinerError;
use crate::miner::MineOutcome;

/// Mine the next block from the current mempool.
///
/// The search runs on the miner's worker thread; this handler only waits on
/// it from actix's blocking pool so request workers stay free.
#[post("/blocks/")]
pub async fn mine_block(state: web::Data<AppState>) -> impl Responder {
    let miner = state.miner.clone();
    let outcome = match web::block(move || miner.mine_next_block()).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e @ MinerError::Rejected(_))) => {
            error!("POST /blocks/ - {e}");
            return HttpResponse::InternalServerError().body(e.to_string());
        }
        Ok(Err(e)) => {
            error!("POST /blocks/ - {e}");
            return HttpResponse::ServiceUnavailable().body(e.to_string());
        }
        Err(e) => {
            error!("POST /blocks/ - blocking task failed: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    match outcome {
        MineOutcome::Mined(block) => HttpResponse::Ok().json(MineResponse {
            status: "mined",
            block: Some(block),
            reason: None,
        }),
        MineOutcome::Stale(e) => {
            warn!("POST /blocks/ - mined block discarded: {e}");
            HttpResponse::Conflict().json(MineResponse {
                status: "stale",
                block: None,
                reason: Some(e.to_string()),
            })
        }
        MineOutcome::Cancelled => HttpResponse::Conflict().json(MineResponse {
            status: "cancelled",
            block: None,
            reason: Some("tip moved during search".to_string()),
        }),
    }
}

mod balance;
mod chain;
mod health;
mod mining;
pub mod models;
mod stats;
mod tx;
mod wallet;

use actix_web::web::{self, ServiceConfig};

pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(chain::get_blocks)
            .service(chain::post_incoming_block)
            .service(chain::get_block)
            .service(chain::post_chain)
            .service(mining::mine_block)
            .service(tx::get_transaction)
            .service(tx::post_transaction)
            .service(tx::post_mempool)
            .service(tx::get_mempool)
            .service(balance::get_balance)
            .service(balance::get_my_balance)
            .service(wallet::get_my_address)
            .service(stats::get_stats),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miner::Miner;
    use crate::node::tests::node;
    use actix_web::{App, http::StatusCode, test};
    use serde_json::Value;
    use std::sync::Arc;

    fn state() -> web::Data<AppState> {
        let node = Arc::new(node());
        let address = node.wallet().public_address().to_string();
        let miner = Arc::new(Miner::spawn(node.clone(), address).unwrap());
        web::Data::new(AppState { node, miner })
    }

    #[actix_web::test]
    async fn mine_then_send_over_http() {
        let state = state();
        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .configure(init_routes),
        )
        .await;

        let req = test::TestRequest::post().uri("/api/v1/blocks/").to_request();
        let mined: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(mined["status"], "mined");
        assert_eq!(mined["block"]["index"], 1);

        let req = test::TestRequest::get().uri("/api/v1/me/balance/").to_request();
        let balance: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(balance["balance"], 50);

        let req = test::TestRequest::post()
            .uri("/api/v1/transactions/")
            .set_json(serde_json::json!({ "address": "bob", "amount": 10 }))
            .to_request();
        let tx: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(tx["txOuts"][0]["amount"], 10);

        let req = test::TestRequest::get().uri("/api/v1/mempool/").to_request();
        let pool: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(pool["size"], 1);
    }

    #[actix_web::test]
    async fn health_reports_tip_height() {
        let app = test::init_service(App::new().app_data(state()).configure(init_routes)).await;
        let req = test::TestRequest::get().uri("/api/v1/health/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["height"], 0);
    }

    #[actix_web::test]
    async fn overspend_is_a_bad_request() {
        let app = test::init_service(App::new().app_data(state()).configure(init_routes)).await;
        let req = test::TestRequest::post()
            .uri("/api/v1/transactions/")
            .set_json(serde_json::json!({ "address": "bob", "amount": 10 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn replaying_genesis_chain_is_rejected() {
        let state = state();
        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .configure(init_routes),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/api/v1/chain/")
            .set_json(state.node.blocks())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let genesis_hash = state.node.newest_block().hash;
        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/blocks/{genesis_hash}/"))
            .to_request();
        let block: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(block["index"], 0);
        assert!(block["previousHash"].is_null());
    }
}

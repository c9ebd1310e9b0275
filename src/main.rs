mod api;
mod blockchain;
mod config;
mod error;
mod mempool;
mod miner;
mod node;
mod p2p;
mod transaction;
mod wallet;

use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::{error, info};
use std::sync::Arc;

use api::AppState;
use config::Config;
use miner::Miner;
use node::Node;
use p2p::LogBroadcaster;
use transaction::SignedTxRules;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let cfg = Config::from_env();
    let wallet = match cfg.load_wallet() {
        Ok(w) => w,
        Err(e) => {
            error!("WALLET_PRIVATE_KEY: {e}");
            std::process::exit(1);
        }
    };
    let miner_address = cfg
        .miner_address
        .clone()
        .unwrap_or_else(|| wallet.public_address().to_string());
    info!("Node wallet address: {}", wallet.public_address());

    let node = Arc::new(Node::new(
        wallet,
        Arc::new(SignedTxRules),
        Arc::new(LogBroadcaster),
    ));
    let miner = Arc::new(Miner::spawn(node.clone(), miner_address)?);
    info!("Mining rewards go to {}", miner.address());

    println!("⛓️ Starting ledger node at http://{}:{}", cfg.host, cfg.port);

    let state = web::Data::new(AppState { node, miner });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((cfg.host.as_str(), cfg.port))?
    .run()
    .await
}

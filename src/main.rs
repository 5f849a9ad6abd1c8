use std::net::Ipv4Addr;

use tracing::info;

use taskboard::config::Config;
use taskboard::db::Repository;
use taskboard::{create_app, AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cfg = Config::from_env();
    info!(env = %cfg.env, db = %cfg.db_path, "starting taskboard");

    let repo = Repository::open(&cfg.db_path, !cfg.env.is_production()).expect("opening database");

    let state = AppState { repo };
    let app = create_app(state);
    let addr = (Ipv4Addr::UNSPECIFIED, cfg.port);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind port");

    info!("running on {addr:?}");

    axum::serve(listener, app).await.expect("failed serving");
}

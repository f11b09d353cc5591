use salvo::{listener::TcpListener, Server};

use config::env_var;
use infra::{database::connection, router};

mod app;
mod config;
mod domain;
mod error;
mod infra;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let pool = connection::create_pool().await;
    let address = format!("0.0.0.0:{}", env_var::get().port);

    tracing::info!("listening on {address}");
    let listener = TcpListener::bind(&address);
    Server::new(listener).serve(router::app(&pool)).await;
}

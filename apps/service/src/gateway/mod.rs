//! HTTP ingress for chat commands, fronting an [`Engine`].

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use pulse::Engine;
use tracing::info;

mod error;
mod routes;

pub use error::AppError;

pub fn parse_addr(bind: &str, port: u16) -> Result<SocketAddr, AppError> {
    Ok(format!("{bind}:{port}").parse()?)
}

pub async fn run_server(addr: SocketAddr, engine: Arc<Engine>) -> Result<(), AppError> {
    info!(%addr, "command gateway listening");

    HttpServer::new(move || {
        App::new().app_data(web::Data::from(engine.clone())).configure(routes::routes)
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}

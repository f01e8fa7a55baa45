mod errors;
mod params;
mod services;

use actix_web::{web, App, HttpServer};
use blob_storage::Filer;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::params::Args;
use crate::services::file_service;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let filer = match Filer::open(&args.filer_config()).await {
        Ok(filer) => web::Data::new(filer),
        Err(e) => {
            tracing::error!("cannot start filer: {}", e);
            return Err(std::io::Error::other(e));
        }
    };

    let server_filer = filer.clone();
    let max_upload_bytes = args.max_upload_bytes;
    tracing::info!("listening on {}", args.http_addr);
    HttpServer::new(move || {
        App::new()
            .app_data(server_filer.clone())
            .app_data(web::PayloadConfig::new(max_upload_bytes))
            .configure(file_service::configure)
    })
        .bind(args.http_addr.clone())?
        .run()
        .await?;

    if let Err(e) = filer.cleanup().await {
        tracing::error!("filer cleanup failed: {}", e);
    }
    Ok(())
}

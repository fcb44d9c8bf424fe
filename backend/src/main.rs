use std::sync::Arc;

use card_backend::routes;
use card_backend::utils::logger;
use card_backend::{AppConfig, CardComposer, ServerArgs};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = ServerArgs::parse();
    logger::init_logger(args.verbose);

    let config = AppConfig::from_args(&args).inspect_err(|e| {
        tracing::error!(details = ?e.details(), "{e}");
    })?;
    tracing::debug!(?config, "loaded configuration");

    let composer = Arc::new(CardComposer::new(&config)?);
    let app = routes::app(composer, config.server.body_limit);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        assets = %config.assets.root.display(),
        "Server running at http://{address}"
    );

    axum::serve(listener, app).await?;

    Ok(())
}

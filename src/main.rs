use authors_service::config::Config;
use authors_service::database::{SqliteRepository, establish_pool};
use authors_service::http::auth::TokenDecoder;
use authors_service::http::{AppState, HttpServer, HttpServerConfig};
use authors_service::render::TemplateRenderer;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("AUTHORS_LOG")
                .unwrap_or_else(|_| EnvFilter::new("authors_service=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = establish_pool(config.database_url()).await?;
    let repository = Arc::new(SqliteRepository::new(pool));
    let renderer = Arc::new(TemplateRenderer::new()?);
    let tokens = TokenDecoder::new(config.jwt_secret());

    let state = AppState::new(repository.clone(), repository, renderer, tokens)
        .with_repository_timeout(config.repository_timeout());
    let server_config = HttpServerConfig::new(config.server_port());
    let http_server = HttpServer::new(state, server_config).await?;
    http_server.run().await
}

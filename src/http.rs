pub mod auth;
pub mod handler;
pub mod negotiate;

use crate::http::auth::TokenDecoder;
use crate::http::handler::ApiError;
use crate::password::PasswordHasher;
use crate::render::Renderer;
use crate::repositories::{ArticleRepository, AuthorRepository};
use anyhow::Context;
use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::trace::TraceLayer;

pub const DEFAULT_REPOSITORY_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_REPOSITORY_TIMEOUT: Duration =
    Duration::from_millis(DEFAULT_REPOSITORY_TIMEOUT_MS);

#[derive(Clone)]
pub struct AppState {
    authors: Arc<dyn AuthorRepository>,
    articles: Arc<dyn ArticleRepository>,
    renderer: Arc<dyn Renderer>,
    tokens: Arc<TokenDecoder>,
    hasher: PasswordHasher,
    repository_timeout: Duration,
}

impl AppState {
    pub fn new(
        authors: Arc<dyn AuthorRepository>,
        articles: Arc<dyn ArticleRepository>,
        renderer: Arc<dyn Renderer>,
        tokens: TokenDecoder,
    ) -> Self {
        Self {
            authors,
            articles,
            renderer,
            tokens: Arc::new(tokens),
            hasher: PasswordHasher::default(),
            repository_timeout: DEFAULT_REPOSITORY_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_repository_timeout(mut self, timeout: Duration) -> Self {
        self.repository_timeout = timeout;
        self
    }

    pub fn authors(&self) -> &dyn AuthorRepository {
        self.authors.as_ref()
    }

    pub fn articles(&self) -> &dyn ArticleRepository {
        self.articles.as_ref()
    }

    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    pub fn tokens(&self) -> &TokenDecoder {
        &self.tokens
    }

    pub const fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    /// Awaits a repository call, giving up once the repository timeout elapses.
    pub async fn within<T, E>(
        &self,
        call: impl Future<Output = Result<T, E>>,
    ) -> Result<T, ApiError>
    where
        ApiError: From<E>,
    {
        match tokio::time::timeout(self.repository_timeout, call).await {
            Ok(result) => result.map_err(ApiError::from),
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.repository_timeout.as_millis(),
                    "repository call timed out"
                );
                Err(ApiError::ServiceUnavailable(
                    "Storage did not respond in time".to_string(),
                ))
            }
        }
    }
}

#[derive(Debug)]
pub struct HttpServerConfig {
    port: u16,
}

impl HttpServerConfig {
    pub const fn new(port: u16) -> Self {
        Self { port }
    }
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn new(state: AppState, config: HttpServerConfig) -> anyhow::Result<Self> {
        let router = router(state);

        let listener = TcpListener::bind(("0.0.0.0", config.port))
            .await
            .with_context(|| format!("Failed to bind to port {}", config.port))?;

        Ok(Self { router, listener })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        tracing::info!(
            addr = %self.listener.local_addr()?,
            "listening for requests"
        );
        axum::serve(self.listener, self.router)
            .await
            .context("Received error from running server")?;
        Ok(())
    }
}

/// Builds the complete application router. Called once at startup.
pub fn router(state: AppState) -> Router {
    fn log_failure(err: ServerErrorsFailureClass, latency: Duration, _span: &tracing::Span) {
        tracing::error!(error = %err, latency_ms = latency.as_millis(), "request failed");
    }

    Router::new()
        .merge(author_routes())
        .layer(TraceLayer::new_for_http().on_failure(log_failure))
        .with_state(state)
}

fn author_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/authors",
            get(handler::list_authors).post(handler::create_author),
        )
        .route(
            "/authors/{id}",
            get(handler::find_author)
                .delete(handler::delete_author)
                .put(handler::update_author),
        )
}

mod boundary;
mod cors;
mod health;
mod routes;
mod state;
mod validated;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use faultline_auth::{ClaimsResolver, Gate, IdentityResolver, TokenVerifier};
use faultline_config::Config;
use faultline_core::Dispatcher;
use faultline_upload::{CloudinaryStore, ObjectStore, UploadPipeline};
use tower_http::trace::TraceLayer;

pub use state::AppState;
pub use validated::ValidatedJson;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration
    ///
    /// Identities are taken from verified token claims and uploads go to
    /// Cloudinary.
    ///
    /// # Errors
    ///
    /// Returns an error if the token key, storage client or staging
    /// directory cannot be set up
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Arc::new(CloudinaryStore::from_config(&config.storage)?);
        Self::with_parts(config, Arc::new(ClaimsResolver), store).await
    }

    /// Build the server with an explicit identity resolver and object store
    ///
    /// # Errors
    ///
    /// Same as [`Server::new`], minus the storage client
    pub async fn with_parts(
        config: Config,
        resolver: Arc<dyn IdentityResolver>,
        store: Arc<dyn ObjectStore>,
    ) -> anyhow::Result<Self> {
        let listen_address = config
            .server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

        let verifier = TokenVerifier::new(
            &config.auth.access_token_secret,
            config.auth.leeway(),
            config.auth.token_ttl(),
        )?;
        let uploads = UploadPipeline::from_config(&config.upload, &config.storage, store).await?;

        let state = AppState {
            dispatcher: Dispatcher::new(config.server.mode),
            gate: Gate::new(Arc::new(verifier), resolver),
            uploads,
        };

        let mut app = Router::new().route("/", axum::routing::get(health::root_handler));

        // Health check
        if config.server.health.enabled {
            app = app.route(&config.server.health.path, axum::routing::get(health::health_handler));
        }

        let app = app
            .nest("/api/v1", routes::api_router(&state))
            .method_not_allowed_fallback(routes::method_not_allowed)
            .fallback(routes::not_found)
            .with_state(state.clone());
        let app = layered(app, state.dispatcher, &config);

        tracing::debug!(mode = ?config.server.mode, "router assembled");

        Ok(Self {
            router: app,
            listen_address,
        })
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Override the configured listen address
    #[must_use]
    pub const fn with_listen_address(mut self, listen_address: SocketAddr) -> Self {
        self.listen_address = listen_address;
        self
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered and in-flight
    /// requests have drained.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}

/// Apply middleware layers (innermost first)
fn layered(mut app: Router, dispatcher: Dispatcher, config: &Config) -> Router {
    // Room for the multipart framing around a maximum-size file
    let body_limit = usize::try_from(config.upload.max_file_bytes)
        .unwrap_or(usize::MAX)
        .saturating_mul(2);
    app = app.layer(DefaultBodyLimit::max(body_limit));

    // Tracing
    app = app.layer(TraceLayer::new_for_http());

    // Failure boundary, inside CORS so panic responses get its headers too
    app = app.layer(axum::middleware::from_fn_with_state(
        dispatcher,
        boundary::boundary_middleware,
    ));

    // CORS
    if let Some(ref cors_config) = config.server.cors {
        app = app.layer(cors::cors_layer(cors_config));
    }

    app
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use config_manager::{ConfigurationError, SystemConfig};
use goldrush_client::{scan_settings, GoldRushClient, GoldRushError};
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use volume_core::{PageSource, VolumeEngine, VolumeError};

mod handlers;
mod types;

use handlers::*;
use types::*;

/// Engine type shared by the handlers; the source is boxed so tests can substitute it
pub type SharedEngine = Arc<VolumeEngine<Arc<dyn PageSource>>>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: SystemConfig,
    /// `None` while the GoldRush API key is missing
    pub engine: Option<SharedEngine>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: SystemConfig, engine: Option<SharedEngine>) -> Self {
        Self {
            config,
            engine,
            started_at: Instant::now(),
        }
    }

    /// The engine, or the configuration error every scan request must fail with
    pub fn engine(&self) -> Result<&SharedEngine, ApiError> {
        self.engine
            .as_ref()
            .ok_or(ApiError::Config(ConfigurationError::MissingApiKey))
    }

    pub fn include_trace(&self, requested: Option<bool>) -> bool {
        requested.unwrap_or(self.config.system.debug_mode)
    }
}

/// Main application error type
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Config(#[from] ConfigurationError),
    #[error("{0}")]
    Volume(#[from] VolumeError),
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Volume(_) => StatusCode::BAD_REQUEST,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            timestamp: chrono::Utc::now(),
        });

        (status, body).into_response()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,api_server=debug".into()),
        )
        .init();

    info!("Starting Wallet Volume API Server...");

    // Load configuration
    let config = SystemConfig::load()?;
    info!("Configuration loaded successfully");

    let engine = build_engine(&config)?;
    if engine.is_some() {
        info!(
            "Volume engine initialized ({}ms deadline, {} pages max)",
            config.scan.deadline_ms, config.scan.max_pages
        );
    }

    let app_state = AppState::new(config.clone(), engine);
    let app = create_router(app_state);

    info!("📋 Available endpoints:");
    info!("   • GET /health - Health check");
    info!("   • GET /api/volume/:chain/:address - Volume of one wallet on one chain");
    info!("   • GET /api/wallets/:address/volume - Volume of one wallet across chains");

    // Bind and serve
    let bind_addr = format!("{}:{}", config.api.host, config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the GoldRush-backed engine; a missing API key leaves the server up without one
fn build_engine(config: &SystemConfig) -> Result<Option<SharedEngine>, GoldRushError> {
    match GoldRushClient::new(config.goldrush.clone()) {
        Ok(client) => {
            let source: Arc<dyn PageSource> = Arc::new(client);
            Ok(Some(Arc::new(VolumeEngine::new(
                source,
                scan_settings(&config.scan),
            ))))
        }
        Err(GoldRushError::Config(ConfigurationError::MissingApiKey)) => {
            warn!("⚠️ COVALENT_API_KEY is not set; volume requests will fail until it is provided");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Volume endpoints
        .route("/api/volume/:chain/:address", get(get_volume))
        .route("/api/wallets/:address/volume", get(get_wallet_volume))
        // Add CORS middleware
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .into_inner(),
        )
        .with_state(state)
}

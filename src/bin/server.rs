use std::net::SocketAddr;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use base64::Engine;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use faultgen::config::GenerationConfig;
use faultgen::error::{ConfigError, MetadataError, PaletteError};
use faultgen::metadata;
use faultgen::palette::GradientPalette;

#[derive(Error, Debug)]
enum ApiError {
    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid palette: {0}")]
    Palette(#[from] PaletteError),

    #[error("Image encoding error: {0}")]
    Encode(#[from] MetadataError),

    #[error("Generation task failed")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Config(_) | ApiError::Palette(_) => StatusCode::BAD_REQUEST,
            ApiError::Encode(e) => {
                error!("Image encoding error: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Deserialize)]
struct GenerateRequest {
    #[serde(flatten)]
    config: GenerationConfig,
    /// Gradient nodes as `#rrggbb`, black to white when absent.
    colors: Option<Vec<String>>,
}

#[derive(Serialize)]
struct GenerateResponse {
    layers: Vec<Layer>,
    timings: Vec<TimingEntry>,
    metadata: Vec<(String, String)>,
    width: usize,
    height: usize,
}

#[derive(Serialize)]
struct Layer {
    name: String,
    data_url: String,
}

#[derive(Serialize)]
struct TimingEntry {
    name: String,
    ms: f64,
}

fn encode_png(rgb: &RgbImage, text: &[(String, String)]) -> Result<String, ApiError> {
    let buf = metadata::encode_png(rgb, text)?;
    let b64 = base64::engine::general_purpose::STANDARD.encode(&buf);
    Ok(format!("data:image/png;base64,{}", b64))
}

async fn generate_handler(
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let config = req.config;
    config.validate()?;
    let palette = match &req.colors {
        Some(colors) => GradientPalette::from_hex(colors)?,
        None => GradientPalette::default(),
    };

    let response = tokio::task::spawn_blocking(move || {
        let (surface, timings) = faultgen::build_surface(&config, &palette, |_| {}, || false)
            .ok_or(ApiError::Internal)?;
        let (w, h) = (surface.w, surface.h);
        let pairs = metadata::to_pairs(&config, &palette);

        let layers = vec![
            Layer {
                name: "heightmap".into(),
                data_url: encode_png(&GradientPalette::default().colorize(&surface.elevation), &[])?,
            },
            Layer {
                name: "map".into(),
                data_url: encode_png(&surface.rgb, &pairs)?,
            },
        ];

        let timing_entries = timings
            .iter()
            .map(|t| TimingEntry {
                name: t.name.to_string(),
                ms: t.ms,
            })
            .collect();

        Ok::<_, ApiError>(GenerateResponse {
            layers,
            timings: timing_entries,
            metadata: pairs,
            width: w,
            height: h,
        })
    })
    .await
    .map_err(|e| {
        error!("generation task panicked: {e}");
        ApiError::Internal
    })??;

    Ok(Json(response))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let app = Router::new()
        .route("/api/generate", post(generate_handler))
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("faultgen server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

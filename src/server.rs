//! Stateless HTTP front end for the conversion pipeline.
//!
//! The model travels in the request body and the converted model in the
//! response body; nothing is written to disk.

use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::ConvertOptions;
use crate::error::{ConvertError, ErrorKind};
use crate::formats::StlEncoding;
use crate::pipeline::Pipeline;

/// Server argument definition (clap derive).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "mesh-convert-server",
    about = "HTTP endpoint converting meshes between STL and OBJ",
    version
)]
pub struct ServerArgs {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:3000")]
    pub listen: SocketAddr,

    /// Largest accepted request body, in MiB
    #[arg(long, default_value_t = 64)]
    pub max_body_mb: usize,

    /// Default STL layout when a request does not choose one
    #[arg(long, value_enum, default_value = "binary")]
    pub stl_encoding: StlEncoding,

    /// Keep original coordinates instead of centering on the origin
    #[arg(long)]
    pub no_normalize: bool,

    /// Answer 422 when an upload contains no triangles
    #[arg(long)]
    pub reject_empty: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub max_body_bytes: usize,
    pub options: ConvertOptions,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 3000)),
            max_body_bytes: 64 * 1024 * 1024,
            options: ConvertOptions::default(),
        }
    }
}

impl From<ServerArgs> for ServerConfig {
    fn from(args: ServerArgs) -> Self {
        ServerConfig {
            listen: args.listen,
            max_body_bytes: args.max_body_mb.saturating_mul(1024 * 1024),
            options: ConvertOptions {
                stl_encoding: args.stl_encoding,
                normalize: !args.no_normalize,
                reject_empty: args.reject_empty,
            },
        }
    }
}

/// Query string of `POST /convert`.
#[derive(Debug, Deserialize)]
pub struct ConvertQuery {
    pub from: String,
    pub to: String,
    /// Download name without extension.
    pub name: Option<String>,
    pub encoding: Option<StlEncoding>,
}

/// JSON error body plus status, derived from a [`ConvertError`].
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: ErrorKind,
    message: String,
}

impl From<ConvertError> for ApiError {
    fn from(e: ConvertError) -> Self {
        let kind = e.kind();
        let status = match kind {
            ErrorKind::BadInput | ErrorKind::Unsupported => StatusCode::BAD_REQUEST,
            ErrorKind::Empty => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError {
            status,
            kind,
            message: e.to_string(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            kind: ErrorKind::BadInput,
            message: format!(
                "Missing or invalid conversion parameters: {}",
                rejection.body_text()
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message, "kind": self.kind });
        (self.status, Json(body)).into_response()
    }
}

/// Build the router. Exposed separately from [`serve`] for in-process tests.
pub fn router(config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/convert", post(convert))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .with_state(config.options)
}

/// Bind `config.listen` and serve until the process is stopped.
pub async fn serve(config: ServerConfig) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    info!(addr = %listener.local_addr()?, "Listening");
    axum::serve(listener, router(&config)).await
}

async fn health() -> &'static str {
    "ok"
}

async fn convert(
    State(defaults): State<ConvertOptions>,
    query: Result<Query<ConvertQuery>, QueryRejection>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let Query(query) = query.inspect_err(|e| warn!(%e, "Rejected conversion parameters"))?;
    let options = ConvertOptions {
        stl_encoding: query.encoding.unwrap_or(defaults.stl_encoding),
        ..defaults
    };
    let ConvertQuery { from, to, name, .. } = query;

    let output = tokio::task::spawn_blocking(move || {
        Pipeline::convert_tags(&body, &from, &to, &options)
    })
    .await
    .map_err(|e| ApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        kind: ErrorKind::Internal,
        message: format!("conversion task failed: {e}"),
    })?
    .inspect_err(|e| warn!(%e, "Rejected conversion request"))?;

    let stem = name
        .as_deref()
        .map(sanitize_stem)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "model".to_string());
    let disposition = format!("attachment; filename=\"{}\"", output.file_name(&stem));

    Ok((
        [
            (header::CONTENT_TYPE, output.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        output.bytes,
    )
        .into_response())
}

/// Keep download names to a safe character set.
fn sanitize_stem(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect::<String>()
        .trim_matches('.')
        .to_string()
}

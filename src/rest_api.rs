//! HTTP/JSON front end.
//!
//! Three POST endpoints map one-to-one onto device operations and always
//! answer with a stable `{"ok": ..}` shape. Device, transport and protocol
//! failures come back as `200` with `ok: false`; only request problems and
//! internal faults use error status codes.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request, State as AxumState},
    http::{header, HeaderValue, StatusCode},
    middleware::map_response,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{
    error::{AppError, AppResult},
    service::{DeviceService, ServiceError, ServiceResult},
};

const ALLOWED_METHODS: &str = "POST, OPTIONS";

#[derive(Clone)]
pub struct RestContext {
    pub service: DeviceService,
    /// Directory holding `index.html` and `main.js`.
    pub static_dir: PathBuf,
}

// ---------- DTOs ----------
#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub command: u16,
}

#[derive(Debug, Deserialize)]
pub struct ReadRequest {
    pub addr: u16,
}

#[derive(Debug, Deserialize)]
pub struct WriteRequest {
    pub addr: u16,
    pub data: u16,
}

/// Reply for operations that return a value.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct DataResponse {
    pub ok: bool,
    pub data: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Reply for operations that only succeed or fail.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct StatusResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DataResponse {
    fn from_result(result: ServiceResult<u16>) -> AppResult<Self> {
        match result {
            Ok(data) => Ok(Self {
                ok: true,
                data,
                error: None,
            }),
            Err(ServiceError::Device(e)) => Ok(Self {
                ok: false,
                data: 0,
                error: Some(e.to_string()),
            }),
            Err(e @ ServiceError::Join(_)) => Err(AppError::Internal(e.to_string())),
        }
    }
}

impl StatusResponse {
    fn from_result(result: ServiceResult<u16>) -> AppResult<Self> {
        let DataResponse { ok, error, .. } = DataResponse::from_result(result)?;
        Ok(Self { ok, error })
    }
}

/// JSON body extractor that rejects with `400 invalid JSON: ...`.
///
/// Unlike `axum::Json` it does not insist on a `Content-Type` header and
/// reports every decoding failure, including out-of-range numbers, the same
/// way.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::InvalidJson(e.body_text()))?;
        serde_json::from_slice(&bytes)
            .map(JsonBody)
            .map_err(|e| AppError::InvalidJson(e.to_string()))
    }
}

// ---------- Router Builder ----------
pub fn build_router(ctx: RestContext) -> Router {
    let api = Router::new()
        .route("/api/command", post(command).options(preflight))
        .route("/api/read", post(read).options(preflight))
        .route("/api/write", post(write).options(preflight))
        .layer(map_response(allow_methods));

    Router::new()
        .merge(api)
        .route("/", get(index))
        .route("/main.js", get(main_js))
        .route("/health", get(health))
        .with_state(ctx)
}

async fn allow_methods(mut response: Response) -> Response {
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    response
}

// ---------- Handlers ----------
async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn health() -> &'static str {
    "ok"
}

pub async fn command(
    AxumState(ctx): AxumState<RestContext>,
    JsonBody(req): JsonBody<CommandRequest>,
) -> AppResult<Json<DataResponse>> {
    let result = ctx.service.command(req.command).await;
    DataResponse::from_result(result).map(Json)
}

pub async fn read(
    AxumState(ctx): AxumState<RestContext>,
    JsonBody(req): JsonBody<ReadRequest>,
) -> AppResult<Json<DataResponse>> {
    let result = ctx.service.read(req.addr).await;
    DataResponse::from_result(result).map(Json)
}

pub async fn write(
    AxumState(ctx): AxumState<RestContext>,
    JsonBody(req): JsonBody<WriteRequest>,
) -> AppResult<Json<StatusResponse>> {
    let result = ctx.service.write(req.addr, req.data).await;
    StatusResponse::from_result(result).map(Json)
}

async fn index(AxumState(ctx): AxumState<RestContext>) -> AppResult<Response> {
    serve_static(&ctx.static_dir, "index.html", "text/html; charset=utf-8").await
}

async fn main_js(AxumState(ctx): AxumState<RestContext>) -> AppResult<Response> {
    serve_static(&ctx.static_dir, "main.js", "text/javascript; charset=utf-8").await
}

async fn serve_static(dir: &Path, name: &str, content_type: &'static str) -> AppResult<Response> {
    match tokio::fs::read(dir.join(name)).await {
        Ok(body) => Ok(([(header::CONTENT_TYPE, content_type)], body).into_response()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::NotFound),
        Err(e) => Err(AppError::Internal(e.to_string())),
    }
}

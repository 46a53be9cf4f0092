use crate::{error::GatewayError, AppState};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use ledger_core::{Balance, Entry, IntegrityReport, Ledger, TransferRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterKeyRequest {
    pub public_key: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterKeyResponse {
    pub person: String,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PublicKeyResponse {
    pub person: String,
    pub public_key: String,
}

/// Run a ledger call off the async runtime; stores do file IO and admission holds a lock.
async fn blocking<T, F>(ledger: Arc<Ledger>, f: F) -> Result<T, GatewayError>
where
    F: FnOnce(&Ledger) -> ledger_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || f(ledger.as_ref()))
        .await
        .map_err(|e| GatewayError::Internal(format!("ledger task failed: {}", e)))?
        .map_err(GatewayError::from)
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: state.service.clone(),
        version: state.version.clone(),
    })
}

// Prometheus metrics endpoint
pub async fn metrics_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    let text = match state.ledger.metrics() {
        Some(metrics) => metrics
            .export()
            .map_err(|e| GatewayError::Internal(format!("Failed to export metrics: {}", e)))?,
        None => String::new(),
    };
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        text,
    ))
}

pub async fn submit_transfer(
    State(state): State<AppState>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Entry>), GatewayError> {
    let Json(request) = payload.map_err(|e| GatewayError::BadRequest(e.body_text()))?;

    let entry = blocking(state.ledger, move |ledger| ledger.submit(request)).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn list_transfers(
    State(state): State<AppState>,
) -> Result<Json<Vec<Entry>>, GatewayError> {
    let entries = blocking(state.ledger, |ledger| ledger.entries()).await?;
    Ok(Json(entries))
}

pub async fn transfers_for(
    State(state): State<AppState>,
    Path(person): Path<String>,
) -> Result<Json<Vec<Entry>>, GatewayError> {
    let entries = blocking(state.ledger, move |ledger| ledger.entries_for(&person)).await?;
    Ok(Json(entries))
}

pub async fn balance(
    State(state): State<AppState>,
    Path(person): Path<String>,
) -> Result<Json<Balance>, GatewayError> {
    let balance = blocking(state.ledger, move |ledger| ledger.balance(&person)).await?;
    Ok(Json(balance))
}

pub async fn verify(
    State(state): State<AppState>,
) -> Result<Json<IntegrityReport>, GatewayError> {
    let report = blocking(state.ledger, |ledger| ledger.verify()).await?;
    Ok(Json(report))
}

pub async fn register_key(
    State(state): State<AppState>,
    Path(person): Path<String>,
    payload: Result<Json<RegisterKeyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterKeyResponse>), GatewayError> {
    let Json(body) = payload.map_err(|e| GatewayError::BadRequest(e.body_text()))?;

    let registered = person.clone();
    blocking(state.ledger, move |ledger| {
        ledger.register_key(&registered, &body.public_key)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterKeyResponse {
            person,
            status: "registered",
        }),
    ))
}

pub async fn get_key(
    State(state): State<AppState>,
    Path(person): Path<String>,
) -> Result<Json<PublicKeyResponse>, GatewayError> {
    let lookup = person.clone();
    let public_key = blocking(state.ledger, move |ledger| ledger.public_key(&lookup))
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("no public key for {}", person)))?;

    Ok(Json(PublicKeyResponse { person, public_key }))
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    /// Individual health checks and their results.
    pub checks: HealthChecks,
}

/// Individual health check results.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// Whether the JWT signing key is readable and parses.
    pub signing_key: String,
}

/// Health check endpoint handler.
///
/// Never requires a token. Returns 503 when the signing key on disk can no
/// longer be loaded; the gate keeps validating against the last good key
/// in that case.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Signing key unavailable", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let key_ok = match state.gate.loader().current_key() {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check: signing key unavailable");
            false
        }
    };

    let response = HealthResponse {
        status: if key_ok { "ok" } else { "degraded" }.to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            signing_key: if key_ok { "ok" } else { "unavailable" }.to_string(),
        },
    };

    let status = if key_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

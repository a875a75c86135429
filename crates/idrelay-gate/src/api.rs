//! JSON API read by the access dashboard

use axum::extract::State;
use axum::http::HeaderValue;
use axum::http::header::ACCESS_CONTROL_ALLOW_ORIGIN;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router, middleware};
use serde::Serialize;

use crate::access::{AccessRecord, LastAccess, Stats};
use crate::registry::Registry;
use crate::state::GateState;

#[derive(Serialize, Debug)]
pub struct RecentHistory {
    #[serde(rename = "historico")]
    pub entries: Vec<AccessRecord>,
}

#[derive(Serialize, Debug)]
pub struct FullHistory {
    #[serde(rename = "total_tentativas")]
    pub total: usize,
    #[serde(rename = "historico")]
    pub entries: Vec<AccessRecord>,
}

#[derive(Serialize, Debug)]
pub struct AuthorizedList {
    pub total: usize,
    #[serde(rename = "ids_autorizados")]
    pub ids: Registry,
}

pub fn router(state: GateState) -> Router {
    Router::new()
        .route("/api/ultimo_acesso", get(last_access))
        .route("/api/historico_recente", get(recent_history))
        .route("/api/estatisticas", get(statistics))
        .route("/listar_autorizados", get(authorized))
        .route("/historico", get(full_history))
        .layer(middleware::map_response(allow_any_origin))
        .with_state(state)
}

/// The dashboard is served from a different origin.
async fn allow_any_origin(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}

pub async fn last_access(State(state): State<GateState>) -> Json<LastAccess> {
    Json(state.log().read().await.last().clone())
}

pub async fn recent_history(State(state): State<GateState>) -> Json<RecentHistory> {
    let entries = state.log().read().await.recent(state.recent_limit());
    Json(RecentHistory { entries })
}

pub async fn statistics(State(state): State<GateState>) -> Json<Stats> {
    Json(state.log().read().await.stats())
}

pub async fn authorized(State(state): State<GateState>) -> Json<AuthorizedList> {
    let ids = state.registry().clone();
    Json(AuthorizedList {
        total: ids.len(),
        ids,
    })
}

pub async fn full_history(State(state): State<GateState>) -> Json<FullHistory> {
    let entries = state.log().read().await.history().to_vec();
    Json(FullHistory {
        total: entries.len(),
        entries,
    })
}

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, get_service, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tracing::{debug, warn};

use crate::adapter;
use crate::config::PollConfig;
use crate::error::{ErrorKind, RelayError};
use crate::models::{
    BlockSummary, ChainSummary, PriceSummary, SearchResult, TransactionSummary, ValidatorSummary,
};
use crate::poller::{spawn_poller, Snapshot};
use crate::rpc::RpcRelay;
use crate::search::search;

/// Latest polled state for each dashboard view.
#[derive(Debug, Default)]
pub struct Dashboard {
    pub chain: Arc<Snapshot<ChainSummary>>,
    pub transactions: Arc<Snapshot<Vec<TransactionSummary>>>,
    pub blocks: Arc<Snapshot<Vec<BlockSummary>>>,
    pub validators: Arc<Snapshot<ValidatorSummary>>,
    pub price: Arc<Snapshot<PriceSummary>>,
}

impl Dashboard {
    pub fn spawn_pollers(&self, relay: Arc<RpcRelay>, poll: &PollConfig) -> Vec<JoinHandle<()>> {
        let limit = poll.recent_limit;
        vec![
            spawn_poller("chain", poll.chain_period(), Arc::clone(&self.chain), {
                let relay = Arc::clone(&relay);
                move || {
                    let relay = Arc::clone(&relay);
                    async move { adapter::get_chain_summary(&relay).await }
                }
            }),
            spawn_poller(
                "transactions",
                poll.activity_period(),
                Arc::clone(&self.transactions),
                {
                    let relay = Arc::clone(&relay);
                    move || {
                        let relay = Arc::clone(&relay);
                        async move { adapter::get_recent_transactions(&relay, limit).await }
                    }
                },
            ),
            spawn_poller("blocks", poll.activity_period(), Arc::clone(&self.blocks), {
                let relay = Arc::clone(&relay);
                move || {
                    let relay = Arc::clone(&relay);
                    async move { adapter::get_recent_blocks(&relay, limit).await }
                }
            }),
            spawn_poller(
                "validators",
                poll.validators_period(),
                Arc::clone(&self.validators),
                {
                    let relay = Arc::clone(&relay);
                    move || {
                        let relay = Arc::clone(&relay);
                        async move { adapter::get_validator_summary(&relay).await }
                    }
                },
            ),
            spawn_poller("price", poll.price_period(), Arc::clone(&self.price), {
                let relay = Arc::clone(&relay);
                move || {
                    let relay = Arc::clone(&relay);
                    async move { adapter::get_price_summary(&relay).await }
                }
            }),
        ]
    }
}

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<RpcRelay>,
    pub dashboard: Arc<Dashboard>,
}

#[derive(Debug, Deserialize)]
pub struct RelayRequest {
    pub method: String,
    pub params: Option<Vec<Value>>,
    pub id: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

fn relay_error_response(err: &RelayError) -> Response {
    let kind = err.kind();
    let status = match kind {
        ErrorKind::Transport | ErrorKind::Parse => StatusCode::BAD_GATEWAY,
        ErrorKind::Upstream => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let message = match err {
        RelayError::Upstream { message, .. } => message.clone(),
        RelayError::Transport(_) => "RPC unavailable".to_string(),
        RelayError::Status(_) => "RPC call failed".to_string(),
        RelayError::Parse(_) | RelayError::Malformed => "Invalid RPC response".to_string(),
    };
    (status, Json(json!({ "error": message, "kind": kind.as_str() }))).into_response()
}

/// Parses the body as JSON whatever its `Content-Type` header says.
pub async fn relay_rpc(State(state): State<AppState>, body: Bytes) -> Response {
    let request: RelayRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejected relay request: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("Invalid relay request: {}", e) })),
            )
                .into_response();
        }
    };

    match state
        .relay
        .call(&request.method, request.params, request.id)
        .await
    {
        Ok(result) => Json(json!({ "result": result })).into_response(),
        Err(e) => relay_error_response(&e),
    }
}

pub async fn get_chain(State(state): State<AppState>) -> Json<ChainSummary> {
    Json(state.dashboard.chain.get())
}

pub async fn get_transactions(State(state): State<AppState>) -> Json<Vec<TransactionSummary>> {
    Json(state.dashboard.transactions.get())
}

pub async fn get_blocks(State(state): State<AppState>) -> Json<Vec<BlockSummary>> {
    Json(state.dashboard.blocks.get())
}

pub async fn get_validators(State(state): State<AppState>) -> Json<ValidatorSummary> {
    Json(state.dashboard.validators.get())
}

pub async fn get_price(State(state): State<AppState>) -> Json<PriceSummary> {
    Json(state.dashboard.price.get())
}

pub async fn get_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Option<SearchResult>> {
    let query = params.q.unwrap_or_default();
    let result = search(&state.relay, &query).await;
    if result.is_none() {
        debug!(query = %query.trim(), "Search found nothing");
    }
    Json(result)
}

pub fn router(state: AppState, static_dir: Option<PathBuf>) -> Router {
    let router = Router::new()
        .route("/api/rpc", post(relay_rpc))
        .route("/api/chain", get(get_chain))
        .route("/api/transactions", get(get_transactions))
        .route("/api/blocks", get(get_blocks))
        .route("/api/validators", get(get_validators))
        .route("/api/price", get(get_price))
        .route("/api/search", get(get_search));

    let router = match static_dir {
        Some(dir) => router
            .route("/", get(|| async { Redirect::to("/static/index.html") }))
            .nest_service("/static", get_service(ServeDir::new(dir))),
        None => router,
    };

    router.with_state(state)
}

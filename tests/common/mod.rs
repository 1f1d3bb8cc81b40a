//! In-process fake JSON-RPC node for integration tests.
#![allow(dead_code)]

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use zeno_explorer::api::{self, AppState, Dashboard};
use zeno_explorer::config::RpcConfig;
use zeno_explorer::rpc::RpcRelay;

#[derive(Debug, Clone)]
pub enum Reply {
    Result(Value),
    Error(i64, String),
    Status(u16),
    Raw(String),
}

type Handler = Arc<dyn Fn(&[Value]) -> Reply + Send + Sync>;

#[derive(Clone)]
struct NodeState {
    handlers: Arc<HashMap<String, Handler>>,
    requests: Arc<Mutex<Vec<Value>>>,
}

#[derive(Default)]
pub struct FakeNodeBuilder {
    handlers: HashMap<String, Handler>,
}

impl FakeNodeBuilder {
    pub fn result(self, method: &str, value: Value) -> Self {
        self.handler(method, move |_| Reply::Result(value.clone()))
    }

    pub fn reply(self, method: &str, reply: Reply) -> Self {
        self.handler(method, move |_| reply.clone())
    }

    pub fn handler<F>(mut self, method: &str, f: F) -> Self
    where
        F: Fn(&[Value]) -> Reply + Send + Sync + 'static,
    {
        self.handlers.insert(method.to_string(), Arc::new(f));
        self
    }

    pub async fn start(self) -> FakeNode {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = NodeState {
            handlers: Arc::new(self.handlers),
            requests: Arc::clone(&requests),
        };
        let app = Router::new().route("/", post(handle)).with_state(state);
        let url = format!("http://{}", serve(app));
        FakeNode { url, requests }
    }
}

pub struct FakeNode {
    pub url: String,
    requests: Arc<Mutex<Vec<Value>>>,
}

impl FakeNode {
    pub fn builder() -> FakeNodeBuilder {
        FakeNodeBuilder::default()
    }

    pub fn relay(&self) -> RpcRelay {
        RpcRelay::new(&RpcConfig::with_endpoint(self.url.clone())).unwrap()
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|r| r["method"].as_str().map(str::to_string))
            .collect()
    }
}

async fn handle(State(state): State<NodeState>, Json(body): Json<Value>) -> (StatusCode, String) {
    state.requests.lock().unwrap().push(body.clone());

    let method = body["method"].as_str().unwrap_or_default();
    let params = body["params"].as_array().cloned().unwrap_or_default();
    let id = body["id"].clone();

    let reply = match state.handlers.get(method) {
        Some(handler) => handler(&params),
        None => Reply::Error(-32601, "Method not found".to_string()),
    };

    match reply {
        Reply::Result(result) => (
            StatusCode::OK,
            json!({"jsonrpc": "2.0", "id": id, "result": result}).to_string(),
        ),
        Reply::Error(code, message) => (
            StatusCode::OK,
            json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message}})
                .to_string(),
        ),
        Reply::Status(code) => (
            StatusCode::from_u16(code).unwrap(),
            "upstream failure".to_string(),
        ),
        Reply::Raw(text) => (StatusCode::OK, text),
    }
}

/// Binds `app` on an ephemeral localhost port and returns the bound address.
pub fn serve(app: Router) -> SocketAddr {
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let server = axum::Server::bind(&addr).serve(app.into_make_service());
    let local = server.local_addr();
    tokio::spawn(server);
    local
}

/// Starts the explorer HTTP surface against `node` with no pollers running.
pub fn start_explorer(node: &FakeNode) -> (String, Arc<Dashboard>) {
    let dashboard = Arc::new(Dashboard::default());
    let state = AppState {
        relay: Arc::new(node.relay()),
        dashboard: Arc::clone(&dashboard),
    };
    let addr = serve(api::router(state, None));
    (format!("http://{}", addr), dashboard)
}

pub fn signature(seed: char) -> String {
    std::iter::repeat(seed).take(88).collect()
}

pub fn transaction_json(sig: &str, fee: u64, err: Value, instructions: usize) -> Value {
    let instructions: Vec<Value> = (0..instructions)
        .map(|_| json!({"programIdIndex": 0, "accounts": [], "data": ""}))
        .collect();
    json!({
        "transaction": {
            "signatures": [sig],
            "message": {
                "accountKeys": [],
                "instructions": instructions,
            }
        },
        "meta": {"err": err, "fee": fee}
    })
}

pub fn full_block_json(slot: u64, transactions: Vec<Value>) -> Value {
    json!({
        "blockhash": format!("hash-{}", slot),
        "previousBlockhash": format!("hash-{}", slot.saturating_sub(1)),
        "parentSlot": slot.saturating_sub(1),
        "blockTime": 1_700_000_000 + slot as i64,
        "blockHeight": slot,
        "transactions": transactions,
    })
}

pub fn signatures_block_json(slot: u64, count: usize) -> Value {
    let signatures: Vec<String> = (0..count).map(|i| format!("sig-{}-{}", slot, i)).collect();
    json!({
        "blockhash": format!("hash-{}", slot),
        "previousBlockhash": format!("hash-{}", slot.saturating_sub(1)),
        "parentSlot": slot.saturating_sub(1),
        "blockTime": 1_700_000_000 + slot as i64,
        "blockHeight": slot,
        "signatures": signatures,
    })
}

pub fn epoch_info_json() -> Value {
    json!({
        "epoch": 342,
        "slotIndex": 12456,
        "slotsInEpoch": 432000,
        "absoluteSlot": 147_756_456u64,
        "blockHeight": 145789,
        "transactionCount": 1000
    })
}

pub fn supply_json(total_sol: u64, circulating_sol: u64) -> Value {
    json!({
        "context": {"slot": 1},
        "value": {
            "total": total_sol * 1_000_000_000,
            "circulating": circulating_sol * 1_000_000_000,
            "nonCirculating": (total_sol - circulating_sol) * 1_000_000_000,
            "nonCirculatingAccounts": []
        }
    })
}

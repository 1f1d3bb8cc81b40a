use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

use crate::config::RpcConfig;
use crate::error::RelayError;

const LOG_BODY_LIMIT: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    pub params: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    /// `Some(Value::Null)` when the node answered `"result": null`.
    #[serde(default, deserialize_with = "present")]
    pub result: Option<Value>,
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl JsonRpcResponse {
    pub fn into_result(self) -> Result<Value, RelayError> {
        if let Some(error) = self.error {
            let message = if error.message.is_empty() {
                "RPC call failed".to_string()
            } else {
                error.message
            };
            return Err(RelayError::Upstream {
                code: error.code,
                message,
            });
        }
        self.result.ok_or(RelayError::Malformed)
    }
}

/// Single-attempt JSON-RPC 2.0 client bound to one upstream endpoint.
#[derive(Debug, Clone)]
pub struct RpcRelay {
    client: Client,
    endpoint: String,
}

impl RpcRelay {
    pub fn new(config: &RpcConfig) -> Result<Self, RelayError> {
        let client = reqwest::ClientBuilder::new()
            .pool_idle_timeout(Duration::from_secs(300))
            .pool_max_idle_per_host(20)
            .tcp_keepalive(Duration::from_secs(30))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn request_body(method: &str, params: Option<Vec<Value>>, id: Option<u64>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(1),
            method: method.to_string(),
            params: params.unwrap_or_default(),
        }
    }

    pub async fn call(
        &self,
        method: &str,
        params: Option<Vec<Value>>,
        id: Option<u64>,
    ) -> Result<Value, RelayError> {
        self.call_timed(method, params, id).await.map(|(result, _)| result)
    }

    /// Like [`RpcRelay::call`], also returning the round-trip in milliseconds.
    pub async fn call_timed(
        &self,
        method: &str,
        params: Option<Vec<Value>>,
        id: Option<u64>,
    ) -> Result<(Value, u128), RelayError> {
        let request = Self::request_body(method, params, id);
        debug!(endpoint = %self.endpoint, method, params = ?request.params, "RPC request");

        let start = Instant::now();
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(method, "RPC transport failure: {}", e);
                RelayError::from(e)
            })?;
        let latency = start.elapsed().as_millis();

        let status = response.status();
        if !status.is_success() {
            warn!(method, %status, "RPC response not ok");
            return Err(RelayError::Status(status));
        }

        let text = response.text().await?;
        trace!(method, "RPC raw response: {}", truncate(&text, LOG_BODY_LIMIT));

        let rpc_response: JsonRpcResponse = serde_json::from_str(&text).map_err(|e| {
            debug!(method, "Failed to parse RPC response: {}", e);
            RelayError::from(e)
        })?;

        let result = rpc_response.into_result().map_err(|e| {
            debug!(method, "RPC returned error: {}", e);
            e
        })?;

        Ok((result, latency))
    }

    /// Calls `method` and decodes its `result` into `T`.
    pub async fn fetch<T>(&self, method: &str, params: Vec<Value>) -> Result<T, RelayError>
    where
        T: DeserializeOwned,
    {
        self.fetch_timed(method, params).await.map(|(result, _)| result)
    }

    pub async fn fetch_timed<T>(&self, method: &str, params: Vec<Value>) -> Result<(T, u128), RelayError>
    where
        T: DeserializeOwned,
    {
        let (value, latency) = self.call_timed(method, Some(params), None).await?;
        let result = serde_json::from_value(value).map_err(|e| {
            debug!(method, "Unexpected result shape: {}", e);
            RelayError::from(e)
        })?;
        Ok((result, latency))
    }
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_body_applies_defaults() {
        let body = RpcRelay::request_body("getHealth", None, None);
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"jsonrpc": "2.0", "id": 1, "method": "getHealth", "params": []})
        );
    }

    #[test]
    fn request_body_keeps_explicit_values() {
        let body = RpcRelay::request_body("getBlock", Some(vec![json!(42)]), Some(7));
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"jsonrpc": "2.0", "id": 7, "method": "getBlock", "params": [42]})
        );
    }

    #[test]
    fn null_result_is_present() {
        let response: JsonRpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"result":null}"#).unwrap();
        assert_eq!(response.into_result().unwrap(), Value::Null);
    }

    #[test]
    fn missing_result_and_error_is_malformed() {
        let response: JsonRpcResponse = serde_json::from_str(r#"{"jsonrpc":"2.0","id":1}"#).unwrap();
        assert!(matches!(response.into_result(), Err(RelayError::Malformed)));
    }

    #[test]
    fn error_object_wins_over_result() {
        let response: JsonRpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"Method not found"}}"#,
        )
        .unwrap();
        match response.into_result() {
            Err(RelayError::Upstream { code, message }) => {
                assert_eq!(code, Some(-32601));
                assert_eq!(message, "Method not found");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("ok", 500), "ok");
    }
}

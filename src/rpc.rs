//! Typed JSON-RPC transport shared by the read endpoint and the wallet

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::RpcError;

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct JsonRpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcErrorObject>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// JSON-RPC 2.0 client over HTTP POST
#[derive(Clone, Debug)]
pub struct JsonRpcClient {
    inner: Client,
    url: Url,
    next_id: Arc<AtomicU64>,
}

impl JsonRpcClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, RpcError> {
        let url = Url::parse(endpoint)
            .map_err(|e| RpcError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(RpcError::InvalidEndpoint(endpoint.to_string()));
        }
        let inner = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            inner,
            url,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    /// Issues a raw call returning the untyped result. A JSON `null` result
    /// is returned as `Value::Null`, not as an error.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            params,
        };
        trace!(id, method, "rpc request");

        let response = self.inner.post(self.url.clone()).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(RpcError::HttpStatus(response.status()));
        }

        let body: Value = response.json().await?;
        let response: JsonRpcResponse = serde_json::from_value(body)?;
        if let Some(error) = response.error {
            debug!(id, method, code = error.code, message = %error.message, "rpc error");
            return Err(RpcError::Remote {
                code: error.code,
                message: error.message,
            });
        }

        match response.result {
            Some(v) => Ok(v),
            None if response.id.is_some() => Ok(Value::Null),
            None => Err(RpcError::EmptyResponse),
        }
    }

    /// Issues a call and deserialises the result into `R`.
    pub async fn call<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<R, RpcError> {
        let value = self.request(method, params).await?;
        Ok(serde_json::from_value(value)?)
    }
}

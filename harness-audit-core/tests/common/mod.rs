#![allow(dead_code)]
//! Scripted transport shared by the integration tests.
//!
//! Responses are queued per `(method, path)` and served first in, first out. Anything
//! not scripted answers 404. Every request is recorded for later assertions.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use harness_audit_core::config::HarnessConfig;
use harness_audit_core::contract::{
    ApiRequest, ApiResponse, HttpMethod, HttpTransport, TransportError,
};
use serde_json::Value;

pub const BASE_URL: &str = "https://harness.test";

pub fn test_config() -> HarnessConfig {
    HarnessConfig::new("acct-1", "pat-secret")
        .with_base_url(BASE_URL)
        .expect("valid base url")
}

type Route = (HttpMethod, String);

#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<Route, VecDeque<Result<ApiResponse, TransportError>>>>,
    log: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: HttpMethod, path: &str, outcome: Result<ApiResponse, TransportError>) {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(outcome);
    }

    pub fn ok(&self, method: HttpMethod, path: &str, body: Value) -> &Self {
        self.push(method, path, Ok(ApiResponse::json(200, &body)));
        self
    }

    pub fn status(&self, method: HttpMethod, path: &str, status: u16) -> &Self {
        self.push(
            method,
            path,
            Ok(ApiResponse {
                status,
                body: "{\"message\":\"scripted failure\"}".to_string(),
            }),
        );
        self
    }

    pub fn timeout(&self, method: HttpMethod, path: &str) -> &Self {
        self.push(method, path, Err(TransportError::Timeout("scripted".into())));
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.log.lock().unwrap().clone()
    }

    /// Requests sent to one path, in order.
    pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        let url = format!("{BASE_URL}{path}");
        self.requests()
            .into_iter()
            .filter(|r| r.url == url)
            .collect()
    }
}

fn path_of(url: &str) -> String {
    url.strip_prefix(BASE_URL).unwrap_or(url).to_string()
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let route = (request.method, path_of(&request.url));
        self.log.lock().unwrap().push(request);
        self.routes
            .lock()
            .unwrap()
            .get_mut(&route)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Ok(ApiResponse {
                    status: 404,
                    body: String::new(),
                })
            })
    }
}

pub fn page(items: Value, last: bool) -> Value {
    serde_json::json!({"status": "SUCCESS", "data": {"content": items, "last": last}})
}

//! Authenticated access to the platform's REST API.
//!
//! [`HarnessClient::request`] is the single boundary where transport and HTTP failures are
//! turned into `None`; nothing above it sees an error for a failed call.

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::HarnessConfig;
use crate::contract::{ApiRequest, HttpMethod, HttpTransport};

/// Paths under these prefixes are served from the host root; everything else lives
/// under the NextGen `/ng/api` prefix.
const ROOT_PATH_MARKERS: [&str; 2] = ["/pipeline/api/", "/gateway/"];
const NG_API_PREFIX: &str = "/ng/api";
const API_KEY_HEADER: &str = "x-api-key";

pub struct HarnessClient<'a, T> {
    config: &'a HarnessConfig,
    transport: T,
}

impl<'a, T: HttpTransport> HarnessClient<'a, T> {
    pub fn new(config: &'a HarnessConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &HarnessConfig {
        self.config
    }

    pub fn resolve_url(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        if ROOT_PATH_MARKERS
            .iter()
            .any(|marker| path.starts_with(marker))
        {
            format!("{base}{path}")
        } else {
            format!("{base}{NG_API_PREFIX}{path}")
        }
    }

    /// Query pairs carried by every call.
    pub fn account_query(&self) -> Vec<(String, String)> {
        vec![(
            "accountIdentifier".to_string(),
            self.config.account_id.clone(),
        )]
    }

    /// Sends one request and returns the decoded JSON body, or `None` on any failure.
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        query: Vec<(String, String)>,
        body: Option<Value>,
    ) -> Option<Value> {
        let url = self.resolve_url(path);
        let request = ApiRequest {
            method,
            url: url.clone(),
            query,
            headers: vec![
                (API_KEY_HEADER.to_string(), self.config.api_key.clone()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body,
        };
        debug!(method = method.as_str(), url = %url, "Sending API request");

        let response = match self.transport.send(request).await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(method = method.as_str(), url = %url, error = %e, "API request failed");
                return None;
            }
        };

        if !response.is_success() {
            if response.status == 404 {
                debug!(method = method.as_str(), url = %url, status = 404, "API endpoint not found");
            } else {
                warn!(
                    method = method.as_str(),
                    url = %url,
                    status = response.status,
                    body = %response.body,
                    "API request failed"
                );
            }
            return None;
        }

        match serde_json::from_str::<Value>(&response.body) {
            Ok(json) => Some(json),
            Err(e) => {
                warn!(url = %url, error = %e, "API response was not valid JSON");
                None
            }
        }
    }
}

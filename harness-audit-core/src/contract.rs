//! # contract: plain data and the transport seam
//!
//! Resource snapshots (`Organization`, `Project`, `Pipeline`), the [`Listing`] result
//! used by every collection fetch, and the [`HttpTransport`] trait that the API client
//! sends requests through.
//!
//! ## Mocking & Testing
//! - [`HttpTransport`] is annotated for `mockall`; `MockHttpTransport` is exported under
//!   the default `test-export-mocks` feature so integration tests can use it.

use async_trait::async_trait;
use mockall::automock;
use serde_json::Value;
use thiserror::Error;

/// Identifier used when an API item carries none.
pub const UNKNOWN_IDENTIFIER: &str = "unknown";

/// Looks through a wrapper object (`{"organization": {...}}`) to the resource itself.
fn unwrap_resource<'a>(item: &'a Value, wrapper: &str) -> &'a Value {
    item.get(wrapper).filter(|v| v.is_object()).unwrap_or(item)
}

fn string_field(item: &Value, key: &str) -> Option<String> {
    item.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    pub identifier: String,
    pub name: String,
}

impl Organization {
    pub fn from_value(item: &Value) -> Self {
        let data = unwrap_resource(item, "organization");
        let identifier =
            string_field(data, "identifier").unwrap_or_else(|| UNKNOWN_IDENTIFIER.to_string());
        let name = string_field(data, "name").unwrap_or_else(|| identifier.clone());
        Self { identifier, name }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub identifier: String,
    pub name: String,
    pub org_identifier: String,
}

impl Project {
    pub fn from_value(item: &Value, org: &Organization) -> Self {
        let data = unwrap_resource(item, "project");
        let identifier =
            string_field(data, "identifier").unwrap_or_else(|| UNKNOWN_IDENTIFIER.to_string());
        let name = string_field(data, "name").unwrap_or_else(|| identifier.clone());
        Self {
            identifier,
            name,
            org_identifier: org.identifier.clone(),
        }
    }

    pub fn is_known(&self) -> bool {
        self.identifier != UNKNOWN_IDENTIFIER
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub identifier: String,
    pub name: String,
    pub org_identifier: String,
    pub project_identifier: String,
}

impl Pipeline {
    /// Pipelines listed without an identifier fall back to their name.
    pub fn from_value(item: &Value, project: &Project) -> Self {
        let data = unwrap_resource(item, "pipeline");
        let identifier = string_field(data, "identifier")
            .or_else(|| string_field(data, "name"))
            .unwrap_or_else(|| UNKNOWN_IDENTIFIER.to_string());
        let name = string_field(data, "name").unwrap_or_else(|| identifier.clone());
        Self {
            identifier,
            name,
            org_identifier: project.org_identifier.clone(),
            project_identifier: project.identifier.clone(),
        }
    }

    pub fn is_known(&self) -> bool {
        self.identifier != UNKNOWN_IDENTIFIER
    }
}

/// Outcome of fetching a collection.
///
/// `Empty` means the server confirmed there is nothing; `Unavailable` means no request
/// produced a usable answer. Callers decide whether the two deserve different handling.
#[derive(Debug, Clone, PartialEq)]
pub enum Listing<T> {
    Items(Vec<T>),
    Empty,
    Unavailable,
}

impl<T> Listing<T> {
    pub fn from_items(items: Vec<T>) -> Self {
        if items.is_empty() {
            Listing::Empty
        } else {
            Listing::Items(items)
        }
    }

    pub fn items(&self) -> &[T] {
        match self {
            Listing::Items(items) => items,
            Listing::Empty | Listing::Unavailable => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Listing::Unavailable)
    }

    pub fn map<U, F>(self, f: F) -> Listing<U>
    where
        F: FnMut(T) -> U,
    {
        match self {
            Listing::Items(items) => Listing::Items(items.into_iter().map(f).collect()),
            Listing::Empty => Listing::Empty,
            Listing::Unavailable => Listing::Unavailable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// A fully resolved request: absolute URL, query pairs, headers and optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("http transport error: {0}")]
    Transport(String),
}

/// Transport boundary for all HTTP I/O. Implemented by the reqwest transport and by mocks.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for &T {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        (**self).send(request).await
    }
}

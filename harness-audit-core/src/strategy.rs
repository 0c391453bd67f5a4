//! Ordered request strategies for endpoints whose exact contract varies between
//! platform versions, and the combinator that tries them.

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::client::HarnessClient;
use crate::contract::{HttpMethod, HttpTransport, Listing, Pipeline, Project};

/// One way of asking for a resource.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestStrategy {
    pub name: &'static str,
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Tries `strategies` in order and returns the first value `extract` accepts.
///
/// A strategy fails when its request yields nothing or when `extract` rejects the
/// payload; either way the next one is tried.
pub async fn first_success<T, U, F>(
    client: &HarnessClient<'_, T>,
    strategies: &[RequestStrategy],
    mut extract: F,
) -> Option<U>
where
    T: HttpTransport,
    F: FnMut(&RequestStrategy, &Value) -> Option<U>,
{
    for strategy in strategies {
        debug!(strategy = strategy.name, "Trying request strategy");
        let Some(response) = client
            .request(
                strategy.method,
                &strategy.path,
                strategy.query.clone(),
                strategy.body.clone(),
            )
            .await
        else {
            continue;
        };
        if let Some(found) = extract(strategy, &response) {
            info!(strategy = strategy.name, "Request strategy succeeded");
            return Some(found);
        }
    }
    None
}

/// What a pipeline list payload turned out to contain.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineItems {
    Items(Vec<Value>),
    Unrecognized(Vec<String>),
}

fn payload_data(response: &Value) -> &Value {
    response.get("data").unwrap_or(response)
}

fn non_empty_array<'v>(data: &'v Value, key: &str) -> Option<&'v Vec<Value>> {
    data.get(key)
        .and_then(Value::as_array)
        .filter(|items| !items.is_empty())
}

/// Checks, in order: a bare list, a non-empty `content`, a non-empty `pipelines`, and a
/// `totalElements` count (which confirms an empty page).
pub fn extract_pipeline_items(response: &Value) -> PipelineItems {
    let data = payload_data(response);
    if let Some(items) = data.as_array() {
        return PipelineItems::Items(items.clone());
    }
    let Some(object) = data.as_object() else {
        return PipelineItems::Unrecognized(Vec::new());
    };
    if let Some(items) = non_empty_array(data, "content") {
        return PipelineItems::Items(items.clone());
    }
    if let Some(items) = non_empty_array(data, "pipelines") {
        return PipelineItems::Items(items.clone());
    }
    if object.contains_key("totalElements") {
        let items = data
            .get("content")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        return PipelineItems::Items(items);
    }
    PipelineItems::Unrecognized(object.keys().cloned().collect())
}

/// Pulls a pipeline's YAML out of a detail payload: an explicit YAML field, else the
/// `pipeline` member or the whole object re-serialized as YAML.
pub fn extract_pipeline_yaml(response: &Value) -> Option<String> {
    let data = payload_data(response);
    let object = data.as_object()?;
    for key in ["yamlPipeline", "yaml", "pipelineYaml"] {
        if let Some(yaml) = object.get(key).and_then(Value::as_str) {
            return Some(yaml.to_string());
        }
    }
    let source = object.get("pipeline").unwrap_or(data);
    serde_yaml::to_string(source).ok()
}

impl<T: HttpTransport> HarnessClient<'_, T> {
    fn project_query(&self, project: &Project) -> Vec<(String, String)> {
        let mut query = self.account_query();
        query.push(("orgIdentifier".to_string(), project.org_identifier.clone()));
        query.push(("projectIdentifier".to_string(), project.identifier.clone()));
        query
    }

    pub fn pipeline_list_strategies(&self, project: &Project) -> Vec<RequestStrategy> {
        let size = self.config().page_size.to_string();
        let size = size.as_str();
        let with = |extra: &[(&str, &str)]| {
            let mut query = self.project_query(project);
            query.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
            query
        };
        vec![
            RequestStrategy {
                name: "POST /pipeline/api/pipelines/list",
                method: HttpMethod::Post,
                path: "/pipeline/api/pipelines/list".to_string(),
                query: with(&[("page", "0"), ("size", size)]),
                body: Some(json!({"filterType": "PipelineSetup"})),
            },
            RequestStrategy {
                name: "GET /pipelines",
                method: HttpMethod::Get,
                path: "/pipelines".to_string(),
                query: with(&[("page", "0"), ("limit", size)]),
                body: None,
            },
            RequestStrategy {
                name: "POST /ng/api/pipelines/list",
                method: HttpMethod::Post,
                path: "/pipelines/list".to_string(),
                query: with(&[]),
                body: Some(json!({"filterType": "PipelineSetup"})),
            },
        ]
    }

    pub fn pipeline_yaml_strategies(&self, pipeline: &Pipeline) -> Vec<RequestStrategy> {
        let mut query = self.account_query();
        query.push(("orgIdentifier".to_string(), pipeline.org_identifier.clone()));
        query.push((
            "projectIdentifier".to_string(),
            pipeline.project_identifier.clone(),
        ));
        vec![
            RequestStrategy {
                name: "GET /ng/api/pipelines/{id}",
                method: HttpMethod::Get,
                path: format!("/pipelines/{}", pipeline.identifier),
                query: query.clone(),
                body: None,
            },
            RequestStrategy {
                name: "GET /pipeline/api/pipelines/{id}",
                method: HttpMethod::Get,
                path: format!("/pipeline/api/pipelines/{}", pipeline.identifier),
                query,
                body: None,
            },
        ]
    }

    /// Lists a project's pipelines, falling back across request shapes.
    pub async fn pipelines(&self, project: &Project) -> Listing<Pipeline> {
        let strategies = self.pipeline_list_strategies(project);
        let found = first_success(self, &strategies, |strategy, response| {
            match extract_pipeline_items(response) {
                PipelineItems::Items(items) => Some(items),
                PipelineItems::Unrecognized(keys) => {
                    warn!(
                        strategy = strategy.name,
                        project = %project.identifier,
                        ?keys,
                        "Unexpected pipeline list response structure"
                    );
                    None
                }
            }
        })
        .await;

        match found {
            Some(items) => {
                debug!(project = %project.identifier, count = items.len(), "Listed pipelines");
                Listing::from_items(items).map(|item| Pipeline::from_value(&item, project))
            }
            None => {
                warn!(
                    org = %project.org_identifier,
                    project = %project.identifier,
                    "All pipeline list strategies failed"
                );
                Listing::Unavailable
            }
        }
    }

    pub async fn pipeline_yaml(&self, pipeline: &Pipeline) -> Option<String> {
        let strategies = self.pipeline_yaml_strategies(pipeline);
        first_success(self, &strategies, |_, response| extract_pipeline_yaml(response)).await
    }
}

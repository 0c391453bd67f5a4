//! Page-index pagination over `data.content` / `data.last` responses.

use std::future::Future;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::HarnessClient;
use crate::contract::{HttpMethod, HttpTransport, Listing, Organization, Project};

/// One decoded page: its content items and whether the server marked it as the last.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub content: Vec<Value>,
    pub last: bool,
}

impl Page {
    /// `None` when the response has no `data` object or no content. A missing `last`
    /// flag is treated as terminal.
    pub fn from_response(response: &Value) -> Option<Page> {
        let data = response.get("data").filter(|d| is_present(d))?;
        let content = data
            .get("content")
            .and_then(Value::as_array)
            .filter(|items| !items.is_empty())?;
        let last = data.get("last").and_then(Value::as_bool).unwrap_or(true);
        Some(Page {
            content: content.clone(),
            last,
        })
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

/// Walks pages from index 0 until the server signals the end.
///
/// An absent first response yields `Unavailable`; a failure on a later page keeps what
/// was collected so far.
pub async fn list_all<F, Fut>(mut fetch_page: F) -> Listing<Value>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Option<Value>>,
{
    let mut items = Vec::new();
    let mut page_index = 0u32;

    loop {
        let Some(response) = fetch_page(page_index).await else {
            if page_index == 0 {
                return Listing::Unavailable;
            }
            warn!(page_index, collected = items.len(), "Page fetch failed, keeping collected items");
            break;
        };

        let Some(page) = Page::from_response(&response) else {
            debug!(page_index, "Page carried no content, stopping");
            break;
        };

        debug!(page_index, count = page.content.len(), last = page.last, "Fetched page");
        items.extend(page.content);
        if page.last {
            break;
        }
        page_index += 1;
    }

    Listing::from_items(items)
}

impl<T: HttpTransport> HarnessClient<'_, T> {
    fn paged_query(&self, extra: &[(&str, &str)], page_index: u32) -> Vec<(String, String)> {
        let mut query = self.account_query();
        query.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        query.push(("pageIndex".to_string(), page_index.to_string()));
        query.push(("pageSize".to_string(), self.config().page_size.to_string()));
        query
    }

    pub async fn organizations(&self) -> Listing<Organization> {
        let listing = list_all(|page| {
            self.request(HttpMethod::Get, "/organizations", self.paged_query(&[], page), None)
        })
        .await;
        info!(count = listing.len(), unavailable = listing.is_unavailable(), "Listed organizations");
        listing.map(|item| Organization::from_value(&item))
    }

    pub async fn projects(&self, org: &Organization) -> Listing<Project> {
        let extra = [("orgIdentifier", org.identifier.as_str())];
        let listing = list_all(|page| {
            self.request(HttpMethod::Get, "/projects", self.paged_query(&extra, page), None)
        })
        .await;
        info!(
            org = %org.identifier,
            count = listing.len(),
            unavailable = listing.is_unavailable(),
            "Listed projects"
        );
        listing.map(|item| Project::from_value(&item, org))
    }
}

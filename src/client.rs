//! Cached client for the remote graph API.
//!
//! Every endpoint method is a [`cached_call`] around a single GET. Collection
//! and membership results are kept for the long collection TTL; the raw
//! request underneath is cached separately for the short request TTL.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum_macros::{AsRefStr, Display};
use tracing::{debug, warn};

use crate::cache::{ResponseCache, cached_call};
use crate::error::BrowserError;
use crate::timers::RequestTimer;

pub const HOUR: Duration = Duration::from_secs(60 * 60);
pub const DAY: Duration = Duration::from_secs(24 * 60 * 60);

pub const NAMESPACES_URL: &str =
    "https://dev.azure.com/{organization}/_apis/securitynamespaces?api-version=5.0";
pub const GROUPS_URL: &str =
    "https://vssps.dev.azure.com/{organization}/_apis/graph/groups?api-version=5.0-preview.1";
pub const USERS_URL: &str =
    "https://vssps.dev.azure.com/{organization}/_apis/graph/users?api-version=5.0-preview.1";
pub const MEMBERSHIPS_URL: &str = "https://vssps.dev.azure.com/{organization}/_apis/Graph/Memberships/{descriptor}?direction={direction}";

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(\w+)\}").expect("placeholder pattern is valid"));

/// Membership edge direction, as the API spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display)]
pub enum Direction {
    /// Containers of the subject
    Up,
    /// Members of the subject
    Down,
}

impl Direction {
    /// The field of a membership record naming the entity at the far end.
    pub fn target_field(self) -> &'static str {
        match self {
            Direction::Up => "containerDescriptor",
            Direction::Down => "memberDescriptor",
        }
    }
}

/// URL templates for each endpoint.
///
/// Templates may use `{organization}`, and the memberships template also
/// `{descriptor}` and `{direction}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Endpoints {
    pub namespaces: String,
    pub groups: String,
    pub users: String,
    pub memberships: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            namespaces: NAMESPACES_URL.to_string(),
            groups: GROUPS_URL.to_string(),
            users: USERS_URL.to_string(),
            memberships: MEMBERSHIPS_URL.to_string(),
        }
    }
}

/// Substitute `{name}` placeholders in `template` from `params`.
pub fn expand_template(
    template: &str,
    params: &BTreeMap<&str, &str>,
) -> Result<String, BrowserError> {
    let mut unknown: Option<String> = None;
    let expanded = PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
        match params.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => {
                unknown.get_or_insert_with(|| caps[1].to_string());
                String::new()
            }
        }
    });

    match unknown {
        Some(name) => Err(BrowserError::InvalidTemplate(format!(
            "unknown placeholder '{{{name}}}' in '{template}'"
        ))),
        None => Ok(expanded.into_owned()),
    }
}

/// Normalize a collection response to its items.
///
/// The API answers either with a bare array or with a `{count, value}`
/// envelope.
pub fn unwrap_collection(data: Value) -> Result<Vec<Value>, BrowserError> {
    match data {
        Value::Array(items) => Ok(items),
        Value::Object(mut envelope) if envelope.contains_key("count") => {
            match envelope.remove("value") {
                Some(Value::Array(items)) => Ok(items),
                _ => Err(BrowserError::Upstream(
                    "collection envelope has no 'value' array".to_string(),
                )),
            }
        }
        other => Err(BrowserError::Upstream(format!(
            "expected a collection, got {}",
            truncate(&other.to_string(), 200)
        ))),
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// The HTTP boundary: fetch a URL and decode its JSON body.
pub trait Transport: Send + Sync {
    fn get_json(&self, url: &str) -> Result<Value, BrowserError>;
}

/// Blocking HTTP transport authenticating with a personal access token.
pub struct HttpTransport {
    client: Client,
    token: String,
}

impl HttpTransport {
    pub fn new(
        token: impl Into<String>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, BrowserError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(HttpTransport {
            client,
            token: token.into(),
        })
    }
}

impl Transport for HttpTransport {
    fn get_json(&self, url: &str) -> Result<Value, BrowserError> {
        debug!(event = "Upstream", phase = "Request", url);

        // Personal access tokens go in the basic-auth username with an empty password.
        let resp = self
            .client
            .get(url)
            .basic_auth(&self.token, Some(""))
            .send()?;

        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            warn!(event = "Upstream", phase = "Status", url, status = status.as_u16());
            return Err(BrowserError::Upstream(format!(
                "GET {url} returned {status}: {}",
                truncate(&body, 200)
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            BrowserError::Upstream(format!("GET {url} returned a non-JSON body: {e}"))
        })
    }
}

/// Per-endpoint access to the remote API, each call going through the cache.
pub struct RemoteApiClient {
    organization: String,
    transport: Arc<dyn Transport>,
    cache: Arc<dyn ResponseCache>,
    endpoints: Endpoints,
    request_ttl: Duration,
    collection_ttl: Duration,
}

impl RemoteApiClient {
    pub fn new(
        organization: impl Into<String>,
        transport: Arc<dyn Transport>,
        cache: Arc<dyn ResponseCache>,
    ) -> Self {
        RemoteApiClient {
            organization: organization.into(),
            transport,
            cache,
            endpoints: Endpoints::default(),
            request_ttl: HOUR,
            collection_ttl: 30 * DAY,
        }
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Override the raw-request and collection TTLs.
    pub fn with_ttls(mut self, request_ttl: Duration, collection_ttl: Duration) -> Self {
        self.request_ttl = request_ttl;
        self.collection_ttl = collection_ttl;
        self
    }

    pub fn get_namespaces(&self) -> Result<Vec<Value>, BrowserError> {
        self.collection("get_namespaces", json!({}), &self.endpoints.namespaces, &[], |_| Ok(()))
    }

    pub fn get_groups(&self) -> Result<Vec<Value>, BrowserError> {
        self.collection("get_groups", json!({}), &self.endpoints.groups, &[], |_| Ok(()))
    }

    pub fn get_users(&self) -> Result<Vec<Value>, BrowserError> {
        self.collection("get_users", json!({}), &self.endpoints.users, &[], |_| Ok(()))
    }

    /// Membership records of the groups `descriptor` belongs to.
    pub fn get_entity_memberships(&self, descriptor: &str) -> Result<Vec<Value>, BrowserError> {
        self.memberships("get_entity_memberships", descriptor, Direction::Up)
    }

    /// Membership records of the entities belonging to `descriptor`.
    pub fn get_entity_members(&self, descriptor: &str) -> Result<Vec<Value>, BrowserError> {
        self.memberships("get_entity_members", descriptor, Direction::Down)
    }

    fn memberships(
        &self,
        operation: &str,
        descriptor: &str,
        direction: Direction,
    ) -> Result<Vec<Value>, BrowserError> {
        let field = direction.target_field();
        self.collection(
            operation,
            json!({ "descriptor": descriptor }),
            &self.endpoints.memberships,
            &[("descriptor", descriptor), ("direction", direction.as_ref())],
            |records| {
                if records.iter().all(|r| r.get(field).is_some_and(Value::is_string)) {
                    Ok(())
                } else {
                    Err(BrowserError::Upstream(format!(
                        "membership record for '{descriptor}' has no '{field}'"
                    )))
                }
            },
        )
    }

    /// Fetch a collection through both cache layers.
    ///
    /// `check` runs on the items before anything is stored, so a body that is
    /// not a collection, or whose records `check` rejects, is never cached.
    fn collection<V>(
        &self,
        operation: &str,
        mut args: Value,
        template: &str,
        params: &[(&str, &str)],
        check: V,
    ) -> Result<Vec<Value>, BrowserError>
    where
        V: Fn(&[Value]) -> Result<(), BrowserError>,
    {
        args["organization"] = json!(self.organization);
        args["url"] = json!(template);
        let data = cached_call(
            self.cache.as_ref(),
            operation,
            &args,
            self.collection_ttl,
            || self.get_request(template, params, &check),
        )?;
        unwrap_collection(data)
    }

    /// Expand `template` and GET it, cached for the request TTL. Only
    /// collections accepted by `check` are stored, as a bare array.
    fn get_request<V>(
        &self,
        template: &str,
        params: &[(&str, &str)],
        check: &V,
    ) -> Result<Value, BrowserError>
    where
        V: Fn(&[Value]) -> Result<(), BrowserError>,
    {
        let mut values: BTreeMap<&str, &str> = params.iter().copied().collect();
        values.insert("organization", self.organization.as_str());

        let args = json!({ "url": template, "args": values });
        cached_call(self.cache.as_ref(), "get_request", &args, self.request_ttl, || {
            let url = expand_template(template, &values)?;
            let _timer = RequestTimer::new(&url);
            let items = unwrap_collection(self.transport.get_json(&url)?)?;
            check(&items)?;
            Ok(Value::Array(items))
        })
    }
}

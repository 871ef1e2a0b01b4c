// Transport-neutral request model

use crate::routes::Target;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The channel a request originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    All,
    Api,
    Cli,
    Web,
    Queue,
    File,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::All => "*",
            Source::Api => "api",
            Source::Cli => "cli",
            Source::Web => "web",
            Source::Queue => "queue",
            Source::File => "file",
        }
    }

    pub fn parse(text: &str) -> Source {
        match text.trim().to_lowercase().as_str() {
            "api" => Source::Api,
            "cli" => Source::Cli,
            "web" => Source::Web,
            "queue" | "que" => Source::Queue,
            "file" => Source::File,
            _ => Source::All,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Source::All)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Verb constants. Requests and targets use plain strings so transports can
/// supply their native verbs; `AUTO` on a target resolves at registration.
pub mod verbs {
    pub const ALL: &str = "*";
    pub const AUTO: &str = "auto";
    pub const GET: &str = "get";
    pub const POST: &str = "post";
    pub const PUT: &str = "put";
    pub const PATCH: &str = "patch";
    pub const DELETE: &str = "delete";
    pub const CLI: &str = "cli";
}

pub const VERSION_DEFAULT: &str = "1.0";

/// A transport-neutral description of one inbound call.
///
/// Universal route = {area}.{resource}.{action}
/// - Web   : POST https://{host}/api/app/users/activate
/// - CLI   : :> app.users.activate -phone="123" -code=5
/// - Queue : JSON { "path": "app.users.activate", "meta": {}, "data": {} }
///
/// Requests are built by transport adapters, consumed by the engine and
/// never mutated; the parts always decompose into exactly
/// area / resource / action, padded with empty strings when absent.
#[derive(Clone)]
pub struct Request {
    pub path: String,
    pub parts: Vec<String>,
    pub source: Source,
    pub verb: String,
    pub data: HashMap<String, Value>,
    pub meta: HashMap<String, Value>,
    /// Opaque handle to the transport's native request object.
    pub raw: Option<Arc<dyn Any + Send + Sync>>,
    /// Correlation tag, unique per request.
    pub tag: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl Request {
    /// Builds a request from an explicit area / resource / action route.
    pub fn api(
        area: &str,
        resource: &str,
        action: &str,
        verb: &str,
        meta: HashMap<String, Value>,
        data: HashMap<String, Value>,
    ) -> Self {
        let parts = vec![area.to_string(), resource.to_string(), action.to_string()];
        Self::build(parts, Source::Api, verb, meta, data)
    }

    /// Builds a request from a delimited path such as "app.users.activate"
    /// or "app/users/activate". A trailing "?" becomes its own part so the
    /// help check can see it.
    pub fn path(
        path: &str,
        source: Source,
        verb: &str,
        meta: HashMap<String, Value>,
        data: HashMap<String, Value>,
    ) -> Self {
        let parts = split_path(path);
        Self::build(parts, source, verb, meta, data)
    }

    /// Builds a CLI request; the verb for console calls is always "cli".
    pub fn cli(path: &str, meta: HashMap<String, Value>, data: HashMap<String, Value>) -> Self {
        Self::path(path, Source::Cli, verbs::CLI, meta, data)
    }

    fn build(
        parts: Vec<String>,
        source: Source,
        verb: &str,
        meta: HashMap<String, Value>,
        data: HashMap<String, Value>,
    ) -> Self {
        let path = parts.join(".");
        Self {
            path,
            parts,
            source,
            verb: verb.to_lowercase(),
            data,
            meta,
            raw: None,
            tag: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            version: VERSION_DEFAULT.to_string(),
        }
    }

    pub fn with_raw(mut self, raw: Arc<dyn Any + Send + Sync>) -> Self {
        self.raw = Some(raw);
        self
    }

    /// Route segment accessors; "?" markers are not route segments.
    pub fn area(&self) -> &str {
        self.segment(0)
    }

    pub fn resource(&self) -> &str {
        self.segment(1)
    }

    pub fn action(&self) -> &str {
        self.segment(2)
    }

    fn segment(&self, index: usize) -> &str {
        self.parts
            .iter()
            .filter(|p| p.as_str() != "?")
            .nth(index)
            .map(|p| p.as_str())
            .unwrap_or("")
    }

    pub fn full_name(&self) -> String {
        format!("{}.{}.{}", self.area(), self.resource(), self.action())
    }

    /// Case-insensitive presence check against the input values.
    pub fn has_input(&self, name: &str) -> bool {
        self.input(name).is_some()
    }

    /// Case-insensitive lookup of an input value.
    pub fn input(&self, name: &str) -> Option<&Value> {
        self.data
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Metadata value as text, e.g. a header or an api key.
    pub fn meta_text(&self, name: &str) -> Option<String> {
        self.meta
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
    }

    /// Sorted input key names: a payload summary safe for diagnostics,
    /// since values never leave the request.
    pub fn input_summary(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.data.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Key=value summary of the request for diagnostics.
    pub fn structured(&self) -> Vec<(&'static str, String)> {
        vec![
            ("path", self.path.clone()),
            ("source", self.source.to_string()),
            ("verb", self.verb.clone()),
            ("tag", self.tag.clone()),
        ]
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("path", &self.path)
            .field("source", &self.source)
            .field("verb", &self.verb)
            .field("data", &self.data)
            .field("meta", &self.meta)
            .field("tag", &self.tag)
            .finish()
    }
}

fn split_path(path: &str) -> Vec<String> {
    let mut parts: Vec<String> = path
        .split(['.', '/'])
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|p| p.to_string())
        .collect();
    // Normalize an attached help marker: "users?" -> "users", "?"
    if let Some(last) = parts.last_mut() {
        if last.len() > 1 && last.ends_with('?') {
            last.pop();
            let trimmed = last.trim_end().to_string();
            *last = trimmed;
            parts.push("?".to_string());
        }
    }
    parts
}

/// Engine-internal envelope: the raw request plus resolution context.
/// It progresses through the pipeline by being rebuilt with a resolved
/// target, never by in-place mutation.
#[derive(Clone)]
pub struct ApiRequest {
    pub request: Request,
    pub target: Option<Arc<Target>>,
    /// Adapter-supplied extra arguments, available to middleware.
    pub extras: HashMap<String, Value>,
}

impl ApiRequest {
    pub fn new(request: Request) -> Self {
        Self {
            request,
            target: None,
            extras: HashMap::new(),
        }
    }

    pub fn with_target(self, target: Arc<Target>) -> Self {
        Self {
            target: Some(target),
            ..self
        }
    }

    pub fn with_request(self, request: Request) -> Self {
        Self { request, ..self }
    }
}

// Help and introspection: documentation derived from the route table

use crate::outcome::{ApiResult, Outcome};
use crate::request::Request;
use crate::routes::{ParamKind, RouteTable, Target};
use serde::Serialize;
use serde_json::Value;

/// Metadata key carrying the documentation access key.
pub const META_DOC_KEY: &str = "doc-key";

/// How much of the registry a help request asks about.
#[derive(Debug, Clone, PartialEq)]
pub enum HelpLevel {
    All,
    Area(String),
    Resource(String, String),
    Action(String, String, String),
}

/// Detects a help request from the path, before any validation runs.
/// A trailing `?` part scopes help to the preceding segments; the bare
/// path `help` ( or `?` alone ) asks for everything.
pub fn detect(req: &Request) -> Option<HelpLevel> {
    let parts = &req.parts;
    if parts.len() == 1 && parts[0].eq_ignore_ascii_case("help") {
        return Some(HelpLevel::All);
    }
    if parts.last().map(|p| p.as_str()) != Some("?") {
        return None;
    }
    let route: Vec<&str> = parts
        .iter()
        .filter(|p| p.as_str() != "?")
        .map(|p| p.as_str())
        .collect();
    match route.as_slice() {
        [] => Some(HelpLevel::All),
        [area] => Some(HelpLevel::Area(area.to_string())),
        [area, resource] => Some(HelpLevel::Resource(area.to_string(), resource.to_string())),
        [area, resource, action] => Some(HelpLevel::Action(
            area.to_string(),
            resource.to_string(),
            action.to_string(),
        )),
        _ => None,
    }
}

/// Doc-key gate: when a key is configured, help requests must present it.
pub fn permitted(req: &Request, doc_key: Option<&str>) -> bool {
    match doc_key {
        None => true,
        Some(expected) => req
            .meta_text(META_DOC_KEY)
            .map(|presented| presented == expected)
            .unwrap_or(false),
    }
}

/// Documentation for one parameter.
#[derive(Debug, Clone, Serialize)]
pub struct ParamDoc {
    pub name: String,
    pub kind: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// Documentation for one action, including how to call it.
#[derive(Debug, Clone, Serialize)]
pub struct ActionDoc {
    pub route: String,
    pub verb: String,
    pub auth: String,
    pub roles: Vec<String>,
    pub sources: Vec<String>,
    pub params: Vec<ParamDoc>,
}

/// Documentation for one api ( area + resource ) and its actions.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceDoc {
    pub area: String,
    pub resource: String,
    pub actions: Vec<ActionDoc>,
}

/// Documentation for one area: its resources, summarized.
#[derive(Debug, Clone, Serialize)]
pub struct AreaDoc {
    pub area: String,
    pub resources: Vec<String>,
}

/// Top-level documentation: every registered area.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryDoc {
    pub areas: Vec<AreaDoc>,
}

/// Builds the documentation outcome for a help request. Unknown segments
/// report as errored, mirroring an unmatched route lookup.
pub fn describe(table: &RouteTable, level: &HelpLevel) -> ApiResult {
    match level {
        HelpLevel::All => to_outcome(&registry_doc(table)),
        HelpLevel::Area(area) => {
            let doc = area_doc(table, area);
            if doc.resources.is_empty() {
                Outcome::errored(&format!("area '{area}' not found"))
            } else {
                to_outcome(&doc)
            }
        }
        HelpLevel::Resource(area, resource) => {
            let doc = resource_doc(table, area, resource);
            if doc.actions.is_empty() {
                Outcome::errored(&format!("api '{area}.{resource}' not found"))
            } else {
                to_outcome(&doc)
            }
        }
        HelpLevel::Action(area, resource, action) => match table.lookup(area, resource, action) {
            Some(target) => to_outcome(&action_doc(&target)),
            None => Outcome::errored(&format!("route '{area}.{resource}.{action}' not found")),
        },
    }
}

fn to_outcome<T: Serialize>(doc: &T) -> ApiResult {
    match serde_json::to_value(doc) {
        Ok(value) => Outcome::success(value),
        Err(err) => Outcome::unexpected(&format!("doc serialization failed: {err}")),
    }
}

fn registry_doc(table: &RouteTable) -> RegistryDoc {
    let mut areas: Vec<AreaDoc> = Vec::new();
    for target in table.sorted() {
        match areas.iter_mut().find(|a| a.area == target.area) {
            Some(area) => {
                if !area.resources.contains(&target.resource) {
                    area.resources.push(target.resource.clone());
                }
            }
            None => areas.push(AreaDoc {
                area: target.area.clone(),
                resources: vec![target.resource.clone()],
            }),
        }
    }
    RegistryDoc { areas }
}

fn area_doc(table: &RouteTable, area: &str) -> AreaDoc {
    let mut resources = Vec::new();
    for target in table.sorted() {
        if target.area.eq_ignore_ascii_case(area) && !resources.contains(&target.resource) {
            resources.push(target.resource.clone());
        }
    }
    AreaDoc {
        area: area.to_string(),
        resources,
    }
}

fn resource_doc(table: &RouteTable, area: &str, resource: &str) -> ResourceDoc {
    let actions = table
        .sorted()
        .into_iter()
        .filter(|t| {
            t.area.eq_ignore_ascii_case(area) && t.resource.eq_ignore_ascii_case(resource)
        })
        .map(|t| action_doc(&t))
        .collect();
    ResourceDoc {
        area: area.to_string(),
        resource: resource.to_string(),
        actions,
    }
}

fn action_doc(target: &Target) -> ActionDoc {
    let mut roles: Vec<String> = target.roles.iter().cloned().collect();
    roles.sort();
    let mut sources: Vec<String> = target.sources.iter().cloned().collect();
    sources.sort();
    ActionDoc {
        route: target.full_name(),
        verb: target.verb.clone(),
        auth: format!("{:?}", target.auth).to_lowercase(),
        roles,
        sources,
        params: target.params.iter().map(param_doc).collect(),
    }
}

fn param_doc(param: &crate::routes::Param) -> ParamDoc {
    ParamDoc {
        name: param.name.clone(),
        kind: param.kind.describe(),
        required: param.required,
        default: param.default.clone(),
    }
}

/// Usage hint for a parameter, shown by console front-ends.
pub fn usage_line(name: &str, kind: &ParamKind, required: bool) -> String {
    let marker = if required { "!" } else { "?" };
    format!("-{name}=<{}> {marker}", kind.describe())
}

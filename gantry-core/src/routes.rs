// Route table: immutable registry mapping (area, resource, action) to targets

use crate::error::Error;
use crate::handler::Invocable;
use crate::request::verbs;
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Declared type of an action parameter. Drives argument coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    Text,
    Bool,
    Int,
    Decimal,
    Date,
    Time,
    DateTime,
    List(Box<ParamKind>),
    Map(Box<ParamKind>, Box<ParamKind>),
    Enum(EnumDef),
    Any,
}

impl ParamKind {
    /// Short type label used in help output, e.g. "list<int>".
    pub fn describe(&self) -> String {
        match self {
            ParamKind::Text => "text".to_string(),
            ParamKind::Bool => "bool".to_string(),
            ParamKind::Int => "int".to_string(),
            ParamKind::Decimal => "decimal".to_string(),
            ParamKind::Date => "date".to_string(),
            ParamKind::Time => "time".to_string(),
            ParamKind::DateTime => "datetime".to_string(),
            ParamKind::List(inner) => format!("list<{}>", inner.describe()),
            ParamKind::Map(k, v) => format!("map<{},{}>", k.describe(), v.describe()),
            ParamKind::Enum(def) => format!("enum<{}>", def.name),
            ParamKind::Any => "any".to_string(),
        }
    }
}

/// A declared enumeration: resolved by ordinal or by case-sensitive name.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    pub name: String,
    pub members: Vec<String>,
}

impl EnumDef {
    pub fn new(name: &str, members: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// Descriptor for one parameter of a target method.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
    pub default: Option<Value>,
}

impl Param {
    pub fn required(name: &str, kind: ParamKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: true,
            default: None,
        }
    }

    pub fn optional(name: &str, kind: ParamKind, default: Value) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: false,
            default: Some(default),
        }
    }
}

/// Authorization mode for an api or an action.
/// `Parent` is only valid on actions and resolves to the owning api's mode
/// at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    Open,
    Keyed,
    Roles,
    Parent,
}

/// One registered, invocable unit identified by (area, resource, action).
/// Created during route-table construction and immutable afterwards.
pub struct Target {
    pub area: String,
    pub resource: String,
    pub action: String,
    pub handler: Arc<dyn Invocable>,
    pub params: Vec<Param>,
    pub roles: HashSet<String>,
    /// Allowed sources; contains "*" to allow any.
    pub sources: HashSet<String>,
    /// Allowed verb; "*" allows any.
    pub verb: String,
    pub auth: AuthMode,
}

impl Target {
    pub fn full_name(&self) -> String {
        format!("{}.{}.{}", self.area, self.resource, self.action)
    }

    pub fn allows_source(&self, source: &str) -> bool {
        self.sources.contains("*") || self.sources.contains(source)
    }

    pub fn allows_verb(&self, verb: &str) -> bool {
        self.verb == verbs::ALL || self.verb.eq_ignore_ascii_case(verb)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("route", &self.full_name())
            .field("verb", &self.verb)
            .field("auth", &self.auth)
            .field("roles", &self.roles)
            .field("sources", &self.sources)
            .finish()
    }
}

/// Registration descriptor for one api ( area + resource ) and its actions.
/// This is the plain list the engine depends on; how the list is produced
/// ( programmatic setup, config files, code generation ) is not its concern.
pub struct ApiSetup {
    pub area: String,
    pub resource: String,
    pub auth: AuthMode,
    pub roles: Vec<String>,
    pub verb: String,
    pub sources: Vec<String>,
    pub actions: Vec<ActionSetup>,
}

impl ApiSetup {
    pub fn new(area: &str, resource: &str) -> Self {
        Self {
            area: area.to_string(),
            resource: resource.to_string(),
            auth: AuthMode::Open,
            roles: Vec::new(),
            verb: verbs::AUTO.to_string(),
            sources: vec!["*".to_string()],
            actions: Vec::new(),
        }
    }

    pub fn auth(mut self, auth: AuthMode) -> Self {
        self.auth = auth;
        self
    }

    pub fn roles(mut self, roles: &[&str]) -> Self {
        self.roles = roles.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn verb(mut self, verb: &str) -> Self {
        self.verb = verb.to_string();
        self
    }

    pub fn sources(mut self, sources: &[&str]) -> Self {
        self.sources = sources.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn action(mut self, action: ActionSetup) -> Self {
        self.actions.push(action);
        self
    }
}

/// Registration descriptor for one action within an api.
/// Auth / verb / sources default to inheriting from the owning api.
pub struct ActionSetup {
    pub name: String,
    pub auth: AuthMode,
    pub roles: Option<Vec<String>>,
    pub verb: String,
    pub sources: Option<Vec<String>>,
    pub params: Vec<Param>,
    pub handler: Arc<dyn Invocable>,
}

impl ActionSetup {
    pub fn new(name: &str, handler: Arc<dyn Invocable>) -> Self {
        Self {
            name: name.to_string(),
            auth: AuthMode::Parent,
            roles: None,
            verb: verbs::AUTO.to_string(),
            sources: None,
            params: Vec::new(),
            handler,
        }
    }

    pub fn auth(mut self, auth: AuthMode) -> Self {
        self.auth = auth;
        self
    }

    pub fn roles(mut self, roles: &[&str]) -> Self {
        self.roles = Some(roles.iter().map(|r| r.to_string()).collect());
        self
    }

    pub fn verb(mut self, verb: &str) -> Self {
        self.verb = verb.to_string();
        self
    }

    pub fn sources(mut self, sources: &[&str]) -> Self {
        self.sources = Some(sources.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }
}

/// Builds the flat target list from api descriptors, resolving inheritance.
pub fn build_targets(apis: Vec<ApiSetup>) -> Result<Vec<Target>, Error> {
    let mut targets = Vec::new();
    for api in apis {
        if api.auth == AuthMode::Parent {
            return Err(Error::Registration(format!(
                "api {}.{} declares auth mode 'parent' at the api level",
                api.area, api.resource
            )));
        }
        for action in api.actions {
            let auth = match action.auth {
                AuthMode::Parent => api.auth,
                concrete => concrete,
            };
            let roles: HashSet<String> = action
                .roles
                .clone()
                .unwrap_or_else(|| api.roles.clone())
                .into_iter()
                .collect();
            let sources: HashSet<String> = action
                .sources
                .clone()
                .unwrap_or_else(|| api.sources.clone())
                .into_iter()
                .map(|s| s.to_lowercase())
                .collect();
            let verb = resolve_verb(&action.verb, &api.verb, &action.name);
            targets.push(Target {
                area: api.area.clone(),
                resource: api.resource.clone(),
                action: action.name,
                handler: action.handler,
                params: action.params,
                roles,
                sources,
                verb,
                auth,
            });
        }
    }
    Ok(targets)
}

/// Resolves an "auto" verb: prefer the action's, then the api's, then infer
/// from the action name the way REST-ish conventions name methods.
fn resolve_verb(action_verb: &str, api_verb: &str, action_name: &str) -> String {
    let picked = if action_verb != verbs::AUTO {
        action_verb
    } else if api_verb != verbs::AUTO {
        api_verb
    } else {
        let name = action_name.to_lowercase();
        if name.starts_with("get") || name.starts_with("find") || name.starts_with("list") {
            verbs::GET
        } else if name.starts_with("create") {
            verbs::POST
        } else if name.starts_with("update") {
            verbs::PUT
        } else if name.starts_with("patch") {
            verbs::PATCH
        } else if name.starts_with("delete") || name.starts_with("remove") {
            verbs::DELETE
        } else {
            verbs::POST
        }
    };
    picked.to_lowercase()
}

/// Immutable map from (area, resource, action) to targets.
///
/// Built once, single threaded, before serving begins; lookups are pure
/// functions of the three segments with one normalization applied
/// identically at registration and lookup. Safe for unsynchronized
/// concurrent reads.
pub struct RouteTable {
    targets: HashMap<(String, String, String), Arc<Target>>,
}

/// The single case-folding function used for all route segments.
fn normalize(segment: &str) -> String {
    segment.trim().to_lowercase()
}

impl RouteTable {
    /// Registers all targets, failing fast on a duplicate route.
    pub fn register(targets: Vec<Target>) -> Result<Self, Error> {
        let mut map = HashMap::new();
        for target in targets {
            let key = (
                normalize(&target.area),
                normalize(&target.resource),
                normalize(&target.action),
            );
            let name = target.full_name();
            if map.insert(key, Arc::new(target)).is_some() {
                return Err(Error::DuplicateRoute(name));
            }
        }
        Ok(Self { targets: map })
    }

    pub fn lookup(&self, area: &str, resource: &str, action: &str) -> Option<Arc<Target>> {
        let key = (normalize(area), normalize(resource), normalize(action));
        self.targets.get(&key).cloned()
    }

    pub fn contains(&self, area: &str, resource: &str, action: &str) -> bool {
        self.lookup(area, resource, action).is_some()
    }

    pub fn contains_area(&self, area: &str) -> bool {
        let area = normalize(area);
        self.targets.keys().any(|(a, _, _)| *a == area)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// All targets in stable route order, for help and introspection.
    pub fn sorted(&self) -> Vec<Arc<Target>> {
        let mut entries: Vec<(&(String, String, String), &Arc<Target>)> =
            self.targets.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter().map(|(_, t)| t.clone()).collect()
    }
}

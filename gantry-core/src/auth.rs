// Authorization: the only component that interprets credential metadata

use crate::outcome::Outcome;
use crate::request::Request;
use crate::routes::AuthMode;
use std::collections::{HashMap, HashSet};

/// Metadata key carrying an api key credential.
pub const META_API_KEY: &str = "api-key";
/// Metadata key carrying the caller's role claims, comma separated.
pub const META_ROLES: &str = "auth-roles";

/// Checks a caller's presented credentials against a target's requirements.
///
/// Credentials arrive in the request metadata ( an api key field or a role
/// claim ); what those fields mean is entirely this trait's business, and no
/// other engine component reads them. Checks are pure computations over the
/// request: no I/O, so they can run inside the synchronous rule pipeline.
pub trait Auth: Send + Sync {
    fn check(&self, req: &Request, mode: AuthMode, roles: &HashSet<String>) -> Outcome<()>;
}

/// Key-based authenticator: each configured api key grants a set of roles.
///
/// - `Keyed` mode: the presented key must be configured, and when the target
///   requires roles, the key must grant at least one of them.
/// - `Roles` mode: the caller's role claim must contain at least one
///   required role; an empty requirement ( or `*` ) only needs a claim to
///   be present at all.
pub struct KeyAuth {
    keys: HashMap<String, HashSet<String>>,
}

impl KeyAuth {
    pub fn new(keys: Vec<(&str, &[&str])>) -> Self {
        let keys = keys
            .into_iter()
            .map(|(key, roles)| {
                (
                    key.to_string(),
                    roles.iter().map(|r| r.to_string()).collect(),
                )
            })
            .collect();
        Self { keys }
    }

    fn check_keyed(&self, req: &Request, required: &HashSet<String>) -> Outcome<()> {
        let presented = match req.meta_text(META_API_KEY) {
            Some(key) if !key.is_empty() => key,
            _ => return Outcome::denied("api key not supplied"),
        };
        let granted = match self.keys.get(&presented) {
            Some(granted) => granted,
            None => return Outcome::denied("api key not recognized"),
        };
        if satisfies(granted, required) {
            Outcome::success(())
        } else {
            Outcome::denied("api key lacks required role")
        }
    }

    fn check_roles(&self, req: &Request, required: &HashSet<String>) -> Outcome<()> {
        let claimed = claimed_roles(req);
        if claimed.is_empty() {
            return Outcome::denied("roles not supplied");
        }
        if satisfies(&claimed, required) {
            Outcome::success(())
        } else {
            Outcome::denied("caller lacks required role")
        }
    }
}

impl Auth for KeyAuth {
    fn check(&self, req: &Request, mode: AuthMode, roles: &HashSet<String>) -> Outcome<()> {
        match mode {
            AuthMode::Open => Outcome::success(()),
            AuthMode::Keyed => self.check_keyed(req, roles),
            AuthMode::Roles => self.check_roles(req, roles),
            // Resolved away at registration; treat a leak as a denial.
            AuthMode::Parent => Outcome::denied("unresolved auth mode"),
        }
    }
}

/// Role claims from metadata, split on commas.
pub fn claimed_roles(req: &Request) -> HashSet<String> {
    req.meta_text(META_ROLES)
        .map(|text| {
            text.split(',')
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn satisfies(granted: &HashSet<String>, required: &HashSet<String>) -> bool {
    if required.is_empty() || required.contains("*") {
        return true;
    }
    required.iter().any(|r| granted.contains(r))
}

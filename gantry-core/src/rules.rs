// Pre-invocation validation rules, run strictly in order

use crate::auth::Auth;
use crate::error::{ErrItem, Errors};
use crate::outcome::Outcome;
use crate::request::ApiRequest;
use std::sync::Arc;

/// A stateless validator in the pre-invocation pipeline.
///
/// Rules are side-effect free and perform no I/O beyond reading the
/// already-built route table; each consumes the in-flight request and
/// passes it through or produces a typed failure. Ordering matters:
/// later rules assume earlier ones succeeded ( the auth and params rules
/// require a resolved target ).
pub trait Rule: Send + Sync {
    fn validate(&self, req: &ApiRequest) -> Outcome<()>;
}

/// Rule 1: the route must decompose into non-empty area / resource / action.
pub struct RouteRule;

impl Rule for RouteRule {
    fn validate(&self, req: &ApiRequest) -> Outcome<()> {
        let r = &req.request;
        if r.area().trim().is_empty()
            || r.resource().trim().is_empty()
            || r.action().trim().is_empty()
        {
            Outcome::invalid(&format!("route '{}' is not well formed", r.path))
        } else {
            Outcome::success(())
        }
    }
}

/// Rule 3: the target must permit the request's source and verb.
/// Console calls carry no meaningful verb, so the verb check applies to
/// the other channels only.
pub struct ProtoRule;

impl Rule for ProtoRule {
    fn validate(&self, req: &ApiRequest) -> Outcome<()> {
        let target = match &req.target {
            Some(t) => t,
            None => return Outcome::errored("route not mapped"),
        };
        let source = req.request.source;
        if !target.allows_source(source.as_str()) {
            return Outcome::invalid(&format!(
                "source '{}' not permitted for {}",
                source,
                target.full_name()
            ));
        }
        if !source.is_all() && source != crate::request::Source::Cli {
            if !target.allows_verb(&req.request.verb) {
                return Outcome::invalid(&format!(
                    "verb '{}' not permitted for {}",
                    req.request.verb,
                    target.full_name()
                ));
            }
        }
        Outcome::success(())
    }
}

/// Rule 4: the caller's credentials must satisfy the target's resolved
/// auth mode and required roles. Only this rule consults the authenticator.
pub struct AuthRule {
    auth: Option<Arc<dyn Auth>>,
}

impl AuthRule {
    pub fn new(auth: Option<Arc<dyn Auth>>) -> Self {
        Self { auth }
    }
}

impl Rule for AuthRule {
    fn validate(&self, req: &ApiRequest) -> Outcome<()> {
        let target = match &req.target {
            Some(t) => t,
            None => return Outcome::errored("route not mapped"),
        };
        if target.auth == crate::routes::AuthMode::Open {
            return Outcome::success(());
        }
        match &self.auth {
            Some(auth) => auth.check(&req.request, target.auth, &target.roles),
            None => Outcome::denied("no authenticator configured"),
        }
    }
}

/// Rule 5: every required, non-defaulted parameter must be present in the
/// request inputs by name ( case-insensitive ). All missing parameters are
/// reported together, one field error each.
pub struct ParamsRule;

impl Rule for ParamsRule {
    fn validate(&self, req: &ApiRequest) -> Outcome<()> {
        let target = match &req.target {
            Some(t) => t,
            None => return Outcome::errored("route not mapped"),
        };
        let missing: Vec<ErrItem> = target
            .params
            .iter()
            .filter(|p| p.required && p.default.is_none())
            .filter(|p| !req.request.has_input(&p.name))
            .map(|p| ErrItem::on(&p.name, "", "Missing"))
            .collect();
        if missing.is_empty() {
            Outcome::success(())
        } else {
            Outcome::Invalid(Errors::list(missing, "Invalid request"))
        }
    }
}

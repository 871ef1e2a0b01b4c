// Engine boundary: one entry point for every transport

use crate::auth::Auth;
use crate::error::Error;
use crate::executor::Executor;
use crate::help::{self, HelpLevel};
use crate::middleware::{MiddlewareChain, Rewriter};
use crate::outcome::{ApiResult, Outcome};
use crate::request::{ApiRequest, Request, Source};
use crate::response::Response;
use crate::routes::{build_targets, ApiSetup, RouteTable, Target};
use crate::rules::{AuthRule, ParamsRule, ProtoRule, RouteRule, Rule};
use std::sync::Arc;
use tracing::info;

/// Host-level settings for one server instance.
#[derive(Debug, Clone)]
pub struct Settings {
    /// The channel this instance primarily serves; informational.
    pub source: Source,
    /// Emit a diagnostic record line after every execution.
    pub record: bool,
    /// When set, help requests must present this key in metadata.
    pub doc_key: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source: Source::All,
            record: false,
            doc_key: None,
        }
    }
}

/// The execution engine: a built route table plus its collaborators.
///
/// `execute` is the single entry point for every transport; adapters build
/// a `Request` and hand it over. The server holds no per-request state, so
/// one instance serves any number of concurrent calls.
pub struct ApiServer {
    routes: Arc<RouteTable>,
    executor: Executor,
    auth: Option<Arc<dyn Auth>>,
    rewriters: Vec<Arc<dyn Rewriter>>,
    settings: Settings,
}

impl ApiServer {
    /// Builds the server from api descriptors, failing fast on registration
    /// problems ( duplicate routes, unresolvable auth modes ).
    pub fn register(apis: Vec<ApiSetup>) -> Result<Self, Error> {
        let targets = build_targets(apis)?;
        let routes = RouteTable::register(targets)?;
        info!(routes = routes.len(), "route table built");
        Ok(Self {
            routes: Arc::new(routes),
            executor: Executor::default(),
            auth: None,
            rewriters: Vec::new(),
            settings: Settings::default(),
        })
    }

    pub fn with_auth(mut self, auth: Arc<dyn Auth>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Global middleware chain, used for targets that declare none of
    /// their own.
    pub fn with_middleware(mut self, chain: MiddlewareChain) -> Self {
        self.executor = Executor::new(chain);
        self
    }

    pub fn with_rewriter(mut self, rewriter: Arc<dyn Rewriter>) -> Self {
        self.rewriters.push(rewriter);
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Executes one request through the full pipeline:
    /// help check, rewriters, validation rules, middleware, invocation.
    /// Every failure mode is a returned outcome, never a panic.
    pub async fn execute(&self, request: Request) -> ApiResult {
        self.run(request).await
    }

    /// Executes and folds the outcome into the serializable envelope.
    pub async fn execute_response(&self, request: Request) -> Response {
        let tag = request.tag.clone();
        let outcome = self.execute(request).await;
        Response::from_outcome(&outcome, &tag)
    }

    /// Direct target lookup, for introspection and adapter wiring.
    pub fn get(&self, area: &str, resource: &str, action: &str) -> Option<Arc<Target>> {
        self.routes.lookup(area, resource, action)
    }

    /// Documentation for a slice of the registry.
    pub fn describe(&self, level: &HelpLevel) -> ApiResult {
        help::describe(&self.routes, level)
    }

    async fn run(&self, request: Request) -> ApiResult {
        // Help is answered before any validation or middleware runs.
        if let Some(level) = help::detect(&request) {
            if !help::permitted(&request, self.settings.doc_key.as_deref()) {
                return Outcome::denied("access to api docs requires a doc key");
            }
            let outcome = help::describe(&self.routes, &level);
            self.record(&request, &outcome);
            return outcome;
        }

        let mut req = ApiRequest::new(request);
        for rewriter in &self.rewriters {
            req = rewriter.rewrite(req);
        }

        self.validate_and_execute(req).await
    }

    async fn validate_and_execute(&self, req: ApiRequest) -> ApiResult {
        let checked = RouteRule.validate(&req);
        if !checked.is_success() {
            let outcome: ApiResult = checked.retag();
            self.record(&req.request, &outcome);
            return outcome;
        }

        let r = &req.request;
        let target = match self.routes.lookup(r.area(), r.resource(), r.action()) {
            Some(target) => target,
            None => {
                let outcome = Outcome::errored(&format!("route '{}' not mapped", r.full_name()));
                self.record(r, &outcome);
                return outcome;
            }
        };
        let req = req.with_target(target);

        let auth_rule = AuthRule::new(self.auth.clone());
        let rules: [&dyn Rule; 3] = [&ProtoRule, &auth_rule, &ParamsRule];
        for rule in rules {
            let checked = rule.validate(&req);
            if !checked.is_success() {
                let outcome = checked.retag();
                self.record(&req.request, &outcome);
                return outcome;
            }
        }

        let outcome = self.executor.execute(req.clone()).await;
        self.record(&req.request, &outcome);
        outcome
    }

    /// Diagnostic record of one execution. Purely observational: emitted
    /// through `tracing` and never able to change the outcome.
    fn record(&self, request: &Request, outcome: &ApiResult) {
        if !self.settings.record {
            return;
        }
        let status = outcome.status();
        info!(
            path = %request.path,
            source = %request.source,
            verb = %request.verb,
            tag = %request.tag,
            inputs = ?request.input_summary(),
            code = status.code,
            status = status.name,
            "request executed"
        );
    }
}

// Invocation: the only stage that runs target code

use crate::deserialize;
use crate::error::Error;
use crate::handler::Returned;
use crate::middleware::{InvokeFn, MiddlewareChain};
use crate::outcome::{ApiResult, Outcome};
use crate::request::ApiRequest;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error};

/// Runs a validated request against its resolved target.
///
/// The executor owns the last three steps of a call: wrap the invocation in
/// the applicable middleware chain, coerce the inputs into the target's
/// argument vector, and normalize whatever comes back into an outcome.
/// A panic inside target code is confined to its own call and surfaces as
/// an `Unexpected` outcome; concurrent requests are unaffected.
#[derive(Clone, Default)]
pub struct Executor {
    chain: MiddlewareChain,
}

impl Executor {
    pub fn new(chain: MiddlewareChain) -> Self {
        Self { chain }
    }

    /// Executes the request. The target must already be resolved; the rule
    /// pipeline guarantees that by the time a request reaches here.
    pub async fn execute(&self, req: ApiRequest) -> ApiResult {
        let target = match &req.target {
            Some(t) => t.clone(),
            None => return Outcome::errored("route not mapped"),
        };
        // A chain declared by the target itself takes the place of the
        // globally configured one.
        let chain = target.handler.middleware().unwrap_or_else(|| self.chain.clone());
        let invoke: InvokeFn = Arc::new(move |r: ApiRequest| Box::pin(invoke_target(r)));
        chain.apply(req, invoke).await
    }
}

/// Terminal invocation: deserialize, call, normalize.
async fn invoke_target(req: ApiRequest) -> ApiResult {
    let target = match &req.target {
        Some(t) => t.clone(),
        None => return Outcome::errored("route not mapped"),
    };
    let args = match deserialize::deserialize(&target.params, &req.request) {
        Ok(args) => args,
        Err(errs) => return Outcome::Invalid(errs),
    };
    debug!(
        path = %req.request.path,
        tag = %req.request.tag,
        args = args.len(),
        "invoking target"
    );
    let call = target.handler.call(req.request.clone(), args);
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(returned) => normalize(returned),
        Err(panic) => {
            let detail = panic_message(panic.as_ref());
            error!(
                path = %req.request.path,
                tag = %req.request.tag,
                detail = %detail,
                "target panicked"
            );
            Outcome::unexpected(&format!("call panicked: {detail}"))
        }
    }
}

/// Folds a target's return into the uniform outcome shape.
///
/// - An already-structured outcome passes through untouched, variant intact.
/// - A plain value becomes `Succeeded`.
/// - A domain error keeps its errors under `Errored`; any other engine
///   error is reclassified as `Unexpected`.
fn normalize(returned: Result<Returned, Error>) -> ApiResult {
    match returned {
        Ok(Returned::Outcome(outcome)) => outcome,
        Ok(Returned::Value(value)) => Outcome::success(value),
        Err(Error::Domain(errs)) => Outcome::Errored(errs),
        Err(other) => Outcome::unexpected(&other.to_string()),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = panic.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{FnHandler, HandlerFn};
    use crate::middleware::{Middleware, Next};
    use crate::request::{verbs, Request};
    use crate::routes::{AuthMode, Param, ParamKind, Target};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    fn target_with(handler: Arc<FnHandler>, params: Vec<Param>) -> Arc<Target> {
        Arc::new(Target {
            area: "app".to_string(),
            resource: "users".to_string(),
            action: "activate".to_string(),
            handler,
            params,
            roles: HashSet::new(),
            sources: HashSet::from(["*".to_string()]),
            verb: verbs::ALL.to_string(),
            auth: AuthMode::Open,
        })
    }

    fn api_request(target: Arc<Target>, data: Vec<(&str, Value)>) -> ApiRequest {
        let data = data.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        let req = Request::cli("app.users.activate", HashMap::new(), data);
        ApiRequest::new(req).with_target(target)
    }

    fn echo_args() -> Arc<FnHandler> {
        FnHandler::new(Arc::new(|_req, args| {
            Box::pin(async move { Ok(Returned::Value(json!(args))) })
        }))
    }

    #[tokio::test]
    async fn test_plain_value_becomes_succeeded() {
        let target = target_with(echo_args(), vec![Param::required("code", ParamKind::Int)]);
        let req = api_request(target, vec![("code", json!("5"))]);
        let out = Executor::default().execute(req).await;
        assert_eq!(out, Outcome::success(json!([5])));
    }

    #[tokio::test]
    async fn test_structured_outcome_passes_through() {
        let handler = FnHandler::new(Arc::new(|_req, _args| {
            Box::pin(async { Ok(Returned::Outcome(Outcome::pending(json!("queued")))) })
        }));
        let req = api_request(target_with(handler, Vec::new()), vec![]);
        let out = Executor::default().execute(req).await;
        assert!(matches!(out, Outcome::Pending(v) if v == json!("queued")));
    }

    #[tokio::test]
    async fn test_domain_error_becomes_errored() {
        let handler = FnHandler::new(Arc::new(|_req, _args| {
            Box::pin(async { Err(Error::domain("user not found")) })
        }));
        let req = api_request(target_with(handler, Vec::new()), vec![]);
        let out = Executor::default().execute(req).await;
        match out {
            Outcome::Errored(errs) => assert_eq!(errs.message, "user not found"),
            other => panic!("expected Errored, got {}", other.status().name),
        }
    }

    #[tokio::test]
    async fn test_other_error_becomes_unexpected() {
        let handler = FnHandler::new(Arc::new(|_req, _args| {
            Box::pin(async { Err(Error::Invocation("reflection broke".to_string())) })
        }));
        let req = api_request(target_with(handler, Vec::new()), vec![]);
        let out = Executor::default().execute(req).await;
        assert!(matches!(out, Outcome::Unexpected(_)));
    }

    #[tokio::test]
    async fn test_panic_is_confined_to_the_call() {
        let handler: HandlerFn = Arc::new(|_req, _args| {
            Box::pin(async { panic!("boom") })
        });
        let target = target_with(FnHandler::new(handler), Vec::new());
        let executor = Executor::default();

        let out = executor.execute(api_request(target.clone(), vec![])).await;
        assert!(matches!(out, Outcome::Unexpected(_)));
        assert!(out.message().contains("boom"));

        // The executor stays usable afterwards.
        let ok_target = target_with(echo_args(), Vec::new());
        let out = executor.execute(api_request(ok_target, vec![])).await;
        assert!(out.is_success());
    }

    #[tokio::test]
    async fn test_bad_argument_aborts_before_invocation() {
        let called = Arc::new(Mutex::new(false));
        let flag = called.clone();
        let handler = FnHandler::new(Arc::new(move |_req, _args| {
            let flag = flag.clone();
            Box::pin(async move {
                *flag.lock().unwrap() = true;
                Ok(Returned::Value(Value::Null))
            })
        }));
        let target = target_with(handler, vec![Param::required("code", ParamKind::Int)]);
        let req = api_request(target, vec![("code", json!("abc"))]);
        let out = Executor::default().execute(req).await;
        assert!(matches!(out, Outcome::Invalid(_)));
        assert!(!*called.lock().unwrap());
    }

    struct Marker {
        name: &'static str,
        markers: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Middleware for Marker {
        async fn process(&self, req: ApiRequest, next: Next) -> ApiResult {
            self.markers.lock().unwrap().push(self.name.to_string());
            next(req).await
        }
    }

    #[tokio::test]
    async fn test_target_chain_replaces_global_chain() {
        let markers = Arc::new(Mutex::new(Vec::new()));
        let global = MiddlewareChain::new().with(Marker {
            name: "global",
            markers: markers.clone(),
        });
        let own = MiddlewareChain::new().with(Marker {
            name: "own",
            markers: markers.clone(),
        });

        let handler = FnHandler::with_middleware(
            Arc::new(|_req, _args| Box::pin(async { Ok(Returned::Value(Value::Null)) })),
            own,
        );
        let req = api_request(target_with(handler, Vec::new()), vec![]);
        let out = Executor::new(global).execute(req).await;
        assert!(out.is_success());
        assert_eq!(*markers.lock().unwrap(), vec!["own"]);
    }

    #[tokio::test]
    async fn test_global_chain_used_when_target_has_none() {
        let markers = Arc::new(Mutex::new(Vec::new()));
        let global = MiddlewareChain::new().with(Marker {
            name: "global",
            markers: markers.clone(),
        });
        let req = api_request(target_with(echo_args(), Vec::new()), vec![]);
        let out = Executor::new(global).execute(req).await;
        assert!(out.is_success());
        assert_eq!(*markers.lock().unwrap(), vec!["global"]);
    }
}

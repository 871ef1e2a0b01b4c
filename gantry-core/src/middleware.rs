// Middleware chain wrapping the eventual target invocation

use crate::outcome::ApiResult;
use crate::request::ApiRequest;
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::debug;

/// Continuation to the rest of the chain and, ultimately, the invocation.
/// A fresh continuation is allocated per request; nothing is shared across
/// concurrent calls.
pub type Next = Box<
    dyn FnOnce(ApiRequest) -> Pin<Box<dyn Future<Output = ApiResult> + Send>> + Send,
>;

/// Terminal function the chain bottoms out into.
pub type InvokeFn = Arc<
    dyn Fn(ApiRequest) -> Pin<Box<dyn Future<Output = ApiResult> + Send>> + Send + Sync,
>;

/// A composable interceptor around the eventual call. Each middleware
/// decides whether to call `next` ( continue ), substitute its own outcome
/// ( short-circuit ), or transform the outcome on the way back out.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn process(&self, req: ApiRequest, next: Next) -> ApiResult;
}

/// Rewrites a request before the rule pipeline runs, e.g. RESTful aliasing
/// of `get movies` onto `movies.get_all`.
pub trait Rewriter: Send + Sync {
    fn rewrite(&self, req: ApiRequest) -> ApiRequest;
}

/// Ordered middleware list with right-to-left composition: the first
/// middleware wraps all the others, which wrap the terminal invoke.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    middlewares: Arc<Vec<Arc<dyn Middleware>>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self {
            middlewares: Arc::new(Vec::new()),
        }
    }

    pub fn add<M: Middleware + 'static>(&mut self, middleware: M) {
        let mut mws = (*self.middlewares).clone();
        mws.push(Arc::new(middleware));
        self.middlewares = Arc::new(mws);
    }

    pub fn with<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.add(middleware);
        self
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Runs the chain in order, ending in `invoke`.
    pub async fn apply(&self, req: ApiRequest, invoke: InvokeFn) -> ApiResult {
        debug!(
            count = self.middlewares.len(),
            path = %req.request.path,
            "running middleware chain"
        );
        self.run_from(0, req, invoke).await
    }

    fn run_from(
        &self,
        index: usize,
        req: ApiRequest,
        invoke: InvokeFn,
    ) -> Pin<Box<dyn Future<Output = ApiResult> + Send>> {
        if index >= self.middlewares.len() {
            invoke(req)
        } else {
            let middleware = self.middlewares[index].clone();
            let chain = self.clone();
            Box::pin(async move {
                let next: Next =
                    Box::new(move |r| chain.run_from(index + 1, r, invoke.clone()));
                middleware.process(req, next).await
            })
        }
    }
}

/// Copies the request's correlation tag into the extras map so downstream
/// middleware and handlers can attach it to their own diagnostics.
pub struct TaggingMiddleware;

#[async_trait]
impl Middleware for TaggingMiddleware {
    async fn process(&self, mut req: ApiRequest, next: Next) -> ApiResult {
        let tag = req.request.tag.clone();
        req.extras
            .insert("tag".to_string(), serde_json::Value::String(tag));
        next(req).await
    }
}

/// Records the wall-clock duration of everything downstream of it.
pub struct TimingMiddleware;

#[async_trait]
impl Middleware for TimingMiddleware {
    async fn process(&self, req: ApiRequest, next: Next) -> ApiResult {
        let start = std::time::Instant::now();
        let path = req.request.path.clone();
        let tag = req.request.tag.clone();
        let result = next(req).await;
        tracing::info!(
            path = %path,
            tag = %tag,
            status = result.status().code,
            duration_ms = start.elapsed().as_millis() as u64,
            "call timed"
        );
        result
    }
}

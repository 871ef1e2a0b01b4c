// Invocable targets: the single capability the route table dispatches to

use crate::error::Error;
use crate::middleware::MiddlewareChain;
use crate::outcome::ApiResult;
use crate::request::Request;
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// What a target method handed back: either a plain domain value, or an
/// already-structured outcome that passes through normalization unchanged.
#[derive(Debug, Clone)]
pub enum Returned {
    Value(Value),
    Outcome(ApiResult),
}

impl Returned {
    /// Serializes a typed domain value into the returned payload, so
    /// handlers can hand back their own structs instead of raw JSON.
    pub fn json<T: serde::Serialize>(value: &T) -> Result<Returned, Error> {
        Ok(Returned::Value(serde_json::to_value(value)?))
    }
}

impl From<Value> for Returned {
    fn from(value: Value) -> Self {
        Returned::Value(value)
    }
}

impl From<ApiResult> for Returned {
    fn from(outcome: ApiResult) -> Self {
        Returned::Outcome(outcome)
    }
}

/// The single capability representing one invocable unit.
///
/// Concrete targets are adapters implementing this trait; they are selected
/// via the route table, never via downcasting. The call receives the full
/// request ( the channel for metadata-derived values such as headers or the
/// caller identity ) plus the typed argument vector produced by the
/// deserializer, in declared parameter order.
#[async_trait]
pub trait Invocable: Send + Sync {
    async fn call(&self, request: Request, args: Vec<Value>) -> Result<Returned, Error>;

    /// Per-target middleware. When present it is used in place of the
    /// globally configured chain ( first match wins ).
    fn middleware(&self) -> Option<MiddlewareChain> {
        None
    }
}

/// Boxed async handler function, the closure form of `Invocable`.
pub type HandlerFn = Arc<
    dyn Fn(Request, Vec<Value>) -> Pin<Box<dyn Future<Output = Result<Returned, Error>> + Send>>
        + Send
        + Sync,
>;

/// Adapter turning a plain async closure into an `Invocable`.
pub struct FnHandler {
    f: HandlerFn,
    chain: Option<MiddlewareChain>,
}

impl FnHandler {
    pub fn new(f: HandlerFn) -> Arc<Self> {
        Arc::new(Self { f, chain: None })
    }

    /// Handler with its own middleware chain, used ahead of the global one.
    pub fn with_middleware(f: HandlerFn, chain: MiddlewareChain) -> Arc<Self> {
        Arc::new(Self {
            f,
            chain: Some(chain),
        })
    }

    /// Handler that accepts anything and returns null. Useful in tests and
    /// for routes that only exist to be observed by middleware.
    pub fn noop() -> Arc<Self> {
        Self::new(Arc::new(|_req, _args| {
            Box::pin(async { Ok(Returned::Value(Value::Null)) })
        }))
    }
}

#[async_trait]
impl Invocable for FnHandler {
    async fn call(&self, request: Request, args: Vec<Value>) -> Result<Returned, Error> {
        (self.f)(request, args).await
    }

    fn middleware(&self) -> Option<MiddlewareChain> {
        self.chain.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Outcome;
    use serde_json::json;
    use std::collections::HashMap;

    fn request() -> Request {
        Request::cli("app.users.activate", HashMap::new(), HashMap::new())
    }

    #[tokio::test]
    async fn test_fn_handler_returns_value() {
        let handler = FnHandler::new(Arc::new(|_req, args| {
            Box::pin(async move { Ok(Returned::Value(json!(args.len()))) })
        }));
        let result = handler.call(request(), vec![json!(1), json!(2)]).await.unwrap();
        assert!(matches!(result, Returned::Value(v) if v == json!(2)));
    }

    #[tokio::test]
    async fn test_fn_handler_returns_typed_value() {
        #[derive(serde::Serialize)]
        struct Activation {
            phone: String,
            activated: bool,
        }
        let handler = FnHandler::new(Arc::new(|_req, _args| {
            Box::pin(async {
                Returned::json(&Activation {
                    phone: "123".to_string(),
                    activated: true,
                })
            })
        }));
        let result = handler.call(request(), Vec::new()).await.unwrap();
        match result {
            Returned::Value(v) => assert_eq!(v, json!({"phone": "123", "activated": true})),
            other => panic!("expected value, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fn_handler_returns_structured_outcome() {
        let handler = FnHandler::new(Arc::new(|_req, _args| {
            Box::pin(async { Ok(Returned::Outcome(Outcome::pending(json!("queued")))) })
        }));
        let result = handler.call(request(), Vec::new()).await.unwrap();
        assert!(matches!(result, Returned::Outcome(Outcome::Pending(_))));
    }

    #[tokio::test]
    async fn test_fn_handler_raises_domain_error() {
        let handler = FnHandler::new(Arc::new(|_req, _args| {
            Box::pin(async { Err(Error::domain("user not found")) })
        }));
        let result = handler.call(request(), Vec::new()).await;
        assert!(matches!(result, Err(Error::Domain(_))));
    }

    #[test]
    fn test_default_has_no_middleware() {
        let handler = FnHandler::noop();
        assert!(handler.middleware().is_none());
    }
}

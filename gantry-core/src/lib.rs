// Core library for the Gantry API execution engine
// This module contains the request model, validation pipeline, and executor

pub mod auth;
pub mod deserialize;
pub mod error;
pub mod executor;
pub mod handler;
pub mod help;
pub mod logging;
pub mod middleware;
pub mod outcome;
pub mod request;
pub mod response;
pub mod routes;
pub mod rules;
pub mod server;
pub mod status;

// Re-export commonly used types
pub use auth::{Auth, KeyAuth, META_API_KEY, META_ROLES};
pub use error::{ErrItem, Error, Errors};
pub use executor::Executor;
pub use handler::{FnHandler, HandlerFn, Invocable, Returned};
pub use help::{HelpLevel, META_DOC_KEY};
pub use middleware::{
    Middleware, MiddlewareChain, Next, Rewriter, TaggingMiddleware, TimingMiddleware,
};
pub use outcome::{ApiResult, Outcome};
pub use request::{verbs, ApiRequest, Request, Source};
pub use response::Response;
pub use routes::{
    ActionSetup, ApiSetup, AuthMode, EnumDef, Param, ParamKind, RouteTable, Target,
};
pub use rules::{AuthRule, ParamsRule, ProtoRule, RouteRule, Rule};
pub use server::{ApiServer, Settings};
pub use status::Status;

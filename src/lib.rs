// Gantry - a protocol-independent API execution engine for Rust
//
// This library provides one route model, one validation pipeline, and one
// executor shared by every transport: the same registered action serves
// HTTP, CLI, and queue callers.

// Re-export core functionality
pub use gantry_core::*;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        ActionSetup,
        ApiRequest,
        ApiResult,
        ApiServer,
        ApiSetup,
        Auth,
        AuthMode,
        ErrItem,
        Error,
        Errors,
        FnHandler,
        Invocable,
        KeyAuth,
        Middleware,
        MiddlewareChain,
        Next,
        Outcome,
        Param,
        ParamKind,
        Request,
        Response,
        Returned,
        Rewriter,
        Settings,
        Source,
        Status,
        Target,
        verbs,
    };
}

//! Per-resource override slots
//!
//! A resource may replace the generated handler of any operation, attach
//! middleware to one operation, or attach pre-middleware to every route.
//! Slots are filled at registration and checked when routes are mounted.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use futures_util::future::BoxFuture;

use super::operation::Operation;

/// Replacement handler for an operation
pub type BoxHandler = Arc<dyn Fn(Request) -> BoxFuture<'static, Response> + Send + Sync>;

/// Middleware wrapped around a route
pub type BoxMiddleware = Arc<dyn Fn(Request, Next) -> BoxFuture<'static, Response> + Send + Sync>;

/// Box an async handler function
pub fn handler_fn<F, Fut>(f: F) -> BoxHandler
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |req| Box::pin(f(req)))
}

/// Box an async middleware function
pub fn middleware_fn<F, Fut>(f: F) -> BoxMiddleware
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |req, next| Box::pin(f(req, next)))
}

#[derive(Clone, Default)]
pub struct ResourceHooks {
    /// Runs before every route of the resource, outermost first
    pub pre: Vec<BoxMiddleware>,

    /// Replaces the generated handler
    pub handlers: HashMap<Operation, BoxHandler>,

    /// Wraps one operation's handler, outermost first
    pub middleware: HashMap<Operation, Vec<BoxMiddleware>>,
}

impl ResourceHooks {
    pub fn handler(&self, op: Operation) -> Option<&BoxHandler> {
        self.handlers.get(&op)
    }

    pub fn middleware(&self, op: Operation) -> &[BoxMiddleware] {
        self.middleware.get(&op).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.pre.is_empty() && self.handlers.is_empty() && self.middleware.is_empty()
    }
}

impl fmt::Debug for ResourceHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut handlers: Vec<_> = self.handlers.keys().map(Operation::as_str).collect();
        handlers.sort_unstable();
        let middleware: HashMap<_, _> = self
            .middleware
            .iter()
            .map(|(op, list)| (op.as_str(), list.len()))
            .collect();
        f.debug_struct("ResourceHooks")
            .field("pre", &self.pre.len())
            .field("handlers", &handlers)
            .field("middleware", &middleware)
            .finish()
    }
}

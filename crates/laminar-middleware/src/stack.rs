//! The registration and serving facade.
//!
//! A [`Stack`] owns the head of a middleware chain. Units are appended with
//! the `register*` family and run, in registration order, for every call to
//! [`Stack::serve`].
//!
//! ```text
//!            serve(sink, request)
//!                   │
//!   ┌───────────────▼───────────────┐
//!   │ unit 1 ── next.run() ──┐      │
//!   │   ┌────────────────────▼────┐ │
//!   │   │ unit 2 ── next.run() ─┐ │ │
//!   │   │   ┌───────────────────▼┐│ │
//!   │   │   │ unit 3             ││ │
//!   │   │   └───────────────────┬┘│ │
//!   │   │ unit 2 (after next) ◄─┘ │ │
//!   │   └────────────────────┬────┘ │
//!   │ unit 1 (after next) ◄──┘      │
//!   └───────────────────────────────┘
//! ```
//!
//! Registration takes `&mut self` and serving takes `&self`, so a stack that
//! is shared across threads (usually behind an `Arc`) can no longer change.

use std::fmt;
use std::sync::Arc;

use crate::chain::ChainNode;
use crate::context::Context;
use crate::handler::{
    wrap, wrap_context, ContextHandler, ContextHandlerFn, Handler, HandlerFn,
};
use crate::middleware::{BoxedMiddleware, Middleware, MiddlewareFn, Next};
use crate::response::{ResponseSink, ResponseWriter};
use crate::types::Request;

/// An appendable chain of middleware units.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use laminar_middleware::{Request, ResponseBuffer, ResponseSink, Stack};
///
/// let mut stack = Stack::new();
/// stack.register_fn("deny", |_ctx, writer, _request, _next| {
///     writer.write_header(StatusCode::FORBIDDEN);
/// });
/// stack.register_handler_fn(|sink: &mut dyn ResponseSink, _request: &mut Request| {
///     let _ = sink.write(b"never reached");
/// });
///
/// let mut buffer = ResponseBuffer::new();
/// let mut request = http::Request::new(bytes::Bytes::new());
/// stack.serve(&mut buffer, &mut request);
///
/// assert_eq!(buffer.status(), Some(StatusCode::FORBIDDEN));
/// assert!(buffer.body().is_empty());
/// ```
#[derive(Default)]
pub struct Stack {
    head: ChainNode,
}

impl Stack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a stack running `units` in the given order.
    pub fn from_middleware<I>(units: I) -> Self
    where
        I: IntoIterator<Item = BoxedMiddleware>,
    {
        Self {
            head: ChainNode::build(units),
        }
    }

    /// Appends a unit to the end of the chain.
    pub fn register<M: Middleware>(&mut self, unit: M) -> &mut Self {
        self.register_shared(Arc::new(unit))
    }

    /// Appends a unit that is already shared.
    ///
    /// The same unit may be registered more than once; it then runs once per
    /// registration.
    pub fn register_shared(&mut self, unit: BoxedMiddleware) -> &mut Self {
        tracing::debug!(
            middleware = unit.name(),
            position = self.head.len(),
            "registered middleware"
        );
        self.head.append(unit);
        self
    }

    /// Appends a chain-aware closure under the given name.
    pub fn register_fn<F>(&mut self, name: &'static str, func: F) -> &mut Self
    where
        F: Fn(Context, &mut ResponseWriter<'_>, &mut Request, Next<'_>) + Send + Sync + 'static,
    {
        self.register(MiddlewareFn::new(name, func))
    }

    /// Appends a plain handler. The rest of the chain always runs after it.
    pub fn register_handler<H: Handler>(&mut self, handler: H) -> &mut Self {
        self.register(wrap(handler))
    }

    /// Appends a plain handler function.
    pub fn register_handler_fn<F>(&mut self, func: F) -> &mut Self
    where
        F: Fn(&mut dyn ResponseSink, &mut Request) + Send + Sync + 'static,
    {
        self.register_handler(HandlerFn::new(func))
    }

    /// Appends a handler that reads the request context.
    pub fn register_context_handler<H: ContextHandler>(&mut self, handler: H) -> &mut Self {
        self.register(wrap_context(handler))
    }

    /// Appends a context-reading handler function.
    pub fn register_context_handler_fn<F>(&mut self, func: F) -> &mut Self
    where
        F: Fn(&Context, &mut dyn ResponseSink, &mut Request) + Send + Sync + 'static,
    {
        self.register_context_handler(ContextHandlerFn::new(func))
    }

    /// Runs the chain for one request with an empty context.
    pub fn serve(&self, sink: &mut dyn ResponseSink, request: &mut Request) {
        self.serve_with_context(Context::background(), sink, request);
    }

    /// Runs the chain for one request, starting from `ctx`.
    ///
    /// A panic raised by a unit propagates to the caller unchanged.
    pub fn serve_with_context(
        &self,
        ctx: Context,
        sink: &mut dyn ResponseSink,
        request: &mut Request,
    ) {
        tracing::trace!(
            method = %request.method(),
            path = request.uri().path(),
            units = self.head.len(),
            "serving request"
        );
        let mut writer = ResponseWriter::new(sink);
        self.head.invoke(ctx, &mut writer, request);
    }

    /// Returns the registered units in chain order.
    pub fn middleware(&self) -> Vec<BoxedMiddleware> {
        self.head.iter().cloned().collect()
    }

    /// Returns the names of the registered units in chain order.
    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.head.iter().map(|unit| unit.name()).collect()
    }

    /// Returns the number of registered units.
    pub fn len(&self) -> usize {
        self.head.len()
    }

    /// Returns `true` if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.head.is_empty()
    }

    /// Returns the head of the chain.
    pub fn chain(&self) -> &ChainNode {
        &self.head
    }
}

impl Handler for Stack {
    fn serve(&self, sink: &mut dyn ResponseSink, request: &mut Request) {
        Stack::serve(self, sink, request);
    }
}

impl FromIterator<BoxedMiddleware> for Stack {
    fn from_iter<I: IntoIterator<Item = BoxedMiddleware>>(iter: I) -> Self {
        Self::from_middleware(iter)
    }
}

impl fmt::Debug for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stack")
            .field("middleware", &self.head)
            .finish()
    }
}

//! Plain request handlers and the adapters that lift them into middleware.
//!
//! A [`Handler`] knows nothing about the chain: it writes a response and
//! returns. [`Wrap`] turns one into a [`Middleware`] that runs the handler and
//! then always continues with the rest of the chain. [`ContextHandler`] and
//! [`WrapContext`] do the same for handlers that read the request
//! [`Context`]; such handlers can read values but cannot pass new ones on.

use std::fmt;

use crate::context::Context;
use crate::middleware::{Middleware, Next};
use crate::response::{ResponseSink, ResponseWriter};
use crate::types::Request;

/// A plain, chain-unaware request handler.
pub trait Handler: Send + Sync + 'static {
    /// Serves the request by writing to `sink`.
    fn serve(&self, sink: &mut dyn ResponseSink, request: &mut Request);
}

/// A handler that can read the request context.
pub trait ContextHandler: Send + Sync + 'static {
    /// Serves the request by writing to `sink`.
    fn serve_with_context(&self, ctx: &Context, sink: &mut dyn ResponseSink, request: &mut Request);
}

/// A [`Handler`] built from a function.
///
/// # Example
///
/// ```
/// use laminar_middleware::{HandlerFn, ResponseSink};
///
/// let hello = HandlerFn::new(|sink: &mut dyn ResponseSink, _request: &mut laminar_middleware::Request| {
///     let _ = sink.write(b"hello");
/// });
/// ```
pub struct HandlerFn<F> {
    func: F,
}

impl<F> HandlerFn<F>
where
    F: Fn(&mut dyn ResponseSink, &mut Request) + Send + Sync + 'static,
{
    /// Wraps a function as a handler.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Handler for HandlerFn<F>
where
    F: Fn(&mut dyn ResponseSink, &mut Request) + Send + Sync + 'static,
{
    fn serve(&self, sink: &mut dyn ResponseSink, request: &mut Request) {
        (self.func)(sink, request);
    }
}

impl<F> fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFn").finish_non_exhaustive()
    }
}

/// A [`ContextHandler`] built from a function.
pub struct ContextHandlerFn<F> {
    func: F,
}

impl<F> ContextHandlerFn<F>
where
    F: Fn(&Context, &mut dyn ResponseSink, &mut Request) + Send + Sync + 'static,
{
    /// Wraps a function as a context handler.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> ContextHandler for ContextHandlerFn<F>
where
    F: Fn(&Context, &mut dyn ResponseSink, &mut Request) + Send + Sync + 'static,
{
    fn serve_with_context(&self, ctx: &Context, sink: &mut dyn ResponseSink, request: &mut Request) {
        (self.func)(ctx, sink, request);
    }
}

impl<F> fmt::Debug for ContextHandlerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextHandlerFn").finish_non_exhaustive()
    }
}

/// Middleware adapter around a plain [`Handler`].
///
/// Runs the handler, then always invokes the rest of the chain.
#[derive(Debug)]
pub struct Wrap<H> {
    handler: H,
}

/// Lifts a plain handler into a middleware unit.
pub fn wrap<H: Handler>(handler: H) -> Wrap<H> {
    Wrap { handler }
}

impl<H> Wrap<H> {
    /// Returns the wrapped handler.
    pub fn inner(&self) -> &H {
        &self.handler
    }
}

impl<H: Handler> Middleware for Wrap<H> {
    fn name(&self) -> &'static str {
        "handler"
    }

    fn handle(
        &self,
        ctx: Context,
        writer: &mut ResponseWriter<'_>,
        request: &mut Request,
        next: Next<'_>,
    ) {
        self.handler.serve(writer, request);
        next.run(ctx, writer, request);
    }
}

/// Middleware adapter around a [`ContextHandler`].
///
/// Runs the handler with a read-only view of the context, then always
/// invokes the rest of the chain with the same context.
#[derive(Debug)]
pub struct WrapContext<H> {
    handler: H,
}

/// Lifts a context handler into a middleware unit.
pub fn wrap_context<H: ContextHandler>(handler: H) -> WrapContext<H> {
    WrapContext { handler }
}

impl<H> WrapContext<H> {
    /// Returns the wrapped handler.
    pub fn inner(&self) -> &H {
        &self.handler
    }
}

impl<H: ContextHandler> Middleware for WrapContext<H> {
    fn name(&self) -> &'static str {
        "context_handler"
    }

    fn handle(
        &self,
        ctx: Context,
        writer: &mut ResponseWriter<'_>,
        request: &mut Request,
        next: Next<'_>,
    ) {
        self.handler.serve_with_context(&ctx, writer, request);
        next.run(ctx, writer, request);
    }
}

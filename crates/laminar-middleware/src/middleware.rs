//! Core middleware trait and the continuation type.
//!
//! This module defines the [`Middleware`] trait that every unit in a
//! [`Stack`](crate::Stack) implements. A unit receives the request context,
//! the shared [`ResponseWriter`], the request, and a [`Next`] continuation.
//! Calling [`Next::run`] hands control to the rest of the chain; code after
//! that call runs once the rest of the chain has returned. Not calling it
//! ends the traversal.
//!
//! # Example
//!
//! ```
//! use laminar_middleware::{Context, Middleware, Next, Request, ResponseWriter};
//!
//! struct Timing;
//!
//! impl Middleware for Timing {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn handle(
//!         &self,
//!         ctx: Context,
//!         writer: &mut ResponseWriter<'_>,
//!         request: &mut Request,
//!         next: Next<'_>,
//!     ) {
//!         let start = std::time::Instant::now();
//!         next.run(ctx, writer, request);
//!         println!("{} took {:?}", request.uri(), start.elapsed());
//!     }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use crate::chain::ChainNode;
use crate::context::Context;
use crate::response::ResponseWriter;
use crate::types::Request;

/// A type-erased middleware that can be stored in a chain.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The unit of request handling in a chain.
///
/// # Invariants
///
/// - Call `next.run()` at most once; `Next` is consumed by the call.
/// - Skip `next.run()` to short-circuit: no later unit runs.
/// - Anything written before a panic stays written; the chain never
///   rewrites a response.
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this unit, used for logging and introspection.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Handles the request, optionally continuing with `next`.
    fn handle(
        &self,
        ctx: Context,
        writer: &mut ResponseWriter<'_>,
        request: &mut Request,
        next: Next<'_>,
    );
}

/// Continuation that invokes the rest of the chain.
pub struct Next<'a> {
    node: &'a ChainNode,
}

static END_OF_CHAIN: ChainNode = ChainNode::Terminal;

impl<'a> Next<'a> {
    pub(crate) fn new(node: &'a ChainNode) -> Self {
        Self { node }
    }

    /// Returns a continuation that does nothing when run.
    ///
    /// Useful for invoking a single unit outside of a stack.
    pub fn end() -> Next<'static> {
        Next {
            node: &END_OF_CHAIN,
        }
    }

    /// Returns `true` if running this continuation would do nothing.
    pub fn is_end(&self) -> bool {
        self.node.is_terminal()
    }

    /// Invokes the rest of the chain.
    ///
    /// This consumes `self` so it can only be called once.
    pub fn run(self, ctx: Context, writer: &mut ResponseWriter<'_>, request: &mut Request) {
        self.node.invoke(ctx, writer, request);
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.node.len())
            .finish()
    }
}

/// A middleware built from a closure.
///
/// # Example
///
/// ```
/// use laminar_middleware::MiddlewareFn;
///
/// let auth = MiddlewareFn::new("auth", |ctx, writer, request, next| {
///     if request.headers().contains_key("authorization") {
///         next.run(ctx, writer, request);
///     } else {
///         use laminar_middleware::ResponseSink;
///         writer.write_header(http::StatusCode::UNAUTHORIZED);
///     }
/// });
/// ```
pub struct MiddlewareFn<F> {
    name: &'static str,
    func: F,
}

impl<F> MiddlewareFn<F>
where
    F: Fn(Context, &mut ResponseWriter<'_>, &mut Request, Next<'_>) + Send + Sync + 'static,
{
    /// Creates a named function-based middleware.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Middleware for MiddlewareFn<F>
where
    F: Fn(Context, &mut ResponseWriter<'_>, &mut Request, Next<'_>) + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn handle(
        &self,
        ctx: Context,
        writer: &mut ResponseWriter<'_>,
        request: &mut Request,
        next: Next<'_>,
    ) {
        (self.func)(ctx, writer, request, next);
    }
}

impl<F> fmt::Debug for MiddlewareFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareFn")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

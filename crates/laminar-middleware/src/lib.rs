//! # Laminar Middleware
//!
//! An appendable chain of middleware units, run in onion order for every
//! request.
//!
//! Units are registered on a [`Stack`]. Each unit receives a [`Context`], the
//! shared [`ResponseWriter`], the request, and a [`Next`] continuation. Code
//! before `next.run(..)` runs on the way down, code after it on the way up:
//!
//! ```text
//! serve ─► A ─► B ─► C ─┐
//!                       │
//! return ◄ A ◄ B ◄ C ◄──┘
//! ```
//!
//! A unit that does not call `next.run(..)` ends the traversal; nothing
//! registered after it runs.
//!
//! ## Kinds of unit
//!
//! | Registered with                | Runs the rest of the chain   |
//! |--------------------------------|------------------------------|
//! | `register` / `register_fn`     | when it calls `next.run`     |
//! | `register_handler(_fn)`        | always, after the handler    |
//! | `register_context_handler(_fn)`| always, after the handler    |
//!
//! ## Example
//!
//! ```
//! use http::StatusCode;
//! use laminar_middleware::{Request, ResponseBuffer, ResponseSink, Stack};
//!
//! let mut stack = Stack::new();
//! stack.register_handler_fn(|sink: &mut dyn ResponseSink, _request: &mut Request| {
//!     let _ = sink.write(b"foo");
//! });
//! stack.register_fn("wrap", |ctx, writer, request, next| {
//!     let _ = writer.write(b"bar");
//!     next.run(ctx, writer, request);
//!     let _ = writer.write(b"baz");
//! });
//!
//! let mut buffer = ResponseBuffer::new();
//! stack.serve(&mut buffer, &mut http::Request::new(bytes::Bytes::new()));
//!
//! assert_eq!(buffer.status(), Some(StatusCode::OK));
//! assert_eq!(buffer.body(), b"foobarbaz");
//! assert_eq!(stack.middleware_names(), vec!["handler", "wrap"]);
//! ```

#![doc(html_root_url = "https://docs.rs/laminar-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chain;
pub mod context;
pub mod handler;
pub mod middleware;
pub mod response;
pub mod stack;
pub mod stages;
pub mod types;

// Re-export main types at crate root
pub use chain::ChainNode;
pub use context::Context;
pub use handler::{
    wrap, wrap_context, ContextHandler, ContextHandlerFn, Handler, HandlerFn, Wrap, WrapContext,
};
pub use middleware::{BoxedMiddleware, Middleware, MiddlewareFn, Next};
pub use response::{ResponseBuffer, ResponseSink, ResponseWriter};
pub use stack::Stack;
pub use types::Request;

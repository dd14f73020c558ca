//! Common types used throughout the middleware chain.

use bytes::Bytes;

/// The HTTP request type handed to every unit in the chain.
///
/// The body is fully buffered by the host before the chain runs.
pub type Request = http::Request<Bytes>;

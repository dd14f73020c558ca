//! Built-in middleware stages.
//!
//! None of these run unless registered. A typical stack registers them
//! outermost first:
//!
//! 1. [`recovery`] - turn panics below it into a 500 response
//! 2. [`request_id`] - generate or propagate a request ID
//! 3. [`logger`] - log one line per request once the chain returns

pub mod logger;
pub mod recovery;
pub mod request_id;

pub use logger::{LoggerMiddleware, RequestLog};
pub use recovery::{panic_message, RecoveryMiddleware};
pub use request_id::{RequestId, RequestIdMiddleware, REQUEST_ID_HEADER};

//! famfin-trigger: the invocation bridge for famfin.
//!
//! Drives the in-process application from the hosting platform's
//! request envelopes. Each invocation runs as a single pass:
//!
//! ```text
//! platform envelope (http::Request<Bytes> | JSON event)
//!   │
//!   ▼
//! normalize ──────────► 400 on undecodable body
//!   │
//!   ▼
//! build_scope
//!   │
//!   ▼
//! invoke application ──► 500 on error, panic or protocol violation
//!   │   (Scope, Inbound, Outbound)
//!   ▼
//! assemble
//!   │
//!   ▼
//! InvocationResult {statusCode, headers, body, isBase64Encoded?}
//! ```
//!
//! [`Bridge::handle`] is the async entry; [`Bridge::handle_blocking`] serves
//! synchronous callers through [`scheduler::run_to_completion`]. The
//! [`HttpTrigger`] exposes the same bridge over local HTTP.

pub mod assemble;
pub mod bridge;
pub mod context;
pub mod convert;
pub mod handler;
pub mod headers;
pub mod invoke;
pub mod normalize;
pub mod scheduler;

pub use bridge::{Bridge, BridgeError, BridgeResult};
pub use handler::HttpTrigger;
pub use normalize::{Envelope, NormalizeError, NormalizedRequest};

//! famfin application calling convention.
//!
//! An in-process web application is driven in two phases:
//!
//! 1. The bridge builds a [`Scope`] describing the request (method, path,
//!    lower-cased header byte pairs, raw query string, scheme, server).
//! 2. The application is called with the scope plus the two halves of a
//!    message channel. It pulls the request body from [`Inbound`] and
//!    pushes a response start followed by body chunks into [`Outbound`].
//!
//! ```text
//! bridge ──Scope──────────────▶ application
//!        ◀──Inbound::receive()─┤  Body { body, more_body: false }
//!        ──Outbound::send()───▶│  Start { status, headers }
//!                              │  Body { body, more_body }*
//! ```
//!
//! The outbound half records into a [`ChannelState`] that the bridge reads
//! once the application's future completes. Sending never blocks and never
//! applies back-pressure; the whole response is buffered.

mod app;
mod channel;
mod error;
mod message;
mod scope;

pub use app::{Application, BoxFuture};
pub use channel::{ChannelHandle, ChannelState, Inbound, Outbound, Phase, channel};
pub use error::{AppError, ChannelError};
pub use message::{InboundMessage, OutboundMessage};
pub use scope::{Scheme, Scope};

//! Application invocation.
//!
//! Runs one application call against a fresh channel and returns the
//! accumulated [`ChannelState`]. Errors returned by the application, panics
//! inside it, and protocol violations on the channel all fail the
//! invocation.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use bytes::Bytes;
use famfin_async::{AppError, Application, ChannelError, ChannelState, Scope, channel};
use futures_util::FutureExt;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("application failed: {0}")]
    Application(#[from] AppError),

    #[error("application panicked: {0}")]
    Panicked(String),

    #[error("protocol violation: {0}")]
    Protocol(#[from] ChannelError),
}

pub async fn invoke(
    app: &dyn Application,
    scope: Scope,
    body: Bytes,
) -> Result<ChannelState, InvokeError> {
    let (inbound, outbound, handle) = channel(body);

    let call = catch_unwind(AssertUnwindSafe(|| app.call(scope, inbound, outbound)))
        .map_err(|payload| InvokeError::Panicked(panic_message(payload.as_ref())))?;

    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(e.into()),
        Err(payload) => return Err(InvokeError::Panicked(panic_message(payload.as_ref()))),
    }

    debug!(phase = ?handle.phase(), "application returned");
    Ok(handle.finish()?)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

use std::future::Future;

use crate::channel::{Inbound, Outbound};
use crate::error::AppError;
use crate::scope::Scope;

pub type BoxFuture<'a, T> = futures_core::future::BoxFuture<'a, T>;

/// An in-process web application.
///
/// `call` receives the invocation's [`Scope`] and both channel halves and
/// resolves once the exchange is complete. The returned future owns
/// everything it needs, so implementations clone shared state into it.
///
/// Any `Fn(Scope, Inbound, Outbound) -> impl Future` closure is an
/// application.
pub trait Application: Send + Sync {
    fn call(
        &self,
        scope: Scope,
        inbound: Inbound,
        outbound: Outbound,
    ) -> BoxFuture<'static, Result<(), AppError>>;
}

impl<F, Fut> Application for F
where
    F: Fn(Scope, Inbound, Outbound) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), AppError>> + Send + 'static,
{
    fn call(
        &self,
        scope: Scope,
        inbound: Inbound,
        outbound: Outbound,
    ) -> BoxFuture<'static, Result<(), AppError>> {
        Box::pin(self(scope, inbound, outbound))
    }
}

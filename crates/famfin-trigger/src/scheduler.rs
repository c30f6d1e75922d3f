//! Run-to-completion for synchronous callers.
//!
//! The platform calls the bridge synchronously. [`run_to_completion`]
//! drives an invocation future to its end from such a caller:
//!
//! - inside an active multi-threaded tokio runtime, the runtime is reused
//!   through `block_in_place`;
//! - inside a current-thread runtime (which cannot be blocked from within),
//!   the future runs on a scoped thread with its own scheduler;
//! - otherwise a current-thread scheduler is provisioned for the call.
//!
//! A provisioned scheduler is released on every exit path, unwinding
//! included, because it is owned by a guard.

use std::future::Future;

use thiserror::Error;
use tokio::runtime::{Builder, Handle, Runtime, RuntimeFlavor};
use tracing::debug;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("failed to provision scheduler: {0}")]
    Provision(#[from] std::io::Error),

    #[error("invocation thread panicked")]
    Panicked,
}

pub fn run_to_completion<F>(future: F) -> Result<F::Output, SchedulerError>
where
    F: Future + Send,
    F::Output: Send,
{
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            debug!("reusing active scheduler");
            Ok(tokio::task::block_in_place(|| handle.block_on(future)))
        }
        Ok(_) => std::thread::scope(|s| {
            s.spawn(|| provision_and_run(future))
                .join()
                .map_err(|_| SchedulerError::Panicked)?
        }),
        Err(_) => provision_and_run(future),
    }
}

fn provision_and_run<F: Future>(future: F) -> Result<F::Output, SchedulerError> {
    let scheduler = ProvisionedScheduler::acquire()?;
    Ok(scheduler.run(future))
}

/// A current-thread runtime that lives for exactly one invocation.
struct ProvisionedScheduler {
    runtime: Runtime,
}

impl ProvisionedScheduler {
    fn acquire() -> Result<Self, SchedulerError> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        debug!("provisioned scheduler");
        Ok(Self { runtime })
    }

    fn run<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

impl Drop for ProvisionedScheduler {
    fn drop(&mut self) {
        debug!("released scheduler");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn answer() -> u32 {
        tokio::task::yield_now().await;
        42
    }

    #[test]
    fn provisions_when_no_runtime_is_active() {
        assert!(Handle::try_current().is_err());
        assert_eq!(run_to_completion(answer()).unwrap(), 42);
        // Nothing leaks into the calling thread.
        assert!(Handle::try_current().is_err());
    }

    #[test]
    fn repeated_calls_each_get_a_scheduler() {
        for _ in 0..3 {
            assert_eq!(run_to_completion(answer()).unwrap(), 42);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn reuses_multi_thread_runtime() {
        let value = run_to_completion(async {
            // Spawning requires a live runtime context.
            tokio::spawn(answer()).await.unwrap()
        })
        .unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn current_thread_runtime_uses_scoped_thread() {
        assert_eq!(run_to_completion(answer()).unwrap(), 42);
    }

    #[test]
    fn scheduler_is_released_when_future_panics() {
        let result = std::panic::catch_unwind(|| {
            run_to_completion(async {
                panic!("boom");
            })
        });
        assert!(result.is_err());
        // A fresh scheduler can still be provisioned afterwards.
        assert_eq!(run_to_completion(answer()).unwrap(), 42);
    }
}

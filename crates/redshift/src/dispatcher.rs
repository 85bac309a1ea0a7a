//! Worker pool for Data API calls.
//!
//! A [`Dispatcher`] runs futures on its own multi-threaded runtime (or on an
//! injected runtime handle) and hands the caller a [`Completion`] right away.
//! Each completion receives exactly one value: the task's result, or an error
//! if the pool shut down first.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::task::{Context, Poll};

use tokio::runtime::{Handle, Runtime};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use redshift_data_core::error::Result;
use redshift_data_core::RedshiftDataError;

const WORKER_THREAD_NAME: &str = "redshift-data-worker";

// ── Completion ─────────────────────────────────────────────────────

/// Single-fulfillment handle for a dispatched call.
///
/// Await it from async code, or call [`Completion::wait`] from a thread that
/// is not driving a Tokio runtime.
#[must_use = "a completion does nothing unless awaited or waited on"]
pub struct Completion<T> {
    rx: oneshot::Receiver<Result<T>>,
}

impl<T> Completion<T> {
    /// A completion that is already resolved.
    pub fn ready(result: Result<T>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(result);
        Self { rx }
    }

    /// Block the current thread until the result arrives.
    ///
    /// Panics if called from within an async execution context.
    pub fn wait(self) -> Result<T> {
        self.rx.blocking_recv().unwrap_or_else(|_| Err(dropped()))
    }

    /// Take the result if it has already arrived.
    pub fn try_take(&mut self) -> Option<Result<T>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(dropped())),
        }
    }
}

impl<T> Future for Completion<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().rx)
            .poll(cx)
            .map(|r| r.unwrap_or_else(|_| Err(dropped())))
    }
}

fn dropped() -> RedshiftDataError {
    RedshiftDataError::Cancelled("worker pool shut down before the call completed".into())
}

// ── Dispatcher ─────────────────────────────────────────────────────

/// Task-execution service shared by every call of one client.
pub struct Dispatcher {
    handle: Handle,
    /// Present only when the dispatcher built its own runtime.
    runtime: Mutex<Option<Runtime>>,
    shutdown: CancellationToken,
}

impl Dispatcher {
    /// Build a dedicated multi-threaded runtime with `worker_threads` workers.
    pub fn new(worker_threads: usize) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(worker_threads.max(1))
            .thread_name(WORKER_THREAD_NAME)
            .enable_all()
            .build()
            .map_err(|e| {
                RedshiftDataError::Configuration(format!("failed to build worker pool: {e}"))
            })?;

        info!(worker_threads, "Dispatcher worker pool started");

        Ok(Self {
            handle: runtime.handle().clone(),
            runtime: Mutex::new(Some(runtime)),
            shutdown: CancellationToken::new(),
        })
    }

    /// Run tasks on an existing runtime. Shutdown cancels in-flight tasks but
    /// leaves the runtime itself alone.
    pub fn with_handle(handle: Handle) -> Self {
        Self {
            handle,
            runtime: Mutex::new(None),
            shutdown: CancellationToken::new(),
        }
    }

    /// Token cancelled when the dispatcher shuts down. Long-running tasks
    /// (pollers) watch a child of it.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Spawn `task` and return its completion immediately.
    ///
    /// After shutdown the completion resolves to [`RedshiftDataError::Closed`].
    pub fn dispatch<T, F>(&self, operation: &'static str, task: F) -> Completion<T>
    where
        T: Send + 'static,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        if self.shutdown.is_cancelled() {
            return Completion::ready(Err(RedshiftDataError::Closed));
        }

        let (tx, rx) = oneshot::channel();
        let token = self.shutdown.clone();

        self.handle.spawn(async move {
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => Err(RedshiftDataError::Cancelled(
                    format!("{operation} interrupted by shutdown"),
                )),
                result = task => result,
            };
            if let Err(e) = &result {
                debug!(operation, error = %e, "Dispatched call failed");
            }
            if tx.send(result).is_err() {
                debug!(operation, "Completion dropped before result was delivered");
            }
        });

        Completion { rx }
    }

    /// Cancel in-flight tasks and release the worker pool without blocking.
    ///
    /// Returns `false` if the dispatcher was already shut down.
    pub fn shutdown(&self) -> bool {
        if self.shutdown.is_cancelled() {
            return false;
        }
        self.shutdown.cancel();

        let runtime = match self.runtime.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(runtime) = runtime {
            runtime.shutdown_background();
        }

        info!("Dispatcher shut down");
        true
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        // Dropping a Runtime from async context panics; always go through
        // shutdown_background.
        if self.shutdown() {
            warn!("Dispatcher dropped without an explicit shutdown");
        }
    }
}

//! Blocking or non-blocking execution, chosen at call time.
//!
//! Outside of a tokio runtime an operation runs to completion on a fresh
//! single-threaded runtime which is torn down before returning. Inside a
//! runtime it is spawned as a child task of the current runtime instead, and
//! the caller receives a [`Pending`] handle to await.

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::future::{self, Either, Ready};
use tokio::runtime::{Builder, Handle};
use tokio::task::JoinHandle;
use tracing::trace;

use super::Error;

/// The outcome of dispatching an operation.
#[must_use = "a pending operation is aborted when dropped"]
#[derive(Debug)]
pub enum Dispatched<T> {
    /// The operation ran to completion on its own runtime.
    Complete(Result<T, Error>),
    /// The operation is running as a child task of the current runtime.
    Pending(Pending<T>),
}

impl<T> Dispatched<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Dispatched::Pending(_))
    }

    /// The finished result of a blocking call, or the pending handle back if
    /// the call was made from inside a runtime.
    pub fn try_complete(self) -> Result<Result<T, Error>, Pending<T>> {
        match self {
            Dispatched::Complete(result) => Ok(result),
            Dispatched::Pending(pending) => Err(pending),
        }
    }
}

impl<T> IntoFuture for Dispatched<T> {
    type Output = Result<T, Error>;
    type IntoFuture = Either<Ready<Result<T, Error>>, Pending<T>>;

    fn into_future(self) -> Self::IntoFuture {
        match self {
            Dispatched::Complete(result) => Either::Left(future::ready(result)),
            Dispatched::Pending(pending) => Either::Right(pending),
        }
    }
}

/// An in-flight child task.
///
/// Awaiting it yields the operation's result. A panic in the task resumes in
/// the awaiting caller. Dropping the handle aborts the task, which closes its
/// response and releases its lease; use [`Pending::detach`] to let it finish
/// unobserved.
#[derive(Debug)]
pub struct Pending<T> {
    handle: Option<JoinHandle<Result<T, Error>>>,
}

impl<T> Pending<T> {
    pub fn abort(&self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    pub fn detach(mut self) {
        self.handle.take();
    }
}

impl<T> Future for Pending<T> {
    type Output = Result<T, Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let handle = match self.handle.as_mut() {
            Some(handle) => handle,
            None => return Poll::Ready(Err(Error::Cancelled)),
        };

        match Pin::new(handle).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(err)) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Poll::Ready(Err(_)) => Poll::Ready(Err(Error::Cancelled)),
        }
    }
}

impl<T> Drop for Pending<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Whether the caller is already running inside a runtime.
pub fn in_runtime() -> bool {
    Handle::try_current().is_ok()
}

pub(crate) fn dispatch<T, F>(operation: F) -> Dispatched<T>
where
    T: Send + 'static,
    F: Future<Output = Result<T, Error>> + Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) => {
            trace!("spawning request as a child task");

            Dispatched::Pending(Pending {
                handle: Some(handle.spawn(operation)),
            })
        }
        Err(_) => {
            trace!("running request on a dedicated runtime");

            Dispatched::Complete(block_on(operation))
        }
    }
}

fn block_on<T, F>(operation: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    let rt = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(Error::Runtime)?;

    rt.block_on(operation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_blocks_outside_runtime() {
        assert!(!in_runtime());

        let dispatched = dispatch(async {
            // The operation itself runs inside the dedicated runtime
            assert!(in_runtime());
            tokio::task::yield_now().await;
            Ok(7)
        });

        assert!(!dispatched.is_pending());
        assert_eq!(dispatched.try_complete().unwrap().unwrap(), 7);

        // The dedicated runtime is gone again
        assert!(!in_runtime());
    }

    #[test]
    fn test_blocking_error_propagates() {
        let dispatched: Dispatched<()> = dispatch(async { Err(Error::MissingApiKey) });

        assert!(matches!(
            dispatched.try_complete(),
            Ok(Err(Error::MissingApiKey))
        ));
    }

    #[tokio::test]
    async fn test_spawns_inside_runtime() {
        let dispatched = dispatch(async { Ok("done") });

        assert!(dispatched.is_pending());
        assert_eq!(dispatched.await.unwrap(), "done");
    }

    #[tokio::test]
    async fn test_children_interleave() {
        let (tx, rx) = tokio::sync::oneshot::channel::<u32>();

        // The first child can only finish once the second has run
        let waiting = dispatch(async move { rx.await.map_err(|_| Error::Cancelled) });
        let sending = dispatch(async move {
            let _ = tx.send(11);
            Ok(())
        });

        sending.await.unwrap();
        assert_eq!(waiting.await.unwrap(), 11);
    }

    #[tokio::test]
    async fn test_abort_resolves_to_cancelled() {
        let dispatched: Dispatched<()> = dispatch(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        });

        let pending = dispatched.try_complete().unwrap_err();
        pending.abort();

        assert!(matches!(pending.await, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_drop_aborts_child() {
        struct SetOnDrop(Arc<AtomicBool>);

        impl Drop for SetOnDrop {
            fn drop(&mut self) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        let dropped = Arc::new(AtomicBool::new(false));
        let guard = SetOnDrop(Arc::clone(&dropped));

        let dispatched: Dispatched<()> = dispatch(async move {
            let _guard = guard;
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        });

        // Let the child start
        tokio::task::yield_now().await;
        drop(dispatched);

        for _ in 0..100 {
            if dropped.load(Ordering::SeqCst) {
                break;
            }
            tokio::task::yield_now().await;
        }

        assert!(dropped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_detached_child_completes() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let dispatched: Dispatched<()> = dispatch(async move {
            let _ = tx.send(());
            Ok(())
        });

        match dispatched {
            Dispatched::Pending(pending) => pending.detach(),
            Dispatched::Complete(_) => panic!("expected a pending child"),
        }

        assert!(rx.await.is_ok());
    }

    #[tokio::test]
    #[should_panic(expected = "child exploded")]
    async fn test_child_panic_reaches_parent() {
        let dispatched: Dispatched<()> = dispatch(async { panic!("child exploded") });

        let _ = dispatched.await;
    }
}

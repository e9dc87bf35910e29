use std::{
    fmt,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

use futures::future::{self, BoxFuture, FutureExt};

use crate::error::Error;

/// Waits until the underlying operation completes.
///
/// Returned by every actuation command. Dropping it does not cancel the
/// operation.
#[must_use = "You must explicitly choose whether to wait for the complete or do not wait"]
pub struct WaitFuture {
    future: BoxFuture<'static, Result<(), Error>>,
}

impl WaitFuture {
    /// Waits until the `future` is complete.
    pub fn new(future: impl Future<Output = Result<(), Error>> + Send + 'static) -> Self {
        Self {
            future: future.boxed(),
        }
    }

    /// Creates a new `WaitFuture` which immediately complete.
    pub fn ready() -> Self {
        Self::new(future::ready(Ok(())))
    }

    /// Creates a new `WaitFuture` which immediately resolves to `error`.
    pub fn failed(error: Error) -> Self {
        Self::new(future::ready(Err(error)))
    }

    /// Waits for completion, giving up with [`Error::Timeout`] after `timeout`.
    pub async fn with_timeout(self, operation: &str, timeout: Duration) -> Result<(), Error> {
        match tokio::time::timeout(timeout, self).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout {
                operation: operation.to_owned(),
                timeout,
            }),
        }
    }
}

impl Future for WaitFuture {
    type Output = Result<(), Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.future.poll_unpin(cx)
    }
}

impl fmt::Debug for WaitFuture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitFuture").finish_non_exhaustive()
    }
}

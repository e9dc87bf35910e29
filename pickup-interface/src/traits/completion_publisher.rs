use auto_impl::auto_impl;

use crate::{error::Error, waits::WaitFuture};

#[auto_impl(&, Box, Arc)]
pub trait CompletionPublisher: Send + Sync {
    /// Publishes the completion message and returns a future that waits until
    /// the message is handed to the transport.
    fn publish(&self, message: &str) -> Result<WaitFuture, Error>;
}

use std::time::Duration;

use pickup_interface::{CompletionPublisher, Error, Session};
use tracing::{info, warn};

use crate::CompletionReporterConfig;

/// Publishes the completion event of a run.
#[derive(Debug)]
pub struct CompletionReporter<C>
where
    C: CompletionPublisher,
{
    publisher: C,
    config: CompletionReporterConfig,
}

impl<C> CompletionReporter<C>
where
    C: CompletionPublisher,
{
    pub fn new(publisher: C, config: CompletionReporterConfig) -> Self {
        Self { publisher, config }
    }

    pub fn publisher(&self) -> &C {
        &self.publisher
    }

    /// Publishes `"<id>:<name>"` of the session, retrying until one attempt
    /// succeeds or `max_attempts` attempts failed.
    pub async fn report(&self, session: &Session) -> Result<(), Error> {
        let message = session.completion_message();
        tokio::time::sleep(Duration::from_secs_f64(self.config.pre_publish_delay_sec)).await;

        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.publish_once(&message).await {
                Ok(()) => break,
                Err(e) if attempt < max_attempts => {
                    warn!(attempt, max_attempts, "failed to publish completion: {e}");
                    tokio::time::sleep(Duration::from_secs_f64(self.config.retry_interval_sec))
                        .await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
        info!(%message, "Finished");

        tokio::time::sleep(Duration::from_secs_f64(self.config.post_publish_delay_sec)).await;
        Ok(())
    }

    async fn publish_once(&self, message: &str) -> Result<(), Error> {
        self.publisher.publish(message)?.await
    }
}

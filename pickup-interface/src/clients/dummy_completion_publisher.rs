use std::sync::Mutex;

use crate::{error::Error, traits::CompletionPublisher, waits::WaitFuture};

/// Dummy CompletionPublisher for debug or tests.
#[derive(Debug, Default)]
pub struct DummyCompletionPublisher {
    pub messages: Mutex<Vec<String>>,
}

impl DummyCompletionPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published_messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl CompletionPublisher for DummyCompletionPublisher {
    fn publish(&self, message: &str) -> Result<WaitFuture, Error> {
        self.messages.lock().unwrap().push(message.to_owned());
        Ok(WaitFuture::ready())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish() {
        let publisher = DummyCompletionPublisher::new();
        assert!(publisher.published_messages().is_empty());
        publisher.publish("42:Doe").unwrap().await.unwrap();
        assert_eq!(publisher.published_messages(), vec!["42:Doe"]);
    }

    #[test]
    fn test_publish_no_wait() {
        let publisher = DummyCompletionPublisher::new();
        let _ = publisher.publish("42:Doe").unwrap();
        assert_eq!(publisher.published_messages(), vec!["42:Doe"]);
    }
}

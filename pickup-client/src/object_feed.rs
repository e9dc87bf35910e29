use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{sleep, JoinHandle},
    time::{Duration, Instant},
};

use pickup_interface::{Error, Point3};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::{joints::default_request_timeout_sec, utils::*};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct WebObjectFeedConfig {
    pub base_url: String,
    #[serde(default = "default_poll_rate_hz")]
    pub poll_rate_hz: f64,
    #[serde(default = "default_request_timeout_sec")]
    pub request_timeout_sec: f64,
}

fn default_poll_rate_hz() -> f64 {
    10.0
}

/// Polls the detected objects from a background thread.
///
/// Every frame is sent to the receiver returned by [`WebObjectFeed::spawn`].
/// The thread stops when the feed is dropped or the receiver is gone.
#[derive(Debug)]
pub struct WebObjectFeed {
    thread: Option<JoinHandle<()>>,
    is_dropping: Arc<AtomicBool>,
}

impl WebObjectFeed {
    pub fn spawn(
        config: &WebObjectFeedConfig,
    ) -> Result<(Self, flume::Receiver<Vec<Point3<f64>>>), Error> {
        let url = endpoint(&parse_url(&config.base_url)?, "get_objects")?;
        let agent = agent(Duration::from_secs_f64(config.request_timeout_sec));
        if config.poll_rate_hz <= 0.0 {
            return Err(Error::Other(anyhow::anyhow!(
                "poll_rate_hz must be positive: {}",
                config.poll_rate_hz
            )));
        }
        let period = Duration::from_secs_f64(1.0 / config.poll_rate_hz);
        let (sender, receiver) = flume::unbounded();
        let is_dropping = Arc::new(AtomicBool::new(false));
        let is_dropping_cloned = is_dropping.clone();
        let thread = std::thread::spawn(move || {
            feed_loop(&agent, &url, period, &sender, &is_dropping_cloned);
        });
        Ok((
            Self {
                thread: Some(thread),
                is_dropping,
            },
            receiver,
        ))
    }
}

fn feed_loop(
    agent: &ureq::Agent,
    url: &Url,
    period: Duration,
    sender: &flume::Sender<Vec<Point3<f64>>>,
    is_dropping: &AtomicBool,
) {
    while !is_dropping.load(Ordering::Relaxed) {
        let start_time = Instant::now();
        match get::<Objects>(agent, url) {
            Ok(objects) => {
                let points = objects
                    .points
                    .into_iter()
                    .map(|[x, y, z]| Point3::new(x, y, z))
                    .collect();
                if sender.send(points).is_err() {
                    debug!("object receiver dropped");
                    return;
                }
            }
            Err(e) => warn!("failed to get objects: {e}"),
        }
        let elapsed = start_time.elapsed();
        if period > elapsed {
            sleep(period - elapsed);
        }
    }
}

impl Drop for WebObjectFeed {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.is_dropping.store(true, Ordering::Relaxed);
            if thread.join().is_err() {
                warn!("object feed thread panicked");
            }
        }
    }
}

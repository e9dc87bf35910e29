use std::{
    fmt,
    thread::sleep,
    time::{Duration, Instant},
};

use pickup_interface::{Error, WaitFuture};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

const CHECK_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Serialize, Deserialize, Debug, Clone)]
pub(crate) struct JointState {
    pub(crate) names: Vec<String>,
    pub(crate) positions: Vec<f64>,
}

#[derive(Serialize, Debug)]
pub(crate) struct JointTarget {
    pub(crate) names: Vec<String>,
    pub(crate) positions: Vec<f64>,
    pub(crate) duration_sec: f64,
}

#[derive(Serialize, Debug)]
pub(crate) struct IkRequest {
    pub(crate) frame_id: String,
    pub(crate) position: [f64; 3],
    pub(crate) orientation: [f64; 4],
}

#[derive(Deserialize, Debug)]
pub(crate) struct IkResponse {
    pub(crate) is_ok: bool,
    #[serde(default)]
    pub(crate) reason: String,
    #[serde(default)]
    pub(crate) names: Vec<String>,
    #[serde(default)]
    pub(crate) positions: Vec<f64>,
}

#[derive(Serialize, Debug)]
pub(crate) struct SetGripper {
    pub(crate) open: bool,
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub(crate) struct GripperState {
    pub(crate) open: bool,
    #[serde(default)]
    pub(crate) moving: bool,
}

#[derive(Deserialize, Debug)]
pub(crate) struct Objects {
    pub(crate) points: Vec<[f64; 3]>,
}

#[derive(Serialize, Debug)]
pub(crate) struct CompletionEvent<'a> {
    pub(crate) data: &'a str,
}

#[derive(Serialize, Deserialize, Debug)]
pub(crate) struct RpcResult {
    pub(crate) is_ok: bool,
    #[serde(default)]
    pub(crate) reason: String,
}

impl RpcResult {
    pub(crate) fn into_result(self) -> Result<(), Error> {
        if self.is_ok {
            Ok(())
        } else {
            Err(Error::ActuationFault {
                message: self.reason,
            })
        }
    }
}

fn map_connection_error<E: fmt::Display>(url: &Url) -> impl FnOnce(E) -> Error + '_ {
    move |e: E| Error::Connection {
        message: format!("url:{url}: {e}"),
    }
}

pub(crate) fn parse_url(url: &str) -> Result<Url, Error> {
    Url::parse(url).map_err(|e| Error::Connection {
        message: format!("invalid url {url:?}: {e}"),
    })
}

pub(crate) fn endpoint(base_url: &Url, path: &str) -> Result<Url, Error> {
    base_url.join(path).map_err(map_connection_error(base_url))
}

pub(crate) fn agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new().timeout(timeout).build()
}

pub(crate) fn get<T: DeserializeOwned>(agent: &ureq::Agent, url: &Url) -> Result<T, Error> {
    agent
        .get(url.as_str())
        .call()
        .map_err(map_connection_error(url))?
        .into_json::<T>()
        .map_err(map_connection_error(url))
}

pub(crate) fn post<T: Serialize, U: DeserializeOwned>(
    agent: &ureq::Agent,
    url: &Url,
    msg: &T,
) -> Result<U, Error> {
    let body = serde_json::to_value(msg).map_err(map_connection_error(url))?;
    agent
        .post(url.as_str())
        .send_json(body)
        .map_err(map_connection_error(url))?
        .into_json()
        .map_err(map_connection_error(url))
}

/// Actuation is reported as a fault whatever went wrong with the transport.
pub(crate) fn actuation_fault(e: Error) -> Error {
    match e {
        Error::Connection { message } => Error::ActuationFault { message },
        e => e,
    }
}

/// Calls `is_done` every 10 ms until it returns true. Returns false if
/// `timeout` elapsed first.
pub(crate) fn poll_until(
    timeout: Duration,
    mut is_done: impl FnMut() -> Result<bool, Error>,
) -> Result<bool, Error> {
    let start = Instant::now();
    loop {
        if is_done()? {
            return Ok(true);
        }
        if start.elapsed() >= timeout {
            return Ok(false);
        }
        sleep(CHECK_INTERVAL);
    }
}

/// Runs a blocking completion check on the blocking thread pool once the
/// returned future is polled.
pub(crate) fn wait_blocking<F>(f: F) -> WaitFuture
where
    F: FnOnce() -> Result<(), Error> + Send + 'static,
{
    WaitFuture::new(async move {
        tokio::task::spawn_blocking(f)
            .await
            .map_err(|e| Error::Other(e.into()))?
    })
}

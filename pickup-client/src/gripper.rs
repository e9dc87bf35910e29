use std::time::Duration;

use pickup_interface::{Error, Gripper, GripperCommand, WaitFuture};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::{joints::default_request_timeout_sec, utils::*};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct WebGripperConfig {
    pub base_url: String,
    #[serde(default = "default_gripper_timeout_sec")]
    pub complete_timeout_sec: f64,
    #[serde(default = "default_request_timeout_sec")]
    pub request_timeout_sec: f64,
}

fn default_gripper_timeout_sec() -> f64 {
    5.0
}

#[derive(Debug)]
pub struct WebGripper {
    agent: ureq::Agent,
    get_url: Url,
    set_url: Url,
    complete_timeout: Duration,
}

impl WebGripper {
    pub fn try_new(config: &WebGripperConfig) -> Result<Self, Error> {
        let base_url = parse_url(&config.base_url)?;
        Ok(Self {
            agent: agent(Duration::from_secs_f64(config.request_timeout_sec)),
            get_url: endpoint(&base_url, "get_gripper")?,
            set_url: endpoint(&base_url, "set_gripper")?,
            complete_timeout: Duration::from_secs_f64(config.complete_timeout_sec),
        })
    }
}

impl Gripper for WebGripper {
    fn set_gripper(&self, command: GripperCommand) -> Result<WaitFuture, Error> {
        let open = command.is_open();
        debug!(open, "set_gripper");
        post::<_, RpcResult>(
            &self.agent,
            &self.set_url,
            &SetGripper { open },
        )
        .map_err(actuation_fault)?
        .into_result()?;

        let agent = self.agent.clone();
        let url = self.get_url.clone();
        let timeout = self.complete_timeout;
        Ok(wait_blocking(move || {
            let reached = poll_until(timeout, || {
                let state: GripperState = get(&agent, &url).map_err(actuation_fault)?;
                Ok(!state.moving && state.open == open)
            })?;
            if reached {
                Ok(())
            } else {
                Err(Error::ActuationFault {
                    message: format!("gripper did not {command} within {timeout:?}"),
                })
            }
        }))
    }
}

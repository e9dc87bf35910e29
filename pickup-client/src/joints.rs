use std::time::Duration;

use pickup_interface::{Error, JointActuator, JointConfiguration, WaitFuture};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::utils::*;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct WebJointActuatorConfig {
    pub base_url: String,
    /// Controllable joints. Empty means every joint reported by the server.
    #[serde(default)]
    pub joint_names: Vec<String>,
    /// Summed absolute joint error (rad) under which a move is complete.
    #[serde(default = "default_allowable_error")]
    pub allowable_error: f64,
    /// Added to the requested move duration.
    #[serde(default = "default_complete_timeout_sec")]
    pub complete_timeout_sec: f64,
    #[serde(default = "default_request_timeout_sec")]
    pub request_timeout_sec: f64,
}

fn default_allowable_error() -> f64 {
    0.02
}

fn default_complete_timeout_sec() -> f64 {
    10.0
}

pub(crate) fn default_request_timeout_sec() -> f64 {
    5.0
}

#[derive(Debug, Clone, Copy)]
struct TotalJointDiffCondition {
    allowable_error: f64,
    timeout: Duration,
}

/// Joint actuation over HTTP.
///
/// Commands always carry the full state of the robot: joints missing from a
/// target keep their current position.
#[derive(Debug)]
pub struct WebJointActuator {
    agent: ureq::Agent,
    get_url: Url,
    set_url: Url,
    joint_names: Vec<String>,
    condition: TotalJointDiffCondition,
}

impl WebJointActuator {
    pub fn try_new(config: &WebJointActuatorConfig) -> Result<Self, Error> {
        let base_url = parse_url(&config.base_url)?;
        let agent = agent(Duration::from_secs_f64(config.request_timeout_sec));
        let get_url = endpoint(&base_url, "get_joint_positions")?;
        let state: JointState = get(&agent, &get_url)?;
        let joint_names = if config.joint_names.is_empty() {
            state.names
        } else {
            if let Some(name) = config
                .joint_names
                .iter()
                .find(|name| !state.names.contains(name))
            {
                return Err(Error::NoJoint(name.clone()));
            }
            config.joint_names.clone()
        };
        Ok(Self {
            agent,
            get_url,
            set_url: endpoint(&base_url, "set_joint_positions")?,
            joint_names,
            condition: TotalJointDiffCondition {
                allowable_error: config.allowable_error,
                timeout: Duration::from_secs_f64(config.complete_timeout_sec),
            },
        })
    }
}

fn total_diff(target: &JointConfiguration, state: &JointState) -> f64 {
    state
        .names
        .iter()
        .zip(&state.positions)
        .filter_map(|(name, current)| target.get(name).map(|tar| (tar - current).abs()))
        .sum()
}

impl JointActuator for WebJointActuator {
    fn joint_names(&self) -> Vec<String> {
        self.joint_names.clone()
    }

    fn current_joint_configuration(&self) -> Result<JointConfiguration, Error> {
        let state: JointState = get(&self.agent, &self.get_url)?;
        Ok(state
            .names
            .into_iter()
            .zip(state.positions)
            .filter(|(name, _)| self.joint_names.contains(name))
            .collect())
    }

    fn send_joint_configuration(
        &self,
        target: &JointConfiguration,
        duration: Duration,
    ) -> Result<WaitFuture, Error> {
        if let Some(name) = target.names().into_iter().find(|n| !self.joint_names.contains(n)) {
            return Err(Error::NoJoint(name));
        }
        let mut state: JointState = get(&self.agent, &self.get_url).map_err(actuation_fault)?;
        target.merge_into(&state.names, &mut state.positions)?;
        let command = JointTarget {
            names: state.names,
            positions: state.positions,
            duration_sec: duration.as_secs_f64(),
        };
        debug!(?command, "set_joint_positions");
        post::<_, RpcResult>(&self.agent, &self.set_url, &command)
            .map_err(actuation_fault)?
            .into_result()?;

        let agent = self.agent.clone();
        let url = self.get_url.clone();
        let target = target.clone();
        let condition = self.condition;
        Ok(wait_blocking(move || {
            let timeout = condition.timeout + duration;
            let mut diff = f64::INFINITY;
            let reached = poll_until(timeout, || {
                let state: JointState = get(&agent, &url).map_err(actuation_fault)?;
                diff = total_diff(&target, &state);
                Ok(diff <= condition.allowable_error)
            })?;
            if reached {
                Ok(())
            } else {
                Err(Error::ActuationFault {
                    message: format!(
                        "joints did not reach the target within {timeout:?} (error = {diff})"
                    ),
                })
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;

    #[test]
    fn test_total_diff() {
        let state = JointState {
            names: vec!["a".to_owned(), "b".to_owned(), "c".to_owned()],
            positions: vec![0.0, 1.0, 2.0],
        };
        let target: JointConfiguration = [("a".to_owned(), 0.5), ("c".to_owned(), 1.0)]
            .into_iter()
            .collect();
        assert_approx_eq!(total_diff(&target, &state), 1.5);
    }

    #[test]
    fn test_config_defaults() {
        let config: WebJointActuatorConfig =
            toml::from_str(r#"base_url = "http://127.0.0.1:7777""#).unwrap();
        assert!(config.joint_names.is_empty());
        assert_approx_eq!(config.allowable_error, 0.02);
        assert_approx_eq!(config.complete_timeout_sec, 10.0);
    }

    #[test]
    fn test_connection_error() {
        let port = portpicker::pick_unused_port().expect("No ports free");
        let config = WebJointActuatorConfig {
            base_url: format!("http://127.0.0.1:{port}"),
            joint_names: vec![],
            allowable_error: 0.02,
            complete_timeout_sec: 1.0,
            request_timeout_sec: 0.5,
        };
        let e = WebJointActuator::try_new(&config).unwrap_err();
        assert!(matches!(e, Error::Connection { .. }));
    }
}

use std::time::Duration;

use pickup_interface::{quaternion_to_xyzw, Error, JointConfiguration, PoseSolver, RobotPose};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::utils::*;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct WebIkSolverConfig {
    /// Base url of the IK service. Requests go to `{url}/solve_ik`.
    pub url: String,
    #[serde(default = "default_ik_timeout_sec")]
    pub timeout_sec: f64,
}

fn default_ik_timeout_sec() -> f64 {
    5.0
}

/// [`PoseSolver`] backed by an IK service over HTTP.
///
/// Every failure, including an unreachable service, is reported as
/// [`Error::UnreachablePose`].
#[derive(Debug)]
pub struct WebIkSolver {
    agent: ureq::Agent,
    url: Url,
}

impl WebIkSolver {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, Error> {
        Ok(Self {
            agent: agent(timeout),
            url: endpoint(&base_url, "solve_ik")?,
        })
    }

    pub fn from_config(config: &WebIkSolverConfig) -> Result<Self, Error> {
        Self::new(
            parse_url(&config.url)?,
            Duration::from_secs_f64(config.timeout_sec),
        )
    }
}

impl PoseSolver for WebIkSolver {
    fn solve(&self, target: &RobotPose) -> Result<JointConfiguration, Error> {
        let unreachable = |reason: String| Error::UnreachablePose {
            position: target.position,
            reason,
        };
        let request = IkRequest {
            frame_id: target.frame_id().to_owned(),
            position: [target.position.x, target.position.y, target.position.z],
            orientation: quaternion_to_xyzw(&target.orientation),
        };
        let response: IkResponse =
            post(&self.agent, &self.url, &request).map_err(|e| unreachable(e.to_string()))?;
        if !response.is_ok {
            return Err(unreachable(response.reason));
        }
        if response.names.is_empty() {
            return Err(unreachable("empty solution".to_owned()));
        }
        debug!(num_joints = response.names.len(), "ik solved");
        JointConfiguration::from_names_and_positions(response.names, response.positions)
            .map_err(|e| unreachable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use pickup_interface::{Point3, UnitQuaternion};

    use super::*;

    #[test]
    fn test_config_default_timeout() {
        let config: WebIkSolverConfig = toml::from_str(r#"url = "http://127.0.0.1:7778""#).unwrap();
        assert_eq!(config.timeout_sec, 5.0);
        let solver = WebIkSolver::from_config(&config).unwrap();
        assert_eq!(solver.url.as_str(), "http://127.0.0.1:7778/solve_ik");
    }

    #[test]
    fn test_unreachable_service() {
        let port = portpicker::pick_unused_port().expect("No ports free");
        let solver = WebIkSolver::new(
            Url::parse(&format!("http://127.0.0.1:{port}")).unwrap(),
            Duration::from_millis(500),
        )
        .unwrap();
        let pose = RobotPose::overhead(Point3::new(0.5, 0.2, 0.1), UnitQuaternion::identity());
        let e = solver.solve(&pose).unwrap_err();
        assert!(matches!(e, Error::UnreachablePose { .. }));
    }
}

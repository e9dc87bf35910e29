use std::path::Path;

use pickup_client::{
    WebCompletionPublisherConfig, WebGripperConfig, WebIkSolverConfig, WebJointActuatorConfig,
    WebObjectFeedConfig,
};
use pickup_interface::Session;
use pickup_sequencer::{SequencerConfig, TerminationPolicy};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Error;

/// Simulated collaborators: every move completes at once and the objects
/// vanish from the scene once captured.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DummyBackendConfig {
    #[serde(default = "default_dummy_objects")]
    pub objects: Vec<[f64; 3]>,
    #[serde(default = "default_dummy_joint_names")]
    pub joint_names: Vec<String>,
    /// Targets farther than this from the origin have no IK solution.
    #[serde(default = "default_reach_m")]
    pub reach_m: f64,
    #[serde(default = "default_feed_rate_hz")]
    pub feed_rate_hz: f64,
}

impl Default for DummyBackendConfig {
    fn default() -> Self {
        Self {
            objects: default_dummy_objects(),
            joint_names: default_dummy_joint_names(),
            reach_m: default_reach_m(),
            feed_rate_hz: default_feed_rate_hz(),
        }
    }
}

fn default_dummy_objects() -> Vec<[f64; 3]> {
    vec![[0.7, 0.15, -0.129], [0.75, 0.3, -0.129]]
}

fn default_dummy_joint_names() -> Vec<String> {
    [
        "left_s0", "left_s1", "left_e0", "left_e1", "left_w0", "left_w1", "left_w2",
    ]
    .iter()
    .map(|name| name.to_string())
    .collect()
}

fn default_reach_m() -> f64 {
    1.2
}

fn default_feed_rate_hz() -> f64 {
    10.0
}

/// Robot server speaking JSON over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct WebBackendConfig {
    /// Joint, gripper and perception endpoints.
    pub base_url: String,
    /// IK service. Defaults to `base_url`.
    #[serde(default)]
    pub ik_url: Option<String>,
    /// Joints of the active limb. Empty means every joint of the robot.
    #[serde(default)]
    pub joint_names: Vec<String>,
    #[serde(default = "default_allowable_error")]
    pub allowable_error: f64,
    #[serde(default = "default_complete_timeout_sec")]
    pub complete_timeout_sec: f64,
    #[serde(default = "default_gripper_timeout_sec")]
    pub gripper_timeout_sec: f64,
    #[serde(default = "default_feed_rate_hz")]
    pub poll_rate_hz: f64,
    #[serde(default = "default_request_timeout_sec")]
    pub request_timeout_sec: f64,
}

fn default_allowable_error() -> f64 {
    0.02
}

fn default_complete_timeout_sec() -> f64 {
    10.0
}

fn default_gripper_timeout_sec() -> f64 {
    5.0
}

fn default_request_timeout_sec() -> f64 {
    5.0
}

impl WebBackendConfig {
    pub fn ik_solver_config(&self) -> WebIkSolverConfig {
        WebIkSolverConfig {
            url: self.ik_url.clone().unwrap_or_else(|| self.base_url.clone()),
            timeout_sec: self.request_timeout_sec,
        }
    }

    pub fn joint_actuator_config(&self) -> WebJointActuatorConfig {
        WebJointActuatorConfig {
            base_url: self.base_url.clone(),
            joint_names: self.joint_names.clone(),
            allowable_error: self.allowable_error,
            complete_timeout_sec: self.complete_timeout_sec,
            request_timeout_sec: self.request_timeout_sec,
        }
    }

    pub fn gripper_config(&self) -> WebGripperConfig {
        WebGripperConfig {
            base_url: self.base_url.clone(),
            complete_timeout_sec: self.gripper_timeout_sec,
            request_timeout_sec: self.request_timeout_sec,
        }
    }

    pub fn object_feed_config(&self) -> WebObjectFeedConfig {
        WebObjectFeedConfig {
            base_url: self.base_url.clone(),
            poll_rate_hz: self.poll_rate_hz,
            request_timeout_sec: self.request_timeout_sec,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", content = "args")]
#[serde(deny_unknown_fields)]
pub enum BackendConfig {
    Dummy(DummyBackendConfig),
    Web(WebBackendConfig),
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::Dummy(DummyBackendConfig::default())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", content = "args")]
#[serde(deny_unknown_fields)]
pub enum CompletionConfig {
    /// Writes the completion event to stdout.
    #[default]
    Print,
    Web(WebCompletionPublisherConfig),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PickupConfig {
    /// Wraps every collaborator with `pickup_tracing::Tracing`.
    #[serde(default)]
    pub trace_collaborators: bool,

    #[serde(default)]
    pub session: Option<Session>,
    #[serde(default)]
    pub sequencer: SequencerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
}

impl PickupConfig {
    pub fn try_new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::from_str(
            &std::fs::read_to_string(&path)
                .map_err(|e| Error::NoFile(path.as_ref().to_owned(), e))?,
            &path,
        )
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str<P: AsRef<Path>>(s: &str, path: P) -> Result<Self, Error> {
        let config: PickupConfig =
            toml::from_str(s).map_err(|e| Error::TomlParseFailure(path.as_ref().to_owned(), e))?;
        config.validate()?;
        debug!("{config:?}");
        Ok(config)
    }

    /// Rejects values the sequencer and the clients cannot run with.
    pub fn validate(&self) -> Result<(), Error> {
        let sequencer = &self.sequencer;
        let reporter = &sequencer.reporter;
        let mut non_negative = vec![
            ("sequencer.approach_clearance_m", sequencer.approach_clearance_m),
            ("sequencer.joint_move_duration_sec", sequencer.joint_move_duration_sec),
            ("sequencer.settle_interval_sec", sequencer.settle_interval_sec),
            ("sequencer.perception_timeout_sec", sequencer.perception_timeout_sec),
            ("sequencer.actuation_timeout_sec", sequencer.actuation_timeout_sec),
            ("sequencer.orientation_tolerance_rad", sequencer.orientation_tolerance_rad),
            ("sequencer.reporter.pre_publish_delay_sec", reporter.pre_publish_delay_sec),
            ("sequencer.reporter.post_publish_delay_sec", reporter.post_publish_delay_sec),
            ("sequencer.reporter.retry_interval_sec", reporter.retry_interval_sec),
        ];
        let mut positive = vec![];
        match &self.backend {
            BackendConfig::Dummy(dummy) => {
                non_negative.push(("backend.args.reach_m", dummy.reach_m));
                positive.push(("backend.args.feed_rate_hz", dummy.feed_rate_hz));
            }
            BackendConfig::Web(web) => {
                non_negative.extend([
                    ("backend.args.allowable_error", web.allowable_error),
                    ("backend.args.complete_timeout_sec", web.complete_timeout_sec),
                    ("backend.args.gripper_timeout_sec", web.gripper_timeout_sec),
                ]);
                positive.extend([
                    ("backend.args.poll_rate_hz", web.poll_rate_hz),
                    ("backend.args.request_timeout_sec", web.request_timeout_sec),
                ]);
            }
        }
        if let CompletionConfig::Web(web) = &self.completion {
            positive.push(("completion.args.request_timeout_sec", web.request_timeout_sec));
        }
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be a non-negative number: {value}"
                )));
            }
        }
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be a positive number: {value}"
                )));
            }
        }
        if let TerminationPolicy::PollUntilEmpty { max_passes: 0 } = sequencer.termination_policy {
            return Err(Error::InvalidConfig(
                "sequencer.termination_policy.max_passes must be at least 1".to_owned(),
            ));
        }
        if reporter.max_attempts == 0 {
            return Err(Error::InvalidConfig(
                "sequencer.reporter.max_attempts must be at least 1".to_owned(),
            ));
        }
        let norm = sequencer
            .overhead_orientation
            .iter()
            .map(|v| v * v)
            .sum::<f64>()
            .sqrt();
        if !norm.is_finite() || norm < 1e-6 {
            return Err(Error::InvalidConfig(format!(
                "sequencer.overhead_orientation is not a rotation: {:?}",
                sequencer.overhead_orientation
            )));
        }
        if sequencer.start_configuration.is_empty() || sequencer.disposal_configuration.is_empty()
        {
            return Err(Error::InvalidConfig(
                "sequencer.start_configuration and sequencer.disposal_configuration must not be empty"
                    .to_owned(),
            ));
        }
        Ok(())
    }

    /// Operator of the session: command line values take priority over
    /// `[session]`.
    pub fn resolve_session(
        &self,
        name: Option<String>,
        id: Option<String>,
    ) -> Result<Session, Error> {
        let name = name
            .or_else(|| self.session.as_ref().map(|s| s.name.clone()))
            .ok_or(Error::NoOperator("name"))?;
        let id = id
            .or_else(|| self.session.as_ref().map(|s| s.id.clone()))
            .ok_or(Error::NoOperator("id"))?;
        Ok(Session::new(name, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roundtrip() {
        let s = toml::to_string(&PickupConfig::default()).unwrap();
        let config = PickupConfig::from_str(&s, "default.toml").unwrap();
        assert!(matches!(config.backend, BackendConfig::Dummy(_)));
        assert!(matches!(config.completion, CompletionConfig::Print));
        assert!(config.session.is_none());
    }

    #[test]
    fn test_web_backend() {
        let config = PickupConfig::from_str(
            r#"
[session]
name = "Doe, Jane"
id = "42"

[sequencer.termination_policy]
type = "PollUntilEmpty"
max_passes = 3

[backend]
type = "Web"

[backend.args]
base_url = "http://127.0.0.1:7777"
ik_url = "http://127.0.0.1:7778"

[completion]
type = "Web"

[completion.args]
url = "http://127.0.0.1:7779/pickup_finished"
"#,
            "web.toml",
        )
        .unwrap();
        assert_eq!(
            config.sequencer.termination_policy,
            TerminationPolicy::PollUntilEmpty { max_passes: 3 }
        );
        let BackendConfig::Web(web) = &config.backend else {
            panic!("unexpected {:?}", config.backend);
        };
        assert_eq!(web.ik_solver_config().url, "http://127.0.0.1:7778");
        assert_eq!(web.gripper_config().base_url, "http://127.0.0.1:7777");
        assert!(web.joint_actuator_config().joint_names.is_empty());
        assert!(matches!(config.completion, CompletionConfig::Web(_)));
        assert_eq!(
            config.resolve_session(None, None).unwrap(),
            Session::new("Doe, Jane", "42")
        );
    }

    #[test]
    fn test_ik_url_defaults_to_base_url() {
        let web: WebBackendConfig = toml::from_str(r#"base_url = "http://robot:7777""#).unwrap();
        assert_eq!(web.ik_solver_config().url, "http://robot:7777");
    }

    #[test]
    fn test_resolve_session() {
        let config = PickupConfig {
            session: Some(Session::new("file", "1")),
            ..Default::default()
        };
        assert_eq!(
            config
                .resolve_session(Some("cli".to_owned()), None)
                .unwrap(),
            Session::new("cli", "1")
        );
        assert!(matches!(
            PickupConfig::default().resolve_session(Some("cli".to_owned()), None),
            Err(Error::NoOperator("id"))
        ));
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            PickupConfig::from_str("[sequencer]\nsettle_interval_sec = -1.0", "a.toml"),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            PickupConfig::from_str("unknown = 1", "a.toml"),
            Err(Error::TomlParseFailure(..))
        ));
    }

    fn assert_invalid(s: &str, field: &str) {
        match PickupConfig::from_str(s, "a.toml") {
            Err(Error::InvalidConfig(message)) => {
                assert!(message.contains(field), "{field:?} not in {message:?}")
            }
            other => panic!("{s:?} was accepted: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_reporter_delays() {
        for field in [
            "pre_publish_delay_sec",
            "post_publish_delay_sec",
            "retry_interval_sec",
        ] {
            assert_invalid(&format!("[sequencer.reporter]\n{field} = -1.0"), field);
        }
        assert_invalid("[sequencer.reporter]\nmax_attempts = 0", "max_attempts");
    }

    #[test]
    fn test_invalid_max_passes() {
        assert_invalid(
            "[sequencer.termination_policy]\ntype = \"PollUntilEmpty\"\nmax_passes = 0",
            "max_passes",
        );
        assert!(PickupConfig::from_str(
            "[sequencer.termination_policy]\ntype = \"PollUntilEmpty\"\nmax_passes = 1",
            "a.toml"
        )
        .is_ok());
    }

    #[test]
    fn test_invalid_web_backend_timeouts() {
        let web = |field: &str, value: f64| {
            format!(
                "[backend]\ntype = \"Web\"\n[backend.args]\nbase_url = \"http://127.0.0.1:7777\"\n{field} = {value:?}"
            )
        };
        for field in ["complete_timeout_sec", "gripper_timeout_sec", "allowable_error"] {
            assert_invalid(&web(field, -1.0), field);
        }
        for field in ["request_timeout_sec", "poll_rate_hz"] {
            assert_invalid(&web(field, 0.0), field);
        }
        assert!(PickupConfig::from_str(&web("request_timeout_sec", 0.5), "a.toml").is_ok());
    }

    #[test]
    fn test_invalid_completion_timeout() {
        assert_invalid(
            "[completion]\ntype = \"Web\"\n[completion.args]\nurl = \"http://127.0.0.1:7779\"\nrequest_timeout_sec = -1.0",
            "completion.args.request_timeout_sec",
        );
    }

    #[test]
    fn test_invalid_dummy_backend() {
        assert_invalid(
            "[backend]\ntype = \"Dummy\"\n[backend.args]\nfeed_rate_hz = 0.0",
            "feed_rate_hz",
        );
    }
}

use std::time::Duration;

use pickup_interface::JointConfiguration;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// What the sequencer does after draining one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum TerminationPolicy {
    /// Finish after draining one snapshot, without polling again.
    #[default]
    SinglePass,
    /// Poll again after every drained snapshot and finish on an empty one.
    /// Fails once `max_passes` snapshots were drained and objects remain.
    PollUntilEmpty { max_passes: usize },
}

/// What the sequencer does when the cycle of one object fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum ObjectFailurePolicy {
    /// Return to the start configuration and go on with the next object.
    #[default]
    SkipObject,
    /// Return to the start configuration and stop the run.
    AbortRun,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CompletionReporterConfig {
    /// Wait before publishing so that subscribers can connect.
    #[serde(default = "default_pre_publish_delay_sec")]
    pub pre_publish_delay_sec: f64,
    #[serde(default = "default_post_publish_delay_sec")]
    pub post_publish_delay_sec: f64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_retry_interval_sec")]
    pub retry_interval_sec: f64,
}

impl Default for CompletionReporterConfig {
    fn default() -> Self {
        Self {
            pre_publish_delay_sec: default_pre_publish_delay_sec(),
            post_publish_delay_sec: default_post_publish_delay_sec(),
            max_attempts: default_max_attempts(),
            retry_interval_sec: default_retry_interval_sec(),
        }
    }
}

impl CompletionReporterConfig {
    /// No delays, used by tests and simulations.
    pub fn immediate() -> Self {
        Self {
            pre_publish_delay_sec: 0.0,
            post_publish_delay_sec: 0.0,
            retry_interval_sec: 0.0,
            ..Default::default()
        }
    }
}

fn default_pre_publish_delay_sec() -> f64 {
    1.0
}

fn default_post_publish_delay_sec() -> f64 {
    0.5
}

fn default_max_attempts() -> usize {
    3
}

fn default_retry_interval_sec() -> f64 {
    0.5
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SequencerConfig {
    // Plain values first: TOML cannot emit a value after a table.
    /// Gripper orientation used for every target pose, `[x, y, z, w]`.
    #[serde(default = "default_overhead_orientation")]
    pub overhead_orientation: [f64; 4],
    #[serde(default = "default_orientation_tolerance_rad")]
    pub orientation_tolerance_rad: f64,
    /// Height of the approach pose above the object.
    #[serde(default = "default_approach_clearance_m")]
    pub approach_clearance_m: f64,
    #[serde(default = "default_joint_move_duration_sec")]
    pub joint_move_duration_sec: f64,
    /// Pause after releasing an object.
    #[serde(default = "default_settle_interval_sec")]
    pub settle_interval_sec: f64,
    #[serde(default = "default_perception_timeout_sec")]
    pub perception_timeout_sec: f64,
    /// Snapshot requests repeated after a perception timeout.
    #[serde(default = "default_perception_retries")]
    pub perception_retries: usize,
    #[serde(default = "default_actuation_timeout_sec")]
    pub actuation_timeout_sec: f64,
    #[serde(default)]
    pub object_failure_policy: ObjectFailurePolicy,

    #[serde(default)]
    pub termination_policy: TerminationPolicy,
    #[serde(default)]
    pub reporter: CompletionReporterConfig,
    #[serde(default = "default_start_configuration")]
    pub start_configuration: JointConfiguration,
    #[serde(default = "default_disposal_configuration")]
    pub disposal_configuration: JointConfiguration,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            overhead_orientation: default_overhead_orientation(),
            orientation_tolerance_rad: default_orientation_tolerance_rad(),
            approach_clearance_m: default_approach_clearance_m(),
            joint_move_duration_sec: default_joint_move_duration_sec(),
            settle_interval_sec: default_settle_interval_sec(),
            perception_timeout_sec: default_perception_timeout_sec(),
            perception_retries: default_perception_retries(),
            actuation_timeout_sec: default_actuation_timeout_sec(),
            object_failure_policy: Default::default(),
            termination_policy: Default::default(),
            reporter: Default::default(),
            start_configuration: default_start_configuration(),
            disposal_configuration: default_disposal_configuration(),
        }
    }
}

impl SequencerConfig {
    pub fn joint_move_duration(&self) -> Duration {
        Duration::from_secs_f64(self.joint_move_duration_sec)
    }

    pub fn settle_interval(&self) -> Duration {
        Duration::from_secs_f64(self.settle_interval_sec)
    }

    pub fn perception_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.perception_timeout_sec)
    }

    pub fn actuation_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.actuation_timeout_sec)
    }
}

fn default_overhead_orientation() -> [f64; 4] {
    [
        -0.0249590815779,
        0.999649402929,
        0.00737916180073,
        0.00486450832011,
    ]
}

fn default_orientation_tolerance_rad() -> f64 {
    0.01
}

fn default_approach_clearance_m() -> f64 {
    0.15
}

fn default_joint_move_duration_sec() -> f64 {
    3.0
}

fn default_settle_interval_sec() -> f64 {
    0.5
}

fn default_perception_timeout_sec() -> f64 {
    5.0
}

fn default_perception_retries() -> usize {
    3
}

fn default_actuation_timeout_sec() -> f64 {
    30.0
}

fn baxter_left_arm(positions: [f64; 7]) -> JointConfiguration {
    [
        "left_w0", "left_w1", "left_w2", "left_e0", "left_e1", "left_s0", "left_s1",
    ]
    .iter()
    .zip(positions)
    .map(|(name, position)| (name.to_string(), position))
    .collect()
}

fn default_start_configuration() -> JointConfiguration {
    baxter_left_arm([
        0.6699952259595108,
        1.030009435085784,
        -0.4999997247485215,
        -1.189968899785275,
        1.9400238130755056,
        -0.08000397926829805,
        -0.9999781166910306,
    ])
}

fn default_disposal_configuration() -> JointConfiguration {
    baxter_left_arm([
        0.3699952259595108,
        1.030009435085784,
        -0.999997247485215,
        -1.189968899785275,
        1.9400238130755056,
        1.78000397926829805,
        -0.9999781166910306,
    ])
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;

    #[test]
    fn test_default_roundtrip_toml() {
        let config = SequencerConfig::default();
        let s = toml::to_string(&config).unwrap();
        let config2: SequencerConfig = toml::from_str(&s).unwrap();
        assert_eq!(config.start_configuration, config2.start_configuration);
        assert_eq!(config.disposal_configuration, config2.disposal_configuration);
        assert_eq!(config2.termination_policy, TerminationPolicy::SinglePass);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: SequencerConfig = toml::from_str("").unwrap();
        assert_approx_eq!(config.approach_clearance_m, 0.15);
        assert_approx_eq!(config.settle_interval_sec, 0.5);
        assert_eq!(config.start_configuration.len(), 7);
        assert_approx_eq!(config.start_configuration.get("left_s0").unwrap(), -0.08000397926829805);
        assert_approx_eq!(
            config.disposal_configuration.get("left_s0").unwrap(),
            1.78000397926829805
        );
        assert_eq!(config.object_failure_policy, ObjectFailurePolicy::SkipObject);
        assert_approx_eq!(config.reporter.pre_publish_delay_sec, 1.0);
    }

    #[test]
    fn test_policies_from_toml() {
        let config: SequencerConfig = toml::from_str(
            r#"
object_failure_policy = "AbortRun"

[termination_policy]
type = "PollUntilEmpty"
max_passes = 4

[start_configuration]
j0 = 0.5
"#,
        )
        .unwrap();
        assert_eq!(config.object_failure_policy, ObjectFailurePolicy::AbortRun);
        assert_eq!(
            config.termination_policy,
            TerminationPolicy::PollUntilEmpty { max_passes: 4 }
        );
        assert_eq!(config.start_configuration.len(), 1);
        // not overwritten
        assert_eq!(config.disposal_configuration.len(), 7);
    }

    #[test]
    fn test_unknown_field() {
        assert!(toml::from_str::<SequencerConfig>("approach_clearance = 0.1").is_err());
    }
}

//! Deserialize tracing log in JSON format

use std::time::Duration;

use pickup_interface::{Error, GripperCommand, JointConfiguration, Point3};
use serde::Deserialize;

pub type Timestamp = chrono::DateTime<chrono::Utc>;

const TARGET: &str = "pickup_tracing";

/// Parses the lines written by the JSON formatter of `tracing-subscriber`.
///
/// Lines of other targets and methods without a log type are skipped.
pub fn from_str(lines: &str) -> Result<Vec<TracingLog>, Error> {
    let mut res = vec![];
    for line in lines.lines().filter(|line| !line.trim().is_empty()) {
        let value: serde_json::Value =
            serde_json::from_str(line).map_err(|e| Error::Other(e.into()))?;
        if !matches!(value.get("target"), Some(target) if target == TARGET) {
            continue;
        }
        let Some(method) = value
            .get("fields")
            .and_then(|fields| fields.get("method"))
            .and_then(|method| method.as_str())
        else {
            continue;
        };
        let log = match method {
            "pickup_interface::PoseSolver::solve" => TracingLog::Solve(parse(value)?),
            "pickup_interface::JointActuator::send_joint_configuration" => {
                TracingLog::SendJointConfiguration(parse(value)?)
            }
            "pickup_interface::Gripper::set_gripper" => TracingLog::SetGripper(parse(value)?),
            "pickup_interface::CompletionPublisher::publish" => TracingLog::Publish(parse(value)?),
            _ => continue,
        };
        res.push(log);
    }
    Ok(res)
}

fn parse<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T, Error> {
    serde_json::from_value(value).map_err(|e| Error::Other(e.into()))
}

#[derive(Debug)]
#[non_exhaustive]
pub enum TracingLog {
    /// [`pickup_interface::PoseSolver::solve`]
    Solve(SolveLog),
    /// [`pickup_interface::JointActuator::send_joint_configuration`]
    SendJointConfiguration(SendJointConfigurationLog),
    /// [`pickup_interface::Gripper::set_gripper`]
    SetGripper(SetGripperLog),
    /// [`pickup_interface::CompletionPublisher::publish`]
    Publish(PublishLog),
}

impl TracingLog {
    pub fn timestamp(&self) -> Timestamp {
        match self {
            Self::Solve(log) => log.timestamp,
            Self::SendJointConfiguration(log) => log.timestamp,
            Self::SetGripper(log) => log.timestamp,
            Self::Publish(log) => log.timestamp,
        }
    }
}

#[derive(Deserialize)]
struct RawTracingLog<Fields> {
    timestamp: Timestamp,
    fields: Fields,
}

#[derive(Debug)]
#[non_exhaustive]
pub struct SolveLog {
    pub timestamp: Timestamp,
    pub position: Point3<f64>,
}

impl<'de> Deserialize<'de> for SolveLog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Fields {
            x: f64,
            y: f64,
            z: f64,
        }
        let v = RawTracingLog::<Fields>::deserialize(deserializer)?;
        Ok(Self {
            timestamp: v.timestamp,
            position: Point3::new(v.fields.x, v.fields.y, v.fields.z),
        })
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub struct SendJointConfigurationLog {
    pub timestamp: Timestamp,
    pub target: JointConfiguration,
    pub duration: Duration,
}

impl<'de> Deserialize<'de> for SendJointConfigurationLog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Fields {
            // JSON text of the configuration
            target: String,
            duration_sec: f64,
        }
        let v = RawTracingLog::<Fields>::deserialize(deserializer)?;
        let target = serde_json::from_str(&v.fields.target).map_err(serde::de::Error::custom)?;
        let duration =
            Duration::try_from_secs_f64(v.fields.duration_sec).map_err(serde::de::Error::custom)?;
        Ok(Self {
            timestamp: v.timestamp,
            target,
            duration,
        })
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub struct SetGripperLog {
    pub timestamp: Timestamp,
    pub command: GripperCommand,
}

impl<'de> Deserialize<'de> for SetGripperLog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Fields {
            open: bool,
        }
        let v = RawTracingLog::<Fields>::deserialize(deserializer)?;
        Ok(Self {
            timestamp: v.timestamp,
            command: if v.fields.open {
                GripperCommand::Open
            } else {
                GripperCommand::Close
            },
        })
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub struct PublishLog {
    pub timestamp: Timestamp,
    pub message: String,
}

impl<'de> Deserialize<'de> for PublishLog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Fields {
            message: String,
        }
        let v = RawTracingLog::<Fields>::deserialize(deserializer)?;
        Ok(Self {
            timestamp: v.timestamp,
            message: v.fields.message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        let lines = r#"
{"timestamp":"2024-05-01T10:00:00.000000Z","level":"INFO","fields":{"message":"start"},"target":"pickup_sequencer::motion_sequencer"}
{"timestamp":"2024-05-01T10:00:01.000000Z","level":"TRACE","fields":{"method":"pickup_interface::PoseSolver::solve","x":0.5,"y":0.2,"z":0.25},"target":"pickup_tracing"}
{"timestamp":"2024-05-01T10:00:02.000000Z","level":"TRACE","fields":{"method":"pickup_interface::JointActuator::send_joint_configuration","target":"{\"left_s0\":0.5}","duration_sec":3.0},"target":"pickup_tracing"}
{"timestamp":"2024-05-01T10:00:03.000000Z","level":"TRACE","fields":{"method":"pickup_interface::JointActuator::joint_names","names":"[\"left_s0\"]"},"target":"pickup_tracing"}
{"timestamp":"2024-05-01T10:00:04.000000Z","level":"TRACE","fields":{"method":"pickup_interface::Gripper::set_gripper","open":false},"target":"pickup_tracing"}
{"timestamp":"2024-05-01T10:00:05.000000Z","level":"TRACE","fields":{"method":"pickup_interface::CompletionPublisher::publish","message":"42:Doe, Jane"},"target":"pickup_tracing"}
"#;
        let logs = from_str(lines).unwrap();
        assert_eq!(logs.len(), 4);
        match &logs[0] {
            TracingLog::Solve(log) => assert_eq!(log.position, Point3::new(0.5, 0.2, 0.25)),
            log => panic!("unexpected {log:?}"),
        }
        match &logs[1] {
            TracingLog::SendJointConfiguration(log) => {
                assert_eq!(log.target.get("left_s0"), Some(0.5));
                assert_eq!(log.duration, Duration::from_secs(3));
            }
            log => panic!("unexpected {log:?}"),
        }
        match &logs[2] {
            TracingLog::SetGripper(log) => assert_eq!(log.command, GripperCommand::Close),
            log => panic!("unexpected {log:?}"),
        }
        match &logs[3] {
            TracingLog::Publish(log) => assert_eq!(log.message, "42:Doe, Jane"),
            log => panic!("unexpected {log:?}"),
        }
        assert!(logs[0].timestamp() < logs[3].timestamp());
    }

    #[test]
    fn test_invalid_line() {
        assert!(from_str("not json").is_err());
    }
}

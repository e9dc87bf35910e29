use std::{collections::BTreeMap, fmt, time::Instant};

use nalgebra::{Isometry3, Point3, Quaternion, Translation3, UnitQuaternion};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Frame every target pose is expressed in.
pub const BASE_FRAME_ID: &str = "base";

/// Builds a unit quaternion from `[x, y, z, w]` components.
///
/// The input is normalized, so hand-written values with a few digits of
/// precision are accepted.
pub fn quaternion_from_xyzw(q: &[f64; 4]) -> UnitQuaternion<f64> {
    UnitQuaternion::from_quaternion(Quaternion::new(q[3], q[0], q[1], q[2]))
}

/// Returns `[x, y, z, w]` components of the quaternion.
pub fn quaternion_to_xyzw(q: &UnitQuaternion<f64>) -> [f64; 4] {
    [q.i, q.j, q.k, q.w]
}

/// Target pose of the end effector in the [`BASE_FRAME_ID`] frame.
///
/// Only the position varies during a session. The orientation is always the
/// session's overhead orientation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RobotPose {
    pub position: Point3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl RobotPose {
    pub fn overhead(position: Point3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Returns a copy of this pose moved up by `clearance` along z.
    pub fn raised(&self, clearance: f64) -> Self {
        let mut position = self.position;
        position.z += clearance;
        Self {
            position,
            orientation: self.orientation,
        }
    }

    pub fn frame_id(&self) -> &'static str {
        BASE_FRAME_ID
    }

    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.position.coords), self.orientation)
    }
}

/// Joint name to target angle (rad).
///
/// A configuration may name every joint of the limb or only a subset of them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JointConfiguration(BTreeMap<String, f64>);

impl JointConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names_and_positions(
        names: Vec<String>,
        positions: Vec<f64>,
    ) -> Result<Self, Error> {
        if names.len() != positions.len() {
            return Err(Error::LengthMismatch {
                model: names.len(),
                input: positions.len(),
            });
        }
        Ok(names.into_iter().zip(positions).collect())
    }

    pub fn insert(&mut self, name: impl Into<String>, position: f64) -> Option<f64> {
        self.0.insert(name.into(), position)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    pub fn positions(&self) -> Vec<f64> {
        self.0.values().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.0.iter().map(|(name, position)| (name.as_str(), *position))
    }

    /// Writes the positions of the joints named in this configuration into
    /// `full_positions`, the current state of the limb ordered as
    /// `full_names`. Joints not named here keep their value.
    ///
    /// Fails if this configuration names a joint the limb does not have.
    pub fn merge_into(
        &self,
        full_names: &[String],
        full_positions: &mut [f64],
    ) -> Result<(), Error> {
        if full_names.len() != full_positions.len() {
            return Err(Error::LengthMismatch {
                model: full_names.len(),
                input: full_positions.len(),
            });
        }
        for (name, position) in &self.0 {
            let index = full_names
                .iter()
                .position(|full_name| full_name == name)
                .ok_or_else(|| Error::NoJoint(name.to_owned()))?;
            full_positions[index] = *position;
        }
        Ok(())
    }
}

impl FromIterator<(String, f64)> for JointConfiguration {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, f64>> for JointConfiguration {
    fn from(map: BTreeMap<String, f64>) -> Self {
        Self(map)
    }
}

/// Object positions captured from one perception update.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectSnapshot {
    objects: Vec<Point3<f64>>,
    captured_at: Instant,
}

impl ObjectSnapshot {
    pub fn new(objects: Vec<Point3<f64>>) -> Self {
        Self {
            objects,
            captured_at: Instant::now(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn objects(&self) -> &[Point3<f64>] {
        &self.objects
    }

    pub fn into_objects(self) -> Vec<Point3<f64>> {
        self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }
}

/// Operator running the session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Session {
    pub name: String,
    pub id: String,
}

impl Session {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }

    /// Payload of the completion event: `"<id>:<name>"`.
    pub fn completion_message(&self) -> String {
        format!("{}:{}", self.id, self.name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum GripperCommand {
    Open,
    Close,
}

impl GripperCommand {
    pub fn is_open(self) -> bool {
        matches!(self, GripperCommand::Open)
    }
}

impl fmt::Display for GripperCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GripperCommand::Open => write!(f, "open"),
            GripperCommand::Close => write!(f, "close"),
        }
    }
}

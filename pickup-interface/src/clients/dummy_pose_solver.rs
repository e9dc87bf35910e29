use std::sync::Mutex;

use nalgebra::Point3;

use crate::{
    error::Error,
    traits::PoseSolver,
    types::{JointConfiguration, RobotPose},
};

/// Dummy PoseSolver for debug or tests.
///
/// This is not kinematics: the solution maps the target coordinates onto the
/// joints in turn (`x`, `y`, `z`, `x`, ...). Targets farther than `reach` from
/// the origin, or registered with [`DummyPoseSolver::fail_at`], are
/// unreachable.
#[derive(Debug)]
pub struct DummyPoseSolver {
    joint_names: Vec<String>,
    reach: f64,
    unreachable: Vec<Point3<f64>>,
    requests: Mutex<Vec<RobotPose>>,
}

impl DummyPoseSolver {
    pub fn new(joint_names: Vec<String>) -> Self {
        Self {
            joint_names,
            reach: f64::INFINITY,
            unreachable: Vec::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_reach(mut self, reach: f64) -> Self {
        self.reach = reach;
        self
    }

    pub fn fail_at(mut self, position: Point3<f64>) -> Self {
        self.unreachable.push(position);
        self
    }

    /// Returns every pose passed to [`PoseSolver::solve`] so far.
    pub fn requests(&self) -> Vec<RobotPose> {
        self.requests.lock().unwrap().clone()
    }
}

impl PoseSolver for DummyPoseSolver {
    fn solve(&self, target: &RobotPose) -> Result<JointConfiguration, Error> {
        self.requests.lock().unwrap().push(*target);
        let position = target.position;
        if position.coords.norm() > self.reach {
            return Err(Error::UnreachablePose {
                position,
                reason: format!("out of reach ({})", self.reach),
            });
        }
        if self
            .unreachable
            .iter()
            .any(|p| (p - position).norm() < 1e-9)
        {
            return Err(Error::UnreachablePose {
                position,
                reason: "no solution".to_owned(),
            });
        }
        Ok(self
            .joint_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), position[i % 3]))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use nalgebra::UnitQuaternion;

    use super::*;

    fn pose(x: f64, y: f64, z: f64) -> RobotPose {
        RobotPose::overhead(Point3::new(x, y, z), UnitQuaternion::identity())
    }

    #[test]
    fn test_solve() {
        let solver = DummyPoseSolver::new(vec!["a".to_owned(), "b".to_owned(), "c".to_owned()]);
        let config = solver.solve(&pose(0.5, 0.2, 0.1)).unwrap();
        assert_eq!(config.len(), 3);
        assert_approx_eq!(config.get("a").unwrap(), 0.5);
        assert_approx_eq!(config.get("b").unwrap(), 0.2);
        assert_approx_eq!(config.get("c").unwrap(), 0.1);
        assert_eq!(solver.requests().len(), 1);
    }

    #[test]
    fn test_unreachable() {
        let solver = DummyPoseSolver::new(vec!["a".to_owned()])
            .with_reach(1.0)
            .fail_at(Point3::new(0.3, 0.3, 0.0));
        assert!(matches!(
            solver.solve(&pose(2.0, 0.0, 0.0)),
            Err(Error::UnreachablePose { .. })
        ));
        assert!(matches!(
            solver.solve(&pose(0.3, 0.3, 0.0)),
            Err(Error::UnreachablePose { .. })
        ));
        assert!(solver.solve(&pose(0.3, 0.3, 0.1)).is_ok());
        assert_eq!(solver.requests().len(), 3);
    }
}

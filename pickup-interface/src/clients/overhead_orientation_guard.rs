use nalgebra::UnitQuaternion;
use tracing::debug;

use crate::{
    error::Error,
    traits::PoseSolver,
    types::{JointConfiguration, RobotPose},
};

/// Rejects target poses whose orientation is not the overhead orientation
/// before they reach the wrapped solver.
#[derive(Debug)]
pub struct OverheadOrientationGuard<S>
where
    S: PoseSolver,
{
    solver: S,
    orientation: UnitQuaternion<f64>,
    tolerance_rad: f64,
}

impl<S> OverheadOrientationGuard<S>
where
    S: PoseSolver,
{
    pub fn new(solver: S, orientation: UnitQuaternion<f64>, tolerance_rad: f64) -> Self {
        Self {
            solver,
            orientation,
            tolerance_rad,
        }
    }

    pub fn orientation(&self) -> &UnitQuaternion<f64> {
        &self.orientation
    }

    pub fn inner(&self) -> &S {
        &self.solver
    }
}

impl<S> PoseSolver for OverheadOrientationGuard<S>
where
    S: PoseSolver,
{
    fn solve(&self, target: &RobotPose) -> Result<JointConfiguration, Error> {
        let angle = target.orientation.angle_to(&self.orientation);
        if angle > self.tolerance_rad {
            debug!(angle, tolerance = self.tolerance_rad, "reject target pose");
            return Err(Error::OrientationMismatch {
                angle,
                tolerance: self.tolerance_rad,
            });
        }
        self.solver.solve(target)
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Point3;

    use super::*;
    use crate::DummyPoseSolver;

    #[test]
    fn test_guard() {
        let overhead = UnitQuaternion::from_euler_angles(std::f64::consts::PI, 0.0, 0.0);
        let solver = DummyPoseSolver::new(vec!["j0".to_owned(), "j1".to_owned(), "j2".to_owned()]);
        let guard = OverheadOrientationGuard::new(&solver, overhead, 1e-3);

        let ok = RobotPose::overhead(Point3::new(0.5, 0.2, 0.1), overhead);
        assert!(guard.solve(&ok).is_ok());

        let tilted = RobotPose::overhead(
            Point3::new(0.5, 0.2, 0.1),
            UnitQuaternion::from_euler_angles(std::f64::consts::PI, 0.3, 0.0),
        );
        assert!(matches!(
            guard.solve(&tilted),
            Err(Error::OrientationMismatch { .. })
        ));
        // the rejected pose never reached the solver
        assert_eq!(solver.requests().len(), 1);
    }
}

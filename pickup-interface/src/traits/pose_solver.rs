use auto_impl::auto_impl;

use crate::{
    error::Error,
    types::{JointConfiguration, RobotPose},
};

#[auto_impl(&, Box, Arc)]
pub trait PoseSolver: Send + Sync {
    /// Computes the joint configuration that brings the end effector to
    /// `target`.
    ///
    /// Issues exactly one request to the solver per call and never retries.
    /// Returns [`Error::UnreachablePose`] if no solution exists or the solver
    /// cannot be reached.
    fn solve(&self, target: &RobotPose) -> Result<JointConfiguration, Error>;
}

use auto_impl::auto_impl;

use crate::{error::Error, types::GripperCommand, waits::WaitFuture};

#[auto_impl(&, Box, Arc)]
pub trait Gripper: Send + Sync {
    /// Starts opening or closing the gripper and returns a future that waits
    /// until the gripper reports the terminal state.
    ///
    /// # Implementation
    ///
    /// See the "Implementation" section of
    /// [`JointActuator::send_joint_configuration`](crate::JointActuator::send_joint_configuration).
    fn set_gripper(&self, command: GripperCommand) -> Result<WaitFuture, Error>;
}

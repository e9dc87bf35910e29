use std::time::Duration;

use auto_impl::auto_impl;

use crate::{error::Error, types::JointConfiguration, waits::WaitFuture};

#[auto_impl(&, Box, Arc)]
pub trait JointActuator: Send + Sync {
    /// Returns names of joints that this actuator handles.
    fn joint_names(&self) -> Vec<String>;

    /// Returns the current position of every handled joint.
    fn current_joint_configuration(&self) -> Result<JointConfiguration, Error>;

    /// Sends the target configuration and returns a future that waits until
    /// the arm reaches it.
    ///
    /// `target` may name only a subset of the joints; the others keep their
    /// current position.
    ///
    /// # Implementation
    ///
    /// The returned future is expected to behave similarly to
    /// [`std::thread::JoinHandle`] and [`tokio::task::JoinHandle`]:
    ///
    /// - Can wait for the operation to complete by `.await`.
    /// - The operation does not end even if it is dropped.
    ///
    /// A fault while moving must resolve the future to
    /// [`Error::ActuationFault`].
    fn send_joint_configuration(
        &self,
        target: &JointConfiguration,
        duration: Duration,
    ) -> Result<WaitFuture, Error>;
}

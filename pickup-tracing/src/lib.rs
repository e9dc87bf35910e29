#![doc = include_str!("../README.md")]

pub mod de;

use std::time::Duration;

use pickup_interface::{
    CompletionPublisher, Error, Gripper, GripperCommand, JointActuator, JointConfiguration,
    PoseSolver, RobotPose, WaitFuture,
};
use tracing::trace;

#[derive(Debug)]
pub struct Tracing<T>(T);

impl<T> Tracing<T> {
    pub fn new(v: T) -> Self {
        Self(v)
    }

    pub fn get_ref(&self) -> &T {
        &self.0
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> From<T> for Tracing<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: PoseSolver> PoseSolver for Tracing<T> {
    fn solve(&self, target: &RobotPose) -> Result<JointConfiguration, Error> {
        trace!(
            method = "pickup_interface::PoseSolver::solve",
            x = target.position.x,
            y = target.position.y,
            z = target.position.z,
        );
        self.0.solve(target)
    }
}

impl<T: JointActuator> JointActuator for Tracing<T> {
    fn joint_names(&self) -> Vec<String> {
        let names = self.0.joint_names();
        trace!(method = "pickup_interface::JointActuator::joint_names", ?names);
        names
    }

    fn current_joint_configuration(&self) -> Result<JointConfiguration, Error> {
        let configuration = self.0.current_joint_configuration()?;
        trace!(
            method = "pickup_interface::JointActuator::current_joint_configuration",
            ?configuration
        );
        Ok(configuration)
    }

    fn send_joint_configuration(
        &self,
        target: &JointConfiguration,
        duration: Duration,
    ) -> Result<WaitFuture, Error> {
        trace!(
            method = "pickup_interface::JointActuator::send_joint_configuration",
            target = %serde_json::to_string(target).unwrap_or_default(),
            duration_sec = duration.as_secs_f64(),
        );
        self.0.send_joint_configuration(target, duration)
    }
}

impl<T: Gripper> Gripper for Tracing<T> {
    fn set_gripper(&self, command: GripperCommand) -> Result<WaitFuture, Error> {
        trace!(
            method = "pickup_interface::Gripper::set_gripper",
            open = command.is_open()
        );
        self.0.set_gripper(command)
    }
}

impl<T: CompletionPublisher> CompletionPublisher for Tracing<T> {
    fn publish(&self, message: &str) -> Result<WaitFuture, Error> {
        trace!(
            method = "pickup_interface::CompletionPublisher::publish",
            message
        );
        self.0.publish(message)
    }
}

#[cfg(test)]
mod tests {
    use pickup_interface::{
        DummyCompletionPublisher, DummyGripper, DummyJointActuator, DummyPoseSolver, Point3,
        UnitQuaternion,
    };

    use super::*;

    #[tokio::test]
    async fn test_forwarding() {
        let solver = Tracing::new(DummyPoseSolver::new(vec!["j0".to_owned()]));
        let pose = RobotPose::overhead(Point3::new(0.5, 0.2, 0.1), UnitQuaternion::identity());
        assert_eq!(solver.solve(&pose).unwrap().len(), 1);
        assert_eq!(solver.get_ref().requests().len(), 1);

        let gripper: Tracing<_> = DummyGripper::new().into();
        gripper
            .set_gripper(GripperCommand::Close)
            .unwrap()
            .await
            .unwrap();
        assert!(!gripper.get_ref().is_open());

        let publisher = Tracing::new(DummyCompletionPublisher::new());
        publisher.publish("1:a").unwrap().await.unwrap();
        assert_eq!(publisher.into_inner().published_messages(), vec!["1:a"]);

        let joints = Tracing::new(DummyJointActuator::new(vec!["j0".to_owned()]));
        assert_eq!(joints.joint_names(), vec!["j0"]);
        let target: JointConfiguration = [("j0".to_owned(), 1.0)].into_iter().collect();
        joints
            .send_joint_configuration(&target, Duration::from_secs(1))
            .unwrap()
            .await
            .unwrap();
        assert_eq!(joints.current_joint_configuration().unwrap(), target);
    }
}

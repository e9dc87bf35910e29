mod dummy_completion_publisher;
mod dummy_gripper;
mod dummy_joint_actuator;
mod dummy_pose_solver;
mod overhead_orientation_guard;

pub use dummy_completion_publisher::*;
pub use dummy_gripper::*;
pub use dummy_joint_actuator::*;
pub use dummy_pose_solver::*;
pub use overhead_orientation_guard::*;

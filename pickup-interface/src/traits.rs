mod completion_publisher;
mod gripper;
mod joint_actuator;
mod pose_solver;

pub use completion_publisher::*;
pub use gripper::*;
pub use joint_actuator::*;
pub use pose_solver::*;

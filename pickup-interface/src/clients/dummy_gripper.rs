use std::sync::Mutex;

use crate::{error::Error, traits::Gripper, types::GripperCommand, waits::WaitFuture};

/// Dummy Gripper for debug or tests.
#[derive(Debug, Default)]
pub struct DummyGripper {
    commands: Mutex<Vec<GripperCommand>>,
}

impl DummyGripper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<GripperCommand> {
        self.commands.lock().unwrap().clone()
    }

    /// The gripper starts open.
    pub fn is_open(&self) -> bool {
        self.commands
            .lock()
            .unwrap()
            .last()
            .map_or(true, |c| c.is_open())
    }
}

impl Gripper for DummyGripper {
    fn set_gripper(&self, command: GripperCommand) -> Result<WaitFuture, Error> {
        self.commands.lock().unwrap().push(command);
        Ok(WaitFuture::ready())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set() {
        let gripper = DummyGripper::new();
        assert!(gripper.is_open());
        gripper
            .set_gripper(GripperCommand::Close)
            .unwrap()
            .await
            .unwrap();
        assert!(!gripper.is_open());
        gripper
            .set_gripper(GripperCommand::Open)
            .unwrap()
            .await
            .unwrap();
        assert_eq!(
            gripper.commands(),
            vec![GripperCommand::Close, GripperCommand::Open]
        );
    }
}

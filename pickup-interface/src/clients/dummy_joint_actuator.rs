use std::{sync::Mutex, time::Duration};

use crate::{
    error::Error, traits::JointActuator, types::JointConfiguration, waits::WaitFuture,
};

/// Dummy JointActuator for debug or tests
///
/// Every target is reached immediately.
#[derive(Debug)]
pub struct DummyJointActuator {
    joint_names: Vec<String>,
    positions: Mutex<Vec<f64>>,
    history: Mutex<Vec<JointConfiguration>>,
}

impl DummyJointActuator {
    pub fn new(joint_names: Vec<String>) -> Self {
        let dof = joint_names.len();
        Self {
            joint_names,
            positions: Mutex::new(vec![0.0; dof]),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Returns every target sent so far, as given by the caller.
    pub fn history(&self) -> Vec<JointConfiguration> {
        self.history.lock().unwrap().clone()
    }
}

impl JointActuator for DummyJointActuator {
    fn joint_names(&self) -> Vec<String> {
        self.joint_names.clone()
    }

    fn current_joint_configuration(&self) -> Result<JointConfiguration, Error> {
        JointConfiguration::from_names_and_positions(
            self.joint_names.clone(),
            self.positions.lock().unwrap().clone(),
        )
    }

    fn send_joint_configuration(
        &self,
        target: &JointConfiguration,
        _duration: Duration,
    ) -> Result<WaitFuture, Error> {
        let mut positions = self.positions.lock().unwrap();
        let mut next = positions.clone();
        target.merge_into(&self.joint_names, &mut next)?;
        *positions = next;
        self.history.lock().unwrap().push(target.clone());
        Ok(WaitFuture::ready())
    }
}

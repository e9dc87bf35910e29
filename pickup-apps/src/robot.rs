use std::{sync::Arc, time::Duration};

use pickup_client::{
    PrintCompletionPublisher, WebCompletionPublisher, WebGripper, WebIkSolver, WebJointActuator,
    WebObjectFeed,
};
use pickup_interface::{
    CompletionPublisher, DummyGripper, DummyJointActuator, DummyPoseSolver, Gripper,
    JointActuator, Point3, PoseSolver,
};
use pickup_sequencer::{MotionSequencer, PerceptionGate};
use pickup_tracing::Tracing;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::{BackendConfig, CompletionConfig, DummyBackendConfig, Error, PickupConfig};

pub type ArcPoseSolver = Arc<dyn PoseSolver>;
pub type ArcJointActuator = Arc<dyn JointActuator>;
pub type ArcGripper = Arc<dyn Gripper>;
pub type ArcCompletionPublisher = Arc<dyn CompletionPublisher>;

pub type PickupSequencer =
    MotionSequencer<ArcPoseSolver, ArcJointActuator, ArcGripper, ArcCompletionPublisher>;

/// Source of the perception feed. Dropping it stops the feed.
#[derive(Debug)]
pub enum ObjectFeed {
    Dummy(JoinHandle<()>),
    Web {
        feed: WebObjectFeed,
        forwarder: JoinHandle<()>,
    },
}

impl Drop for ObjectFeed {
    fn drop(&mut self) {
        match self {
            ObjectFeed::Dummy(task) => task.abort(),
            ObjectFeed::Web { forwarder, .. } => forwarder.abort(),
        }
    }
}

/// A sequencer wired to the collaborators of a [`PickupConfig`].
#[derive(Debug)]
pub struct Pickup {
    pub sequencer: PickupSequencer,
    pub feed: ObjectFeed,
}

macro_rules! wrap {
    ($ty:ty, $client:expr, $trace:expr) => {
        if $trace {
            Arc::new(Tracing::new($client)) as $ty
        } else {
            Arc::new($client) as $ty
        }
    };
}

impl PickupConfig {
    /// Creates the collaborators and starts the perception feed.
    ///
    /// Must be called within a tokio runtime.
    pub fn create_pickup(&self) -> Result<Pickup, Error> {
        let gate = Arc::new(PerceptionGate::new());
        let trace = self.trace_collaborators;
        let solver: ArcPoseSolver;
        let joints: ArcJointActuator;
        let gripper: ArcGripper;
        let feed = match &self.backend {
            BackendConfig::Dummy(config) => {
                info!(num_objects = config.objects.len(), "dummy backend");
                let dummy_solver =
                    DummyPoseSolver::new(config.joint_names.clone()).with_reach(config.reach_m);
                solver = wrap!(ArcPoseSolver, dummy_solver, trace);
                let dummy_joints = DummyJointActuator::new(self.dummy_joint_names(config));
                joints = wrap!(ArcJointActuator, dummy_joints, trace);
                gripper = wrap!(ArcGripper, DummyGripper::new(), trace);
                ObjectFeed::Dummy(spawn_dummy_feed(&gate, config)?)
            }
            BackendConfig::Web(config) => {
                info!(base_url = %config.base_url, "web backend");
                let web_solver = WebIkSolver::from_config(&config.ik_solver_config())?;
                solver = wrap!(ArcPoseSolver, web_solver, trace);
                let web_joints = WebJointActuator::try_new(&config.joint_actuator_config())?;
                joints = wrap!(ArcJointActuator, web_joints, trace);
                let web_gripper = WebGripper::try_new(&config.gripper_config())?;
                gripper = wrap!(ArcGripper, web_gripper, trace);
                let (feed, receiver) = WebObjectFeed::spawn(&config.object_feed_config())?;
                ObjectFeed::Web {
                    feed,
                    forwarder: gate.attach(receiver),
                }
            }
        };
        let publisher = match &self.completion {
            CompletionConfig::Print => {
                wrap!(ArcCompletionPublisher, PrintCompletionPublisher::new(), trace)
            }
            CompletionConfig::Web(config) => wrap!(
                ArcCompletionPublisher,
                WebCompletionPublisher::try_new(config)?,
                trace
            ),
        };
        let sequencer = MotionSequencer::new(
            self.sequencer.clone(),
            solver,
            joints,
            gripper,
            gate,
            publisher,
        );
        debug!(?sequencer, "created");
        Ok(Pickup { sequencer, feed })
    }

    /// The dummy limb also carries the joints named by the start and
    /// disposal configurations.
    fn dummy_joint_names(&self, config: &DummyBackendConfig) -> Vec<String> {
        let mut names = config.joint_names.clone();
        for name in self
            .sequencer
            .start_configuration
            .names()
            .into_iter()
            .chain(self.sequencer.disposal_configuration.names())
        {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

/// Publishes the remaining objects of the dummy scene. Captured objects are
/// removed from the scene.
fn spawn_dummy_feed(
    gate: &Arc<PerceptionGate>,
    config: &DummyBackendConfig,
) -> Result<JoinHandle<()>, Error> {
    if !config.feed_rate_hz.is_finite() || config.feed_rate_hz <= 0.0 {
        return Err(Error::InvalidConfig(format!(
            "backend.args.feed_rate_hz must be positive: {}",
            config.feed_rate_hz
        )));
    }
    let period = Duration::from_secs_f64(1.0 / config.feed_rate_hz);
    let mut scene: Vec<Point3<f64>> = config
        .objects
        .iter()
        .map(|&[x, y, z]| Point3::new(x, y, z))
        .collect();
    let gate = gate.clone();
    Ok(tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            if gate.on_feed_update(scene.clone()) {
                debug!(num_objects = scene.len(), "dummy scene captured");
                scene.clear();
            }
        }
    }))
}

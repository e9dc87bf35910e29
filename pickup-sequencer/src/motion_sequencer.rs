use std::{
    future::Future,
    sync::{Arc, Mutex, PoisonError},
};

use pickup_interface::{
    quaternion_from_xyzw, CompletionPublisher, Error, Gripper, GripperCommand,
    JointActuator, JointConfiguration, ObjectSnapshot, OverheadOrientationGuard, Point3,
    PoseSolver, RobotPose, Session, UnitQuaternion,
};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::{
    CompletionReporter, ObjectFailurePolicy, PerceptionGate, SequencerConfig, TerminationPolicy,
};

/// Phase of the per-object sub-sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Start configuration, approach pose above the object, gripper opened.
    Approach,
    Descend,
    Grasp,
    /// Back to the start configuration with the object.
    Retreat,
    Dispose,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Polling,
    Draining,
    PerObject(Step),
    Finished,
    /// The run stopped with an error.
    Aborted,
}

/// Result of the cycle of one object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectOutcome {
    pub position: Point3<f64>,
    /// Message of the error that ended the cycle early.
    pub error: Option<String>,
}

impl ObjectOutcome {
    pub fn is_disposed(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Number of captured snapshots.
    pub polls: usize,
    /// One entry per visited object, in visiting order.
    pub objects: Vec<ObjectOutcome>,
}

impl RunReport {
    pub fn num_disposed(&self) -> usize {
        self.objects.iter().filter(|o| o.is_disposed()).count()
    }
}

/// Cancels a running [`MotionSequencer::run`] at its next suspension point.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    fn new() -> Self {
        Self {
            sender: Arc::new(watch::Sender::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_canceled(&self) -> bool {
        *self.sender.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}

pub struct MotionSequencer<P, J, G, C>
where
    P: PoseSolver,
    J: JointActuator,
    G: Gripper,
    C: CompletionPublisher,
{
    config: SequencerConfig,
    orientation: UnitQuaternion<f64>,
    solver: Arc<OverheadOrientationGuard<P>>,
    joints: J,
    gripper: G,
    gate: Arc<PerceptionGate>,
    reporter: CompletionReporter<C>,
    state: Mutex<SequencerState>,
    cancel: CancelHandle,
}

impl<P, J, G, C> std::fmt::Debug for MotionSequencer<P, J, G, C>
where
    P: PoseSolver + 'static,
    J: JointActuator,
    G: Gripper,
    C: CompletionPublisher,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionSequencer")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl<P, J, G, C> MotionSequencer<P, J, G, C>
where
    P: PoseSolver + 'static,
    J: JointActuator,
    G: Gripper,
    C: CompletionPublisher,
{
    pub fn new(
        config: SequencerConfig,
        solver: P,
        joints: J,
        gripper: G,
        gate: Arc<PerceptionGate>,
        publisher: C,
    ) -> Self {
        let orientation = quaternion_from_xyzw(&config.overhead_orientation);
        let solver = Arc::new(OverheadOrientationGuard::new(
            solver,
            orientation,
            config.orientation_tolerance_rad,
        ));
        let reporter = CompletionReporter::new(publisher, config.reporter.clone());
        Self {
            config,
            orientation,
            solver,
            joints,
            gripper,
            gate,
            reporter,
            state: Mutex::new(SequencerState::Polling),
            cancel: CancelHandle::new(),
        }
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    pub fn gate(&self) -> &Arc<PerceptionGate> {
        &self.gate
    }

    pub fn state(&self) -> SequencerState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: SequencerState) {
        debug!(?state, "transition");
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Disposes every detected object, then publishes the completion event
    /// of `session`.
    ///
    /// Objects whose cycle fails are skipped or abort the run according to
    /// [`ObjectFailurePolicy`]. No completion event is published if the run
    /// fails.
    pub async fn run(&self, session: &Session) -> Result<RunReport, Error> {
        info!(operator = %session.name, id = %session.id, "start");
        let mut report = RunReport::default();
        let result = match self.drain_until_finished(&mut report).await {
            Ok(()) => {
                self.set_state(SequencerState::Finished);
                self.cancelable(self.reporter.report(session)).await
            }
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {
                info!(
                    polls = report.polls,
                    disposed = report.num_disposed(),
                    visited = report.objects.len(),
                    "run finished"
                );
                Ok(report)
            }
            Err(e) => {
                error!("run aborted: {e}");
                self.set_state(SequencerState::Aborted);
                Err(e)
            }
        }
    }

    async fn drain_until_finished(&self, report: &mut RunReport) -> Result<(), Error> {
        let mut drained = 0;
        loop {
            self.set_state(SequencerState::Polling);
            let snapshot = self.poll_snapshot().await?;
            report.polls += 1;
            if snapshot.is_empty() {
                info!("no objects detected");
                return Ok(());
            }
            if let TerminationPolicy::PollUntilEmpty { max_passes } = self.config.termination_policy
            {
                if drained >= max_passes {
                    return Err(Error::PassLimitExceeded(drained));
                }
            }
            self.drain(snapshot, report).await?;
            drained += 1;
            if self.config.termination_policy == TerminationPolicy::SinglePass {
                return Ok(());
            }
        }
    }

    async fn poll_snapshot(&self) -> Result<ObjectSnapshot, Error> {
        let timeout = self.config.perception_timeout();
        let attempts = self.config.perception_retries + 1;
        for attempt in 1..=attempts {
            self.gate.request_snapshot();
            match self.cancelable(self.gate.wait_snapshot(timeout)).await {
                Ok(snapshot) => {
                    debug!(num_objects = snapshot.len(), attempt, "snapshot");
                    return Ok(snapshot);
                }
                Err(Error::PerceptionTimeout { .. }) => {
                    warn!(attempt, attempts, "no snapshot within {timeout:?}");
                }
                Err(e) => return Err(e),
            }
        }
        Err(Error::PerceptionTimeout { timeout, attempts })
    }

    async fn drain(&self, snapshot: ObjectSnapshot, report: &mut RunReport) -> Result<(), Error> {
        let num_objects = snapshot.len();
        for (index, position) in snapshot.into_objects().into_iter().enumerate() {
            self.set_state(SequencerState::Draining);
            info!(
                index,
                num_objects,
                x = position.x,
                y = position.y,
                z = position.z,
                "pick up object"
            );
            match self.pick_and_dispose(position).await {
                Ok(()) => report.objects.push(ObjectOutcome {
                    position,
                    error: None,
                }),
                Err(e @ Error::Canceled { .. }) => return Err(e),
                Err(e) => {
                    warn!(index, "failed to dispose object: {e}");
                    report.objects.push(ObjectOutcome {
                        position,
                        error: Some(e.to_string()),
                    });
                    self.return_to_start().await?;
                    if !e.is_object_local()
                        || self.config.object_failure_policy == ObjectFailurePolicy::AbortRun
                    {
                        return Err(e);
                    }
                }
            }
        }
        self.set_state(SequencerState::Draining);
        Ok(())
    }

    async fn pick_and_dispose(&self, position: Point3<f64>) -> Result<(), Error> {
        let pickup = RobotPose::overhead(position, self.orientation);
        let approach = pickup.raised(self.config.approach_clearance_m);

        self.set_state(SequencerState::PerObject(Step::Approach));
        self.move_joints("move to start", &self.config.start_configuration)
            .await?;
        let target = self.solve(&approach).await?;
        self.move_joints("approach", &target).await?;
        self.set_gripper(GripperCommand::Open).await?;

        self.set_state(SequencerState::PerObject(Step::Descend));
        let target = self.solve(&pickup).await?;
        self.move_joints("descend", &target).await?;

        self.set_state(SequencerState::PerObject(Step::Grasp));
        self.set_gripper(GripperCommand::Close).await?;

        self.set_state(SequencerState::PerObject(Step::Retreat));
        self.move_joints("retreat", &self.config.start_configuration)
            .await?;

        self.set_state(SequencerState::PerObject(Step::Dispose));
        self.move_joints("move to disposal", &self.config.disposal_configuration)
            .await?;

        self.set_state(SequencerState::PerObject(Step::Release));
        self.set_gripper(GripperCommand::Open).await?;

        let settle = self.config.settle_interval();
        self.cancelable(async {
            tokio::time::sleep(settle).await;
            Ok(())
        })
        .await
    }

    /// Brings the arm back to a known configuration after a failed cycle.
    async fn return_to_start(&self) -> Result<(), Error> {
        self.move_joints("return to start", &self.config.start_configuration)
            .await
            .map_err(|e| {
                error!("failed to return to start: {e}");
                e
            })
    }

    /// Solves on the blocking pool so that a cancel does not wait for the
    /// solver. A canceled solve finishes in the background, bounded by the
    /// solver's own request timeout, and its result is dropped.
    async fn solve(&self, target: &RobotPose) -> Result<JointConfiguration, Error> {
        debug!(
            x = target.position.x,
            y = target.position.y,
            z = target.position.z,
            "solve"
        );
        let solver = self.solver.clone();
        let target = *target;
        self.cancelable(async move {
            tokio::task::spawn_blocking(move || solver.solve(&target))
                .await
                .map_err(|e| Error::Other(e.into()))?
        })
        .await
    }

    async fn move_joints(&self, operation: &str, target: &JointConfiguration) -> Result<(), Error> {
        debug!(operation, ?target, "move joints");
        let wait = self
            .joints
            .send_joint_configuration(target, self.config.joint_move_duration())?;
        self.cancelable(wait.with_timeout(operation, self.config.actuation_timeout()))
            .await
    }

    async fn set_gripper(&self, command: GripperCommand) -> Result<(), Error> {
        debug!(%command, "gripper");
        let wait = self.gripper.set_gripper(command)?;
        let operation = format!("{command} gripper");
        self.cancelable(wait.with_timeout(&operation, self.config.actuation_timeout()))
            .await
    }

    async fn cancelable<T>(
        &self,
        future: impl Future<Output = Result<T, Error>>,
    ) -> Result<T, Error> {
        let mut canceled = self.cancel.subscribe();
        tokio::select! {
            result = future => result,
            _ = canceled.wait_for(|canceled| *canceled) => Err(Error::Canceled {
                message: "run canceled".to_owned(),
            }),
        }
    }
}

use std::time::Duration;

use nalgebra::Point3;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(
        "pickup-interface: Unreachable pose ({:.3}, {:.3}, {:.3}) : {}",
        position.x,
        position.y,
        position.z,
        reason
    )]
    UnreachablePose {
        position: Point3<f64>,
        reason: String,
    },
    #[error("pickup-interface: Actuation fault : {}", message)]
    ActuationFault { message: String },
    #[error(
        "pickup-interface: No snapshot arrived within {:?} ({} request(s))",
        timeout,
        attempts
    )]
    PerceptionTimeout { timeout: Duration, attempts: usize },
    #[error("pickup-interface: Timeout {} after {:?}", operation, timeout)]
    Timeout {
        operation: String,
        timeout: Duration,
    },
    #[error(
        "pickup-interface: Orientation is {} rad away from the overhead orientation (tolerance = {})",
        angle,
        tolerance
    )]
    OrientationMismatch { angle: f64, tolerance: f64 },
    #[error("pickup-interface: Length mismatch (model = {}, input = {})", model, input)]
    LengthMismatch { model: usize, input: usize },
    #[error("pickup-interface: No Joint={} is found.", .0)]
    NoJoint(String),
    #[error("pickup-interface: Connection error : {}", message)]
    Connection { message: String },
    #[error("pickup-interface: Canceled : {}", message)]
    Canceled { message: String },
    #[error("pickup-interface: Objects still detected after {} passes", .0)]
    PassLimitExceeded(usize),
    #[error("pickup-interface: Other: {:?}", .0)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Returns true if the error only concerns the object being handled, so
    /// that the remaining objects can still be processed.
    pub fn is_object_local(&self) -> bool {
        matches!(
            self,
            Error::UnreachablePose { .. }
                | Error::ActuationFault { .. }
                | Error::Timeout { .. }
                | Error::OrientationMismatch { .. }
                | Error::LengthMismatch { .. }
                | Error::NoJoint(_)
                | Error::Connection { .. }
        )
    }
}

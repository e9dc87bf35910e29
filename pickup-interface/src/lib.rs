#![doc = include_str!("../README.md")]

mod clients;
mod error;
mod traits;
mod types;
mod waits;

pub use clients::*;
pub use error::*;
pub use traits::*;
pub use types::*;
pub use waits::*;

// re-export
pub use nalgebra::{Isometry3, Point3, Quaternion, UnitQuaternion};

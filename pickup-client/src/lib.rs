#![doc = include_str!("../README.md")]

mod completion;
mod gripper;
mod ik;
mod joints;
mod object_feed;
mod utils;

pub use crate::{completion::*, gripper::*, ik::*, joints::*, object_feed::*};

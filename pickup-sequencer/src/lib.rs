#![doc = include_str!("../README.md")]

mod completion_reporter;
mod config;
mod motion_sequencer;
mod perception_gate;

pub use crate::{
    completion_reporter::*, config::*, motion_sequencer::*, perception_gate::*,
};

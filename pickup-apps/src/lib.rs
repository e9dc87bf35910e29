#![doc = include_str!("../README.md")]

mod error;
mod pickup_config;
mod robot;
pub mod utils;

pub use crate::{error::*, pickup_config::*, robot::*};

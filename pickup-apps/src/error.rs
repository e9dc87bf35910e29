use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("pickup-apps: No File {:?} is found ({}).", .0, .1)]
    NoFile(PathBuf, #[source] std::io::Error),
    #[error("pickup-apps: Failed to parse {:?} as toml ({}).", .0, .1)]
    TomlParseFailure(PathBuf, #[source] toml::de::Error),
    #[error("pickup-apps: No operator {} is specified.", .0)]
    NoOperator(&'static str),
    #[error("pickup-apps: Invalid config: {}", .0)]
    InvalidConfig(String),
    #[error("pickup-apps: pickup-interface: {:?}", .0)]
    Interface(#[from] pickup_interface::Error),
}

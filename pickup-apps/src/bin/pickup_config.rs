use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use schemars::schema_for;
use tracing::debug;

#[derive(Debug, Parser)]
#[clap(name = env!("CARGO_BIN_NAME"))]
struct Args {
    #[clap(subcommand)]
    subcommand: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate JSON schema for the specified config file.
    Schema {
        /// Kind of config file.
        #[clap(value_enum, ignore_case = true)]
        kind: ConfigKind,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConfigKind {
    PickupConfig,
    SequencerConfig,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    debug!(?args);

    match args.subcommand {
        Command::Schema { kind } => {
            let schema = match kind {
                ConfigKind::PickupConfig => schema_for!(pickup_apps::PickupConfig),
                ConfigKind::SequencerConfig => schema_for!(pickup_sequencer::SequencerConfig),
            };
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_args() {
        let bin = env!("CARGO_BIN_NAME");
        assert!(Args::try_parse_from([bin, "schema", "pickup-config"]).is_ok());
        assert!(Args::try_parse_from([bin, "schema", "sequencer-config"]).is_ok());
        assert!(Args::try_parse_from([bin, "schema", "robot-config"]).is_err());
    }
}
